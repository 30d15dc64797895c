// The Route Builder: derives the HTTP surface directly from the agent
// registry at startup, the same way the original controller's `start()`
// method walks its registered agents and calls `add_api_route` once per
// action. Grounded on `CircuitBreakerApiServer::create_router` from the
// workflow engine for the overall shape (merge per-resource routers, a
// shared `ApiConfig`, conditional CORS, a fallback handler).

use axum::extract::{Extension, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::{AgentMachine, ExecuteRequest, ExecutionMode};
use crate::models::ProcessId;
use crate::registry::AgentRegistry;
use crate::AgentMachineError;

/// HTTP-layer configuration, independent of which agents are registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_enabled: true,
        }
    }
}

/// One route the registry derived, recorded alongside the agent/action it
/// belongs to so `/docs` can describe the whole surface without separately
/// walking the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteInfo {
    pub method: &'static str,
    pub path: String,
    pub agent: String,
    pub action: Option<String>,
}

/// The full set of routes derived from a registry. Computed once at router
/// build time and reused by the `/docs` handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteTable {
    pub routes: Vec<RouteInfo>,
}

impl RouteTable {
    fn derive(registry: &AgentRegistry) -> Self {
        let mut routes = Vec::new();
        for agent in registry.agents() {
            for handler in agent.handlers_initializer_first() {
                if handler.is_initializer() {
                    routes.push(RouteInfo {
                        method: "POST",
                        path: format!("/agents/{}/programs/{}", agent.name, handler.action.as_str()),
                        agent: agent.name.clone(),
                        action: Some(handler.action.as_str().to_string()),
                    });
                }
                routes.push(RouteInfo {
                    method: "POST",
                    path: format!(
                        "/agents/{}/processes/:process_id/actions/{}",
                        agent.name,
                        handler.action.as_str()
                    ),
                    agent: agent.name.clone(),
                    action: Some(handler.action.as_str().to_string()),
                });
            }
            routes.push(RouteInfo {
                method: "GET",
                path: format!("/agents/{}/processes/:process_id/status", agent.name),
                agent: agent.name.clone(),
                action: None,
            });
        }
        RouteTable { routes }
    }
}

/// Build the Axum router for a fully-assembled [`AgentMachine`]: one route
/// per action (initializers first, per-agent, so a static action segment is
/// registered before the agent's dynamic status route) plus `/docs`.
pub fn build_router(machine: AgentMachine, config: &ApiConfig) -> Router {
    let route_table = RouteTable::derive(machine.registry());
    let mut router = Router::new();

    for agent in machine.registry().agents() {
        let agent_name = agent.name.clone();

        for handler in agent.handlers_initializer_first() {
            let action_name = handler.action.as_str().to_string();

            if handler.is_initializer() {
                let path = format!("/agents/{}/programs/{}", agent_name, action_name);
                let agent_name = agent_name.clone();
                let action_name = action_name.clone();
                router = router.route(
                    &path,
                    post(move |Extension(machine): Extension<AgentMachine>, headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                        let agent_name = agent_name.clone();
                        let action_name = action_name.clone();
                        async move { execute(machine, agent_name, action_name, None, headers, body).await }
                    }),
                );
            }

            // Every action, initializer or not, is also reachable through the
            // `actions` path against an existing process id. For a non-
            // initializer this is the only way to advance a process; for an
            // initializer it exists purely so re-invoking it against an
            // already-started process yields a 409 guard violation rather
            // than a 404 — see DESIGN.md.
            let path = format!(
                "/agents/{}/processes/:process_id/actions/{}",
                agent_name, action_name
            );
            let agent_name_for_route = agent_name.clone();
            let action_name_for_route = action_name.clone();
            router = router.route(
                &path,
                post(move |Extension(machine): Extension<AgentMachine>, Path(process_id): Path<String>, headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                    let agent_name = agent_name_for_route.clone();
                    let action_name = action_name_for_route.clone();
                    async move { execute(machine, agent_name, action_name, Some(process_id), headers, body).await }
                }),
            );
        }

        let status_path = format!("/agents/{}/processes/:process_id/status", agent_name);
        router = router.route(
            &status_path,
            get(move |Extension(machine): Extension<AgentMachine>, Path(process_id): Path<String>| async move {
                status(machine, process_id).await
            }),
        );
    }

    router = router.route(
        "/docs",
        get(move |Extension(_machine): Extension<AgentMachine>| {
            let route_table = route_table.clone();
            async move { Json(route_table).into_response() }
        }),
    );

    router = router.fallback(not_found).layer(TraceLayer::new_for_http());

    if config.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }

    router.layer(Extension(machine))
}

async fn execute(
    machine: AgentMachine,
    agent_name: String,
    action_name: String,
    process_id: Option<String>,
    headers: HeaderMap,
    body: serde_json::Value,
) -> Response {
    let callback_url = headers
        .get("callback-url")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    // §4.5 step 3: the header wins if present; otherwise a callback-url
    // implies async, and a bare request defaults to sync.
    let mode = match headers
        .get("execution-mode")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_lowercase())
    {
        Some(value) if value == "async" => ExecutionMode::Async,
        Some(_) => ExecutionMode::Sync,
        None if callback_url.is_some() => ExecutionMode::Async,
        None => ExecutionMode::Sync,
    };

    let request = ExecuteRequest {
        agent_name,
        action_name,
        process_id: process_id.map(ProcessId::from),
        body,
        mode,
        callback_url,
    };

    match machine.controller().execute(request).await {
        Ok(response) => (
            StatusCode::from_u16(response.http_status).unwrap_or(StatusCode::OK),
            Json(response.status),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn status(machine: AgentMachine, process_id: String) -> Response {
    match machine.controller().status(&ProcessId::from(process_id)).await {
        Ok(response) => (
            StatusCode::from_u16(response.http_status).unwrap_or(StatusCode::OK),
            Json(response.status),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: AgentMachineError) -> Response {
    match err {
        AgentMachineError::Validation(validation_error) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "detail": validation_error.errors })),
        )
            .into_response(),
        AgentMachineError::AgentNotFound(_)
        | AgentMachineError::ActionNotFound { .. }
        | AgentMachineError::ProcessNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "detail": err.to_string() })),
        )
            .into_response(),
        AgentMachineError::GuardViolation { .. } => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "detail": err.to_string() })),
        )
            .into_response(),
        AgentMachineError::Handler { status, detail } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(serde_json::json!({ "detail": detail })),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": other.to_string() })),
        )
            .into_response(),
    }
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "detail": "not found" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests;
