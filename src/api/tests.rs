// End-to-end tests for the Route Builder + Process Controller, driven
// through the actual Axum router rather than calling engine methods
// directly — these are the scenarios spec'd as S1-S7, plus the cross-
// cutting invariants from §8.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use crate::agents::{helloworld_agent, paramtester_agent};
use crate::engine::AgentMachine;
use crate::registry::AgentRegistryBuilder;
use crate::store::InMemoryEventStore;

use super::{build_router, ApiConfig};

fn router_for(registry: crate::registry::AgentRegistry) -> Router {
    let store = Arc::new(InMemoryEventStore::new());
    let machine = AgentMachine::new(registry, store);
    build_router(machine, &ApiConfig::default())
}

async fn send(router: &Router, method: Method, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    send_with_headers(router, method, uri, body, &[]).await
}

async fn send_with_headers(
    router: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    headers: &[(&str, &str)],
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(serde_json::to_vec(&body).unwrap())).unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn s1_empty_host_has_no_agent_routes() {
    let registry = AgentRegistryBuilder::new().build().unwrap();
    let router = router_for(registry);

    let (status, _) = send(&router, Method::GET, "/docs", serde_json::Value::Null).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, Method::POST, "/agents/helloworld/programs/idle", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn helloworld_registry() -> crate::registry::AgentRegistry {
    AgentRegistryBuilder::new().agent(helloworld_agent()).build().unwrap()
}

#[tokio::test]
async fn s2_happy_path_terminates_synchronously() {
    let router = router_for(helloworld_registry());

    let (status, body) = send(
        &router,
        Method::POST,
        "/agents/helloworld/programs/idle",
        serde_json::json!({ "question": "hello" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "terminated");
    assert_eq!(body["data"], serde_json::json!({ "question": "hello", "answer": "world" }));
    assert!(body["process_id"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn s3_async_mode_accepts_then_polls_to_the_same_terminal_body() {
    let router = router_for(helloworld_registry());

    let (status, body) = send_with_headers(
        &router,
        Method::POST,
        "/agents/helloworld/programs/idle",
        serde_json::json!({ "question": "hello" }),
        &[("execution-mode", "async")],
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let process_id = body["process_id"].as_str().unwrap().to_string();

    // Background task runs on the same runtime; give it a turn to finish.
    let mut polled = serde_json::Value::Null;
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (status, body) = send(
            &router,
            Method::GET,
            &format!("/agents/helloworld/processes/{process_id}/status"),
            serde_json::Value::Null,
        )
        .await;
        if status == StatusCode::OK {
            polled = body;
            break;
        }
    }

    assert_eq!(polled["state"], "terminated");
    assert_eq!(polled["data"], serde_json::json!({ "question": "hello", "answer": "world" }));
}

#[tokio::test]
async fn s4_advancing_a_terminated_process_is_a_conflict() {
    let router = router_for(helloworld_registry());

    let (_, body) = send(
        &router,
        Method::POST,
        "/agents/helloworld/programs/idle",
        serde_json::json!({ "question": "hello" }),
    )
    .await;
    let process_id = body["process_id"].as_str().unwrap();

    let (status, _) = send(
        &router,
        Method::POST,
        &format!("/agents/helloworld/processes/{process_id}/actions/idle"),
        serde_json::json!({ "question": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn s5_handler_http_error_surfaces_at_its_declared_status() {
    let router = router_for(helloworld_registry());

    let (status, body) = send(
        &router,
        Method::POST,
        "/agents/helloworld/programs/idle",
        serde_json::json!({ "question": "hola" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("huge system error"));
}

fn paramtester_registry() -> crate::registry::AgentRegistry {
    AgentRegistryBuilder::new().agent(paramtester_agent()).build().unwrap()
}

#[tokio::test]
async fn s6_defaults_and_required_fields() {
    let router = router_for(paramtester_registry());

    let (status, body) = send(
        &router,
        Method::POST,
        "/agents/paramtester/programs/foo",
        serde_json::json!({ "x": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!({ "x": 1, "y": 5, "z": 10 }));

    let (status, _) = send(&router, Method::POST, "/agents/paramtester/programs/foo", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &router,
        Method::POST,
        "/agents/paramtester/programs/foo",
        serde_json::json!({ "x": 1, "y": 2, "z": 3 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!({ "x": 1, "y": 2, "z": 3 }));
}

#[tokio::test]
async fn s7_unknown_process_is_not_found() {
    let router = router_for(helloworld_registry());

    let (status, _) = send(
        &router,
        Method::POST,
        "/agents/helloworld/processes/DEADBEEF/actions/idle",
        serde_json::json!({ "question": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        Method::GET,
        "/agents/helloworld/processes/DEADBEEF/status",
        serde_json::Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_failure_leaves_no_trace_and_available_actions_is_populated() {
    let router = router_for(paramtester_registry());

    // A 422 must not create a process at all: there is nothing to poll.
    let (status, _) = send(&router, Method::POST, "/agents/paramtester/programs/foo", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &router,
        Method::POST,
        "/agents/paramtester/programs/foo",
        serde_json::json!({ "x": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // `foo` is an initializer; once terminated, no action may fire from
    // "terminated", so the available list is empty.
    assert_eq!(body["available_actions"], serde_json::json!([]));
}
