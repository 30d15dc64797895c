// The process controller: the heart of the agent machine. Validates a
// request against an agent's declared actions, enforces the state-transition
// guard, appends the `processing` event, and dispatches execution either
// inline or in the background.
//
// Grounded directly on `AgentController.process_action` in the original
// controller: this is the same five-step contract (resolve handler, resolve
// process id, check guard, validate input, append-then-run) reimplemented
// with Rust's ownership rules standing in for Python's GIL-protected
// dictionaries.

use dashmap::DashMap;
use std::sync::Arc;

use crate::engine::execution_runner::ExecutionRunner;
use crate::engine::status::StatusView;
use crate::models::ids::reserved;
use crate::models::{ActionContext, HandlerDescriptor, ProcessId, StateName};
use crate::registry::AgentRegistry;
use crate::schema;
use crate::store::ProcessEventStore;
use crate::AgentMachineError;

/// How a request asked for its action to be dispatched. Chosen per-request
/// via the `execution-mode` header (see `crate::api`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Await the handler inline and return its terminal status.
    Sync,
    /// Accept the request, run the handler in the background, and return
    /// immediately with a `processing` status.
    Async,
}

#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub agent_name: String,
    pub action_name: String,
    /// `None` for an initializer action, which always mints a fresh process.
    pub process_id: Option<ProcessId>,
    pub body: serde_json::Value,
    pub mode: ExecutionMode,
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExecuteResponse {
    pub status: StatusView,
    pub http_status: u16,
}

/// Guards the race between checking a process's current state and appending
/// its `processing` event: two concurrent requests against the same process
/// must not both pass the guard check before either one records that it's
/// running. See DESIGN.md for why a per-process mutex was chosen over the
/// alternatives the design notes raise.
pub struct ProcessController {
    registry: Arc<AgentRegistry>,
    store: ProcessEventStore,
    runner: ExecutionRunner,
    locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl ProcessController {
    pub fn new(registry: Arc<AgentRegistry>, store: ProcessEventStore) -> Self {
        ProcessController {
            runner: ExecutionRunner::new(registry.clone(), store.clone()),
            registry,
            store,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, process_id: &ProcessId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .entry(process_id.as_str().to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Run one action. This is steps 1-6 of the guard/dispatch contract;
    /// step 7 (actually running the handler to completion) happens either
    /// inline here (`Sync`) or on a spawned task (`Async`) — either way,
    /// outside the per-process lock.
    pub async fn execute(&self, request: ExecuteRequest) -> crate::Result<ExecuteResponse> {
        let agent = self
            .registry
            .get(&request.agent_name)
            .ok_or_else(|| AgentMachineError::AgentNotFound(request.agent_name.clone()))?;

        let handler = agent.handler(&request.action_name).ok_or_else(|| AgentMachineError::ActionNotFound {
            agent: request.agent_name.clone(),
            action: request.action_name.clone(),
        })?;

        // Validation runs before process lookup and the guard check, matching
        // the original controller: FastAPI's Pydantic injection validates the
        // body before `process_action`'s own code ever runs, so a malformed
        // body against an unknown process or a disallowed state still comes
        // back 422, not 404/409.
        let normalized_input = schema::validate(&handler.params, &request.body)?;

        let (process_id, previous_state, guard) = self.resolve_process(handler, &request).await?;

        if !handler.accepts(previous_state.as_ref()) {
            let state_label = previous_state
                .as_ref()
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| reserved::UNINITIALIZED.to_string());
            return Err(AgentMachineError::GuardViolation {
                action: request.action_name.clone(),
                state: state_label,
            });
        }

        let processing_event = crate::models::ProcessEvent::processing(
            process_id.clone(),
            agent.name.clone(),
            handler.action.clone(),
        );
        self.store
            .append(processing_event)
            .await
            .map_err(AgentMachineError::Store)?;

        // Drop the per-process lock now: everything after this point runs
        // the handler, which may take arbitrarily long and must not block
        // other requests to the same process from being rejected quickly.
        drop(guard);

        let ctx = ActionContext {
            process_id: process_id.clone(),
            agent_name: agent.name.clone(),
            action: handler.action.clone(),
            previous_state,
            input: normalized_input,
        };

        match request.mode {
            ExecutionMode::Async => {
                let runner = self.runner.clone();
                let handler_fn = handler.handler.clone();
                let callback_url = request.callback_url.clone();
                tokio::spawn(async move {
                    if let Err(err) = runner.run(handler_fn, ctx, callback_url).await {
                        tracing::error!(error = %err, "execution runner failed to record a terminal event");
                    }
                });

                let status = StatusView {
                    process_id,
                    agent_name: agent.name.clone(),
                    state: reserved::PROCESSING.to_string(),
                    data: None,
                    error: None,
                    available_actions: Vec::new(),
                }
                .with_available_actions(&self.registry);

                Ok(ExecuteResponse {
                    status,
                    http_status: 202,
                })
            }
            ExecutionMode::Sync => {
                let status = self
                    .runner
                    .run(handler.handler.clone(), ctx, request.callback_url.clone())
                    .await
                    .map_err(AgentMachineError::Store)?;
                let events = self
                    .store
                    .events_for_process(&process_id)
                    .await
                    .map_err(AgentMachineError::Store)?;
                let http_status = status.http_status(&events);
                Ok(ExecuteResponse { status, http_status })
            }
        }
    }

    /// Resolve the process id and current state this request is acting
    /// against, holding the per-process lock across the lookup when one is
    /// needed. Returns the lock guard so the caller can drop it explicitly
    /// once the `processing` event is safely appended.
    async fn resolve_process(
        &self,
        _handler: &HandlerDescriptor,
        request: &ExecuteRequest,
    ) -> crate::Result<(ProcessId, Option<StateName>, Option<tokio::sync::OwnedMutexGuard<()>>)> {
        // Which path matched (`/programs/{action}` vs
        // `/processes/{process_id}/actions/{action}`) decides this, not
        // whether the handler happens to be an initializer: an initializer
        // is also reachable through the `actions` path against an existing
        // process id, and must guard-reject it there (409) rather than 404,
        // since the route exists — it's the transition that's disallowed.
        let Some(process_id) = request.process_id.clone() else {
            return Ok((ProcessId::generate(), None, None));
        };

        let lock = self.lock_for(&process_id);
        let guard = lock.lock_owned().await;

        let latest = self
            .store
            .latest_event(&process_id)
            .await
            .map_err(AgentMachineError::Store)?
            .ok_or_else(|| AgentMachineError::ProcessNotFound(process_id.as_str().to_string()))?;

        Ok((process_id, Some(latest.state), Some(guard)))
    }

    /// The Status Reducer entry point used by the `GET` status route: fold a
    /// process's history down to its current view.
    pub async fn status(&self, process_id: &ProcessId) -> crate::Result<ExecuteResponse> {
        let events = self
            .store
            .events_for_process(process_id)
            .await
            .map_err(AgentMachineError::Store)?;
        let status = StatusView::reduce(&events)
            .ok_or_else(|| AgentMachineError::ProcessNotFound(process_id.as_str().to_string()))?
            .with_available_actions(&self.registry);
        let http_status = status.http_status(&events);
        Ok(ExecuteResponse { status, http_status })
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }
}

