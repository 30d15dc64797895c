// The execution runner: actually calls a handler, turns its outcome into a
// terminal event, appends it, and — when the caller asked for async
// execution with a callback — delivers the final status to that URL.
//
// The callback-url contract has no counterpart in the original controller;
// it's this crate's answer to async execution needing some way to notify a
// caller without them polling. Grounded on the `reqwest::Client` usage
// pattern from the workflow engine's external HTTP calls.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::engine::status::StatusView;
use crate::models::{ActionContext, ActionFn};
use crate::registry::AgentRegistry;
use crate::store::ProcessEventStore;
use crate::AgentMachineError;

#[derive(Clone)]
pub struct ExecutionRunner {
    registry: Arc<AgentRegistry>,
    store: ProcessEventStore,
    http_client: reqwest::Client,
}

impl ExecutionRunner {
    pub fn new(registry: Arc<AgentRegistry>, store: ProcessEventStore) -> Self {
        ExecutionRunner {
            registry,
            store,
            http_client: reqwest::Client::new(),
        }
    }

    /// Run `handler` against `ctx`, append the resulting terminal event, and
    /// (if `callback_url` is set) POST the reduced status to it. Runs to
    /// completion regardless of how the handler finishes — a handler error
    /// is a normal outcome here, not a reason to stop.
    pub async fn run(
        &self,
        handler: ActionFn,
        ctx: ActionContext,
        callback_url: Option<String>,
    ) -> anyhow::Result<StatusView> {
        let process_id = ctx.process_id.clone();
        let agent_name = ctx.agent_name.clone();
        let action = ctx.action.clone();

        let result = handler(ctx).await;

        let event = match result {
            Ok(outcome) => crate::models::ProcessEvent::completed(
                process_id,
                agent_name,
                action,
                outcome.next_state,
                outcome.data,
            ),
            Err(AgentMachineError::Handler { status, detail }) => {
                if status >= 500 {
                    error!(process_id = %process_id, %status, %detail, "handler signalled an http error");
                } else {
                    debug!(process_id = %process_id, %status, %detail, "handler signalled an http error");
                }
                crate::models::ProcessEvent::http_error(process_id, agent_name, action, status, detail)
            }
            Err(other) => {
                error!(process_id = %process_id, error = %other, "handler produced an unhandled error");
                crate::models::ProcessEvent::unhandled_error(process_id, agent_name, action, other.to_string())
            }
        };

        self.store.append(event.clone()).await?;

        let view = StatusView {
            process_id: event.process_id.clone(),
            agent_name: event.agent_name.clone(),
            state: event.state.as_str().to_string(),
            data: event.data.clone(),
            error: event.error.clone(),
            available_actions: Vec::new(),
        }
        .with_available_actions(&self.registry);

        if let Some(url) = callback_url {
            self.deliver_callback(&url, &view).await;
        }

        Ok(view)
    }

    async fn deliver_callback(&self, url: &str, view: &StatusView) {
        match self.http_client.post(url).json(view).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(
                    process_id = %view.process_id,
                    status = %response.status(),
                    "callback delivery rejected by receiver"
                );
            }
            Err(err) => {
                warn!(process_id = %view.process_id, error = %err, "callback delivery failed");
            }
            Ok(_) => {}
        }
    }
}
