// The status reducer: turns a process's event history into the single
// current view a client sees. Grounded on `get_process_info`/`doc_to_response`
// in the original agent controller: fold over every event, keep the one with
// the latest timestamp, and map it to an HTTP status.

use serde::{Deserialize, Serialize};

use crate::models::event::latest;
use crate::models::ids::reserved;
use crate::registry::AgentRegistry;
use crate::models::{ProcessEvent, ProcessId};

/// The reduced, client-facing view of a process: whatever its latest event
/// says, plus the set of actions a client may fire next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusView {
    pub process_id: ProcessId,
    pub agent_name: String,
    pub state: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    /// Actions whose `allowed_predecessor_states` contains `state`, per
    /// §3's definition of "available actions". Empty for any reserved
    /// terminal/error state, since no handler ever declares one of those as
    /// a predecessor.
    #[serde(default)]
    pub available_actions: Vec<String>,
}

impl StatusView {
    /// Fold a process's full event history down to the single latest event,
    /// the way `get_latest_process_event` does in the original controller.
    /// Returns `None` for a process id with no recorded events at all.
    /// `available_actions` is left empty; callers that have a registry
    /// handle should call [`StatusView::with_available_actions`] afterward.
    pub fn reduce(events: &[ProcessEvent]) -> Option<Self> {
        let event = latest(events.iter())?;
        Some(StatusView {
            process_id: event.process_id.clone(),
            agent_name: event.agent_name.clone(),
            state: event.state.as_str().to_string(),
            data: event.data.clone(),
            error: event.error.clone(),
            available_actions: Vec::new(),
        })
    }

    /// Fill in `available_actions` from the registry's declared handlers,
    /// per the `{ a | latest.state ∈ A.handlers[a].allowed_predecessor_states }`
    /// definition in §3. Call sites pass the registry explicitly rather than
    /// this type holding a reference, so `StatusView` stays a plain,
    /// serializable value.
    pub fn with_available_actions(mut self, registry: &AgentRegistry) -> Self {
        self.available_actions = registry
            .get(&self.agent_name)
            .map(|agent| {
                let state = crate::models::StateName::from(self.state.clone());
                agent
                    .handlers
                    .iter()
                    .filter(|h| !h.is_initializer() && h.allowed_predecessor_states.contains(&state))
                    .map(|h| h.action.as_str().to_string())
                    .collect()
            })
            .unwrap_or_default();
        self
    }

    /// The HTTP status code this view renders as, matching the controller's
    /// `doc_to_response` mapping: `processing` is a 202 (accepted, still
    /// running), a declared `http_error` renders at its own status, an
    /// `unhandled_error` is always a 500, and anything else is a plain 200.
    pub fn http_status(&self, events: &[ProcessEvent]) -> u16 {
        match self.state.as_str() {
            reserved::PROCESSING => 202,
            reserved::HTTP_ERROR => latest(events.iter())
                .and_then(|e| e.status_code)
                .unwrap_or(500),
            reserved::UNHANDLED_ERROR => 500,
            _ => 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ids::{ActionName, StateName};

    #[test]
    fn reduces_to_latest_event() {
        let pid = ProcessId::from("p1");
        let processing = ProcessEvent::processing(pid.clone(), "demo", ActionName::from("start"));
        let done = ProcessEvent::completed(
            pid,
            "demo",
            ActionName::from("start"),
            StateName::from("idle"),
            serde_json::json!({ "ok": true }),
        );
        let events = vec![processing, done];
        let view = StatusView::reduce(&events).unwrap();
        assert_eq!(view.state, "idle");
        assert_eq!(view.http_status(&events), 200);
    }

    #[test]
    fn processing_state_renders_as_202() {
        let pid = ProcessId::from("p1");
        let processing = ProcessEvent::processing(pid, "demo", ActionName::from("start"));
        let events = vec![processing];
        let view = StatusView::reduce(&events).unwrap();
        assert_eq!(view.http_status(&events), 202);
    }

    #[test]
    fn http_error_renders_at_its_declared_status() {
        let pid = ProcessId::from("p1");
        let err = ProcessEvent::http_error(pid, "demo", ActionName::from("start"), 409, "conflict");
        let events = vec![err];
        let view = StatusView::reduce(&events).unwrap();
        assert_eq!(view.http_status(&events), 409);
    }

    #[test]
    fn empty_history_reduces_to_none() {
        assert!(StatusView::reduce(&[]).is_none());
    }
}
