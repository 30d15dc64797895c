// Process events: the append-only log entries that are the single source of
// truth for process state. Grounded on the `HistoryEvent` shape in the
// workflow engine this crate grew out of, but here the event IS the record —
// there is no separately-mutated `Resource.state` field to keep in sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::ids::{ActionName, ProcessId, StateName};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Monotonic counter used to break ties when two events land on the exact
/// same timestamp. `chrono::Utc::now()` has millisecond-ish practical
/// resolution; two events appended back-to-back on a fast machine can share
/// a timestamp, and the spec requires a deterministic "latest wins" order.
fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// One immutable record of an action having run against a process.
///
/// Appended once per execution and never mutated afterward. The process's
/// current state is always derived by reducing over these — see
/// [`crate::engine::status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessEvent {
    /// The process this event belongs to.
    pub process_id: ProcessId,

    /// Which agent's machine this process is an instance of.
    pub agent_name: String,

    /// The action that produced this event.
    pub action: ActionName,

    /// The state this event leaves the process in. `processing` while the
    /// handler is still running; the handler's declared destination state,
    /// `terminated`, `http_error`, or `unhandled_error` once it's done.
    pub state: StateName,

    /// The handler's output, if it completed successfully. `None` while
    /// `state == processing`, and for error states (the error itself lives in
    /// `error`).
    pub data: Option<serde_json::Value>,

    /// Populated when `state` is `http_error` or `unhandled_error`.
    pub error: Option<String>,

    /// The HTTP status a handler's declared error asked for. Only ever set
    /// alongside `http_error`; `unhandled_error` always renders as 500.
    pub status_code: Option<u16>,

    /// When this event was recorded. The reducer picks the event with the
    /// greatest `date`, breaking ties with `sequence`.
    pub date: DateTime<Utc>,

    /// Insertion-order tiebreaker, assigned once per process at construction.
    /// Not persisted meaning beyond "happened-before" within this process;
    /// never compared across processes.
    pub sequence: u64,
}

impl ProcessEvent {
    /// Build the `processing` event inserted the moment an action is
    /// accepted, before the handler has run.
    pub fn processing(process_id: ProcessId, agent_name: impl Into<String>, action: ActionName) -> Self {
        ProcessEvent {
            process_id,
            agent_name: agent_name.into(),
            action,
            state: StateName::new(crate::models::ids::reserved::PROCESSING),
            data: None,
            error: None,
            status_code: None,
            date: Utc::now(),
            sequence: next_sequence(),
        }
    }

    /// Build the terminal event recorded once a handler finishes
    /// successfully.
    pub fn completed(
        process_id: ProcessId,
        agent_name: impl Into<String>,
        action: ActionName,
        state: StateName,
        data: serde_json::Value,
    ) -> Self {
        ProcessEvent {
            process_id,
            agent_name: agent_name.into(),
            action,
            state,
            data: Some(data),
            error: None,
            status_code: None,
            date: Utc::now(),
            sequence: next_sequence(),
        }
    }

    /// Build the terminal event recorded when a handler itself raises an
    /// HTTP-style error (see `AgentMachineError::Handler`).
    pub fn http_error(
        process_id: ProcessId,
        agent_name: impl Into<String>,
        action: ActionName,
        status_code: u16,
        detail: impl Into<String>,
    ) -> Self {
        ProcessEvent {
            process_id,
            agent_name: agent_name.into(),
            action,
            state: StateName::new(crate::models::ids::reserved::HTTP_ERROR),
            data: None,
            error: Some(detail.into()),
            status_code: Some(status_code),
            date: Utc::now(),
            sequence: next_sequence(),
        }
    }

    /// Build the terminal event recorded when a handler panics or otherwise
    /// fails in a way that was never translated into a declared error.
    pub fn unhandled_error(
        process_id: ProcessId,
        agent_name: impl Into<String>,
        action: ActionName,
        detail: impl Into<String>,
    ) -> Self {
        ProcessEvent {
            process_id,
            agent_name: agent_name.into(),
            action,
            state: StateName::new(crate::models::ids::reserved::UNHANDLED_ERROR),
            data: None,
            error: Some(detail.into()),
            status_code: Some(500),
            date: Utc::now(),
            sequence: next_sequence(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        let s = self.state.as_str();
        s == crate::models::ids::reserved::TERMINATED
            || s == crate::models::ids::reserved::HTTP_ERROR
            || s == crate::models::ids::reserved::UNHANDLED_ERROR
    }

    pub fn is_processing(&self) -> bool {
        self.state.as_str() == crate::models::ids::reserved::PROCESSING
    }
}

/// Orders events "latest wins": greatest `date`, then greatest `sequence`.
/// Used by the status reducer to pick the current event out of a process's
/// full history without assuming the store returns them in any order.
pub fn latest<'a>(events: impl IntoIterator<Item = &'a ProcessEvent>) -> Option<&'a ProcessEvent> {
    events
        .into_iter()
        .max_by_key(|e| (e.date, e.sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_breaks_ties_by_sequence() {
        let pid = ProcessId::from("p1");
        let e1 = ProcessEvent::processing(pid.clone(), "demo", ActionName::from("start"));
        let mut e2 = ProcessEvent::completed(
            pid,
            "demo",
            ActionName::from("start"),
            StateName::from("done"),
            serde_json::json!({}),
        );
        // Force an identical timestamp to exercise the sequence tiebreak.
        e2.date = e1.date;
        assert!(e2.sequence > e1.sequence);

        let events = vec![e1.clone(), e2.clone()];
        let picked = latest(events.iter()).unwrap();
        assert_eq!(picked.sequence, e2.sequence);
    }

    #[test]
    fn terminal_and_processing_classification() {
        let pid = ProcessId::from("p1");
        let processing = ProcessEvent::processing(pid.clone(), "demo", ActionName::from("start"));
        assert!(processing.is_processing());
        assert!(!processing.is_terminal());

        let done = ProcessEvent::completed(
            pid,
            "demo",
            ActionName::from("start"),
            StateName::from("terminated"),
            serde_json::json!({}),
        );
        assert!(done.is_terminal());
        assert!(!done.is_processing());
    }
}
