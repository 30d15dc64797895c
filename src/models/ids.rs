// Identifiers for the agent process controller.
//
// `StateName` and `ActionName` mirror the `StateId`/`ActivityId` pattern from
// the workflow engine this crate grew out of: simple string wrappers so any
// agent can name its own states and actions without the engine knowing
// anything about them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// **State name** — where a process currently sits in its agent's machine.
///
/// Any string is a valid state name; the engine assigns no meaning to it
/// except for the reserved names in [`reserved`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateName(pub String);

impl StateName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn new<S: Into<String>>(name: S) -> Self {
        StateName(name.into())
    }

    /// The virtual state every process starts in before its first event.
    /// Never stored; only ever compared against.
    pub fn uninitialized() -> Self {
        StateName(reserved::UNINITIALIZED.to_string())
    }

    pub fn is_uninitialized(&self) -> bool {
        self.0 == reserved::UNINITIALIZED
    }
}

impl From<&str> for StateName {
    fn from(s: &str) -> Self {
        StateName(s.to_string())
    }
}

impl From<String> for StateName {
    fn from(s: String) -> Self {
        StateName(s)
    }
}

impl std::fmt::Display for StateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// **Action name** — the label of a transition a client can invoke.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionName(pub String);

impl ActionName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn new<S: Into<String>>(name: S) -> Self {
        ActionName(name.into())
    }
}

impl From<&str> for ActionName {
    fn from(s: &str) -> Self {
        ActionName(s.to_string())
    }
}

impl From<String> for ActionName {
    fn from(s: String) -> Self {
        ActionName(s)
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reserved state names the controller itself assigns. Domain-defined states
/// must not collide with these; the registry rejects any agent that declares
/// a handler predecessor state using one of them (`processing` in particular
/// can never be declared reachable — see `HandlerDescriptor::validate`).
pub mod reserved {
    pub const UNINITIALIZED: &str = "UNINITIALIZED";
    pub const PROCESSING: &str = "processing";
    pub const TERMINATED: &str = "terminated";
    pub const HTTP_ERROR: &str = "http_error";
    pub const UNHANDLED_ERROR: &str = "unhandled_error";
}

/// Opaque process identifier. A process is identified by a random v4 UUID
/// minted when its initializer action runs; the event log is keyed by it from
/// then on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub String);

impl ProcessId {
    /// Mint a fresh id for a brand-new process.
    pub fn generate() -> Self {
        ProcessId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProcessId {
    fn from(s: &str) -> Self {
        ProcessId(s.to_string())
    }
}

impl From<String> for ProcessId {
    fn from(s: String) -> Self {
        ProcessId(s)
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_name_conversions() {
        let s1 = StateName::from("draft");
        let s2 = StateName::new("draft".to_string());
        assert_eq!(s1, s2);
        assert_eq!(s1.as_str(), "draft");
        assert_eq!(s1.to_string(), "draft");
    }

    #[test]
    fn uninitialized_is_a_sentinel() {
        let state = StateName::uninitialized();
        assert!(state.is_uninitialized());
        assert!(!StateName::from("draft").is_uninitialized());
    }

    #[test]
    fn process_ids_are_unique() {
        let a = ProcessId::generate();
        let b = ProcessId::generate();
        assert_ne!(a, b);
    }
}
