// Handler descriptors: the declarative shape of a single action an agent
// exposes, and the pieces needed to validate its input and run it.
//
// Grounded on the generic `Into<T>`-bounded constructors in the workflow
// engine's `TransitionDefinition`, adapted so an action also carries the
// Rust closure that actually executes it.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::models::ids::{ActionName, StateName};

/// The primitive types an action parameter can declare. Mirrors the handful
/// of JSON-schema-ish kinds the schema deriver needs to validate and coerce
/// against; this is intentionally smaller than full JSON Schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Float,
    Boolean,
    Object,
    Array,
    Any,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Float => "float",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
            ParamKind::Any => "any",
        }
    }
}

/// One declared input parameter of an action. Required iff it has no
/// default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputParam {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<serde_json::Value>,
}

impl InputParam {
    pub fn required<S: Into<String>>(name: S, kind: ParamKind) -> Self {
        InputParam {
            name: name.into(),
            kind,
            default: None,
        }
    }

    pub fn with_default<S: Into<String>>(name: S, kind: ParamKind, default: serde_json::Value) -> Self {
        InputParam {
            name: name.into(),
            kind,
            default: Some(default),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Everything a handler needs to know about the request it's servicing.
/// Passed by value into the closure each time an action runs.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub process_id: crate::models::ids::ProcessId,
    pub agent_name: String,
    pub action: ActionName,
    /// The process's state immediately before this action ran. `None` for
    /// initializer actions, which start from the virtual `UNINITIALIZED`
    /// state.
    pub previous_state: Option<StateName>,
    /// Validated, defaulted request body.
    pub input: serde_json::Value,
}

/// What a handler produced: the state the process moves to, and the data
/// recorded alongside it. A handler that wants to signal an HTTP-style error
/// instead returns `Err(AgentMachineError::Handler { .. })`; anything else
/// returned as `Err` is treated as an unhandled error.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub next_state: StateName,
    pub data: serde_json::Value,
}

impl ActionOutcome {
    pub fn new(next_state: impl Into<StateName>, data: serde_json::Value) -> Self {
        ActionOutcome {
            next_state: next_state.into(),
            data,
        }
    }
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A handler's executable body: an async closure from context to outcome.
/// `Arc`-wrapped so `HandlerDescriptor` can be cheaply cloned into the
/// registry and shared across concurrently-running requests.
pub type ActionFn = Arc<
    dyn Fn(ActionContext) -> BoxFuture<'static, crate::Result<ActionOutcome>> + Send + Sync,
>;

/// The declarative description of one action on one agent: its name, the
/// states it may run from, its parameter schema, and the code that runs it.
#[derive(Clone)]
pub struct HandlerDescriptor {
    pub action: ActionName,
    /// States this action may be invoked from. An empty list marks this as
    /// an **initializer**: it may only run against a brand-new process
    /// (the virtual `UNINITIALIZED` state), and running it always mints a
    /// fresh `ProcessId`.
    pub allowed_predecessor_states: Vec<StateName>,
    pub params: Vec<InputParam>,
    pub handler: ActionFn,
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("action", &self.action)
            .field("allowed_predecessor_states", &self.allowed_predecessor_states)
            .field("params", &self.params)
            .finish()
    }
}

impl HandlerDescriptor {
    pub fn is_initializer(&self) -> bool {
        self.allowed_predecessor_states.is_empty()
    }

    /// Whether this action may run from the given current state. Initializers
    /// only ever match the virtual "no process yet" case, represented here by
    /// `None`.
    pub fn accepts(&self, current: Option<&StateName>) -> bool {
        match current {
            None => self.is_initializer(),
            Some(state) => !self.is_initializer() && self.allowed_predecessor_states.contains(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_handler() -> ActionFn {
        Arc::new(|ctx: ActionContext| {
            Box::pin(async move { Ok(ActionOutcome::new("done", ctx.input)) })
        })
    }

    #[test]
    fn initializer_only_accepts_absent_state() {
        let handler = HandlerDescriptor {
            action: ActionName::from("start"),
            allowed_predecessor_states: vec![],
            params: vec![],
            handler: noop_handler(),
        };
        assert!(handler.is_initializer());
        assert!(handler.accepts(None));
        assert!(!handler.accepts(Some(&StateName::from("idle"))));
    }

    #[test]
    fn non_initializer_checks_predecessor_list() {
        let handler = HandlerDescriptor {
            action: ActionName::from("advance"),
            allowed_predecessor_states: vec![StateName::from("idle")],
            params: vec![],
            handler: noop_handler(),
        };
        assert!(!handler.accepts(None));
        assert!(handler.accepts(Some(&StateName::from("idle"))));
        assert!(!handler.accepts(Some(&StateName::from("running"))));
    }

    #[test]
    fn required_param_has_no_default() {
        let p = InputParam::required("x", ParamKind::Integer);
        assert!(p.is_required());
        let p2 = InputParam::with_default("y", ParamKind::Integer, serde_json::json!(5));
        assert!(!p2.is_required());
    }
}
