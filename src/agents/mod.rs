// Demo agents used by the integration tests and the server binary's
// built-in fallback registry. Real deployments build an [`AgentRegistry`]
// from their own declared agents (the YAML resource-loading path the host
// bootstrap would normally use is out of scope — see spec §1); these two
// agents exist to exercise every invariant in the core contract with a
// realistic, runnable example rather than a trivial one.
//
// Grounded on the `helloworld`/`paramtester` scenarios used throughout the
// original controller's own test suite: a single-action agent that branches
// on its input, and a defaults/required-fields agent.

use crate::models::{ActionOutcome, AgentDescriptor, InputParam, ParamKind};
use crate::registry::{AgentRegistryBuilder, HandlerBuilder};
use crate::AgentMachineError;

/// `helloworld`: one initializer, `idle(question: str)`. Returns a
/// `terminated` state with `{question, answer: "world"}` when asked
/// politely; anything else is treated as a handler-declared HTTP error, to
/// exercise the `http_error` terminal state end to end.
pub fn helloworld_agent() -> AgentDescriptor {
    AgentDescriptor::new(
        "helloworld",
        vec![HandlerBuilder::new("idle")
            .param(InputParam::required("question", ParamKind::String))
            .build(|ctx| async move {
                let question = ctx.input["question"].as_str().unwrap_or_default();
                if question == "hello" {
                    Ok(ActionOutcome::new(
                        "terminated",
                        serde_json::json!({ "question": question, "answer": "world" }),
                    ))
                } else {
                    Err(AgentMachineError::Handler {
                        status: 500,
                        detail: "huge system error, please contact the administrator".to_string(),
                    })
                }
            })],
    )
}

/// `paramtester`: one initializer, `foo(x: int, y: int = 5, z: int = 10)`.
/// Echoes its validated, defaulted input back as the terminal data, so
/// callers can assert on exactly what the schema deriver filled in.
pub fn paramtester_agent() -> AgentDescriptor {
    AgentDescriptor::new(
        "paramtester",
        vec![HandlerBuilder::new("foo")
            .params(vec![
                InputParam::required("x", ParamKind::Integer),
                InputParam::with_default("y", ParamKind::Integer, serde_json::json!(5)),
                InputParam::with_default("z", ParamKind::Integer, serde_json::json!(10)),
            ])
            .build(|ctx| async move { Ok(ActionOutcome::new("terminated", ctx.input)) })],
    )
}

/// The registry the server binary boots with when no agent-descriptor
/// directory is configured: both demo agents, ready to accept traffic.
pub fn demo_registry() -> crate::Result<crate::registry::AgentRegistry> {
    AgentRegistryBuilder::new()
        .agent(helloworld_agent())
        .agent(paramtester_agent())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helloworld_declares_a_single_initializer() {
        let agent = helloworld_agent();
        assert_eq!(agent.handlers.len(), 1);
        assert!(agent.handler("idle").unwrap().is_initializer());
    }

    #[test]
    fn paramtester_declares_required_and_defaulted_params() {
        let agent = paramtester_agent();
        let handler = agent.handler("foo").unwrap();
        assert!(handler.params[0].is_required());
        assert!(!handler.params[1].is_required());
        assert!(!handler.params[2].is_required());
    }

    #[test]
    fn demo_registry_builds_cleanly() {
        assert!(demo_registry().is_ok());
    }
}
