// An agent: a name plus the set of actions (handlers) that make up its state
// machine. Grounded on the shape of the workflow engine's
// `WorkflowDefinition`, but flattened: an agent has no separate states list,
// since states here are just strings actions refer to.

use crate::models::handler::HandlerDescriptor;

/// A named state machine hosted by the agent machine. Built once by an
/// [`crate::registry::AgentRegistryBuilder`] and never mutated afterward.
#[derive(Clone)]
pub struct AgentDescriptor {
    pub name: String,
    pub handlers: Vec<HandlerDescriptor>,
}

impl std::fmt::Debug for AgentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDescriptor")
            .field("name", &self.name)
            .field("actions", &self.handlers.iter().map(|h| h.action.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>, handlers: Vec<HandlerDescriptor>) -> Self {
        AgentDescriptor {
            name: name.into(),
            handlers,
        }
    }

    pub fn handler(&self, action: &str) -> Option<&HandlerDescriptor> {
        self.handlers.iter().find(|h| h.action.as_str() == action)
    }

    pub fn initializers(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.handlers.iter().filter(|h| h.is_initializer())
    }

    /// Handlers ordered with initializers first. Routes are registered in
    /// this order so that, when two actions would otherwise overlap in an
    /// HTTP framework's route table, the initializer's POST-without-a-path
    /// form is matched before a more specific advance-an-existing-process
    /// route could shadow it.
    pub fn handlers_initializer_first(&self) -> Vec<&HandlerDescriptor> {
        let mut ordered: Vec<&HandlerDescriptor> = self.handlers.iter().collect();
        ordered.sort_by_key(|h| !h.is_initializer());
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::handler::{ActionContext, ActionOutcome};
    use crate::models::ids::{ActionName, StateName};
    use std::sync::Arc;

    fn noop_handler() -> crate::models::handler::ActionFn {
        Arc::new(|ctx: ActionContext| Box::pin(async move { Ok(ActionOutcome::new("done", ctx.input)) }))
    }

    #[test]
    fn initializers_sort_first() {
        let agent = AgentDescriptor::new(
            "demo",
            vec![
                HandlerDescriptor {
                    action: ActionName::from("advance"),
                    allowed_predecessor_states: vec![StateName::from("idle")],
                    params: vec![],
                    handler: noop_handler(),
                },
                HandlerDescriptor {
                    action: ActionName::from("start"),
                    allowed_predecessor_states: vec![],
                    params: vec![],
                    handler: noop_handler(),
                },
            ],
        );
        let ordered = agent.handlers_initializer_first();
        assert_eq!(ordered[0].action.as_str(), "start");
        assert_eq!(ordered[1].action.as_str(), "advance");
    }

    #[test]
    fn handler_lookup_by_name() {
        let agent = AgentDescriptor::new(
            "demo",
            vec![HandlerDescriptor {
                action: ActionName::from("start"),
                allowed_predecessor_states: vec![],
                params: vec![],
                handler: noop_handler(),
            }],
        );
        assert!(agent.handler("start").is_some());
        assert!(agent.handler("missing").is_none());
    }
}
