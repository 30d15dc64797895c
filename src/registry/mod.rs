// The agent registry: built once at startup from declared agents, immutable
// afterward. Grounded on the workflow engine's builder-pattern construction
// (`with_x(mut self, ...) -> Self` chains finishing in `.build()`), adapted
// to validate the state-machine contract rather than assemble a GraphQL
// server.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::models::{
    ActionContext, ActionFn, ActionName, ActionOutcome, AgentDescriptor, HandlerDescriptor, InputParam,
    StateName,
};
use crate::models::ids::reserved;

/// Fluent builder for a single [`HandlerDescriptor`]. Grounded on
/// `TransitionDefinition::new`/`with_conditions` from the workflow engine:
/// a small chain of `with_x` calls finishing with the actual handler body.
pub struct HandlerBuilder {
    action: ActionName,
    allowed_predecessor_states: Vec<StateName>,
    params: Vec<InputParam>,
}

impl HandlerBuilder {
    pub fn new(action: impl Into<ActionName>) -> Self {
        HandlerBuilder {
            action: action.into(),
            allowed_predecessor_states: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Mark this action as runnable from the given states. Leaving this
    /// unset (the default) makes the action an initializer: it may only run
    /// against a brand-new process.
    pub fn from_states<S: Into<StateName>>(mut self, states: Vec<S>) -> Self {
        self.allowed_predecessor_states = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn param(mut self, param: InputParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(mut self, params: Vec<InputParam>) -> Self {
        self.params = params;
        self
    }

    /// Finish the builder, supplying the async closure that actually runs
    /// this action.
    pub fn build<F, Fut>(self, handler: F) -> HandlerDescriptor
    where
        F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<ActionOutcome>> + Send + 'static,
    {
        let boxed: ActionFn = Arc::new(move |ctx: ActionContext| {
            Box::pin(handler(ctx)) as Pin<Box<dyn Future<Output = crate::Result<ActionOutcome>> + Send>>
        });

        HandlerDescriptor {
            action: self.action,
            allowed_predecessor_states: self.allowed_predecessor_states,
            params: self.params,
            handler: boxed,
        }
    }
}

/// The fully-assembled set of agents the host exposes. Immutable once built;
/// shared across requests behind an `Arc`.
pub struct AgentRegistry {
    agents: HashMap<String, AgentDescriptor>,
}

impl AgentRegistry {
    pub fn get(&self, name: &str) -> Option<&AgentDescriptor> {
        self.agents.get(name)
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.values()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Builds an [`AgentRegistry`], validating the state-transition contract
/// before handing out anything callers can run requests against.
#[derive(Default)]
pub struct AgentRegistryBuilder {
    agents: Vec<AgentDescriptor>,
}

impl AgentRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent(mut self, agent: AgentDescriptor) -> Self {
        self.agents.push(agent);
        self
    }

    /// Validate and freeze the registry.
    ///
    /// Rejects:
    /// - two agents sharing a name
    /// - an agent with no initializer action (nothing could ever start a
    ///   process for it)
    /// - a handler whose declared predecessor states collide with a reserved
    ///   name (`processing` in particular can never be a real predecessor
    ///   state — it only ever exists transiently between request and
    ///   response)
    pub fn build(self) -> crate::Result<AgentRegistry> {
        let mut agents = HashMap::new();

        for agent in self.agents {
            if agents.contains_key(&agent.name) {
                return Err(crate::AgentMachineError::InvalidConfiguration(format!(
                    "duplicate agent name: {}",
                    agent.name
                )));
            }

            if agent.initializers().next().is_none() {
                return Err(crate::AgentMachineError::InvalidConfiguration(format!(
                    "agent \"{}\" declares no initializer action",
                    agent.name
                )));
            }

            for handler in &agent.handlers {
                for state in &handler.allowed_predecessor_states {
                    if is_reserved(state.as_str()) {
                        return Err(crate::AgentMachineError::InvalidConfiguration(format!(
                            "agent \"{}\" action \"{}\" declares reserved state \"{}\" as a predecessor",
                            agent.name,
                            handler.action.as_str(),
                            state.as_str()
                        )));
                    }
                }
            }

            agents.insert(agent.name.clone(), agent);
        }

        Ok(AgentRegistry { agents })
    }
}

fn is_reserved(state: &str) -> bool {
    // `http_error` is deliberately absent here: spec.md §4.8 calls it
    // "pseudo-terminal but retryable via another action if its predecessors
    // permit", so a handler may legally declare it as an allowed
    // predecessor state like any other.
    matches!(
        state,
        reserved::UNINITIALIZED | reserved::PROCESSING | reserved::TERMINATED | reserved::UNHANDLED_ERROR
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_agent() -> AgentDescriptor {
        AgentDescriptor::new(
            "demo",
            vec![HandlerBuilder::new("start")
                .build(|ctx| async move { Ok(ActionOutcome::new("idle", ctx.input)) })],
        )
    }

    #[test]
    fn builds_a_valid_registry() {
        let registry = AgentRegistryBuilder::new().agent(demo_agent()).build().unwrap();
        assert!(registry.get("demo").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn rejects_duplicate_agent_names() {
        let result = AgentRegistryBuilder::new()
            .agent(demo_agent())
            .agent(demo_agent())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_agent_with_no_initializer() {
        let agent = AgentDescriptor::new(
            "demo",
            vec![HandlerBuilder::new("advance")
                .from_states(vec!["idle"])
                .build(|ctx| async move { Ok(ActionOutcome::new("idle", ctx.input)) })],
        );
        let result = AgentRegistryBuilder::new().agent(agent).build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_reserved_predecessor_state() {
        let agent = AgentDescriptor::new(
            "demo",
            vec![
                HandlerBuilder::new("start")
                    .build(|ctx| async move { Ok(ActionOutcome::new("idle", ctx.input)) }),
                HandlerBuilder::new("advance")
                    .from_states(vec!["processing"])
                    .build(|ctx| async move { Ok(ActionOutcome::new("idle", ctx.input)) }),
            ],
        );
        let result = AgentRegistryBuilder::new().agent(agent).build();
        assert!(result.is_err());
    }
}
