// The engine: process controller, execution runner, and status reducer —
// the part of the system that actually guards transitions, runs handlers,
// and reconstructs process status.

pub mod execution_runner;
pub mod process_controller;
pub mod status;

pub use execution_runner::ExecutionRunner;
pub use process_controller::{ExecuteRequest, ExecuteResponse, ExecutionMode, ProcessController};
pub use status::StatusView;

use std::sync::Arc;

use crate::registry::AgentRegistry;
use crate::store::{EventStore, ProcessEventStore};

/// The assembled runtime: an immutable agent registry plus the controller
/// that runs requests against it. This is what `src/api` and `src/server`
/// hold onto; everything else (the event store, the per-process locks) is
/// reachable only through it.
#[derive(Clone)]
pub struct AgentMachine {
    registry: Arc<AgentRegistry>,
    controller: Arc<ProcessController>,
}

impl AgentMachine {
    pub fn new(registry: AgentRegistry, store: Arc<dyn EventStore>) -> Self {
        let registry = Arc::new(registry);
        let process_store = ProcessEventStore::new(store);
        let controller = Arc::new(ProcessController::new(registry.clone(), process_store));
        AgentMachine { registry, controller }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn controller(&self) -> Arc<ProcessController> {
        self.controller.clone()
    }
}
