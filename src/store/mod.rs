// The event store: a pluggable, append-only log of `ProcessEvent`s.
//
// Grounded on the `WorkflowStorage` async_trait in the workflow engine this
// crate grew out of — same `#[async_trait]` + `Arc<dyn Trait>` shape, reduced
// to the two operations an event-sourced process log actually needs: append
// and scan-by-process.

pub mod memory;
pub mod nats;

pub use memory::InMemoryEventStore;
pub use nats::NatsEventStore;

use async_trait::async_trait;

use crate::models::{ProcessEvent, ProcessId};

/// Backing engine for the process event log. In-memory for tests and local
/// development; a NATS JetStream stream in production. Either way, the
/// contract is the same: events are appended, never mutated, and retrieved
/// per-process for the status reducer to fold over.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event. Must not silently drop or reorder events — the
    /// reducer's correctness depends on seeing the full history.
    async fn append(&self, event: ProcessEvent) -> anyhow::Result<()>;

    /// All events recorded for a process, in no particular order — callers
    /// reduce with [`crate::models::event::latest`] rather than relying on
    /// store ordering.
    async fn events_for_process(&self, process_id: &ProcessId) -> anyhow::Result<Vec<ProcessEvent>>;
}

/// A small convenience wrapper around `Arc<dyn EventStore>` used by the
/// engine, so call sites don't need to spell out `Arc<dyn EventStore>`
/// everywhere and so the "pick the latest event" reduction lives in one
/// place instead of being repeated at every caller.
#[derive(Clone)]
pub struct ProcessEventStore {
    inner: std::sync::Arc<dyn EventStore>,
}

impl ProcessEventStore {
    pub fn new(inner: std::sync::Arc<dyn EventStore>) -> Self {
        ProcessEventStore { inner }
    }

    pub async fn append(&self, event: ProcessEvent) -> anyhow::Result<()> {
        self.inner.append(event).await
    }

    pub async fn events_for_process(&self, process_id: &ProcessId) -> anyhow::Result<Vec<ProcessEvent>> {
        self.inner.events_for_process(process_id).await
    }

    /// The process's current state, derived by reducing its full history.
    /// `Ok(None)` means the process id has never had an event appended.
    pub async fn latest_event(&self, process_id: &ProcessId) -> anyhow::Result<Option<ProcessEvent>> {
        let events = self.events_for_process(process_id).await?;
        Ok(crate::models::event::latest(events.iter()).cloned())
    }
}
