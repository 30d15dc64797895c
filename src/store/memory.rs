// In-memory event store: a `RwLock<HashMap<...>>`, same idiom as
// `InMemoryStorage` in the workflow engine this crate grew out of. Used by
// tests and by the demo binary when no NATS URL is configured.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{ProcessEvent, ProcessId};
use crate::store::EventStore;

#[derive(Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<String, Vec<ProcessEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: ProcessEvent) -> anyhow::Result<()> {
        let mut events = self
            .events
            .write()
            .map_err(|_| anyhow::anyhow!("event store lock poisoned"))?;
        events
            .entry(event.process_id.as_str().to_string())
            .or_insert_with(Vec::new)
            .push(event);
        Ok(())
    }

    async fn events_for_process(&self, process_id: &ProcessId) -> anyhow::Result<Vec<ProcessEvent>> {
        let events = self
            .events
            .read()
            .map_err(|_| anyhow::anyhow!("event store lock poisoned"))?;
        Ok(events.get(process_id.as_str()).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionName;

    #[tokio::test]
    async fn append_then_read_back() {
        let store = InMemoryEventStore::new();
        let pid = ProcessId::from("p1");
        let event = ProcessEvent::processing(pid.clone(), "demo", ActionName::from("start"));
        store.append(event).await.unwrap();

        let events = store.events_for_process(&pid).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn unknown_process_returns_empty() {
        let store = InMemoryEventStore::new();
        let events = store.events_for_process(&ProcessId::from("missing")).await.unwrap();
        assert!(events.is_empty());
    }
}
