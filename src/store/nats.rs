// NATS JetStream-backed event store, grounded on `nats_storage.rs` from the
// workflow engine this crate grew out of: one durable stream holding every
// event, keyed by a per-process subject so a single filtered consumer
// replays exactly one process's history.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

use crate::models::{ProcessEvent, ProcessId};
use crate::store::EventStore;

const STREAM_NAME: &str = "AGENT_MACHINE_EVENTS";
const SUBJECT_PREFIX: &str = "agent-machine.events";

/// Tuning knobs for the backing JetStream stream. Defaults mirror the
/// workflow engine's `NATSStorageConfig`: keep everything, bounded only by
/// time, since the event log is the durable source of truth.
#[derive(Debug, Clone)]
pub struct NatsEventStoreConfig {
    pub nats_url: String,
    pub max_age_seconds: Option<u64>,
}

impl Default for NatsEventStoreConfig {
    fn default() -> Self {
        NatsEventStoreConfig {
            nats_url: "nats://localhost:4222".to_string(),
            max_age_seconds: None,
        }
    }
}

pub struct NatsEventStore {
    jetstream: async_nats::jetstream::Context,
}

impl NatsEventStore {
    pub async fn connect(config: NatsEventStoreConfig) -> anyhow::Result<Self> {
        let client = async_nats::connect(&config.nats_url).await?;
        let jetstream = async_nats::jetstream::new(client);

        let mut stream_config = async_nats::jetstream::stream::Config {
            name: STREAM_NAME.to_string(),
            subjects: vec![format!("{}.*", SUBJECT_PREFIX)],
            retention: async_nats::jetstream::stream::RetentionPolicy::Limits,
            storage: async_nats::jetstream::stream::StorageType::File,
            discard: async_nats::jetstream::stream::DiscardPolicy::Old,
            ..Default::default()
        };
        if let Some(seconds) = config.max_age_seconds {
            stream_config.max_age = std::time::Duration::from_secs(seconds);
        }

        jetstream.get_or_create_stream(stream_config).await?;

        Ok(NatsEventStore { jetstream })
    }

    fn subject(process_id: &ProcessId) -> String {
        format!("{}.{}", SUBJECT_PREFIX, process_id.as_str())
    }
}

#[async_trait]
impl EventStore for NatsEventStore {
    async fn append(&self, event: ProcessEvent) -> anyhow::Result<()> {
        let subject = Self::subject(&event.process_id);
        let payload = serde_json::to_vec(&event)?;
        self.jetstream.publish(subject, payload.into()).await?.await?;
        Ok(())
    }

    async fn events_for_process(&self, process_id: &ProcessId) -> anyhow::Result<Vec<ProcessEvent>> {
        let stream = self.jetstream.get_stream(STREAM_NAME).await?;
        let subject = Self::subject(process_id);

        let consumer: async_nats::jetstream::consumer::PullConsumer = stream
            .create_consumer(async_nats::jetstream::consumer::pull::Config {
                filter_subject: subject,
                deliver_policy: async_nats::jetstream::consumer::DeliverPolicy::All,
                ack_policy: async_nats::jetstream::consumer::AckPolicy::None,
                ..Default::default()
            })
            .await?;

        let mut events = Vec::new();
        let mut messages = consumer.fetch().max_messages(10_000).messages().await?;
        while let Some(message) = messages.next().await {
            let message = message?;
            let event: ProcessEvent = serde_json::from_slice(&message.payload)?;
            events.push(event);
        }

        Ok(events)
    }
}

/// Convenience constructor used by the server bootstrap, so `src/bin/server.rs`
/// doesn't need to reach into `async_nats` directly.
pub async fn connect(config: NatsEventStoreConfig) -> anyhow::Result<Arc<dyn EventStore>> {
    Ok(Arc::new(NatsEventStore::connect(config).await?))
}
