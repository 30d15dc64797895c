// Host bootstrap: the collaborator that owns process startup, config
// layering, and the actual HTTP listener. Everything under here is outside
// the core's contract (see spec §1) — swapping it for a different listener
// or config scheme should never touch `engine`, `registry`, or `api`.
//
// Grounded on `GraphQLServerBuilder`/`GraphQLServer` in the workflow engine
// this crate grew out of: a `with_x(mut self, ...) -> Self` builder that
// accumulates optional pieces (storage backend, registry) and a terminal
// `build_and_run` that binds the listener. Configuration layering (file +
// env, with CLI overriding both) follows the same `config`/`dotenv` pairing
// the workflow engine's binaries used.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{build_router, ApiConfig};
use crate::engine::AgentMachine;
use crate::registry::AgentRegistry;
use crate::store::{EventStore, InMemoryEventStore};

/// Host-level configuration: listener address plus the two bootstrap flags
/// the spec's CLI names (`--reload`, `--debug`) and the agent-descriptor
/// directory positional argument. Loading agent descriptors from that
/// directory (YAML resource loading) is an external collaborator per spec
/// §1; this crate accepts an already-built [`AgentRegistry`] instead, and
/// `agents_dir` is carried through only so it can be logged and handed to
/// whatever loader a deployment wires in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Reload the agent-descriptor directory on change. The core contract
    /// has no notion of "reload"; this is a host-bootstrap convenience a
    /// production deployment may wire up via a file watcher.
    pub reload: bool,
    /// Verbose logging: lowers the tracing filter to `debug` for this
    /// crate's own spans in addition to whatever `RUST_LOG` requests.
    pub debug: bool,
    pub agents_dir: Option<String>,
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            reload: false,
            debug: false,
            agents_dir: None,
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Layer `agent-machine.{toml,yaml,json}` (if present) under environment
    /// variables prefixed `AGENT_MACHINE__` (double underscore separates
    /// nesting, e.g. `AGENT_MACHINE__PORT=9000`), the same file-then-env
    /// layering the workflow engine's binaries built with the `config`
    /// crate. CLI flags are applied afterward by the caller, since `clap`
    /// values always take precedence over both.
    pub fn load() -> anyhow::Result<Self> {
        let layered = config::Config::builder()
            .add_source(config::File::with_name("agent-machine").required(false))
            .add_source(config::Environment::with_prefix("AGENT_MACHINE").separator("__"))
            .build()?;

        match layered.try_deserialize::<ServerConfig>() {
            Ok(config) => Ok(config),
            Err(_) => Ok(ServerConfig::default()),
        }
    }
}

fn default_store() -> Arc<dyn EventStore> {
    Arc::new(InMemoryEventStore::new())
}

/// Builds and runs the HTTP listener for an [`AgentRegistry`]. Consumes
/// itself on `build_and_run`, the same one-shot builder shape as
/// `GraphQLServerBuilder::build_and_run` in the workflow engine.
pub struct ServerBuilder {
    config: ServerConfig,
    registry: Option<AgentRegistry>,
    store: Arc<dyn EventStore>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        ServerBuilder {
            config: ServerConfig::default(),
            registry: None,
            store: default_store(),
        }
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn with_reload(mut self, reload: bool) -> Self {
        self.config.reload = reload;
        self
    }

    pub fn with_agents_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.agents_dir = Some(dir.into());
        self
    }

    pub fn with_registry(mut self, registry: AgentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Swap the in-memory event store for a NATS JetStream-backed one.
    pub async fn with_nats(mut self, nats_url: &str) -> anyhow::Result<Self> {
        let store = crate::store::nats::connect(crate::store::nats::NatsEventStoreConfig {
            nats_url: nats_url.to_string(),
            max_age_seconds: None,
        })
        .await?;
        self.store = store;
        Ok(self)
    }

    /// Assemble the [`AgentMachine`] and the router-facing [`ApiConfig`]
    /// without starting a listener. Exposed so tests and embedders can drive
    /// the router directly (see `crate::api::tests`).
    pub fn build(self) -> crate::Result<(AgentMachine, ApiConfig)> {
        let registry = self
            .registry
            .ok_or_else(|| crate::AgentMachineError::InvalidConfiguration("no agent registry configured".to_string()))?;
        let machine = AgentMachine::new(registry, self.store);
        let api_config = ApiConfig {
            host: self.config.host.clone(),
            port: self.config.port,
            cors_enabled: self.config.cors_enabled,
        };
        Ok((machine, api_config))
    }

    pub async fn build_and_run(self) -> anyhow::Result<()> {
        if self.config.debug {
            info!("debug logging requested; ensure RUST_LOG=debug is also set for full effect");
        }
        if self.config.reload {
            info!(dir = ?self.config.agents_dir, "reload requested; this host binary does not watch the agents directory for changes");
        }

        let (machine, api_config) = self.build()?;
        let addr = format!("{}:{}", api_config.host, api_config.port);
        let router = build_router(machine, &api_config);

        info!("agent machine listening on http://{}", addr);
        axum::Server::bind(&addr.parse()?)
            .serve(router.into_make_service())
            .await?;
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
