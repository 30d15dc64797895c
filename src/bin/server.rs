// Agent Machine - server bootstrap.
//
// Run with: cargo run --bin agent-machine-server -- [OPTIONS] [AGENTS_DIR]
//
// Loading agent descriptors from a directory of YAML resources is an
// external collaborator this crate does not implement (see spec §1); this
// binary boots the built-in demo registry (`agent_machine::agents`) and
// only uses `agents_dir` to log where a real deployment would point its
// loader.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use agent_machine::agents::demo_registry;
use agent_machine::server::{ServerBuilder, ServerConfig};

/// CLI surface from spec §6: a port override, a dev-reload flag, a debug
/// flag, and the agent-descriptor directory.
#[derive(Parser, Debug)]
#[command(name = "agent-machine-server", version, about = "Hosts agent process controllers over HTTP")]
struct Cli {
    /// HTTP listen port. Overrides config file / env when set.
    #[arg(long)]
    port: Option<u16>,

    /// Re-read the agent-descriptor directory on change.
    #[arg(long, default_value_t = false)]
    reload: bool,

    /// Verbose logging.
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// NATS URL to back the event store. Falls back to an in-memory store
    /// when unset — fine for development, not for a multi-instance deploy.
    #[arg(long, env = "NATS_URL")]
    nats_url: Option<String>,

    /// Directory of agent-descriptor documents.
    agents_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv::dotenv().is_err() {
        eprintln!("no .env file found; reading configuration from the environment directly");
    }

    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let mut config = ServerConfig::load().unwrap_or_default();
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.reload = cli.reload || config.reload;
    config.debug = cli.debug || config.debug;
    if let Some(dir) = &cli.agents_dir {
        config.agents_dir = Some(dir.display().to_string());
    }

    info!(host = %config.host, port = config.port, "starting agent machine");
    if let Some(dir) = &config.agents_dir {
        warn!(dir, "agent-descriptor directory loading is not implemented; using the built-in demo registry");
    }

    let registry = demo_registry()?;
    let mut builder = ServerBuilder::new().with_config(config.clone()).with_registry(registry);

    if let Some(nats_url) = cli.nats_url {
        info!(nats_url, "connecting to NATS JetStream for the event store");
        builder = builder.with_nats(&nats_url).await?;
    }

    builder.build_and_run().await
}
