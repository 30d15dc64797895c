// Agent Machine - Rust Edition
// A long-running HTTP service that hosts agents: named state machines whose
// transitions are actions. Clients start a process via an agent's initializer
// action; subsequent actions advance it through named states until a terminal
// state is reached. Every action execution is recorded as an immutable event.

//! # Agent Machine
//!
//! This is the library crate for the agent process controller: the subsystem
//! that derives a routed HTTP surface from each agent's declared actions,
//! validates input against per-action schemas, enforces the state-transition
//! contract, dispatches execution synchronously or asynchronously, persists an
//! append-only event log, and reconstructs process status by reducing it.
//!
//! ## Core Components
//!
//! - [`models`]: the domain types — `ProcessId`, `StateName`, `ActionName`,
//!   `ProcessEvent`, `HandlerDescriptor`, `AgentDescriptor`.
//! - [`schema`]: derives input schemas from a handler's declared parameters and
//!   validates request bodies against them.
//! - [`store`]: the abstract, pluggable event store (`EventStore` trait) plus
//!   an in-memory implementation and a NATS JetStream-backed one.
//! - [`registry`]: the `AgentRegistry`, built once at startup from declared
//!   agents and immutable afterward.
//! - [`engine`]: the process controller, execution runner, and status reducer
//!   — the part that actually guards transitions and runs handlers.
//! - [`api`]: builds the Axum router from the registry (the Route Builder).
//! - [`server`]: host bootstrap — configuration and the `axum::Server` runner.
//! - [`agents`]: a small set of example agents used by the integration tests
//!   and the demo binary.
//!
//! ## Rust Learning Notes:
//!
//! ### Module System
//! Rust organizes code into modules. Each `mod` declaration tells Rust to
//! include code from either a `.rs` file or a directory with a `mod.rs` file.
//!
//! ### Re-exports
//! `pub use` statements create shortcuts so callers don't need to know the
//! internal module structure.

pub mod models;

pub mod schema;

pub mod store;

pub mod registry;

pub mod engine;

pub mod api;

pub mod server;

pub mod agents;

// Re-export the core domain types for easy access.
pub use models::{
    ActionContext, ActionFn, ActionName, ActionOutcome, AgentDescriptor, HandlerDescriptor,
    InputParam, ParamKind, ProcessEvent, ProcessId, StateName,
};

pub use schema::{FieldError, ValidationError};

pub use store::{EventStore, InMemoryEventStore, ProcessEventStore};

pub use registry::{AgentRegistry, AgentRegistryBuilder, HandlerBuilder};

pub use engine::AgentMachine;

pub use api::{ApiConfig, RouteTable};

pub use server::{ServerBuilder, ServerConfig};

// Core error types
// Using the `thiserror` crate to make error handling easier.
use thiserror::Error;

/// Custom error types for Agent Machine operations.
///
/// ## Rust Learning Notes:
///
/// ### Error Handling in Rust
/// Rust doesn't have exceptions. Instead, it uses `Result<T, E>` types where
/// `Ok(value)` represents success and `Err(error)` represents failure.
///
/// ### The `thiserror` Crate
/// This crate provides macros to make error types easier to write:
/// - `#[derive(Error)]` implements `std::error::Error`
/// - `#[error("...")]` provides a human-readable message
/// - `#[from]` enables automatic conversion from other error types
#[derive(Error, Debug)]
pub enum AgentMachineError {
    /// No agent is registered under this name.
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// The agent has no action with this name.
    #[error("Action \"{action}\" not found on agent \"{agent}\"")]
    ActionNotFound { agent: String, action: String },

    /// Referenced process has no events.
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    /// The action cannot fire from the process's current state.
    #[error("Action \"{action}\" cannot process state \"{state}\"")]
    GuardViolation { action: String, state: String },

    /// Request body failed schema validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A handler deliberately signalled an HTTP-style error.
    #[error("Handler error {status}: {detail}")]
    Handler { status: u16, detail: String },

    /// Event store I/O failure.
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),

    /// JSON serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Startup-time failure deriving a schema or registering an agent.
    #[error("Invalid agent configuration: {0}")]
    InvalidConfiguration(String),

    /// Delivering the `callback-url` contract failed.
    #[error("Callback delivery failed: {0}")]
    Callback(String),
}

impl From<std::io::Error> for AgentMachineError {
    fn from(err: std::io::Error) -> Self {
        AgentMachineError::Store(err.into())
    }
}

/// Type alias for `Result`s that use [`AgentMachineError`].
pub type Result<T> = std::result::Result<T, AgentMachineError>;
