// Core domain models for the agent machine.
// These are the generic, engine-agnostic data structures every other module
// builds on.

//! # Domain Models Module
//!
//! This module contains the core domain models: process identifiers, state
//! and action names, the append-only process event, and the declarative
//! handler/agent descriptors the registry is built from.
//!
//! ## Rust Learning Notes:
//!
//! ### Module Organization
//! This `mod.rs` file serves as the **module root** for the `models`
//! directory. Each `pub mod` declaration pulls in a sibling `.rs` file as a
//! submodule; the `pub use` statements below re-export the types callers
//! actually want so they can write `agent_machine::ProcessId` instead of
//! `agent_machine::models::ids::ProcessId`.

pub mod agent;
pub mod event;
pub mod handler;
pub mod ids;

pub use agent::AgentDescriptor;
pub use event::ProcessEvent;
pub use handler::{ActionContext, ActionFn, ActionOutcome, HandlerDescriptor, InputParam, ParamKind};
pub use ids::{ActionName, ProcessId, StateName};
