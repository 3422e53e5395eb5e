//! Stateful entity host: register actions, value-based entities, and
//! event-sourced entities against service descriptors, then start the host
//! and dispatch commands to them.
//!
//! The host keeps entity state in process (an in-memory value store, event
//! journal, and snapshot store), activates instances on demand, and
//! passivates them again when an explicit idle sweep finds them past their
//! configured timeout.

pub mod action;
pub mod command;
pub mod config;
pub mod descriptor;
mod dispatch;
pub mod error;
pub mod event_sourced;
pub mod host;
pub mod metrics;
pub mod options;
mod registry;
pub mod state_store;
pub mod testing;
pub mod types;
pub mod value_entity;

/// Prelude module for convenient glob imports.
///
/// Re-exports everything needed to implement and register services.
/// Use `use statehost::prelude::*;`.
pub mod prelude {
    pub use crate::action::{Action, ActionContext};
    pub use crate::command::{ClientAction, CommandEnvelope, ForwardTarget, SideEffect};
    pub use crate::config::HostConfig;
    pub use crate::descriptor::{FileDescriptor, ServiceDescriptor};
    pub use crate::error::HostError;
    pub use crate::event_sourced::{EventSourcedContext, EventSourcedEntity};
    pub use crate::host::{EntityHost, RunningHost};
    pub use crate::options::{EntityOptions, PassivationStrategy};
    pub use crate::types::{EntityId, ServiceName};
    pub use crate::value_entity::{StateOperation, ValueCommandContext, ValueEntity};
}
