//! TCK model services.
//!
//! Each model service interprets a scripted `Request`: the caller lists the
//! actions the service should take, and the conformance suite checks that
//! the host carries them out. The request shape is shared; the value-based
//! and event-sourced variants add their own state actions.

pub mod action;
pub mod eventsourced;
pub mod passivation;
pub mod valueentity;

use serde::{Deserialize, Serialize};

/// Reply payload of every model service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub message: String,
}

impl Response {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
