//! The election state machine and tally engine.
//!
//! Every mutating operation validates all of its preconditions before touching
//! state, so a rejected operation leaves the [`Election`] exactly as it found it.
//! Ordering of operations is the caller's business (see [`crate::ledger`]); the
//! engine only requires that each operation sees the results of those before it.

use serde::Serialize;

use crate::error::ElectionError;
use crate::model::{ElectionPhase, Identity};

pub use registry::Registry;
pub use tally::tally;

mod access;
mod ballot;
mod lifecycle;
mod registry;
mod tally;

pub type Result<T> = std::result::Result<T, ElectionError>;

/// A single election: who runs it, who is registered, and how far along it is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    /// Fixed at construction.
    admin: Identity,
    registry: Registry,
    phase: ElectionPhase,
}

impl Election {
    /// Create an empty, not-yet-started election administered by `admin`.
    pub fn new(admin: Identity) -> Self {
        Self {
            admin,
            registry: Registry::default(),
            phase: ElectionPhase::NotStarted,
        }
    }

    pub fn admin(&self) -> Identity {
        self.admin
    }

    pub fn phase(&self) -> ElectionPhase {
        self.phase
    }

    /// Read-only view of every registered candidate and voter.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
