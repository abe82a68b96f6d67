use serde::{Deserialize, Serialize};

use super::Identity;

/// Outcome of a finished election. Derived from the registry on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResult {
    /// First candidate, in registration order, to reach `max_votes`.
    /// `None` only when no candidates are registered.
    pub winner: Option<Identity>,
    pub max_votes: u64,
    /// At least two candidates share `max_votes`.
    pub is_tie: bool,
}
