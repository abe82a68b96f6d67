use serde::{Deserialize, Serialize};

use super::Identity;

/// A registered contestant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Identity,
    pub name: String,
    pub party_name: String,
    /// Ballots cast for this candidate in the current round.
    pub vote_count: u64,
}

impl Candidate {
    /// Create a candidate with no votes.
    pub fn new(id: Identity, name: String, party_name: String) -> Self {
        Self {
            id,
            name,
            party_name,
            vote_count: 0,
        }
    }
}
