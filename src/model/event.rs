use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::Identity;

/// Structured record of a successfully applied operation, carrying its inputs
/// so observers can react without re-reading state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    CandidateRegistered {
        candidate: Identity,
        name: String,
        party_name: String,
    },
    #[serde(rename_all = "camelCase")]
    VoterRegistered {
        voter: Identity,
        name: String,
        national_id: String,
        age: u32,
    },
    /// `restart` is set when voting reopens after having ended.
    VotingStarted { restart: bool },
    VotingEnded,
    /// `cleared_votes` is the number of ballots discarded by the reset.
    #[serde(rename_all = "camelCase")]
    ElectionReset { cleared_votes: u64 },
    VoteCast { voter: Identity, candidate: Identity },
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CandidateRegistered {
                candidate,
                name,
                party_name,
            } => write!(f, "candidate {candidate} registered ({name}, {party_name})"),
            Self::VoterRegistered { voter, name, .. } => {
                write!(f, "voter {voter} registered ({name})")
            }
            Self::VotingStarted { restart: false } => write!(f, "voting started"),
            Self::VotingStarted { restart: true } => write!(f, "voting restarted"),
            Self::VotingEnded => write!(f, "voting ended"),
            Self::ElectionReset { cleared_votes } => {
                write!(f, "election reset, {cleared_votes} ballot(s) cleared")
            }
            Self::VoteCast { voter, candidate } => {
                write!(f, "voter {voter} voted for {candidate}")
            }
        }
    }
}
