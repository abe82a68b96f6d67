use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ElectionPhase, Identity, IdentityParseError};

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons an election operation is rejected. A rejected operation has no effect at all.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "camelCase")]
pub enum ElectionError {
    #[error("Unauthorized: {caller} is not the election admin")]
    Unauthorized { caller: Identity },
    #[error("Candidate {candidate} is already registered")]
    DuplicateCandidate { candidate: Identity },
    #[error("Voter {voter} is already registered")]
    DuplicateVoter { voter: Identity },
    #[error("Invalid voter age {age}")]
    InvalidAge { age: i64 },
    #[error("Cannot move election from {from} to {to}")]
    InvalidTransition {
        from: ElectionPhase,
        to: ElectionPhase,
    },
    #[error("Voting is not active (election is {phase})")]
    VotingNotActive { phase: ElectionPhase },
    #[error("Voter {voter} is not registered")]
    UnknownVoter { voter: Identity },
    #[error("Candidate {candidate} is not registered")]
    UnknownCandidate { candidate: Identity },
    #[error("Voter {voter} has already voted")]
    AlreadyVoted { voter: Identity },
    #[error("Voting has not ended (election is {phase})")]
    VotingNotEnded { phase: ElectionPhase },
    #[error("The election is not tied")]
    NoTie,
}

/// Ways a journal can fail verification while being loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    #[error("missing journal header")]
    MissingHeader,
    #[error("unsupported journal version {0}")]
    Version(u32),
    #[error("journal is administered by {found}, expected {expected}")]
    AdminMismatch { expected: Identity, found: Identity },
    #[error("expected sequence number {expected}, found {found}")]
    Sequence { expected: u64, found: u64 },
    #[error("hash chain broken at sequence number {seq}")]
    BrokenChain { seq: u64 },
    #[error("replaying sequence number {seq} produced a different outcome")]
    OutcomeMismatch { seq: u64 },
}

/// Errors from anything outside the pure engine: persistence, configuration, parsing.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Election(#[from] ElectionError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Bad configuration: {0}")]
    Config(#[from] figment::Error),
    #[error(transparent)]
    IdentityParse(#[from] IdentityParseError),
    #[error("Journal verification failed: {0}")]
    Journal(#[from] JournalError),
    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}
