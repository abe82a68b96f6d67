use std::fmt::{Display, Formatter};

use serde_repr::{Deserialize_repr, Serialize_repr};

/// States in the election lifecycle.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ElectionPhase {
    /// Registration only; no ballots accepted yet.
    #[default]
    NotStarted = 0,
    /// Ballots are being accepted.
    Started = 1,
    /// Voting closed; results are available.
    Ended = 2,
}

impl ElectionPhase {
    /// Has voting ever been opened? Stays true once ended.
    pub fn is_started(self) -> bool {
        self != Self::NotStarted
    }

    pub fn is_ended(self) -> bool {
        self == Self::Ended
    }
}

impl Display for ElectionPhase {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::NotStarted => "not started",
                Self::Started => "started",
                Self::Ended => "ended",
            }
        )
    }
}
