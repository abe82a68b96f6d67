use log::info;

use crate::error::ElectionError;
use crate::model::{ElectionPhase, Event, Identity};

use super::{Election, Result};

impl Election {
    /// Open voting, either for the first time or again after it has ended.
    /// Reopening keeps every ballot already cast; use [`Self::reset_election`]
    /// first to start a fresh round.
    pub fn start_voting(&mut self, caller: Identity) -> Result<Event> {
        self.require_admin(caller)?;
        let restart = match self.phase {
            ElectionPhase::NotStarted => false,
            ElectionPhase::Ended => true,
            ElectionPhase::Started => {
                return Err(ElectionError::InvalidTransition {
                    from: self.phase,
                    to: ElectionPhase::Started,
                })
            }
        };

        self.phase = ElectionPhase::Started;
        info!(
            "Voting {}",
            if restart { "restarted" } else { "started" }
        );
        Ok(Event::VotingStarted { restart })
    }

    /// Close voting, making results available.
    pub fn end_voting(&mut self, caller: Identity) -> Result<Event> {
        self.require_admin(caller)?;
        if self.phase != ElectionPhase::Started {
            return Err(ElectionError::InvalidTransition {
                from: self.phase,
                to: ElectionPhase::Ended,
            });
        }

        self.phase = ElectionPhase::Ended;
        info!(
            "Voting ended with {} ballot(s) cast",
            self.registry.ballots_cast()
        );
        Ok(Event::VotingEnded)
    }

    /// Discard every ballot of a finished election and return to `NotStarted`,
    /// keeping all registrations. Only valid once voting has ended.
    pub fn reset_election(&mut self, caller: Identity) -> Result<Event> {
        self.require_admin(caller)?;
        if self.phase != ElectionPhase::Ended {
            return Err(ElectionError::InvalidTransition {
                from: self.phase,
                to: ElectionPhase::NotStarted,
            });
        }

        let cleared_votes = self.registry.clear_votes();
        self.phase = ElectionPhase::NotStarted;
        info!("Election reset, {cleared_votes} ballot(s) cleared");
        Ok(Event::ElectionReset { cleared_votes })
    }

    /// Has voting ever been opened?
    pub fn is_started(&self) -> bool {
        self.phase.is_started()
    }

    pub fn is_ended(&self) -> bool {
        self.phase.is_ended()
    }
}
