use log::{debug, info};

use crate::error::ElectionError;
use crate::model::{ElectionPhase, Event, Identity};

use super::{Election, Result};

impl Election {
    /// Cast `voter`'s single ballot for `candidate`.
    ///
    /// Checks, in order: voting is open, the voter is registered, the voter has not
    /// already voted, the candidate is registered. Only once all of them pass are
    /// the voter's status and the candidate's count updated, together.
    pub fn vote(&mut self, voter: Identity, candidate: Identity) -> Result<Event> {
        if self.phase != ElectionPhase::Started {
            return Err(ElectionError::VotingNotActive { phase: self.phase });
        }
        let voter_pos = self
            .registry
            .voter_position(voter)
            .ok_or(ElectionError::UnknownVoter { voter })?;
        if self.registry.voters()[voter_pos].has_voted {
            debug!("Voter {voter} tried to vote twice");
            return Err(ElectionError::AlreadyVoted { voter });
        }
        let candidate_pos = self
            .registry
            .candidate_position(candidate)
            .ok_or(ElectionError::UnknownCandidate { candidate })?;

        self.registry.record_vote(voter_pos, candidate_pos);
        info!("Ballot cast by {voter}");
        Ok(Event::VoteCast { voter, candidate })
    }
}
