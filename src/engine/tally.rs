use crate::error::ElectionError;
use crate::model::{Candidate, ElectionPhase, ElectionResult};

use super::{Election, Result};

/// Compute the result over a snapshot of candidates in registration order.
pub fn tally(candidates: &[Candidate]) -> ElectionResult {
    let max_votes = candidates
        .iter()
        .map(|c| c.vote_count)
        .max()
        .unwrap_or(0);
    let mut leaders = candidates.iter().filter(|c| c.vote_count == max_votes);
    let winner = leaders.next().map(|c| c.id);
    let is_tie = leaders.next().is_some();

    ElectionResult {
        winner,
        max_votes,
        is_tie,
    }
}

impl Election {
    /// The winner, winning vote count and whether it is a tie. Recomputed on every call.
    pub fn get_election_results(&self) -> Result<ElectionResult> {
        if self.phase != ElectionPhase::Ended {
            return Err(ElectionError::VotingNotEnded { phase: self.phase });
        }
        Ok(tally(self.registry.candidates()))
    }

    /// Every candidate sharing the winning vote count, in registration order.
    pub fn get_tied_candidates(&self) -> Result<Vec<Candidate>> {
        let result = self.get_election_results()?;
        if !result.is_tie {
            return Err(ElectionError::NoTie);
        }
        Ok(self
            .registry
            .candidates()
            .iter()
            .filter(|c| c.vote_count == result.max_votes)
            .cloned()
            .collect())
    }
}
