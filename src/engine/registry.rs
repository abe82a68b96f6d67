use std::collections::HashMap;

use log::info;
use serde::Serialize;

use crate::error::ElectionError;
use crate::model::{Candidate, Event, Identity, Voter};

use super::{Election, Result};

/// Registered candidates and voters, each kept in registration order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Registry {
    candidates: Vec<Candidate>,
    voters: Vec<Voter>,
    /// Position of each candidate in `candidates`.
    #[serde(skip)]
    candidate_index: HashMap<Identity, usize>,
    /// Position of each voter in `voters`.
    #[serde(skip)]
    voter_index: HashMap<Identity, usize>,
}

impl Registry {
    pub fn candidate(&self, id: Identity) -> Option<&Candidate> {
        self.candidate_index.get(&id).map(|&i| &self.candidates[i])
    }

    pub fn voter(&self, id: Identity) -> Option<&Voter> {
        self.voter_index.get(&id).map(|&i| &self.voters[i])
    }

    /// All candidates, in registration order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// All voters, in registration order.
    pub fn voters(&self) -> &[Voter] {
        &self.voters
    }

    /// Number of voters who have cast a ballot this round.
    pub fn ballots_cast(&self) -> u64 {
        self.voters.iter().filter(|v| v.has_voted).count() as u64
    }

    /// Sum of every candidate's vote count. Always equal to [`Self::ballots_cast`].
    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.vote_count).sum()
    }

    pub(super) fn candidate_position(&self, id: Identity) -> Option<usize> {
        self.candidate_index.get(&id).copied()
    }

    pub(super) fn voter_position(&self, id: Identity) -> Option<usize> {
        self.voter_index.get(&id).copied()
    }

    /// Caller must have checked the identity is new.
    fn insert_candidate(&mut self, candidate: Candidate) {
        self.candidate_index
            .insert(candidate.id, self.candidates.len());
        self.candidates.push(candidate);
    }

    /// Caller must have checked the identity is new.
    fn insert_voter(&mut self, voter: Voter) {
        self.voter_index.insert(voter.id, self.voters.len());
        self.voters.push(voter);
    }

    /// Mark the voter as having voted and credit the candidate, as one step.
    /// Both positions must be valid and the voter must not have voted yet.
    pub(super) fn record_vote(&mut self, voter: usize, candidate: usize) {
        let candidate_id = self.candidates[candidate].id;
        let voter = &mut self.voters[voter];
        voter.has_voted = true;
        voter.voted_for = Some(candidate_id);
        self.candidates[candidate].vote_count += 1;
    }

    /// Forget every ballot while keeping all registrations. Returns how many
    /// ballots were discarded.
    pub(super) fn clear_votes(&mut self) -> u64 {
        let cleared = self.ballots_cast();
        for candidate in &mut self.candidates {
            candidate.vote_count = 0;
        }
        for voter in &mut self.voters {
            voter.has_voted = false;
            voter.voted_for = None;
        }
        cleared
    }
}

impl Election {
    /// Register a new candidate with zero votes. Admin only; allowed in any phase.
    pub fn register_candidate(
        &mut self,
        caller: Identity,
        candidate: Identity,
        name: String,
        party_name: String,
    ) -> Result<Event> {
        self.require_admin(caller)?;
        if self.registry.candidate_index.contains_key(&candidate) {
            return Err(ElectionError::DuplicateCandidate { candidate });
        }

        info!("Registering candidate {candidate} ({name}, {party_name})");
        self.registry.insert_candidate(Candidate::new(
            candidate,
            name.clone(),
            party_name.clone(),
        ));
        Ok(Event::CandidateRegistered {
            candidate,
            name,
            party_name,
        })
    }

    /// Register a new voter who has not yet voted. Admin only; allowed in any phase.
    pub fn register_voter(
        &mut self,
        caller: Identity,
        voter: Identity,
        name: String,
        national_id: String,
        age: i64,
    ) -> Result<Event> {
        self.require_admin(caller)?;
        if self.registry.voter_index.contains_key(&voter) {
            return Err(ElectionError::DuplicateVoter { voter });
        }
        let age = match u32::try_from(age) {
            Ok(age) if age > 0 => age,
            _ => return Err(ElectionError::InvalidAge { age }),
        };

        info!("Registering voter {voter} ({name})");
        self.registry.insert_voter(Voter::new(
            voter,
            name.clone(),
            national_id.clone(),
            age,
        ));
        Ok(Event::VoterRegistered {
            voter,
            name,
            national_id,
            age,
        })
    }

    pub fn get_candidate(&self, candidate: Identity) -> Option<&Candidate> {
        self.registry.candidate(candidate)
    }

    pub fn get_voter(&self, voter: Identity) -> Option<&Voter> {
        self.registry.voter(voter)
    }

    /// All candidates, in registration order.
    pub fn list_candidates(&self) -> &[Candidate] {
        self.registry.candidates()
    }

    /// All voters, in registration order.
    pub fn list_voters(&self) -> &[Voter] {
        self.registry.voters()
    }

    /// Credential check for logins that don't go through a wallet.
    pub fn verify_voter(&self, voter: Identity, national_id: &str) -> bool {
        self.registry
            .voter(voter)
            .map_or(false, |v| v.matches_credentials(national_id))
    }
}
