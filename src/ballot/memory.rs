//! An in-memory [`BallotStore`] for unit tests.
//!
//! Applies each cast unit under a single lock, after checking every
//! precondition, so the all-or-nothing contract of the real store holds:
//! either every write of the unit happens or none does.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::model::{
    common::ElectionId,
    db::{
        audit::NewAuditEntry, candidate::Candidate, election::Election, history::NewHistoryEntry,
        vote::Vote,
    },
    mongodb::Id,
};

use super::store::{BallotStore, CastFailure, CastUnit, StoreError};

#[derive(Default)]
struct State {
    elections: HashMap<ElectionId, Election>,
    candidates: HashMap<Id, Candidate>,
    votes: HashMap<String, Vote>,
    history: Vec<NewHistoryEntry>,
    audit: Vec<NewAuditEntry>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_election(&self, election: Election) {
        self.state
            .lock()
            .unwrap()
            .elections
            .insert(election.id, election);
    }

    pub fn insert_candidate(&self, candidate: Candidate) {
        self.state
            .lock()
            .unwrap()
            .candidates
            .insert(candidate.id, candidate);
    }

    pub fn election(&self, id: ElectionId) -> Option<Election> {
        self.state.lock().unwrap().elections.get(&id).cloned()
    }

    pub fn candidate(&self, id: Id) -> Option<Candidate> {
        self.state.lock().unwrap().candidates.get(&id).cloned()
    }

    pub fn vote(&self, fingerprint: &str) -> Option<Vote> {
        self.state.lock().unwrap().votes.get(fingerprint).cloned()
    }

    /// Number of idempotency records held for an election.
    pub fn votes_in(&self, election: ElectionId) -> usize {
        self.state
            .lock()
            .unwrap()
            .votes
            .values()
            .filter(|vote| vote.election_id == election)
            .count()
    }

    pub fn history(&self) -> Vec<NewHistoryEntry> {
        self.state.lock().unwrap().history.clone()
    }

    pub fn audit_log(&self) -> Vec<NewAuditEntry> {
        self.state.lock().unwrap().audit.clone()
    }
}

#[rocket::async_trait]
impl BallotStore for InMemoryStore {
    async fn candidates_of(&self, election: ElectionId) -> Result<Vec<Candidate>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut candidates: Vec<Candidate> = state
            .candidates
            .values()
            .filter(|c| c.election_id == election)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.position.cmp(&b.position));
        Ok(candidates)
    }

    async fn cast(&self, unit: CastUnit) -> Result<(), CastFailure> {
        let mut state = self.state.lock().unwrap();

        // Check everything before mutating anything.
        if state.votes.contains_key(&unit.vote.fingerprint) {
            return Err(CastFailure::Duplicate);
        }
        if state
            .history
            .iter()
            .any(|h| h.voter_id == unit.history.voter_id && h.election_id == unit.history.election_id)
        {
            return Err(CastFailure::Duplicate);
        }
        if !state.candidates.contains_key(&unit.candidate_id) {
            return Err(StoreError::Conflict(format!(
                "candidate {} disappeared during cast",
                unit.candidate_id
            ))
            .into());
        }

        let candidate = state
            .candidates
            .get_mut(&unit.candidate_id)
            .expect("checked above");
        candidate.vote_count += 1;
        if let Some(election) = state.elections.get_mut(&unit.vote.election_id) {
            election.total_votes += 1;
        }
        state.votes.insert(unit.vote.fingerprint.clone(), unit.vote);
        state.history.push(unit.history);
        state.audit.push(unit.audit);
        Ok(())
    }
}
