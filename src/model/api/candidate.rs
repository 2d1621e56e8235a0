use serde::{Deserialize, Serialize};

use crate::model::{
    common::ElectionId,
    db::candidate::{Candidate, NewCandidate},
    mongodb::Id,
};

/// A candidate specification, as submitted by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    #[serde(default)]
    pub party: String,
    #[serde(default)]
    pub biography: String,
    pub position: u32,
}

impl CandidateSpec {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Candidate name must not be empty".to_string());
        }
        Ok(())
    }

    /// Convert this spec into a candidate for the given election.
    pub fn into_candidate(self, election_id: ElectionId) -> NewCandidate {
        NewCandidate::new(
            election_id,
            self.name,
            self.party,
            self.biography,
            self.position,
        )
    }
}

/// The externally-visible description of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: Id,
    pub election_id: ElectionId,
    pub name: String,
    pub party: String,
    pub biography: String,
    pub position: u32,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            election_id: candidate.candidate.election_id,
            name: candidate.candidate.name,
            party: candidate.candidate.party,
            biography: candidate.candidate.biography,
            position: candidate.candidate.position,
        }
    }
}
