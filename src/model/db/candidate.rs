use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{common::ElectionId, mongodb::Id};

/// Core candidate data, as stored in the database.
///
/// `vote_count` is the authoritative tally for this candidate and is only
/// ever mutated by the casting transaction's atomic increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    /// The election this candidate stands in.
    pub election_id: ElectionId,
    pub name: String,
    pub party: String,
    pub biography: String,
    /// Display ordering within the election; unique per election.
    pub position: u32,
    /// Authoritative running tally.
    pub vote_count: u64,
}

impl CandidateCore {
    /// Create a candidate with an empty tally.
    pub fn new(
        election_id: ElectionId,
        name: String,
        party: String,
        biography: String,
        position: u32,
    ) -> Self {
        Self {
            election_id,
            name,
            party,
            biography,
            position,
            vote_count: 0,
        }
    }
}

/// A candidate without an ID, ready for insertion.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use super::*;

    impl Candidate {
        pub fn example(election_id: ElectionId, position: u32) -> Self {
            Self {
                id: Id::new(),
                candidate: CandidateCore::new(
                    election_id,
                    format!("Candidate {position}"),
                    "Independent".to_string(),
                    String::new(),
                    position,
                ),
            }
        }
    }
}
