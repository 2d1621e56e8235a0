use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// One candidate's standing in the projected results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateStanding {
    pub id: Id,
    pub name: String,
    pub party: String,
    pub vote_count: u64,
    /// Share of the total vote, rounded to two decimal places;
    /// zero when no votes have been cast.
    pub percentage: f64,
}

/// Ranked results for one election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionResults {
    /// Candidates ordered by descending vote count.
    pub results: Vec<CandidateStanding>,
    pub total_votes: u64,
}
