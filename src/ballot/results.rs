//! Projection of per-candidate tallies into ranked results.
//!
//! The projector performs no visibility gating; callers authorize the read
//! through the lifecycle gate first. A results read may race a concurrent
//! cast, which is acceptable because results are only exposed after the
//! election closes.

use crate::model::{
    api::results::{CandidateStanding, ElectionResults},
    common::ElectionId,
    db::candidate::Candidate,
};

use super::store::{BallotStore, StoreError};

pub struct ResultsProjector<S> {
    store: S,
}

impl<S: BallotStore> ResultsProjector<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetch the election's candidates and rank them.
    pub async fn project(&self, election: ElectionId) -> Result<ElectionResults, StoreError> {
        let candidates = self.store.candidates_of(election).await?;
        Ok(rank(candidates))
    }
}

/// Rank candidates by descending vote count.
///
/// The sort is stable and the input arrives in display-position order, so
/// equal tallies resolve deterministically by position.
pub fn rank(mut candidates: Vec<Candidate>) -> ElectionResults {
    let total_votes: u64 = candidates.iter().map(|c| c.vote_count).sum();
    candidates.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));

    let results = candidates
        .into_iter()
        .map(|candidate| {
            let vote_count = candidate.vote_count;
            CandidateStanding {
                id: candidate.id,
                name: candidate.candidate.name,
                party: candidate.candidate.party,
                vote_count,
                percentage: percentage(vote_count, total_votes),
            }
        })
        .collect();

    ElectionResults {
        results,
        total_votes,
    }
}

/// Share of the total vote, rounded to two decimal places.
/// Defined as zero when no votes have been cast.
fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
    }
}
