use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::ElectionId;

/// The idempotency record of a cast ballot.
///
/// The `_id` is the vote fingerprint: a one-way hash of (voter subject,
/// election ID). A second creation attempt for the same key fails at the
/// store, which is what makes casting exactly-once under races. This record
/// is the sole source of truth for "has this voter voted in this election"
/// and deliberately does not reference the chosen candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub fingerprint: String,
    pub election_id: ElectionId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
    /// Whether the voter was verified at cast time. Always true for votes
    /// created through the ledger; kept explicit for auditability.
    pub verified: bool,
}

impl Vote {
    pub fn new(fingerprint: String, election_id: ElectionId, cast_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint,
            election_id,
            cast_at,
            verified: true,
        }
    }
}
