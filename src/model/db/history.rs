use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::ElectionId, mongodb::Id};

/// One entry in a voter's append-only voting history.
///
/// Kept in its own collection rather than as an array on the voter record,
/// so the voter document stays bounded and casting never contends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntryCore {
    pub voter_id: Id,
    pub election_id: ElectionId,
    pub election_title: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

/// A history entry without an ID, ready for insertion.
pub type NewHistoryEntry = HistoryEntryCore;

/// A history entry from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub entry: HistoryEntryCore,
}

impl Deref for HistoryEntry {
    type Target = HistoryEntryCore;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}
