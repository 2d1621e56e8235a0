use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::ElectionId, mongodb::Id};

/// The kinds of recorded actions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    VoteCast,
    VoterVerified,
    ElectionCreated,
    ElectionModified,
    ElectionStatusChanged,
    ResultsApproved,
}

/// Core audit entry data. Append-only; never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntryCore {
    pub action: AuditAction,
    /// Subject identifier of the acting user.
    pub actor: String,
    pub election_id: Option<ElectionId>,
    /// Free-form identifier of a non-election target (e.g. a voter ID).
    pub target: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub at: DateTime<Utc>,
    pub details: String,
    /// Request provenance: caller network address and client identifier.
    pub client_addr: Option<String>,
    pub client_id: Option<String>,
}

impl AuditEntryCore {
    /// The entry recorded inside every casting transaction. Holds the actor,
    /// election and provenance but never the chosen candidate.
    pub fn vote_cast(
        actor: String,
        election_id: ElectionId,
        at: DateTime<Utc>,
        client_addr: Option<String>,
        client_id: Option<String>,
    ) -> Self {
        Self {
            action: AuditAction::VoteCast,
            actor,
            election_id: Some(election_id),
            target: None,
            at,
            details: "ballot cast".to_string(),
            client_addr,
            client_id,
        }
    }

    /// An entry for an administrative action.
    pub fn admin_action(
        action: AuditAction,
        actor: String,
        election_id: Option<ElectionId>,
        target: Option<String>,
        details: String,
    ) -> Self {
        Self {
            action,
            actor,
            election_id,
            target,
            at: Utc::now(),
            details,
            client_addr: None,
            client_id: None,
        }
    }
}

/// An audit entry without an ID, ready for insertion.
pub type NewAuditEntry = AuditEntryCore;

/// An audit entry from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub entry: AuditEntryCore,
}

impl Deref for AuditEntry {
    type Target = AuditEntryCore;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}
