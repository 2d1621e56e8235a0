use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::ElectionId,
    db::history::HistoryEntry,
    db::voter::{RegionAttributes, Voter},
    mongodb::Id,
};

/// A registration request: the caller's declared region attributes.
/// Identity (subject, email) comes from the verified credential, never
/// from the request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub constituency: Option<String>,
}

impl From<RegistrationRequest> for RegionAttributes {
    fn from(request: RegistrationRequest) -> Self {
        Self {
            state: request.state,
            district: request.district,
            ward: request.ward,
            constituency: request.constituency,
        }
    }
}

/// The externally-visible description of a voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterDescription {
    pub id: Id,
    pub email: String,
    pub is_verified: bool,
    pub is_eligible: bool,
    pub state: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
    pub constituency: Option<String>,
}

impl From<Voter> for VoterDescription {
    fn from(voter: Voter) -> Self {
        Self {
            id: voter.id,
            email: voter.voter.email,
            is_verified: voter.voter.is_verified,
            is_eligible: voter.voter.is_eligible,
            state: voter.voter.state,
            district: voter.voter.district,
            ward: voter.voter.ward,
            constituency: voter.voter.constituency,
        }
    }
}

/// An admin's verification decision for a voter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationUpdate {
    pub verified: bool,
    pub eligible: bool,
}

/// One entry of a voter's own voting history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntryDescription {
    pub election_id: ElectionId,
    pub election_title: String,
    pub cast_at: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoryEntryDescription {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            election_id: entry.entry.election_id,
            election_title: entry.entry.election_title,
            cast_at: entry.entry.cast_at,
        }
    }
}
