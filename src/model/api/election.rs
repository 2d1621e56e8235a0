use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{ElectionId, ElectionKind, ElectionStatus},
    db::election::Election,
};

/// An election specification, as submitted by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    pub title: String,
    #[serde(default)]
    pub kind: ElectionKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub allowed_regions: HashSet<String>,
    #[serde(default)]
    pub constituency: Option<String>,
}

impl ElectionSpec {
    /// Check the spec for internal consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Election title must not be empty".to_string());
        }
        if self.start_time >= self.end_time {
            return Err("Election must end after it starts".to_string());
        }
        if matches!(self.kind, ElectionKind::State | ElectionKind::Local)
            && self.allowed_regions.is_empty()
        {
            return Err("State and local elections need at least one allowed region".to_string());
        }
        Ok(())
    }

    /// Convert this spec into an election with the given unique ID,
    /// in the `scheduled` state.
    pub fn into_election(self, id: ElectionId) -> Election {
        Election::new(
            id,
            self.title,
            self.kind,
            self.start_time,
            self.end_time,
            self.allowed_regions,
            self.constituency,
        )
    }
}

/// Top-level election metadata for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub id: ElectionId,
    pub title: String,
    pub kind: ElectionKind,
    pub status: ElectionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<Election> for ElectionSummary {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            title: election.election.title,
            kind: election.election.kind,
            status: election.election.status,
            start_time: election.election.start_time,
            end_time: election.election.end_time,
        }
    }
}

/// The full externally-visible description of an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDescription {
    pub id: ElectionId,
    pub title: String,
    pub kind: ElectionKind,
    pub status: ElectionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub allowed_regions: HashSet<String>,
    pub constituency: Option<String>,
    pub results_approved: bool,
    pub total_votes: u64,
}

impl From<Election> for ElectionDescription {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            title: election.election.title,
            kind: election.election.kind,
            status: election.election.status,
            start_time: election.election.start_time,
            end_time: election.election.end_time,
            allowed_regions: election.election.allowed_regions,
            constituency: election.election.constituency,
            results_approved: election.election.results_approved,
            total_votes: election.election.total_votes,
        }
    }
}

/// An admin-requested status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ElectionStatus,
}

/// An admin's results-approval decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use chrono::Duration;

    use super::*;

    impl ElectionSpec {
        pub fn example() -> Self {
            let start_time = Utc::now() + Duration::days(1);
            Self {
                title: "Example Election".to_string(),
                kind: ElectionKind::National,
                start_time,
                end_time: start_time + Duration::days(7),
                allowed_regions: HashSet::new(),
                constituency: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_spec_passes() {
        assert!(ElectionSpec::example().validate().is_ok());
    }

    #[test]
    fn empty_title_is_rejected() {
        let mut spec = ElectionSpec::example();
        spec.title = "  ".to_string();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut spec = ElectionSpec::example();
        spec.end_time = spec.start_time;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn regional_kinds_need_regions() {
        let mut spec = ElectionSpec::example();
        spec.kind = ElectionKind::State;
        assert!(spec.validate().is_err());
        spec.allowed_regions.insert("CA".to_string());
        assert!(spec.validate().is_ok());

        spec.kind = ElectionKind::Local;
        assert!(spec.validate().is_ok());
        spec.allowed_regions.clear();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn spec_becomes_scheduled_election() {
        let election = ElectionSpec::example().into_election(7);
        assert_eq!(election.id, 7);
        assert_eq!(election.status, ElectionStatus::Scheduled);
        assert!(!election.results_approved);
        assert_eq!(election.total_votes, 0);
    }
}
