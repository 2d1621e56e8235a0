use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::{ElectionId, ElectionKind, ElectionStatus};

/// Core election data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionCore {
    /// Displayed title.
    pub title: String,
    /// Scope, deciding the eligibility policy.
    pub kind: ElectionKind,
    /// Lifecycle status; admin-driven, never advanced on a schedule.
    pub status: ElectionStatus,
    /// Start of the casting window.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// End of the casting window.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    /// Regions whose voters may participate (state/local elections).
    pub allowed_regions: HashSet<String>,
    /// Optional constituency restriction for state elections.
    pub constituency: Option<String>,
    /// Gate on non-admin results visibility; set by an admin only after
    /// the election has completed or its window has passed.
    pub results_approved: bool,
    /// Informational running total; authoritative counts live on candidates.
    pub total_votes: u64,
}

/// An election from the database, with its unique integer ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: ElectionId,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Election {
    /// Create a new election in the `scheduled` state.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ElectionId,
        title: String,
        kind: ElectionKind,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        allowed_regions: HashSet<String>,
        constituency: Option<String>,
    ) -> Self {
        Self {
            id,
            election: ElectionCore {
                title,
                kind,
                status: ElectionStatus::Scheduled,
                start_time,
                end_time,
                allowed_regions,
                constituency,
                results_approved: false,
                total_votes: 0,
            },
        }
    }
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use chrono::Duration;

    use super::*;

    impl Election {
        /// A national election currently inside its casting window.
        pub fn active_example() -> Self {
            let now = Utc::now();
            let mut election = Self::new(
                1,
                "General Election".to_string(),
                ElectionKind::National,
                now - Duration::hours(1),
                now + Duration::hours(1),
                HashSet::new(),
                None,
            );
            election.status = ElectionStatus::Active;
            election
        }

        /// A state election restricted to the given regions.
        pub fn state_example(regions: &[&str]) -> Self {
            let mut election = Self::active_example();
            election.id = 2;
            election.title = "State Ballot".to_string();
            election.kind = ElectionKind::State;
            election.allowed_regions = regions.iter().map(|r| r.to_string()).collect();
            election
        }

        /// A local election restricted to the given regions.
        pub fn local_example(regions: &[&str]) -> Self {
            let mut election = Self::state_example(regions);
            election.id = 3;
            election.title = "Local Ballot".to_string();
            election.kind = ElectionKind::Local;
            election
        }

        /// An election whose casting window has not opened yet.
        pub fn scheduled_example() -> Self {
            let now = Utc::now();
            Self::new(
                4,
                "Upcoming Election".to_string(),
                ElectionKind::National,
                now + Duration::days(1),
                now + Duration::days(2),
                HashSet::new(),
                None,
            )
        }

        /// A still-active election whose window has already passed.
        pub fn expired_example() -> Self {
            let now = Utc::now();
            let mut election = Self::active_example();
            election.id = 5;
            election.start_time = now - Duration::days(2);
            election.end_time = now - Duration::days(1);
            election
        }
    }
}
