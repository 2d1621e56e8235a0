use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core voter data, as stored in the database.
///
/// Voters are created on registration as unverified and ineligible; only
/// the administrative verification action flips the flags. Their voting
/// history lives in a separate append-only collection, not on this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Stable subject identifier from the identity provider.
    pub subject: String,
    /// Contact email from the identity provider.
    pub email: String,
    /// Has an administrator verified this voter's identity?
    pub is_verified: bool,
    /// Has an administrator marked this voter as eligible to vote at all?
    pub is_eligible: bool,
    /// Region attributes used by the eligibility policy.
    pub state: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
    pub constituency: Option<String>,
}

impl VoterCore {
    /// Create a new voter in the initial (unverified, ineligible) state.
    pub fn new(subject: String, email: String, regions: RegionAttributes) -> Self {
        Self {
            subject,
            email,
            is_verified: false,
            is_eligible: false,
            state: regions.state,
            district: regions.district,
            ward: regions.ward,
            constituency: regions.constituency,
        }
    }
}

/// The region attributes a voter declares at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionAttributes {
    pub state: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
    pub constituency: Option<String>,
}

/// A voter without an ID, ready for insertion.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use super::*;

    impl VoterCore {
        pub fn example() -> Self {
            Self {
                subject: "subject-1234".to_string(),
                email: "voter@example.com".to_string(),
                is_verified: true,
                is_eligible: true,
                state: Some("CA".to_string()),
                district: Some("D1".to_string()),
                ward: Some("W1".to_string()),
                constituency: None,
            }
        }
    }

    impl Voter {
        pub fn example() -> Self {
            Self {
                id: Id::new(),
                voter: VoterCore::example(),
            }
        }
    }
}
