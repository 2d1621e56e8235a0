use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// Our election IDs are integers, allocated from the counter collection.
pub type ElectionId = u32;

/// The scope of an election, which decides the eligibility policy applied
/// to voters' region attributes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionKind {
    /// Open to every verified, eligible voter.
    General,
    /// Synonym for general in the eligibility policy.
    National,
    /// Restricted to voters whose state is in the allowed regions.
    State,
    /// Restricted by district and/or ward membership.
    Local,
}

impl Default for ElectionKind {
    fn default() -> Self {
        Self::General
    }
}

/// States in the election lifecycle.
///
/// Transitions are admin-driven only; the system never advances the status
/// on a schedule. Validity of casting and results visibility are evaluated
/// against the time window independently of the status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    /// Created and under construction; not yet open for ballots.
    Scheduled,
    /// Open for ballots (subject to the time window).
    Active,
    /// Closed by an admin.
    Completed,
    /// Abandoned; terminal.
    Cancelled,
}

impl ElectionStatus {
    /// Is the admin-driven transition from `self` to `next` allowed?
    pub fn may_become(self, next: Self) -> bool {
        use ElectionStatus::*;
        matches!(
            (self, next),
            (Scheduled, Active) | (Active, Completed) | (Scheduled, Cancelled) | (Active, Cancelled)
        )
    }
}

impl From<ElectionStatus> for Bson {
    fn from(status: ElectionStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        use ElectionStatus::*;
        assert!(Scheduled.may_become(Active));
        assert!(Scheduled.may_become(Cancelled));
        assert!(Active.may_become(Completed));
        assert!(Active.may_become(Cancelled));
    }

    #[test]
    fn illegal_transitions() {
        use ElectionStatus::*;
        assert!(!Scheduled.may_become(Completed));
        assert!(!Active.may_become(Scheduled));
        assert!(!Completed.may_become(Active));
        assert!(!Completed.may_become(Cancelled));
        assert!(!Cancelled.may_become(Active));
        assert!(!Cancelled.may_become(Scheduled));
        assert!(!Active.may_become(Active));
    }
}
