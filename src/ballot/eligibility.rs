//! The eligibility policy: a pure function from (voter, election) to a
//! yes/no answer. No side effects, no suspension; callable any number of
//! times with identical results for identical inputs.

use crate::model::{
    common::ElectionKind,
    db::{election::ElectionCore, voter::VoterCore},
};

/// May this voter cast a ballot in this election?
///
/// Unverified or ineligible voters always fail, before any region policy
/// is consulted. The region policy then depends on the election kind.
pub fn resolve(voter: &VoterCore, election: &ElectionCore) -> bool {
    if !voter.is_verified || !voter.is_eligible {
        return false;
    }
    match election.kind {
        // Every verified, eligible voter may take part.
        ElectionKind::General | ElectionKind::National => true,
        ElectionKind::State => state_policy(voter, election),
        ElectionKind::Local => local_policy(voter, election),
    }
}

/// State elections: the voter's state must be one of the allowed regions,
/// and if the election names a constituency the voter's must match exactly.
fn state_policy(voter: &VoterCore, election: &ElectionCore) -> bool {
    let state = match non_empty(&voter.state) {
        Some(state) => state,
        None => return false,
    };
    if election.allowed_regions.is_empty() || !election.allowed_regions.contains(state) {
        return false;
    }
    match &election.constituency {
        Some(constituency) => voter.constituency.as_deref() == Some(constituency.as_str()),
        None => true,
    }
}

/// Local elections accept three region-naming granularities: the allowed
/// regions may list districts, wards, or composite "district-ward" names.
fn local_policy(voter: &VoterCore, election: &ElectionCore) -> bool {
    let (district, ward) = match (non_empty(&voter.district), non_empty(&voter.ward)) {
        (Some(district), Some(ward)) => (district, ward),
        _ => return false,
    };
    if election.allowed_regions.is_empty() {
        return false;
    }
    election.allowed_regions.contains(district)
        || election.allowed_regions.contains(ward)
        || election
            .allowed_regions
            .contains(&format!("{district}-{ward}"))
}

fn non_empty(attr: &Option<String>) -> Option<&str> {
    attr.as_deref().filter(|s| !s.is_empty())
}
