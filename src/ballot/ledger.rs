//! The vote ledger: owner of the invariant "at most one counted vote per
//! (voter, election)".
//!
//! All preconditions are evaluated before the atomic unit begins and are
//! cheap, side-effect-free, and specific. The unit itself only ever fails
//! wholesale; the ledger never retries internally, to avoid double side
//! effects.

use chrono::{DateTime, Utc};
use data_encoding::HEXLOWER;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::identity::{IdentityClaims, IdentityProvider, Provenance, Role};
use crate::model::{
    common::ElectionId,
    db::{
        audit::NewAuditEntry,
        candidate::Candidate,
        election::Election,
        history::NewHistoryEntry,
        vote::Vote,
        voter::Voter,
    },
};

use super::{
    eligibility,
    lifecycle::{self, CastBlocked},
    store::{BallotStore, CastFailure, CastUnit, StoreError},
};

/// Why a cast request was refused. Every refusal carries a stable, named
/// reason; "already voted", "not yet eligible" and "election closed" have
/// different remediation paths for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastRefusal {
    #[error(transparent)]
    Window(#[from] CastBlocked),
    #[error("voter has not been verified")]
    NotVerified,
    #[error("voter is not eligible for this election")]
    Ineligible,
    #[error("candidate does not stand in this election")]
    WrongElection,
    #[error("administrators cannot cast ballots")]
    AdminBarred,
    #[error("a ballot has already been cast in this election")]
    AlreadyVoted,
}

/// A cast attempt's failure: either a specific refusal, or a transient
/// store problem that the transport layer may retry.
#[derive(Debug, Error)]
pub enum CastError {
    #[error(transparent)]
    Refused(#[from] CastRefusal),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Proof of a successful cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastReceipt {
    pub cast_at: DateTime<Utc>,
}

/// The deterministic one-way key enforcing one vote per (voter, election):
/// the same voter casting again for the same election always maps to the
/// same fingerprint.
pub fn vote_fingerprint(subject: &str, election: ElectionId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject.as_bytes());
    hasher.update(b":");
    hasher.update(election.to_string().as_bytes());
    HEXLOWER.encode(&hasher.finalize())
}

/// The ledger itself, constructed per operation with its collaborators.
pub struct VoteLedger<'a, S> {
    store: S,
    identity: &'a dyn IdentityProvider,
}

impl<'a, S: BallotStore> VoteLedger<'a, S> {
    pub fn new(store: S, identity: &'a dyn IdentityProvider) -> Self {
        Self { store, identity }
    }

    /// Cast a ballot: run every precondition, then apply the atomic unit.
    pub async fn cast(
        &self,
        actor: &IdentityClaims,
        provenance: &Provenance,
        voter: &Voter,
        election: &Election,
        candidate: &Candidate,
        now: DateTime<Utc>,
    ) -> Result<CastReceipt, CastError> {
        lifecycle::validate_for_casting(election, now).map_err(CastRefusal::Window)?;
        if !voter.is_verified {
            return Err(CastRefusal::NotVerified.into());
        }
        if !eligibility::resolve(voter, election) {
            return Err(CastRefusal::Ineligible.into());
        }
        if candidate.election_id != election.id {
            return Err(CastRefusal::WrongElection.into());
        }
        self.admin_bar(actor).await?;

        let fingerprint = vote_fingerprint(&voter.subject, election.id);
        let unit = CastUnit {
            vote: Vote::new(fingerprint, election.id, now),
            candidate_id: candidate.id,
            history: NewHistoryEntry {
                voter_id: voter.id,
                election_id: election.id,
                election_title: election.title.clone(),
                cast_at: now,
            },
            audit: NewAuditEntry::vote_cast(
                actor.subject.clone(),
                election.id,
                now,
                provenance.client_addr.clone(),
                provenance.client_id.clone(),
            ),
        };

        match self.store.cast(unit).await {
            Ok(()) => Ok(CastReceipt { cast_at: now }),
            Err(CastFailure::Duplicate) => Err(CastRefusal::AlreadyVoted.into()),
            Err(CastFailure::Store(e)) => Err(CastError::Store(e)),
        }
    }

    /// Administrators are categorically barred from casting. The role is
    /// looked up fresh from the identity provider; if that lookup fails,
    /// casting proceeds (availability over strictness, see DESIGN.md).
    async fn admin_bar(&self, actor: &IdentityClaims) -> Result<(), CastError> {
        match self.identity.role_of(actor).await {
            Ok(Some(Role::Admin)) => Err(CastRefusal::AdminBarred.into()),
            Ok(None) => Ok(()),
            Err(e) => {
                warn!("Could not check administrator status ({e}); allowing cast to proceed");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ballot::memory::InMemoryStore;
    use crate::identity::IdentityError;
    use crate::model::db::election::Election;

    /// An identity provider with a scripted role lookup.
    struct StubIdentity {
        available: bool,
        role: Option<Role>,
    }

    impl StubIdentity {
        fn voter() -> Self {
            Self {
                available: true,
                role: None,
            }
        }

        fn admin() -> Self {
            Self {
                available: true,
                role: Some(Role::Admin),
            }
        }

        fn down() -> Self {
            Self {
                available: false,
                role: None,
            }
        }
    }

    #[rocket::async_trait]
    impl IdentityProvider for StubIdentity {
        async fn verify(&self, _credential: &str) -> Result<IdentityClaims, IdentityError> {
            unimplemented!("the ledger never verifies credentials")
        }

        async fn role_of(&self, _claims: &IdentityClaims) -> Result<Option<Role>, IdentityError> {
            if self.available {
                Ok(self.role)
            } else {
                Err(IdentityError::Unavailable("stubbed outage".to_string()))
            }
        }
    }

    fn seeded_store(election: &Election, candidates: &[Candidate]) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_election(election.clone());
        for candidate in candidates {
            store.insert_candidate(candidate.clone());
        }
        store
    }

    fn cast_args() -> (IdentityClaims, Provenance, Voter, Election, Candidate) {
        let election = Election::active_example();
        let candidate = Candidate::example(election.id, 1);
        (
            IdentityClaims::example_voter(),
            Provenance {
                client_addr: Some("203.0.113.7".to_string()),
                client_id: Some("web-client".to_string()),
            },
            Voter::example(),
            election,
            candidate,
        )
    }

    #[rocket::async_test]
    async fn cast_applies_all_writes() {
        let (actor, provenance, voter, election, candidate) = cast_args();
        let store = seeded_store(&election, &[candidate.clone()]);
        let identity = StubIdentity::voter();
        let ledger = VoteLedger::new(&store, &identity);
        let now = Utc::now();

        let receipt = ledger
            .cast(&actor, &provenance, &voter, &election, &candidate, now)
            .await
            .unwrap();
        assert_eq!(receipt.cast_at, now);

        // The idempotency record exists at the fingerprint key.
        let fingerprint = vote_fingerprint(&voter.subject, election.id);
        let vote = store.vote(&fingerprint).unwrap();
        assert_eq!(vote.election_id, election.id);
        assert!(vote.verified);

        // The tally and the informational counter each moved by one.
        assert_eq!(store.candidate(candidate.id).unwrap().vote_count, 1);
        assert_eq!(store.election(election.id).unwrap().total_votes, 1);

        // The history log gained one entry.
        let history = store.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].voter_id, voter.id);
        assert_eq!(history[0].election_title, election.title);

        // The audit entry names actor and provenance but not the candidate.
        let audit = store.audit_log();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].actor, actor.subject);
        assert_eq!(audit[0].election_id, Some(election.id));
        assert_eq!(audit[0].client_addr.as_deref(), Some("203.0.113.7"));
        let serialized = mongodb::bson::to_document(&audit[0]).unwrap().to_string();
        assert!(!serialized.contains(&candidate.name));
        assert!(!serialized.contains(&candidate.id.to_string()));
    }

    #[rocket::async_test]
    async fn second_cast_is_refused_and_counted_once() {
        let (actor, provenance, voter, election, candidate) = cast_args();
        let other = Candidate::example(election.id, 2);
        let store = seeded_store(&election, &[candidate.clone(), other.clone()]);
        let identity = StubIdentity::voter();
        let ledger = VoteLedger::new(&store, &identity);

        ledger
            .cast(&actor, &provenance, &voter, &election, &candidate, Utc::now())
            .await
            .unwrap();

        // Retrying with a different candidate still maps to the same
        // fingerprint and must be refused.
        let second = ledger
            .cast(&actor, &provenance, &voter, &election, &other, Utc::now())
            .await;
        assert!(matches!(
            second,
            Err(CastError::Refused(CastRefusal::AlreadyVoted))
        ));

        // The tally increased by exactly one overall.
        assert_eq!(store.candidate(candidate.id).unwrap().vote_count, 1);
        assert_eq!(store.candidate(other.id).unwrap().vote_count, 0);
        assert_eq!(store.election(election.id).unwrap().total_votes, 1);
        assert_eq!(store.history().len(), 1);
    }

    #[rocket::async_test]
    async fn unverified_voter_is_refused_without_side_effects() {
        let (actor, provenance, mut voter, election, candidate) = cast_args();
        voter.is_verified = false;
        let store = seeded_store(&election, &[candidate.clone()]);
        let identity = StubIdentity::voter();
        let ledger = VoteLedger::new(&store, &identity);

        let result = ledger
            .cast(&actor, &provenance, &voter, &election, &candidate, Utc::now())
            .await;
        assert!(matches!(
            result,
            Err(CastError::Refused(CastRefusal::NotVerified))
        ));
        assert_eq!(store.candidate(candidate.id).unwrap().vote_count, 0);
        assert!(store.audit_log().is_empty());
    }

    #[rocket::async_test]
    async fn ineligible_region_is_refused() {
        let (actor, provenance, voter, _, _) = cast_args();
        let mut election = Election::state_example(&["NY"]);
        election.status = crate::model::common::ElectionStatus::Active;
        let candidate = Candidate::example(election.id, 1);
        let store = seeded_store(&election, &[candidate.clone()]);
        let identity = StubIdentity::voter();
        let ledger = VoteLedger::new(&store, &identity);

        // Voter is from CA; the election only allows NY.
        let result = ledger
            .cast(&actor, &provenance, &voter, &election, &candidate, Utc::now())
            .await;
        assert!(matches!(
            result,
            Err(CastError::Refused(CastRefusal::Ineligible))
        ));
    }

    #[rocket::async_test]
    async fn closed_window_is_refused_before_anything_else() {
        let (actor, provenance, mut voter, _, _) = cast_args();
        let election = Election::expired_example();
        let candidate = Candidate::example(election.id, 1);
        let store = seeded_store(&election, &[candidate.clone()]);
        let identity = StubIdentity::voter();
        let ledger = VoteLedger::new(&store, &identity);

        // Even an unverified voter sees the window refusal first.
        voter.is_verified = false;
        let result = ledger
            .cast(&actor, &provenance, &voter, &election, &candidate, Utc::now())
            .await;
        assert!(matches!(
            result,
            Err(CastError::Refused(CastRefusal::Window(CastBlocked::Ended)))
        ));
    }

    #[rocket::async_test]
    async fn candidate_from_another_election_is_refused() {
        let (actor, provenance, voter, election, _) = cast_args();
        let foreign = Candidate::example(election.id + 1, 1);
        let store = seeded_store(&election, &[foreign.clone()]);
        let identity = StubIdentity::voter();
        let ledger = VoteLedger::new(&store, &identity);

        let result = ledger
            .cast(&actor, &provenance, &voter, &election, &foreign, Utc::now())
            .await;
        assert!(matches!(
            result,
            Err(CastError::Refused(CastRefusal::WrongElection))
        ));
    }

    #[rocket::async_test]
    async fn administrators_are_barred() {
        let (_, provenance, voter, election, candidate) = cast_args();
        let actor = IdentityClaims::example_admin();
        let store = seeded_store(&election, &[candidate.clone()]);
        let identity = StubIdentity::admin();
        let ledger = VoteLedger::new(&store, &identity);

        let result = ledger
            .cast(&actor, &provenance, &voter, &election, &candidate, Utc::now())
            .await;
        assert!(matches!(
            result,
            Err(CastError::Refused(CastRefusal::AdminBarred))
        ));
        assert_eq!(store.candidate(candidate.id).unwrap().vote_count, 0);
    }

    #[rocket::async_test]
    async fn admin_check_outage_fails_open() {
        let (actor, provenance, voter, election, candidate) = cast_args();
        let store = seeded_store(&election, &[candidate.clone()]);
        let identity = StubIdentity::down();
        let ledger = VoteLedger::new(&store, &identity);

        // The role lookup errors; the cast proceeds regardless.
        let result = ledger
            .cast(&actor, &provenance, &voter, &election, &candidate, Utc::now())
            .await;
        assert!(result.is_ok());
        assert_eq!(store.candidate(candidate.id).unwrap().vote_count, 1);
    }

    #[rocket::async_test]
    async fn tallies_match_vote_records() {
        let election = Election::active_example();
        let first = Candidate::example(election.id, 1);
        let second = Candidate::example(election.id, 2);
        let store = seeded_store(&election, &[first.clone(), second.clone()]);
        let identity = StubIdentity::voter();
        let ledger = VoteLedger::new(&store, &identity);
        let provenance = Provenance {
            client_addr: None,
            client_id: None,
        };

        let mut voters = Vec::new();
        for n in 0..3 {
            let mut voter = Voter::example();
            voter.id = crate::model::mongodb::Id::new();
            voter.subject = format!("subject-{n}");
            voters.push(voter);
        }

        let picks = [&first, &first, &second];
        for (voter, candidate) in voters.iter().zip(picks) {
            let mut actor = IdentityClaims::example_voter();
            actor.subject = voter.subject.clone();
            ledger
                .cast(&actor, &provenance, voter, &election, candidate, Utc::now())
                .await
                .unwrap();
        }

        // A repeat attempt by the first voter changes nothing.
        let mut actor = IdentityClaims::example_voter();
        actor.subject = voters[0].subject.clone();
        let retry = ledger
            .cast(&actor, &provenance, &voters[0], &election, &second, Utc::now())
            .await;
        assert!(matches!(
            retry,
            Err(CastError::Refused(CastRefusal::AlreadyVoted))
        ));

        // Sum of candidate tallies equals the number of vote records.
        let tally_sum = store.candidate(first.id).unwrap().vote_count
            + store.candidate(second.id).unwrap().vote_count;
        assert_eq!(tally_sum, 3);
        assert_eq!(store.votes_in(election.id), 3);
        assert_eq!(store.election(election.id).unwrap().total_votes, 3);
    }

    #[test]
    fn fingerprint_is_deterministic_and_distinct() {
        let a1 = vote_fingerprint("subject-a", 1);
        assert_eq!(a1, vote_fingerprint("subject-a", 1));
        assert_ne!(a1, vote_fingerprint("subject-a", 2));
        assert_ne!(a1, vote_fingerprint("subject-b", 1));
        // SHA-256 rendered as lowercase hex.
        assert_eq!(a1.len(), 64);
        assert!(a1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
