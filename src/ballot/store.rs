//! The transactional store abstraction behind the ballot engine.
//!
//! All exclusivity guarantees come from the backing store: the cast unit is
//! applied all-or-nothing, and a duplicate vote fingerprint fails the whole
//! unit. Components receive their store at construction, so tests can
//! substitute the in-memory implementation.

use mongodb::{
    bson::doc,
    error::{Error as DbError, ErrorKind, WriteFailure},
    Client, ClientSession, Database,
};
use thiserror::Error;

use crate::model::{
    common::ElectionId,
    db::{
        audit::NewAuditEntry, candidate::Candidate, election::Election, history::NewHistoryEntry,
        vote::Vote,
    },
    mongodb::{u32_id_filter, Coll, Id, PlannedQuery},
};

/// A store-level failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    /// The store's state changed under the operation (e.g. a referenced
    /// document disappeared mid-transaction). Retryable.
    #[error("store conflict: {0}")]
    Conflict(String),
}

/// Why a cast unit was not applied.
#[derive(Debug, Error)]
pub enum CastFailure {
    /// The vote fingerprint (or history key) already exists: this voter has
    /// already voted in this election.
    #[error("a ballot has already been cast for this voter and election")]
    Duplicate,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The writes of one ballot cast, applied as a single all-or-nothing unit:
/// the idempotency record, the candidate tally increment, the election's
/// informational counter, the history append, and the audit append.
#[derive(Debug, Clone)]
pub struct CastUnit {
    pub vote: Vote,
    pub candidate_id: Id,
    pub history: NewHistoryEntry,
    pub audit: NewAuditEntry,
}

/// Storage operations the ballot engine needs.
#[rocket::async_trait]
pub trait BallotStore: Send + Sync {
    /// All candidates of an election, ordered by display position.
    async fn candidates_of(&self, election: ElectionId) -> Result<Vec<Candidate>, StoreError>;

    /// Apply a cast unit atomically. No partial state may ever be
    /// observable; a pre-existing fingerprint fails with
    /// [`CastFailure::Duplicate`]. The store does not retry.
    async fn cast(&self, unit: CastUnit) -> Result<(), CastFailure>;
}

#[rocket::async_trait]
impl<T: BallotStore> BallotStore for &T {
    async fn candidates_of(&self, election: ElectionId) -> Result<Vec<Candidate>, StoreError> {
        (**self).candidates_of(election).await
    }

    async fn cast(&self, unit: CastUnit) -> Result<(), CastFailure> {
        (**self).cast(unit).await
    }
}

/// Does this error mean a unique key was violated?
pub fn is_duplicate_key(err: &DbError) -> bool {
    const DUPLICATE_KEY: i32 = 11000;
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY,
        ErrorKind::BulkWrite(bulk) => bulk
            .write_errors
            .as_ref()
            .map_or(false, |errors| errors.iter().any(|e| e.code == DUPLICATE_KEY)),
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// The MongoDB-backed store used in production.
pub struct MongoBallotStore {
    client: Client,
    db: Database,
}

impl MongoBallotStore {
    pub fn new(client: Client, db: Database) -> Self {
        Self { client, db }
    }

    /// The writes of the cast unit, in order, against one session.
    async fn apply(&self, unit: &CastUnit, session: &mut ClientSession) -> Result<(), CastFailure> {
        // The idempotency record first: its `_id` is the fingerprint, so a
        // duplicate creation attempt fails here and aborts everything.
        let votes = Coll::<Vote>::from_db(&self.db);
        if let Err(e) = votes
            .insert_one_with_session(&unit.vote, None, session)
            .await
        {
            return Err(if is_duplicate_key(&e) {
                CastFailure::Duplicate
            } else {
                StoreError::Db(e).into()
            });
        }

        // The authoritative tally.
        let candidates = Coll::<Candidate>::from_db(&self.db);
        let updated = candidates
            .update_one_with_session(
                unit.candidate_id.as_doc(),
                doc! { "$inc": { "vote_count": 1_i64 } },
                None,
                session,
            )
            .await
            .map_err(StoreError::Db)?;
        if updated.matched_count != 1 {
            return Err(StoreError::Conflict(format!(
                "candidate {} disappeared during cast",
                unit.candidate_id
            ))
            .into());
        }

        // The election's informational counter.
        let elections = Coll::<Election>::from_db(&self.db);
        elections
            .update_one_with_session(
                u32_id_filter(unit.vote.election_id),
                doc! { "$inc": { "total_votes": 1_i64 } },
                None,
                session,
            )
            .await
            .map_err(StoreError::Db)?;

        // The voter's append-only history. Its unique (voter, election)
        // index is a second line of defence against double casting.
        let history = Coll::<NewHistoryEntry>::from_db(&self.db);
        if let Err(e) = history
            .insert_one_with_session(&unit.history, None, session)
            .await
        {
            return Err(if is_duplicate_key(&e) {
                CastFailure::Duplicate
            } else {
                StoreError::Db(e).into()
            });
        }

        // The audit trail.
        let audit = Coll::<NewAuditEntry>::from_db(&self.db);
        audit
            .insert_one_with_session(&unit.audit, None, session)
            .await
            .map_err(StoreError::Db)?;

        Ok(())
    }
}

#[rocket::async_trait]
impl BallotStore for MongoBallotStore {
    async fn candidates_of(&self, election: ElectionId) -> Result<Vec<Candidate>, StoreError> {
        let coll = Coll::<Candidate>::from_db(&self.db);
        let query = PlannedQuery::new(
            "candidates by election",
            doc! { "election_id": election },
            doc! {},
            move |candidate: &Candidate| candidate.election_id == election,
        )
        .sorted(doc! { "position": 1 }, |a, b| a.position.cmp(&b.position));
        query.run(&coll).await.map_err(StoreError::Db)
    }

    async fn cast(&self, unit: CastUnit) -> Result<(), CastFailure> {
        let mut session = self
            .client
            .start_session(None)
            .await
            .map_err(StoreError::Db)?;
        session
            .start_transaction(None)
            .await
            .map_err(StoreError::Db)?;

        match self.apply(&unit, &mut session).await {
            Ok(()) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(StoreError::Db)?;
                Ok(())
            }
            Err(failure) => {
                // Nothing becomes visible; the caller decides about retries.
                let _ = session.abort_transaction().await;
                Err(failure)
            }
        }
    }
}
