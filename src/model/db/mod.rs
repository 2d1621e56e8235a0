//! DB-compatible (de/serialisable) types.
//!
//! The types in this module are serialised in a store-friendly way:
//! IDs and datetimes use MongoDB's own formats.

pub mod audit;
pub use audit::{AuditAction, AuditEntry, NewAuditEntry};

pub mod candidate;
pub use candidate::{Candidate, CandidateCore, NewCandidate};

pub mod election;
pub use election::{Election, ElectionCore};

pub mod history;
pub use history::{HistoryEntry, HistoryEntryCore, NewHistoryEntry};

pub mod vote;
pub use vote::Vote;

pub mod voter;
pub use voter::{NewVoter, RegionAttributes, Voter, VoterCore};
