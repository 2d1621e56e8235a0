//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way:
//! IDs as hex strings, datetimes as RFC 3339 timestamps. Validation of
//! request bodies happens here, at the boundary, not in the handlers.

pub mod candidate;
pub mod election;
pub mod results;
pub mod vote;
pub mod voter;
