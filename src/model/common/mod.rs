pub mod election;

pub use election::{ElectionId, ElectionKind, ElectionStatus};
