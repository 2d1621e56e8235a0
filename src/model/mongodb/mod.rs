mod bson;
mod collection;
mod counter;
mod planner;

pub use bson::{u32_id_filter, Id};
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use counter::{ensure_election_id_counter_exists, Counter, ELECTION_ID_COUNTER_ID};
pub use planner::{filter_sort_in_memory, PlannedQuery};
