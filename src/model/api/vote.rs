use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A request to cast a ballot for a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastRequest {
    pub candidate_id: Id,
}

/// A successful cast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastResponse {
    pub cast_at: DateTime<Utc>,
}
