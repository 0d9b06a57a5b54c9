//! Peer review model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rating left by one user on another's profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub reviewer_id: String,
    pub reviewee_id: String,
    /// 1 to 5 inclusive
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
