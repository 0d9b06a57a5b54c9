//! Follow graph model
//!
//! Follows are directional edges with an approval step. The canonical
//! record is the (follower, followed) pair; follower/following lists
//! are derived by querying the edge table from either side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    Pending,
    Accepted,
}

impl FollowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowStatus::Pending => "pending",
            FollowStatus::Accepted => "accepted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(FollowStatus::Pending),
            "accepted" => Some(FollowStatus::Accepted),
            _ => None,
        }
    }
}

/// A directional follow edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub id: i64,
    pub follower_id: String,
    pub followed_id: String,
    pub status: FollowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry in a follower/following listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEntry {
    pub clerk_id: String,
    pub name: String,
    pub since: DateTime<Utc>,
}
