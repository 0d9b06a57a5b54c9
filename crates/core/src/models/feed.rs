//! Feed request models
//!
//! Feed requests cover both flavours of outreach: asking to join a
//! project, and asking a person to collaborate. Both land in one table
//! distinguished by `kind`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedRequestKind {
    Project,
    Person,
}

impl FeedRequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedRequestKind::Project => "project",
            FeedRequestKind::Person => "person",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "project" => Some(FeedRequestKind::Project),
            "person" => Some(FeedRequestKind::Person),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl FeedRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedRequestStatus::Pending => "pending",
            FeedRequestStatus::Approved => "approved",
            FeedRequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(FeedRequestStatus::Pending),
            "approved" => Some(FeedRequestStatus::Approved),
            "rejected" => Some(FeedRequestStatus::Rejected),
            _ => None,
        }
    }
}

/// A pending or resolved outreach request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedRequest {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub kind: FeedRequestKind,
    /// Set when kind is `project`
    pub project_id: Option<i64>,
    pub message: Option<String>,
    pub status: FeedRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new feed request
#[derive(Debug, Clone)]
pub struct NewFeedRequest {
    pub sender_id: String,
    pub receiver_id: String,
    pub kind: FeedRequestKind,
    pub project_id: Option<i64>,
    pub message: Option<String>,
}
