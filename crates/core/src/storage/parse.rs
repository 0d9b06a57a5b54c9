//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use chrono::{DateTime, Utc};
use rusqlite::Error as SqlError;
use serde::de::DeserializeOwned;

use crate::models::{
    FeedRequestKind, FeedRequestStatus, FollowStatus, HackathonMode, HackathonStatus,
    ProjectStatus, Role,
};

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            SqlError::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Parse a JSON column into a typed value
pub fn parse_json<T: DeserializeOwned>(s: &str) -> Result<T, SqlError> {
    serde_json::from_str(s).map_err(|e| {
        SqlError::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Convert a stored role string to Role
pub fn role_from_str(s: &str) -> Role {
    Role::from_str(s).unwrap_or(Role::Participant)
}

/// Convert a stored status string to HackathonStatus
pub fn hackathon_status_from_str(s: &str) -> HackathonStatus {
    HackathonStatus::from_str(s).unwrap_or(HackathonStatus::Pending)
}

/// Convert a stored mode string to HackathonMode
pub fn hackathon_mode_from_str(s: &str) -> HackathonMode {
    HackathonMode::from_str(s).unwrap_or(HackathonMode::Online)
}

/// Convert a stored status string to ProjectStatus
pub fn project_status_from_str(s: &str) -> ProjectStatus {
    ProjectStatus::from_str(s).unwrap_or(ProjectStatus::Open)
}

/// Convert a stored status string to FollowStatus
pub fn follow_status_from_str(s: &str) -> FollowStatus {
    FollowStatus::from_str(s).unwrap_or(FollowStatus::Pending)
}

/// Convert a stored kind string to FeedRequestKind
pub fn feed_kind_from_str(s: &str) -> FeedRequestKind {
    FeedRequestKind::from_str(s).unwrap_or(FeedRequestKind::Person)
}

/// Convert a stored status string to FeedRequestStatus
pub fn feed_status_from_str(s: &str) -> FeedRequestStatus {
    FeedRequestStatus::from_str(s).unwrap_or(FeedRequestStatus::Pending)
}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
