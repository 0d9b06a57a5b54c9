//! Hackathon model and lifecycle states
//!
//! A hackathon moves through `pending -> approved -> live -> expired`
//! and never backwards. Transitions are driven either by an admin
//! approval or by the periodic sweep comparing the schedule against
//! the current time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a hackathon. Ordering follows the lifecycle, so
/// a transition is legal only when the target compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HackathonStatus {
    Pending,
    Approved,
    Live,
    Expired,
}

impl HackathonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HackathonStatus::Pending => "pending",
            HackathonStatus::Approved => "approved",
            HackathonStatus::Live => "live",
            HackathonStatus::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(HackathonStatus::Pending),
            "approved" => Some(HackathonStatus::Approved),
            "live" => Some(HackathonStatus::Live),
            "expired" => Some(HackathonStatus::Expired),
            _ => None,
        }
    }

    /// Whether moving to `next` is a forward transition
    pub fn can_advance_to(&self, next: HackathonStatus) -> bool {
        next > *self
    }
}

impl std::fmt::Display for HackathonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HackathonMode {
    Online,
    Offline,
}

impl HackathonMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HackathonMode::Online => "online",
            HackathonMode::Offline => "offline",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "online" => Some(HackathonMode::Online),
            "offline" => Some(HackathonMode::Offline),
            _ => None,
        }
    }
}

/// A hackathon event listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hackathon {
    pub id: i64,
    pub organiser_id: String,
    pub name: String,
    pub description: Option<String>,
    pub mode: HackathonMode,
    /// Venue address, required for offline events
    pub address: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub max_team_size: u32,
    pub prize_pool: Option<String>,
    pub tags: Vec<String>,
    pub status: HackathonStatus,
    /// Winning team ids, set by the organiser after expiry
    pub winners: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hackathon {
    /// Whether new registrations and team changes are still allowed
    pub fn registration_open(&self, now: DateTime<Utc>) -> bool {
        now <= self.registration_deadline
    }
}

/// Input for hackathon creation
#[derive(Debug, Clone)]
pub struct NewHackathon {
    pub organiser_id: String,
    pub name: String,
    pub description: Option<String>,
    pub mode: HackathonMode,
    pub address: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub max_team_size: u32,
    pub prize_pool: Option<String>,
    pub tags: Vec<String>,
}

/// Partial update for a hackathon; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct HackathonPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub prize_pool: Option<String>,
    pub tags: Option<Vec<String>>,
    pub winners: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ordering_follows_lifecycle() {
        assert!(HackathonStatus::Pending.can_advance_to(HackathonStatus::Approved));
        assert!(HackathonStatus::Approved.can_advance_to(HackathonStatus::Live));
        assert!(HackathonStatus::Live.can_advance_to(HackathonStatus::Expired));
        assert!(HackathonStatus::Approved.can_advance_to(HackathonStatus::Expired));
    }

    #[test]
    fn status_never_moves_backwards() {
        assert!(!HackathonStatus::Expired.can_advance_to(HackathonStatus::Live));
        assert!(!HackathonStatus::Live.can_advance_to(HackathonStatus::Approved));
        assert!(!HackathonStatus::Approved.can_advance_to(HackathonStatus::Pending));
        assert!(!HackathonStatus::Live.can_advance_to(HackathonStatus::Live));
    }
}
