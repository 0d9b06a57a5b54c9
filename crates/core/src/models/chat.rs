//! Chat room and message models
//!
//! Rooms are addressed by a deterministic string id so that companion
//! rooms (team chats, project chats, direct messages) can be located
//! without a lookup table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Room id for a direct message pair. Order-insensitive: the two clerk
/// ids are sorted so both sides derive the same id.
pub fn dm_room_id(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("dm-{lo}-{hi}")
}

pub fn team_room_id(team_id: i64) -> String {
    format!("team-{team_id}")
}

pub fn project_room_id(project_id: i64) -> String {
    format!("project-{project_id}")
}

/// Room id for an open interest group, derived from the topic slug
pub fn open_room_id(slug: &str) -> String {
    format!("open-{slug}")
}

/// A chat room of any flavour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: i64,
    /// Deterministic external id, unique across all rooms
    pub room_id: String,
    pub is_group: bool,
    /// Open groups accept any joiner; closed groups are invite-only
    pub is_open_group: bool,
    pub participants: Vec<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub created_by: String,
    pub project_id: Option<i64>,
    pub team_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl ChatRoom {
    pub fn has_participant(&self, clerk_id: &str) -> bool {
        self.participants.iter().any(|p| p == clerk_id)
    }
}

/// Input for chat room creation
#[derive(Debug, Clone)]
pub struct NewChatRoom {
    pub room_id: String,
    pub is_group: bool,
    pub is_open_group: bool,
    pub participants: Vec<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub created_by: String,
    pub project_id: Option<i64>,
    pub team_id: Option<i64>,
}

/// A message stored against a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub room_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Message joined with the sender's display name for history listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDisplay {
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dm_room_id_is_order_insensitive() {
        assert_eq!(dm_room_id("user_b", "user_a"), dm_room_id("user_a", "user_b"));
        assert_eq!(dm_room_id("user_a", "user_b"), "dm-user_a-user_b");
    }
}
