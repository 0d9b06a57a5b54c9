//! Team model

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;

/// Generates a random join code. Uniqueness is enforced by the caller
/// against the teams table.
pub fn generate_team_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// A team registered for a hackathon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub hackathon_id: i64,
    pub leader_id: String,
    pub name: String,
    /// Case-insensitive join code shared out of band
    pub team_code: String,
    pub max_members: u32,
    /// Clerk ids of current members, leader included
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_members as usize
    }

    pub fn has_member(&self, clerk_id: &str) -> bool {
        self.members.iter().any(|m| m == clerk_id)
    }
}

/// Input for team creation; the leader becomes the first member
#[derive(Debug, Clone)]
pub struct NewTeam {
    pub hackathon_id: i64,
    pub leader_id: String,
    pub name: String,
}
