//! User account model
//!
//! Users are keyed by the identity provider's stable clerk id; the
//! platform never stores credentials itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform role attached to a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Participant,
    Mentor,
    Organiser,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Participant => "participant",
            Role::Mentor => "mentor",
            Role::Organiser => "organiser",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "participant" => Some(Role::Participant),
            "mentor" => Some(Role::Mentor),
            "organiser" => Some(Role::Organiser),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A platform user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub clerk_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(clerk_id: String, name: String, email: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            clerk_id,
            name,
            email,
            phone_number: None,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_phone_number(mut self, phone_number: String) -> Self {
        self.phone_number = Some(phone_number);
        self
    }
}
