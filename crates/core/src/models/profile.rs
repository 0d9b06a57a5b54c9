//! Profile models
//!
//! Thin 1:1 extensions of a user account. A user may carry a general
//! details row plus a mentor or organiser profile depending on role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// General profile details for any user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetails {
    pub clerk_id: String,
    pub bio: Option<String>,
    pub portfolio_links: Vec<String>,
    pub tags: Vec<String>,
    pub skills: Vec<String>,
    pub interests: Option<String>,
    /// Free-form {platform: handle/url} object
    pub socials: Value,
    pub ongoing_project_links: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDetails {
    pub fn new(clerk_id: String) -> Self {
        let now = Utc::now();
        Self {
            clerk_id,
            bio: None,
            portfolio_links: Vec::new(),
            tags: Vec::new(),
            skills: Vec::new(),
            interests: None,
            socials: Value::Object(Default::default()),
            ongoing_project_links: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Mentor-specific profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorProfile {
    pub clerk_id: String,
    pub skills: Vec<String>,
    pub tags: Vec<String>,
    pub bio: Option<String>,
}

/// Organiser-specific profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganiserProfile {
    pub clerk_id: String,
    pub organization: Option<String>,
    pub website: Option<String>,
    pub bio: Option<String>,
    pub socials: Value,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrganiserProfile {
    pub fn new(clerk_id: String) -> Self {
        let now = Utc::now();
        Self {
            clerk_id,
            organization: None,
            website: None,
            bio: None,
            socials: Value::Object(Default::default()),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
