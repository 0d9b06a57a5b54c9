//! Project listing model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Open,
    Closed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Open => "open",
            ProjectStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ProjectStatus::Open),
            "closed" => Some(ProjectStatus::Closed),
            _ => None,
        }
    }
}

/// A project listing owned by a user; owns one chat room 1:1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub title: String,
    pub short_description: String,
    pub big_description: String,
    pub tags: Vec<String>,
    pub progress: Option<i32>,
    pub duration: Option<String>,
    pub goals: Option<String>,
    pub skills_required: Vec<String>,
    pub status: ProjectStatus,
    pub links: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for project creation; the id and timestamps are assigned on insert
#[derive(Debug, Clone)]
pub struct NewProject {
    pub owner_id: String,
    pub name: String,
    pub title: String,
    pub short_description: String,
    pub big_description: String,
    pub tags: Vec<String>,
    pub progress: Option<i32>,
    pub duration: Option<String>,
    pub goals: Option<String>,
    pub skills_required: Vec<String>,
    pub status: ProjectStatus,
    pub links: Vec<String>,
}

impl NewProject {
    pub fn new(
        owner_id: String,
        name: String,
        title: String,
        short_description: String,
        big_description: String,
    ) -> Self {
        Self {
            owner_id,
            name,
            title,
            short_description,
            big_description,
            tags: Vec::new(),
            progress: None,
            duration: None,
            goals: None,
            skills_required: Vec::new(),
            status: ProjectStatus::Open,
            links: Vec::new(),
        }
    }
}

/// Partial update for a project; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub big_description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub progress: Option<i32>,
    pub duration: Option<String>,
    pub goals: Option<String>,
    pub skills_required: Option<Vec<String>>,
    pub status: Option<ProjectStatus>,
    pub links: Option<Vec<String>>,
}
