//! Profile storage operations
//!
//! Upsert-style access to the 1:1 profile extension tables.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{parse_datetime, parse_json, OptionalExt};
use crate::error::Result;
use crate::models::{MentorProfile, OrganiserProfile, UserDetails};

pub struct ProfileStore<'a> {
    conn: &'a Connection,
}

fn details_from_row(row: &Row<'_>) -> rusqlite::Result<UserDetails> {
    Ok(UserDetails {
        clerk_id: row.get(0)?,
        bio: row.get(1)?,
        portfolio_links: parse_json(&row.get::<_, String>(2)?)?,
        tags: parse_json(&row.get::<_, String>(3)?)?,
        skills: parse_json(&row.get::<_, String>(4)?)?,
        interests: row.get(5)?,
        socials: parse_json(&row.get::<_, String>(6)?)?,
        ongoing_project_links: parse_json(&row.get::<_, String>(7)?)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(9)?)?,
    })
}

impl<'a> ProfileStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert or replace a user's general details
    #[instrument(skip(self, details), fields(clerk_id = %details.clerk_id))]
    pub fn upsert_details(&self, details: &UserDetails) -> Result<()> {
        self.conn.execute(
            "INSERT INTO user_details
                (clerk_id, bio, portfolio_links, tags, skills, interests, socials,
                 ongoing_project_links, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(clerk_id) DO UPDATE SET
                bio = excluded.bio,
                portfolio_links = excluded.portfolio_links,
                tags = excluded.tags,
                skills = excluded.skills,
                interests = excluded.interests,
                socials = excluded.socials,
                ongoing_project_links = excluded.ongoing_project_links,
                updated_at = excluded.updated_at",
            params![
                details.clerk_id,
                details.bio,
                serde_json::to_string(&details.portfolio_links)?,
                serde_json::to_string(&details.tags)?,
                serde_json::to_string(&details.skills)?,
                details.interests,
                serde_json::to_string(&details.socials)?,
                serde_json::to_string(&details.ongoing_project_links)?,
                details.created_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a user's general details
    pub fn find_details(&self, clerk_id: &str) -> Result<Option<UserDetails>> {
        let mut stmt = self.conn.prepare(
            "SELECT clerk_id, bio, portfolio_links, tags, skills, interests, socials,
                    ongoing_project_links, created_at, updated_at
             FROM user_details WHERE clerk_id = ?1",
        )?;

        let details = stmt
            .query_row(params![clerk_id], details_from_row)
            .optional()?;

        Ok(details)
    }

    /// Insert or replace a mentor profile
    #[instrument(skip(self, profile), fields(clerk_id = %profile.clerk_id))]
    pub fn upsert_mentor(&self, profile: &MentorProfile) -> Result<()> {
        self.conn.execute(
            "INSERT INTO mentor_profiles (clerk_id, skills, tags, bio)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(clerk_id) DO UPDATE SET
                skills = excluded.skills,
                tags = excluded.tags,
                bio = excluded.bio",
            params![
                profile.clerk_id,
                serde_json::to_string(&profile.skills)?,
                serde_json::to_string(&profile.tags)?,
                profile.bio,
            ],
        )?;
        Ok(())
    }

    /// Fetch a mentor profile
    pub fn find_mentor(&self, clerk_id: &str) -> Result<Option<MentorProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT clerk_id, skills, tags, bio FROM mentor_profiles WHERE clerk_id = ?1",
        )?;

        let profile = stmt
            .query_row(params![clerk_id], |row| {
                Ok(MentorProfile {
                    clerk_id: row.get(0)?,
                    skills: parse_json(&row.get::<_, String>(1)?)?,
                    tags: parse_json(&row.get::<_, String>(2)?)?,
                    bio: row.get(3)?,
                })
            })
            .optional()?;

        Ok(profile)
    }

    /// List all mentors with a profile
    pub fn list_mentors(&self) -> Result<Vec<MentorProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT clerk_id, skills, tags, bio FROM mentor_profiles ORDER BY clerk_id",
        )?;

        let profiles = stmt
            .query_map([], |row| {
                Ok(MentorProfile {
                    clerk_id: row.get(0)?,
                    skills: parse_json(&row.get::<_, String>(1)?)?,
                    tags: parse_json(&row.get::<_, String>(2)?)?,
                    bio: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(profiles)
    }

    /// Insert or replace an organiser profile
    #[instrument(skip(self, profile), fields(clerk_id = %profile.clerk_id))]
    pub fn upsert_organiser(&self, profile: &OrganiserProfile) -> Result<()> {
        self.conn.execute(
            "INSERT INTO organiser_profiles
                (clerk_id, organization, website, bio, socials, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(clerk_id) DO UPDATE SET
                organization = excluded.organization,
                website = excluded.website,
                bio = excluded.bio,
                socials = excluded.socials,
                tags = excluded.tags,
                updated_at = excluded.updated_at",
            params![
                profile.clerk_id,
                profile.organization,
                profile.website,
                profile.bio,
                serde_json::to_string(&profile.socials)?,
                serde_json::to_string(&profile.tags)?,
                profile.created_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch an organiser profile
    pub fn find_organiser(&self, clerk_id: &str) -> Result<Option<OrganiserProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT clerk_id, organization, website, bio, socials, tags, created_at, updated_at
             FROM organiser_profiles WHERE clerk_id = ?1",
        )?;

        let profile = stmt
            .query_row(params![clerk_id], |row| {
                Ok(OrganiserProfile {
                    clerk_id: row.get(0)?,
                    organization: row.get(1)?,
                    website: row.get(2)?,
                    bio: row.get(3)?,
                    socials: parse_json(&row.get::<_, String>(4)?)?,
                    tags: parse_json(&row.get::<_, String>(5)?)?,
                    created_at: parse_datetime(&row.get::<_, String>(6)?)?,
                    updated_at: parse_datetime(&row.get::<_, String>(7)?)?,
                })
            })
            .optional()?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use crate::storage::Database;

    fn seed_user(db: &Database, id: &str) {
        let user = User::new(
            id.to_string(),
            format!("User {id}"),
            format!("{id}@example.com"),
            Role::Participant,
        );
        db.users().create(&user).unwrap();
    }

    #[test]
    fn test_details_upsert_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "user_1");

        let mut details = UserDetails::new("user_1".into());
        details.skills = vec!["rust".into(), "sql".into()];
        details.bio = Some("hello".into());
        db.profiles().upsert_details(&details).unwrap();

        let found = db.profiles().find_details("user_1").unwrap().unwrap();
        assert_eq!(found.skills, vec!["rust", "sql"]);

        // Second upsert replaces, not duplicates
        details.bio = Some("updated".into());
        db.profiles().upsert_details(&details).unwrap();
        let found = db.profiles().find_details("user_1").unwrap().unwrap();
        assert_eq!(found.bio.as_deref(), Some("updated"));
    }

    #[test]
    fn test_mentor_listing() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "mentor_1");
        seed_user(&db, "mentor_2");

        for id in ["mentor_1", "mentor_2"] {
            db.profiles()
                .upsert_mentor(&MentorProfile {
                    clerk_id: id.to_string(),
                    skills: vec!["mentoring".into()],
                    tags: vec![],
                    bio: None,
                })
                .unwrap();
        }

        let mentors = db.profiles().list_mentors().unwrap();
        assert_eq!(mentors.len(), 2);
    }

    #[test]
    fn test_missing_profile_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.profiles().find_details("ghost").unwrap().is_none());
        assert!(db.profiles().find_organiser("ghost").unwrap().is_none());
    }
}
