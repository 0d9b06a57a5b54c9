//! Follow graph storage operations
//!
//! One row per directional edge; the receiving side resolves the
//! request by flipping status or deleting the row.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{follow_status_from_str, parse_datetime, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Follow, FollowEntry};

pub struct FollowStore<'a> {
    conn: &'a Connection,
}

const FOLLOW_COLUMNS: &str = "id, follower_id, followed_id, status, created_at, updated_at";

fn follow_from_row(row: &Row<'_>) -> rusqlite::Result<Follow> {
    Ok(Follow {
        id: row.get(0)?,
        follower_id: row.get(1)?,
        followed_id: row.get(2)?,
        status: follow_status_from_str(&row.get::<_, String>(3)?),
        created_at: parse_datetime(&row.get::<_, String>(4)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

impl<'a> FollowStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a pending follow request
    #[instrument(skip(self))]
    pub fn create_request(&self, follower_id: &str, followed_id: &str) -> Result<i64> {
        if self.find(follower_id, followed_id)?.is_some() {
            return Err(Error::Conflict("Follow request already exists".into()));
        }
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO follows (follower_id, followed_id, status, created_at, updated_at)
             VALUES (?1, ?2, 'pending', ?3, ?4)",
            params![follower_id, followed_id, now, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find the edge between two users, if any
    pub fn find(&self, follower_id: &str, followed_id: &str) -> Result<Option<Follow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FOLLOW_COLUMNS} FROM follows WHERE follower_id = ?1 AND followed_id = ?2"
        ))?;

        let follow = stmt
            .query_row(params![follower_id, followed_id], follow_from_row)
            .optional()?;

        Ok(follow)
    }

    /// Accept a pending request
    #[instrument(skip(self))]
    pub fn accept(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE follows SET status = 'accepted', updated_at = ?1
             WHERE follower_id = ?2 AND followed_id = ?3 AND status = 'pending'",
            params![Utc::now().to_rfc3339(), follower_id, followed_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound("No pending follow request".into()));
        }
        Ok(())
    }

    /// Reject a pending request (the row is dropped so a retry works)
    #[instrument(skip(self))]
    pub fn reject(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM follows
             WHERE follower_id = ?1 AND followed_id = ?2 AND status = 'pending'",
            params![follower_id, followed_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound("No pending follow request".into()));
        }
        Ok(())
    }

    /// Remove an edge regardless of status (unfollow / remove follower)
    pub fn remove(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower_id, followed_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound("No such follow".into()));
        }
        Ok(())
    }

    /// Whether follower has an accepted edge to followed
    pub fn is_following(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows
             WHERE follower_id = ?1 AND followed_id = ?2 AND status = 'accepted'",
            params![follower_id, followed_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Accepted followers of a user, with display names
    pub fn list_followers(&self, clerk_id: &str) -> Result<Vec<FollowEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT f.follower_id, u.name, f.updated_at
             FROM follows f
             JOIN users u ON u.clerk_id = f.follower_id
             WHERE f.followed_id = ?1 AND f.status = 'accepted'
             ORDER BY f.updated_at",
        )?;

        let entries = stmt
            .query_map(params![clerk_id], |row| {
                Ok(FollowEntry {
                    clerk_id: row.get(0)?,
                    name: row.get(1)?,
                    since: parse_datetime(&row.get::<_, String>(2)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }

    /// Users a given user follows (accepted only), with display names
    pub fn list_following(&self, clerk_id: &str) -> Result<Vec<FollowEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT f.followed_id, u.name, f.updated_at
             FROM follows f
             JOIN users u ON u.clerk_id = f.followed_id
             WHERE f.follower_id = ?1 AND f.status = 'accepted'
             ORDER BY f.updated_at",
        )?;

        let entries = stmt
            .query_map(params![clerk_id], |row| {
                Ok(FollowEntry {
                    clerk_id: row.get(0)?,
                    name: row.get(1)?,
                    since: parse_datetime(&row.get::<_, String>(2)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }

    /// Pending requests awaiting a user's decision
    pub fn list_pending_for(&self, clerk_id: &str) -> Result<Vec<Follow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FOLLOW_COLUMNS} FROM follows
             WHERE followed_id = ?1 AND status = 'pending' ORDER BY created_at"
        ))?;

        let follows = stmt
            .query_map(params![clerk_id], follow_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(follows)
    }
}
