//! Feed request storage operations

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{feed_kind_from_str, feed_status_from_str, parse_datetime, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{FeedRequest, FeedRequestStatus, NewFeedRequest};

pub struct FeedStore<'a> {
    conn: &'a Connection,
}

const FEED_COLUMNS: &str =
    "id, sender_id, receiver_id, kind, project_id, message, status, created_at, updated_at";

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<FeedRequest> {
    Ok(FeedRequest {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        kind: feed_kind_from_str(&row.get::<_, String>(3)?),
        project_id: row.get(4)?,
        message: row.get(5)?,
        status: feed_status_from_str(&row.get::<_, String>(6)?),
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(8)?)?,
    })
}

impl<'a> FeedStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a pending request, returning its id
    #[instrument(skip(self, request), fields(sender_id = %request.sender_id, receiver_id = %request.receiver_id))]
    pub fn create(&self, request: &NewFeedRequest) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO feed_requests
                (sender_id, receiver_id, kind, project_id, message, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7)",
            params![
                request.sender_id,
                request.receiver_id,
                request.kind.as_str(),
                request.project_id,
                request.message,
                now,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find request by id
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: i64) -> Result<Option<FeedRequest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feed_requests WHERE id = ?1"
        ))?;

        let request = stmt.query_row(params![id], request_from_row).optional()?;

        Ok(request)
    }

    /// Requests addressed to a user, newest first
    pub fn list_for_receiver(&self, receiver_id: &str) -> Result<Vec<FeedRequest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feed_requests
             WHERE receiver_id = ?1 ORDER BY created_at DESC"
        ))?;

        let requests = stmt
            .query_map(params![receiver_id], request_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(requests)
    }

    /// Requests a user has sent, newest first
    pub fn list_for_sender(&self, sender_id: &str) -> Result<Vec<FeedRequest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feed_requests
             WHERE sender_id = ?1 ORDER BY created_at DESC"
        ))?;

        let requests = stmt
            .query_map(params![sender_id], request_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(requests)
    }

    /// Resolve a pending request. Only pending rows can move, so a
    /// second resolution attempt conflicts instead of flip-flopping.
    #[instrument(skip(self))]
    pub fn set_status(&self, id: i64, status: FeedRequestStatus) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE feed_requests SET status = ?1, updated_at = ?2
             WHERE id = ?3 AND status = 'pending'",
            params![status.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            if self.find_by_id(id)?.is_none() {
                return Err(Error::NotFound(format!("Feed request {id}")));
            }
            return Err(Error::Conflict("Request already resolved".into()));
        }
        Ok(())
    }
}
