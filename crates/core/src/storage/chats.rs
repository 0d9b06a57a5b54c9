//! Chat room and message storage operations

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{parse_datetime, parse_json, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{ChatRoom, Message, MessageDisplay, NewChatRoom};

pub struct ChatStore<'a> {
    conn: &'a Connection,
}

const ROOM_COLUMNS: &str = "id, room_id, is_group, is_open_group, participants, topic, \
     description, created_by, project_id, team_id, created_at";

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<ChatRoom> {
    Ok(ChatRoom {
        id: row.get(0)?,
        room_id: row.get(1)?,
        is_group: row.get(2)?,
        is_open_group: row.get(3)?,
        participants: parse_json(&row.get::<_, String>(4)?)?,
        topic: row.get(5)?,
        description: row.get(6)?,
        created_by: row.get(7)?,
        project_id: row.get(8)?,
        team_id: row.get(9)?,
        created_at: parse_datetime(&row.get::<_, String>(10)?)?,
    })
}

impl<'a> ChatStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a chat room, returning its rowid
    #[instrument(skip(self, room), fields(room_id = %room.room_id))]
    pub fn create_room(&self, room: &NewChatRoom) -> Result<i64> {
        if self.find_by_room_id(&room.room_id)?.is_some() {
            return Err(Error::Conflict(format!("Room {} already exists", room.room_id)));
        }
        self.conn.execute(
            "INSERT INTO chat_rooms
                (room_id, is_group, is_open_group, participants, topic, description,
                 created_by, project_id, team_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                room.room_id,
                room.is_group,
                room.is_open_group,
                serde_json::to_string(&room.participants)?,
                room.topic,
                room.description,
                room.created_by,
                room.project_id,
                room.team_id,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find a room by its deterministic external id
    #[instrument(skip(self))]
    pub fn find_by_room_id(&self, room_id: &str) -> Result<Option<ChatRoom>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE room_id = ?1"
        ))?;

        let room = stmt.query_row(params![room_id], room_from_row).optional()?;

        Ok(room)
    }

    /// List rooms a user participates in
    pub fn list_for_user(&self, clerk_id: &str) -> Result<Vec<ChatRoom>> {
        // Participants are a JSON array of strings; match the quoted id.
        let needle = serde_json::to_string(clerk_id)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms
             WHERE participants LIKE '%' || ?1 || '%' ORDER BY created_at"
        ))?;

        let rooms = stmt
            .query_map(params![needle], room_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        // The LIKE is a coarse prefilter; confirm actual membership.
        Ok(rooms.into_iter().filter(|r| r.has_participant(clerk_id)).collect())
    }

    /// List open interest groups
    pub fn list_open_groups(&self) -> Result<Vec<ChatRoom>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE is_open_group = 1 ORDER BY created_at"
        ))?;

        let rooms = stmt
            .query_map([], room_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rooms)
    }

    /// Replace the participant roster of a room
    pub fn set_participants(&self, room_id: &str, participants: &[String]) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE chat_rooms SET participants = ?1 WHERE room_id = ?2",
            params![serde_json::to_string(participants)?, room_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Room {room_id}")));
        }
        Ok(())
    }

    /// Store a message, returning its id
    #[instrument(skip(self, content), fields(room_id = %room_id, sender_id = %sender_id))]
    pub fn create_message(&self, room_id: &str, sender_id: &str, content: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO messages (room_id, sender_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![room_id, sender_id, content, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Message history for a room, oldest first, joined with sender names
    #[instrument(skip(self))]
    pub fn list_messages(&self, room_id: &str) -> Result<Vec<MessageDisplay>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.sender_id, u.name, m.content, m.created_at
             FROM messages m
             JOIN users u ON u.clerk_id = m.sender_id
             WHERE m.room_id = ?1
             ORDER BY m.created_at, m.id",
        )?;

        let messages = stmt
            .query_map(params![room_id], |row| {
                Ok(MessageDisplay {
                    sender_id: row.get(0)?,
                    sender_name: row.get(1)?,
                    content: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(messages)
    }

    /// Find a single message by id
    pub fn find_message(&self, id: i64) -> Result<Option<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, room_id, sender_id, content, created_at FROM messages WHERE id = ?1",
        )?;

        let message = stmt
            .query_row(params![id], |row| {
                Ok(Message {
                    id: row.get(0)?,
                    room_id: row.get(1)?,
                    sender_id: row.get(2)?,
                    content: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?)?,
                })
            })
            .optional()?;

        Ok(message)
    }
}
