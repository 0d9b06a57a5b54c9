//! Chat operations: direct messages, open groups, project rooms

use tracing::instrument;

use crate::error::{Error, Result};
use crate::models::{
    dm_room_id, open_room_id, project_room_id, ChatRoom, MessageDisplay, NewChatRoom,
};
use crate::roster;
use crate::storage::{ChatStore, Database};

fn require_user(db: &Database, clerk_id: &str) -> Result<()> {
    if db.users().find_by_clerk_id(clerk_id)?.is_none() {
        return Err(Error::NotFound(format!("User {clerk_id}")));
    }
    Ok(())
}

/// Open (or return) the direct message room between two users. The
/// room id is derived from the sorted pair, so repeated calls from
/// either side land on the same room.
#[instrument(skip(db))]
pub fn create_dm(db: &Database, user_a: &str, user_b: &str) -> Result<ChatRoom> {
    if user_a == user_b {
        return Err(Error::Validation("Cannot open a DM with yourself".into()));
    }
    require_user(db, user_a)?;
    require_user(db, user_b)?;

    let room_id = dm_room_id(user_a, user_b);
    if let Some(existing) = db.chats().find_by_room_id(&room_id)? {
        return Ok(existing);
    }

    db.chats().create_room(&NewChatRoom {
        room_id: room_id.clone(),
        is_group: false,
        is_open_group: false,
        participants: vec![user_a.to_string(), user_b.to_string()],
        topic: None,
        description: None,
        created_by: user_a.to_string(),
        project_id: None,
        team_id: None,
    })?;

    db.chats()
        .find_by_room_id(&room_id)?
        .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))
}

/// Create an open interest group. The slug must be unused.
#[instrument(skip(db, description))]
pub fn create_open_group(
    db: &Database,
    creator_id: &str,
    slug: &str,
    topic: &str,
    description: Option<&str>,
) -> Result<ChatRoom> {
    require_user(db, creator_id)?;
    let slug_ok = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !slug_ok {
        return Err(Error::Validation(
            "Slug must be lowercase letters, digits and dashes".into(),
        ));
    }

    let room_id = open_room_id(slug);
    db.chats().create_room(&NewChatRoom {
        room_id: room_id.clone(),
        is_group: true,
        is_open_group: true,
        participants: vec![creator_id.to_string()],
        topic: Some(topic.to_string()),
        description: description.map(str::to_string),
        created_by: creator_id.to_string(),
        project_id: None,
        team_id: None,
    })?;

    db.chats()
        .find_by_room_id(&room_id)?
        .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))
}

/// Join an open group. Joining a group you are already in is a no-op.
#[instrument(skip(db))]
pub fn join_open_group(db: &mut Database, user_id: &str, room_id: &str) -> Result<ChatRoom> {
    require_user(db, user_id)?;

    let tx = db.immediate_transaction()?;
    {
        let chats = ChatStore::new(&tx);
        let room = chats
            .find_by_room_id(room_id)?
            .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))?;
        if !room.is_open_group {
            return Err(Error::Unauthorized("Room is not an open group".into()));
        }
        if let Ok(participants) = roster::add(&room.participants, user_id.to_string(), None) {
            chats.set_participants(room_id, &participants)?;
        }
    }
    tx.commit()?;

    db.chats()
        .find_by_room_id(room_id)?
        .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))
}

/// Leave an open group. Leaving a group you are not in is a no-op.
#[instrument(skip(db))]
pub fn leave_open_group(db: &mut Database, user_id: &str, room_id: &str) -> Result<ChatRoom> {
    require_user(db, user_id)?;

    let tx = db.immediate_transaction()?;
    {
        let chats = ChatStore::new(&tx);
        let room = chats
            .find_by_room_id(room_id)?
            .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))?;
        if !room.is_open_group {
            return Err(Error::Unauthorized("Room is not an open group".into()));
        }
        if let Ok(participants) = roster::remove(&room.participants, &user_id.to_string(), None) {
            chats.set_participants(room_id, &participants)?;
        }
    }
    tx.commit()?;

    db.chats()
        .find_by_room_id(room_id)?
        .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))
}

/// Send a message into a room the sender participates in
#[instrument(skip(db, content))]
pub fn send_message(db: &Database, sender_id: &str, room_id: &str, content: &str) -> Result<i64> {
    if content.trim().is_empty() {
        return Err(Error::Validation("Message cannot be empty".into()));
    }
    let room = db
        .chats()
        .find_by_room_id(room_id)?
        .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))?;
    if !room.has_participant(sender_id) {
        return Err(Error::Unauthorized(
            "Not a participant of this room".into(),
        ));
    }
    db.chats().create_message(room_id, sender_id, content)
}

/// Message history for a participant, oldest first
#[instrument(skip(db))]
pub fn get_messages(db: &Database, user_id: &str, room_id: &str) -> Result<Vec<MessageDisplay>> {
    let room = db
        .chats()
        .find_by_room_id(room_id)?
        .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))?;
    if !room.has_participant(user_id) {
        return Err(Error::Unauthorized(
            "Not a participant of this room".into(),
        ));
    }
    db.chats().list_messages(room_id)
}

/// Open (or return) the companion chat room for a project. Only the
/// project owner may create it explicitly; repeat calls return the
/// existing room.
#[instrument(skip(db))]
pub fn create_project_chat(db: &Database, owner_id: &str, project_id: i64) -> Result<ChatRoom> {
    let project = db
        .projects()
        .find_by_id(project_id)?
        .ok_or_else(|| Error::NotFound(format!("Project {project_id}")))?;
    if project.owner_id != owner_id {
        return Err(Error::Unauthorized(
            "Only the project owner can open its chat".into(),
        ));
    }

    let room_id = project_room_id(project_id);
    if let Some(existing) = db.chats().find_by_room_id(&room_id)? {
        return Ok(existing);
    }

    db.chats().create_room(&NewChatRoom {
        room_id: room_id.clone(),
        is_group: true,
        is_open_group: false,
        participants: vec![owner_id.to_string()],
        topic: Some(project.title.clone()),
        description: None,
        created_by: owner_id.to_string(),
        project_id: Some(project_id),
        team_id: None,
    })?;

    db.chats()
        .find_by_room_id(&room_id)?
        .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))
}

/// Add a user to a project chat. Owner only; re-inviting an existing
/// participant is a no-op.
#[instrument(skip(db))]
pub fn invite_to_project_chat(
    db: &mut Database,
    owner_id: &str,
    project_id: i64,
    invitee_id: &str,
) -> Result<ChatRoom> {
    require_user(db, invitee_id)?;
    let project = db
        .projects()
        .find_by_id(project_id)?
        .ok_or_else(|| Error::NotFound(format!("Project {project_id}")))?;
    if project.owner_id != owner_id {
        return Err(Error::Unauthorized(
            "Only the project owner can invite".into(),
        ));
    }

    let room_id = project_room_id(project_id);
    let tx = db.immediate_transaction()?;
    {
        let chats = ChatStore::new(&tx);
        let room = chats
            .find_by_room_id(&room_id)?
            .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))?;
        if let Ok(participants) = roster::add(&room.participants, invitee_id.to_string(), None) {
            chats.set_participants(&room_id, &participants)?;
        }
    }
    tx.commit()?;

    db.chats()
        .find_by_room_id(&room_id)?
        .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))
}

/// Remove a user from a project chat. Owner only; the owner cannot be
/// kicked out of their own project room.
#[instrument(skip(db))]
pub fn kick_from_project_chat(
    db: &mut Database,
    owner_id: &str,
    project_id: i64,
    member_id: &str,
) -> Result<ChatRoom> {
    let project = db
        .projects()
        .find_by_id(project_id)?
        .ok_or_else(|| Error::NotFound(format!("Project {project_id}")))?;
    if project.owner_id != owner_id {
        return Err(Error::Unauthorized(
            "Only the project owner can remove members".into(),
        ));
    }

    let room_id = project_room_id(project_id);
    let tx = db.immediate_transaction()?;
    {
        let chats = ChatStore::new(&tx);
        let room = chats
            .find_by_room_id(&room_id)?
            .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))?;
        match roster::remove(
            &room.participants,
            &member_id.to_string(),
            Some(&project.owner_id),
        ) {
            Ok(participants) => chats.set_participants(&room_id, &participants)?,
            Err(roster::RosterError::Protected) => {
                return Err(Error::Conflict("Cannot remove the project owner".into()))
            }
            // Kicking someone who already left is a no-op
            Err(_) => {}
        }
    }
    tx.commit()?;

    db.chats()
        .find_by_room_id(&room_id)?
        .ok_or_else(|| Error::NotFound(format!("Room {room_id}")))
}
