//! Project operations
//!
//! Creating a project also creates its companion chat room in the
//! same transaction, so the two can never drift apart.

use tracing::instrument;

use crate::error::{Error, Result};
use crate::models::{project_room_id, NewChatRoom, NewProject, Project, ProjectPatch};
use crate::storage::{ChatStore, Database, ProjectStore};

/// Create a project together with its chat room
#[instrument(skip(db, project), fields(owner_id = %project.owner_id))]
pub fn create_project(db: &mut Database, project: &NewProject) -> Result<Project> {
    if db.users().find_by_clerk_id(&project.owner_id)?.is_none() {
        return Err(Error::NotFound(format!("User {}", project.owner_id)));
    }
    if project.title.trim().is_empty() {
        return Err(Error::Validation("Title cannot be empty".into()));
    }
    if let Some(progress) = project.progress {
        if !(0..=100).contains(&progress) {
            return Err(Error::Validation(
                "Progress must be between 0 and 100".into(),
            ));
        }
    }

    let tx = db.immediate_transaction()?;

    let project_id = ProjectStore::new(&tx).create(project)?;
    ChatStore::new(&tx).create_room(&NewChatRoom {
        room_id: project_room_id(project_id),
        is_group: true,
        is_open_group: false,
        participants: vec![project.owner_id.clone()],
        topic: Some(project.title.clone()),
        description: None,
        created_by: project.owner_id.clone(),
        project_id: Some(project_id),
        team_id: None,
    })?;

    tx.commit()?;

    db.projects()
        .find_by_id(project_id)?
        .ok_or_else(|| Error::NotFound(format!("Project {project_id}")))
}

/// Update a project. Owner only.
#[instrument(skip(db, patch))]
pub fn update_project(
    db: &Database,
    owner_id: &str,
    project_id: i64,
    patch: &ProjectPatch,
) -> Result<Project> {
    let project = db
        .projects()
        .find_by_id(project_id)?
        .ok_or_else(|| Error::NotFound(format!("Project {project_id}")))?;
    if project.owner_id != owner_id {
        return Err(Error::Unauthorized(
            "Only the owner can update this project".into(),
        ));
    }
    if let Some(progress) = patch.progress {
        if !(0..=100).contains(&progress) {
            return Err(Error::Validation(
                "Progress must be between 0 and 100".into(),
            ));
        }
    }

    db.projects().update(project_id, patch)?;
    db.projects()
        .find_by_id(project_id)?
        .ok_or_else(|| Error::NotFound(format!("Project {project_id}")))
}

/// Delete a project. Owner only; the chat room and its messages
/// cascade with it.
#[instrument(skip(db))]
pub fn delete_project(db: &Database, owner_id: &str, project_id: i64) -> Result<()> {
    let project = db
        .projects()
        .find_by_id(project_id)?
        .ok_or_else(|| Error::NotFound(format!("Project {project_id}")))?;
    if project.owner_id != owner_id {
        return Err(Error::Unauthorized(
            "Only the owner can delete this project".into(),
        ));
    }
    db.projects().delete(project_id)
}
