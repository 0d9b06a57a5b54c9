//! Project storage operations

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{parse_datetime, parse_json, project_status_from_str, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{NewProject, Project, ProjectPatch};

pub struct ProjectStore<'a> {
    conn: &'a Connection,
}

const PROJECT_COLUMNS: &str = "id, owner_id, name, title, short_description, big_description, \
     tags, progress, duration, goals, skills_required, status, links, created_at, updated_at";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        title: row.get(3)?,
        short_description: row.get(4)?,
        big_description: row.get(5)?,
        tags: parse_json(&row.get::<_, String>(6)?)?,
        progress: row.get(7)?,
        duration: row.get(8)?,
        goals: row.get(9)?,
        skills_required: parse_json(&row.get::<_, String>(10)?)?,
        status: project_status_from_str(&row.get::<_, String>(11)?),
        links: parse_json(&row.get::<_, String>(12)?)?,
        created_at: parse_datetime(&row.get::<_, String>(13)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(14)?)?,
    })
}

impl<'a> ProjectStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a project, returning its id
    #[instrument(skip(self, project), fields(owner_id = %project.owner_id))]
    pub fn create(&self, project: &NewProject) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO projects
                (owner_id, name, title, short_description, big_description, tags, progress,
                 duration, goals, skills_required, status, links, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                project.owner_id,
                project.name,
                project.title,
                project.short_description,
                project.big_description,
                serde_json::to_string(&project.tags)?,
                project.progress,
                project.duration,
                project.goals,
                serde_json::to_string(&project.skills_required)?,
                project.status.as_str(),
                serde_json::to_string(&project.links)?,
                now,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find project by id
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: i64) -> Result<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"))?;

        let project = stmt.query_row(params![id], project_from_row).optional()?;

        Ok(project)
    }

    /// List all projects, newest first
    pub fn list_all(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC"
        ))?;

        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(projects)
    }

    /// List projects owned by a user
    pub fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = ?1 ORDER BY created_at DESC"
        ))?;

        let projects = stmt
            .query_map(params![owner_id], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(projects)
    }

    /// Apply a partial update to a project
    pub fn update(&self, id: i64, patch: &ProjectPatch) -> Result<()> {
        let current = self
            .find_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("Project {id}")))?;

        let title = patch.title.as_ref().unwrap_or(&current.title);
        let short = patch
            .short_description
            .as_ref()
            .unwrap_or(&current.short_description);
        let big = patch
            .big_description
            .as_ref()
            .unwrap_or(&current.big_description);
        let tags = patch.tags.as_ref().unwrap_or(&current.tags);
        let progress = patch.progress.or(current.progress);
        let duration = patch.duration.as_ref().or(current.duration.as_ref());
        let goals = patch.goals.as_ref().or(current.goals.as_ref());
        let skills = patch
            .skills_required
            .as_ref()
            .unwrap_or(&current.skills_required);
        let status = patch.status.unwrap_or(current.status);
        let links = patch.links.as_ref().unwrap_or(&current.links);

        self.conn.execute(
            "UPDATE projects SET title = ?1, short_description = ?2, big_description = ?3,
                tags = ?4, progress = ?5, duration = ?6, goals = ?7, skills_required = ?8,
                status = ?9, links = ?10, updated_at = ?11
             WHERE id = ?12",
            params![
                title,
                short,
                big,
                serde_json::to_string(tags)?,
                progress,
                duration,
                goals,
                serde_json::to_string(skills)?,
                status.as_str(),
                serde_json::to_string(links)?,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        Ok(())
    }

    /// Delete a project (chat room cascades)
    pub fn delete(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Project {id}")));
        }
        Ok(())
    }
}
