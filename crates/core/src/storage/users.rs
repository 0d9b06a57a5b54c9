//! User storage operations

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{parse_datetime, role_from_str, OptionalExt};
use crate::error::{Error, Result};
use crate::models::User;

pub struct UserStore<'a> {
    conn: &'a Connection,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        clerk_id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone_number: row.get(3)?,
        role: role_from_str(&row.get::<_, String>(4)?),
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(6)?)?,
    })
}

const USER_COLUMNS: &str = "clerk_id, name, email, phone_number, role, created_at, updated_at";

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new user
    #[instrument(skip(self, user), fields(clerk_id = %user.clerk_id))]
    pub fn create(&self, user: &User) -> Result<()> {
        if self.find_by_clerk_id(&user.clerk_id)?.is_some() {
            return Err(Error::Conflict("User already exists".into()));
        }
        if self.find_by_email(&user.email)?.is_some() {
            return Err(Error::Conflict("Email already in use".into()));
        }
        self.conn.execute(
            "INSERT INTO users (clerk_id, name, email, phone_number, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.clerk_id,
                user.name,
                user.email,
                user.phone_number,
                user.role.as_str(),
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find user by clerk id
    #[instrument(skip(self))]
    pub fn find_by_clerk_id(&self, clerk_id: &str) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE clerk_id = ?1"))?;

        let user = stmt
            .query_row(params![clerk_id], user_from_row)
            .optional()?;

        Ok(user)
    }

    /// Find user by email
    #[instrument(skip(self))]
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;

        let user = stmt.query_row(params![email], user_from_row).optional()?;

        Ok(user)
    }

    /// Update name, email and phone number
    pub fn update(&self, user: &User) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE users SET name = ?1, email = ?2, phone_number = ?3, role = ?4, updated_at = ?5
             WHERE clerk_id = ?6",
            params![
                user.name,
                user.email,
                user.phone_number,
                user.role.as_str(),
                Utc::now().to_rfc3339(),
                user.clerk_id,
            ],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("User {}", user.clerk_id)));
        }
        Ok(())
    }

    /// Delete a user and all dependent rows (cascades)
    pub fn delete(&self, clerk_id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE clerk_id = ?1", params![clerk_id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("User {clerk_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::storage::Database;

    fn sample_user(id: &str) -> User {
        User::new(
            id.to_string(),
            format!("User {id}"),
            format!("{id}@example.com"),
            Role::Participant,
        )
    }

    #[test]
    fn test_create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let user = sample_user("user_1");
        db.users().create(&user).unwrap();

        let found = db.users().find_by_clerk_id("user_1").unwrap().unwrap();
        assert_eq!(found.email, "user_1@example.com");
        assert_eq!(found.role, Role::Participant);

        let by_email = db.users().find_by_email("user_1@example.com").unwrap();
        assert!(by_email.is_some());
    }

    #[test]
    fn test_duplicate_clerk_id_conflicts() {
        let db = Database::open_in_memory().unwrap();
        db.users().create(&sample_user("user_1")).unwrap();

        let err = db.users().create(&sample_user("user_1")).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let db = Database::open_in_memory().unwrap();
        db.users().create(&sample_user("user_1")).unwrap();

        let mut other = sample_user("user_2");
        other.email = "user_1@example.com".into();
        let err = db.users().create(&other).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_update_missing_user() {
        let db = Database::open_in_memory().unwrap();
        let err = db.users().update(&sample_user("ghost")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
