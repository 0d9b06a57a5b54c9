//! SQLite storage layer for Hackmate

mod chats;
mod feed;
mod follows;
mod hackathons;
mod migrations;
mod parse;
mod profiles;
mod projects;
mod reviews;
mod teams;
mod users;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::Result;

pub use chats::ChatStore;
pub use feed::FeedStore;
pub use follows::FollowStore;
pub use hackathons::HackathonStore;
pub use profiles::ProfileStore;
pub use projects::ProjectStore;
pub use reviews::ReviewStore;
pub use teams::TeamStore;
pub use users::UserStore;

/// How long a writer waits on a contended database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        // A second writer waits for the lock instead of failing with
        // DatabaseBusy, then re-reads and reports roster conflicts.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Begin a write transaction that takes the database lock up front.
    /// Roster mutations go through this so concurrent writers serialize
    /// on read-modify-write cycles.
    pub(crate) fn immediate_transaction(&mut self) -> Result<Transaction<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(tx)
    }

    /// Get user store
    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.conn)
    }

    /// Get profile store
    pub fn profiles(&self) -> ProfileStore<'_> {
        ProfileStore::new(&self.conn)
    }

    /// Get project store
    pub fn projects(&self) -> ProjectStore<'_> {
        ProjectStore::new(&self.conn)
    }

    /// Get hackathon store
    pub fn hackathons(&self) -> HackathonStore<'_> {
        HackathonStore::new(&self.conn)
    }

    /// Get team store
    pub fn teams(&self) -> TeamStore<'_> {
        TeamStore::new(&self.conn)
    }

    /// Get chat store
    pub fn chats(&self) -> ChatStore<'_> {
        ChatStore::new(&self.conn)
    }

    /// Get follow store
    pub fn follows(&self) -> FollowStore<'_> {
        FollowStore::new(&self.conn)
    }

    /// Get feed store
    pub fn feed(&self) -> FeedStore<'_> {
        FeedStore::new(&self.conn)
    }

    /// Get review store
    pub fn reviews(&self) -> ReviewStore<'_> {
        ReviewStore::new(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};

    #[test]
    fn test_open_applies_schema() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.schema_version() > 0);
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hackmate.db");

        {
            let db = Database::open(&path).unwrap();
            let user = User::new(
                "user_1".into(),
                "User".into(),
                "user@example.com".into(),
                Role::Participant,
            );
            db.users().create(&user).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let found = db.users().find_by_clerk_id("user_1").unwrap();
        assert!(found.is_some());
    }
}
