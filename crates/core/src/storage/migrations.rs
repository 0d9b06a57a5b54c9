//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Users table (keyed by identity provider id)
            CREATE TABLE IF NOT EXISTS users (
                clerk_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone_number TEXT,
                role TEXT NOT NULL DEFAULT 'participant',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- General profile details, 1:1 with users
            CREATE TABLE IF NOT EXISTS user_details (
                clerk_id TEXT PRIMARY KEY,
                bio TEXT,
                portfolio_links TEXT NOT NULL DEFAULT '[]',
                tags TEXT NOT NULL DEFAULT '[]',
                skills TEXT NOT NULL DEFAULT '[]',
                interests TEXT,
                socials TEXT NOT NULL DEFAULT '{}',
                ongoing_project_links TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (clerk_id) REFERENCES users(clerk_id) ON DELETE CASCADE
            );

            -- Mentor profiles, 1:1 with mentor users
            CREATE TABLE IF NOT EXISTS mentor_profiles (
                clerk_id TEXT PRIMARY KEY,
                skills TEXT NOT NULL DEFAULT '[]',
                tags TEXT NOT NULL DEFAULT '[]',
                bio TEXT,
                FOREIGN KEY (clerk_id) REFERENCES users(clerk_id) ON DELETE CASCADE
            );

            -- Organiser profiles, 1:1 with organiser users
            CREATE TABLE IF NOT EXISTS organiser_profiles (
                clerk_id TEXT PRIMARY KEY,
                organization TEXT,
                website TEXT,
                bio TEXT,
                socials TEXT NOT NULL DEFAULT '{}',
                tags TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (clerk_id) REFERENCES users(clerk_id) ON DELETE CASCADE
            );

            -- Project listings
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                title TEXT NOT NULL,
                short_description TEXT NOT NULL,
                big_description TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                progress INTEGER,
                duration TEXT,
                goals TEXT,
                skills_required TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'open',
                links TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(clerk_id) ON DELETE CASCADE
            );

            -- Hackathon listings
            CREATE TABLE IF NOT EXISTS hackathons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                organiser_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                mode TEXT NOT NULL DEFAULT 'online',
                address TEXT,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                registration_deadline TEXT NOT NULL,
                max_team_size INTEGER NOT NULL DEFAULT 4,
                prize_pool TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'pending',
                winners TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (organiser_id) REFERENCES users(clerk_id)
            );

            -- Individual hackathon registrations
            CREATE TABLE IF NOT EXISTS hackathon_registrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hackathon_id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                registered_at TEXT NOT NULL,
                FOREIGN KEY (hackathon_id) REFERENCES hackathons(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(clerk_id) ON DELETE CASCADE,
                UNIQUE(hackathon_id, user_id)
            );

            -- Teams with JSON member roster
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hackathon_id INTEGER NOT NULL,
                leader_id TEXT NOT NULL,
                name TEXT NOT NULL,
                team_code TEXT NOT NULL UNIQUE,
                max_members INTEGER NOT NULL,
                members TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                FOREIGN KEY (hackathon_id) REFERENCES hackathons(id) ON DELETE CASCADE,
                FOREIGN KEY (leader_id) REFERENCES users(clerk_id)
            );

            -- Chat rooms with JSON participant roster
            CREATE TABLE IF NOT EXISTS chat_rooms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id TEXT NOT NULL UNIQUE,
                is_group INTEGER NOT NULL DEFAULT 0,
                is_open_group INTEGER NOT NULL DEFAULT 0,
                participants TEXT NOT NULL DEFAULT '[]',
                topic TEXT,
                description TEXT,
                created_by TEXT NOT NULL,
                project_id INTEGER,
                team_id INTEGER,
                created_at TEXT NOT NULL,
                FOREIGN KEY (created_by) REFERENCES users(clerk_id),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (team_id) REFERENCES teams(id) ON DELETE CASCADE
            );

            -- Messages table
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (room_id) REFERENCES chat_rooms(room_id) ON DELETE CASCADE,
                FOREIGN KEY (sender_id) REFERENCES users(clerk_id)
            );

            -- Directional follow edges with approval step
            CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                follower_id TEXT NOT NULL,
                followed_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (follower_id) REFERENCES users(clerk_id) ON DELETE CASCADE,
                FOREIGN KEY (followed_id) REFERENCES users(clerk_id) ON DELETE CASCADE,
                UNIQUE(follower_id, followed_id)
            );

            -- Feed requests (project join asks and person outreach)
            CREATE TABLE IF NOT EXISTS feed_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id TEXT NOT NULL,
                receiver_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                project_id INTEGER,
                message TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (sender_id) REFERENCES users(clerk_id) ON DELETE CASCADE,
                FOREIGN KEY (receiver_id) REFERENCES users(clerk_id) ON DELETE CASCADE,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            -- Peer reviews
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reviewer_id TEXT NOT NULL,
                reviewee_id TEXT NOT NULL,
                rating INTEGER NOT NULL,
                comment TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (reviewer_id) REFERENCES users(clerk_id) ON DELETE CASCADE,
                FOREIGN KEY (reviewee_id) REFERENCES users(clerk_id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for query performance",
        sql: r#"
            -- Hackathon indexes (sweep scans status + schedule)
            CREATE INDEX IF NOT EXISTS idx_hackathons_status ON hackathons(status);
            CREATE INDEX IF NOT EXISTS idx_hackathons_organiser ON hackathons(organiser_id);
            CREATE INDEX IF NOT EXISTS idx_hackathons_status_end ON hackathons(status, end_date);

            -- Registration indexes
            CREATE INDEX IF NOT EXISTS idx_registrations_user ON hackathon_registrations(user_id);
            CREATE INDEX IF NOT EXISTS idx_registrations_hackathon ON hackathon_registrations(hackathon_id);

            -- Team indexes
            CREATE INDEX IF NOT EXISTS idx_teams_hackathon ON teams(hackathon_id);
            CREATE INDEX IF NOT EXISTS idx_teams_leader ON teams(leader_id);

            -- Message indexes
            CREATE INDEX IF NOT EXISTS idx_messages_room ON messages(room_id);
            CREATE INDEX IF NOT EXISTS idx_messages_room_created ON messages(room_id, created_at);

            -- Follow indexes (queried from both sides)
            CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows(follower_id);
            CREATE INDEX IF NOT EXISTS idx_follows_followed ON follows(followed_id);
            CREATE INDEX IF NOT EXISTS idx_follows_status ON follows(status);

            -- Feed request indexes
            CREATE INDEX IF NOT EXISTS idx_feed_requests_receiver ON feed_requests(receiver_id);
            CREATE INDEX IF NOT EXISTS idx_feed_requests_sender ON feed_requests(sender_id);

            -- Project and review indexes
            CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id);
            CREATE INDEX IF NOT EXISTS idx_reviews_reviewee ON reviews(reviewee_id);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;
    info!(current_version, "Checking for pending migrations");

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            conn.execute_batch(migration.sql)?;
            record_migration(conn, migration)?;

            info!(version = migration.version, "Migration complete");
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Get the latest migration version (test helper)
    fn latest_version() -> u32 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn test_migrations_run() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Run twice
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_sequential() {
        // Verify migrations are numbered sequentially
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(
                migration.version as usize,
                i + 1,
                "Migration {} should have version {}",
                migration.description,
                i + 1
            );
        }
    }
}
