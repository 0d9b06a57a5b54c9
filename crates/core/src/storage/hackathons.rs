//! Hackathon storage operations
//!
//! Row access plus the two bulk status updates the lifecycle sweep
//! relies on. Status writes here are unconditional SQL; transition
//! legality is enforced by the ops layer and the sweep's WHERE
//! clauses.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{
    hackathon_mode_from_str, hackathon_status_from_str, parse_datetime, parse_json, OptionalExt,
};
use crate::error::{Error, Result};
use crate::models::{Hackathon, HackathonPatch, HackathonStatus, NewHackathon};

pub struct HackathonStore<'a> {
    conn: &'a Connection,
}

const HACKATHON_COLUMNS: &str = "id, organiser_id, name, description, mode, address, start_date, \
     end_date, registration_deadline, max_team_size, prize_pool, tags, status, winners, \
     created_at, updated_at";

fn hackathon_from_row(row: &Row<'_>) -> rusqlite::Result<Hackathon> {
    Ok(Hackathon {
        id: row.get(0)?,
        organiser_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        mode: hackathon_mode_from_str(&row.get::<_, String>(4)?),
        address: row.get(5)?,
        start_date: parse_datetime(&row.get::<_, String>(6)?)?,
        end_date: parse_datetime(&row.get::<_, String>(7)?)?,
        registration_deadline: parse_datetime(&row.get::<_, String>(8)?)?,
        max_team_size: row.get(9)?,
        prize_pool: row.get(10)?,
        tags: parse_json(&row.get::<_, String>(11)?)?,
        status: hackathon_status_from_str(&row.get::<_, String>(12)?),
        winners: parse_json(&row.get::<_, String>(13)?)?,
        created_at: parse_datetime(&row.get::<_, String>(14)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(15)?)?,
    })
}

impl<'a> HackathonStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a hackathon in pending state, returning its id
    #[instrument(skip(self, hackathon), fields(organiser_id = %hackathon.organiser_id))]
    pub fn create(&self, hackathon: &NewHackathon) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO hackathons
                (organiser_id, name, description, mode, address, start_date, end_date,
                 registration_deadline, max_team_size, prize_pool, tags, status, winners,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'pending', '[]', ?12, ?13)",
            params![
                hackathon.organiser_id,
                hackathon.name,
                hackathon.description,
                hackathon.mode.as_str(),
                hackathon.address,
                hackathon.start_date.to_rfc3339(),
                hackathon.end_date.to_rfc3339(),
                hackathon.registration_deadline.to_rfc3339(),
                hackathon.max_team_size,
                hackathon.prize_pool,
                serde_json::to_string(&hackathon.tags)?,
                now,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find hackathon by id
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: i64) -> Result<Option<Hackathon>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HACKATHON_COLUMNS} FROM hackathons WHERE id = ?1"
        ))?;

        let hackathon = stmt.query_row(params![id], hackathon_from_row).optional()?;

        Ok(hackathon)
    }

    /// List hackathons visible to participants (everything past approval)
    pub fn list_public(&self) -> Result<Vec<Hackathon>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HACKATHON_COLUMNS} FROM hackathons
             WHERE status != 'pending' ORDER BY start_date"
        ))?;

        let hackathons = stmt
            .query_map([], hackathon_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(hackathons)
    }

    /// List hackathons created by an organiser, any status
    pub fn list_for_organiser(&self, organiser_id: &str) -> Result<Vec<Hackathon>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HACKATHON_COLUMNS} FROM hackathons
             WHERE organiser_id = ?1 ORDER BY created_at DESC"
        ))?;

        let hackathons = stmt
            .query_map(params![organiser_id], hackathon_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(hackathons)
    }

    /// Apply a partial update to schedule and descriptive fields
    pub fn update_details(&self, id: i64, patch: &HackathonPatch) -> Result<()> {
        let current = self
            .find_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("Hackathon {id}")))?;

        let name = patch.name.as_ref().unwrap_or(&current.name);
        let description = patch.description.as_ref().or(current.description.as_ref());
        let address = patch.address.as_ref().or(current.address.as_ref());
        let start = patch.start_date.unwrap_or(current.start_date);
        let end = patch.end_date.unwrap_or(current.end_date);
        let deadline = patch
            .registration_deadline
            .unwrap_or(current.registration_deadline);
        let prize_pool = patch.prize_pool.as_ref().or(current.prize_pool.as_ref());
        let tags = patch.tags.as_ref().unwrap_or(&current.tags);
        let winners = patch.winners.as_ref().unwrap_or(&current.winners);

        self.conn.execute(
            "UPDATE hackathons SET name = ?1, description = ?2, address = ?3, start_date = ?4,
                end_date = ?5, registration_deadline = ?6, prize_pool = ?7, tags = ?8,
                winners = ?9, updated_at = ?10
             WHERE id = ?11",
            params![
                name,
                description,
                address,
                start.to_rfc3339(),
                end.to_rfc3339(),
                deadline.to_rfc3339(),
                prize_pool,
                serde_json::to_string(tags)?,
                serde_json::to_string(winners)?,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        Ok(())
    }

    /// Advance the lifecycle status. Transitions are monotonic;
    /// moving sideways or backwards conflicts.
    pub fn set_status(&self, id: i64, status: HackathonStatus) -> Result<()> {
        let current = self
            .find_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("Hackathon {id}")))?;
        if !current.status.can_advance_to(status) {
            return Err(Error::Conflict(format!(
                "Cannot move a {} hackathon to {}",
                current.status, status
            )));
        }
        self.conn.execute(
            "UPDATE hackathons SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Replace the winners roster
    pub fn set_winners(&self, id: i64, winners: &[i64]) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE hackathons SET winners = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                serde_json::to_string(winners)?,
                Utc::now().to_rfc3339(),
                id
            ],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Hackathon {id}")));
        }
        Ok(())
    }

    /// Expire approved or live hackathons whose end date has passed.
    /// Returns the number of rows flipped.
    pub fn expire_ended(&self, now: DateTime<Utc>) -> Result<u64> {
        let count = self.conn.execute(
            "UPDATE hackathons SET status = 'expired', updated_at = ?1
             WHERE status IN ('approved', 'live') AND end_date < ?1",
            params![now.to_rfc3339()],
        )?;
        Ok(count as u64)
    }

    /// Move approved hackathons inside their window to live.
    /// Returns the number of rows flipped.
    pub fn go_live(&self, now: DateTime<Utc>) -> Result<u64> {
        let count = self.conn.execute(
            "UPDATE hackathons SET status = 'live', updated_at = ?1
             WHERE status = 'approved' AND start_date <= ?1 AND end_date >= ?1",
            params![now.to_rfc3339()],
        )?;
        Ok(count as u64)
    }

    /// Register a user for a hackathon
    #[instrument(skip(self))]
    pub fn register(&self, hackathon_id: i64, user_id: &str) -> Result<()> {
        if self.is_registered(hackathon_id, user_id)? {
            return Err(Error::Conflict("Already registered".into()));
        }
        self.conn.execute(
            "INSERT INTO hackathon_registrations (hackathon_id, user_id, registered_at)
             VALUES (?1, ?2, ?3)",
            params![hackathon_id, user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Whether a user holds a registration for a hackathon
    pub fn is_registered(&self, hackathon_id: i64, user_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM hackathon_registrations
             WHERE hackathon_id = ?1 AND user_id = ?2",
            params![hackathon_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List registered user ids for a hackathon
    pub fn list_registrations(&self, hackathon_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id FROM hackathon_registrations
             WHERE hackathon_id = ?1 ORDER BY registered_at",
        )?;

        let users = stmt
            .query_map(params![hackathon_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HackathonMode, Role, User};
    use crate::storage::Database;
    use chrono::Duration;

    fn seed_user(db: &Database, id: &str, role: Role) {
        let user = User::new(
            id.to_string(),
            format!("User {id}"),
            format!("{id}@example.com"),
            role,
        );
        db.users().create(&user).unwrap();
    }

    fn sample_hackathon(organiser: &str) -> NewHackathon {
        let now = Utc::now();
        NewHackathon {
            organiser_id: organiser.to_string(),
            name: "Hack Week".into(),
            description: None,
            mode: HackathonMode::Online,
            address: None,
            start_date: now + Duration::days(7),
            end_date: now + Duration::days(9),
            registration_deadline: now + Duration::days(5),
            max_team_size: 4,
            prize_pool: None,
            tags: vec!["ai".into()],
        }
    }

    #[test]
    fn test_create_starts_pending() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);

        let id = db.hackathons().create(&sample_hackathon("org")).unwrap();
        let hackathon = db.hackathons().find_by_id(id).unwrap().unwrap();
        assert_eq!(hackathon.status, HackathonStatus::Pending);
        assert!(hackathon.winners.is_empty());
    }

    #[test]
    fn test_set_status_is_monotonic() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);

        let id = db.hackathons().create(&sample_hackathon("org")).unwrap();
        db.hackathons()
            .set_status(id, HackathonStatus::Live)
            .unwrap();

        // Backwards and sideways moves conflict
        let err = db
            .hackathons()
            .set_status(id, HackathonStatus::Approved)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        let err = db
            .hackathons()
            .set_status(id, HackathonStatus::Live)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        assert_eq!(
            db.hackathons().find_by_id(id).unwrap().unwrap().status,
            HackathonStatus::Live
        );
    }

    #[test]
    fn test_dates_round_trip_losslessly() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);

        let input = sample_hackathon("org");
        let id = db.hackathons().create(&input).unwrap();
        let fetched = db.hackathons().find_by_id(id).unwrap().unwrap();

        assert_eq!(fetched.start_date, input.start_date);
        assert_eq!(fetched.end_date, input.end_date);
        assert_eq!(fetched.registration_deadline, input.registration_deadline);
    }

    #[test]
    fn test_public_listing_hides_pending() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);

        let pending = db.hackathons().create(&sample_hackathon("org")).unwrap();
        let approved = db.hackathons().create(&sample_hackathon("org")).unwrap();
        db.hackathons()
            .set_status(approved, HackathonStatus::Approved)
            .unwrap();

        let listed = db.hackathons().list_public().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, approved);
        assert_ne!(listed[0].id, pending);
    }

    #[test]
    fn test_expire_ended_only_touches_past_events() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);
        let now = Utc::now();

        let mut past = sample_hackathon("org");
        past.start_date = now - Duration::days(3);
        past.end_date = now - Duration::days(1);
        let past_id = db.hackathons().create(&past).unwrap();
        db.hackathons()
            .set_status(past_id, HackathonStatus::Live)
            .unwrap();

        let future_id = db.hackathons().create(&sample_hackathon("org")).unwrap();
        db.hackathons()
            .set_status(future_id, HackathonStatus::Approved)
            .unwrap();

        let expired = db.hackathons().expire_ended(now).unwrap();
        assert_eq!(expired, 1);
        assert_eq!(
            db.hackathons().find_by_id(past_id).unwrap().unwrap().status,
            HackathonStatus::Expired
        );
        assert_eq!(
            db.hackathons()
                .find_by_id(future_id)
                .unwrap()
                .unwrap()
                .status,
            HackathonStatus::Approved
        );
    }

    #[test]
    fn test_go_live_skips_pending() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);
        let now = Utc::now();

        let mut running = sample_hackathon("org");
        running.start_date = now - Duration::hours(1);
        running.end_date = now + Duration::days(1);
        let id = db.hackathons().create(&running).unwrap();

        // Still pending, sweep must not touch it
        assert_eq!(db.hackathons().go_live(now).unwrap(), 0);

        db.hackathons()
            .set_status(id, HackathonStatus::Approved)
            .unwrap();
        assert_eq!(db.hackathons().go_live(now).unwrap(), 1);
        assert_eq!(
            db.hackathons().find_by_id(id).unwrap().unwrap().status,
            HackathonStatus::Live
        );
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);
        seed_user(&db, "user_1", Role::Participant);

        let id = db.hackathons().create(&sample_hackathon("org")).unwrap();
        db.hackathons().register(id, "user_1").unwrap();
        assert!(db.hackathons().is_registered(id, "user_1").unwrap());

        let err = db.hackathons().register(id, "user_1").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }
}
