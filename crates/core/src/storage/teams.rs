//! Team storage operations
//!
//! The member roster is a JSON column replaced wholesale through
//! `set_members`. Callers mutate it inside an immediate transaction so
//! two joiners cannot both read the same snapshot.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{parse_datetime, parse_json, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{generate_team_code, NewTeam, Team};

pub struct TeamStore<'a> {
    conn: &'a Connection,
}

const TEAM_COLUMNS: &str =
    "id, hackathon_id, leader_id, name, team_code, max_members, members, created_at";

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        hackathon_id: row.get(1)?,
        leader_id: row.get(2)?,
        name: row.get(3)?,
        team_code: row.get(4)?,
        max_members: row.get(5)?,
        members: parse_json(&row.get::<_, String>(6)?)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
    })
}

impl<'a> TeamStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a team with a freshly generated unique join code. The
    /// leader is inserted as the only member.
    #[instrument(skip(self, team), fields(hackathon_id = team.hackathon_id, leader_id = %team.leader_id))]
    pub fn create(&self, team: &NewTeam, max_members: u32) -> Result<i64> {
        let code = self.generate_unique_code()?;
        let members = serde_json::to_string(&[&team.leader_id])?;
        self.conn.execute(
            "INSERT INTO teams (hackathon_id, leader_id, name, team_code, max_members, members, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                team.hackathon_id,
                team.leader_id,
                team.name,
                code,
                max_members,
                members,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn generate_unique_code(&self) -> Result<String> {
        // Collisions are rare at 36^6 codes; retry a few times rather
        // than loop unbounded.
        for _ in 0..10 {
            let code = generate_team_code();
            if !self.code_exists(&code)? {
                return Ok(code);
            }
        }
        Err(Error::Conflict("Could not allocate a team code".into()))
    }

    /// Whether a join code is already taken (case-insensitive)
    pub fn code_exists(&self, code: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM teams WHERE team_code = ?1 COLLATE NOCASE",
            params![code],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Find team by id
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: i64) -> Result<Option<Team>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"))?;

        let team = stmt.query_row(params![id], team_from_row).optional()?;

        Ok(team)
    }

    /// Find team by join code, case-insensitive
    #[instrument(skip(self))]
    pub fn find_by_code(&self, code: &str) -> Result<Option<Team>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE team_code = ?1 COLLATE NOCASE"
        ))?;

        let team = stmt.query_row(params![code], team_from_row).optional()?;

        Ok(team)
    }

    /// Find the team a user leads in a hackathon
    pub fn find_by_leader(&self, hackathon_id: i64, leader_id: &str) -> Result<Option<Team>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE hackathon_id = ?1 AND leader_id = ?2"
        ))?;

        let team = stmt
            .query_row(params![hackathon_id, leader_id], team_from_row)
            .optional()?;

        Ok(team)
    }

    /// Find the team a user belongs to in a hackathon, if any
    pub fn find_for_member(&self, hackathon_id: i64, clerk_id: &str) -> Result<Option<Team>> {
        let teams = self.list_for_hackathon(hackathon_id)?;
        Ok(teams.into_iter().find(|t| t.has_member(clerk_id)))
    }

    /// List all teams in a hackathon
    pub fn list_for_hackathon(&self, hackathon_id: i64) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE hackathon_id = ?1 ORDER BY created_at"
        ))?;

        let teams = stmt
            .query_map(params![hackathon_id], team_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(teams)
    }

    /// Replace the member roster with a new value
    pub fn set_members(&self, id: i64, members: &[String]) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE teams SET members = ?1 WHERE id = ?2",
            params![serde_json::to_string(members)?, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Team {id}")));
        }
        Ok(())
    }

    /// Delete a team (team chat cascades)
    pub fn delete(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM teams WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("Team {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HackathonMode, NewHackathon, Role, User};
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

    fn seed_hackathon(db: &Database, organiser: &str) -> i64 {
        let now = Utc::now();
        db.hackathons()
            .create(&NewHackathon {
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
                tags: vec![],
            })
            .unwrap()
    }

    #[test]
    fn test_create_seeds_leader_as_member() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);
        seed_user(&db, "leader", Role::Participant);
        let hackathon_id = seed_hackathon(&db, "org");

        let id = db
            .teams()
            .create(
                &NewTeam {
                    hackathon_id,
                    leader_id: "leader".into(),
                    name: "Rustaceans".into(),
                },
                4,
            )
            .unwrap();

        let team = db.teams().find_by_id(id).unwrap().unwrap();
        assert_eq!(team.members, vec!["leader"]);
        assert_eq!(team.team_code.len(), 6);
    }

    #[test]
    fn test_code_lookup_ignores_case() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);
        seed_user(&db, "leader", Role::Participant);
        let hackathon_id = seed_hackathon(&db, "org");

        let id = db
            .teams()
            .create(
                &NewTeam {
                    hackathon_id,
                    leader_id: "leader".into(),
                    name: "Rustaceans".into(),
                },
                4,
            )
            .unwrap();
        let team = db.teams().find_by_id(id).unwrap().unwrap();

        let lower = team.team_code.to_lowercase();
        let found = db.teams().find_by_code(&lower).unwrap().unwrap();
        assert_eq!(found.id, id);
    }

    #[test]
    fn test_set_members_replaces_roster() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);
        seed_user(&db, "leader", Role::Participant);
        let hackathon_id = seed_hackathon(&db, "org");

        let id = db
            .teams()
            .create(
                &NewTeam {
                    hackathon_id,
                    leader_id: "leader".into(),
                    name: "Rustaceans".into(),
                },
                4,
            )
            .unwrap();

        db.teams()
            .set_members(id, &["leader".into(), "member".into()])
            .unwrap();
        let team = db.teams().find_by_id(id).unwrap().unwrap();
        assert_eq!(team.members.len(), 2);
        assert!(team.has_member("member"));
    }
}
