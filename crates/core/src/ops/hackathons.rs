//! Hackathon operations: creation, approval, updates, registration

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::models::{
    Hackathon, HackathonMode, HackathonPatch, HackathonStatus, NewHackathon, Role, User,
};
use crate::storage::Database;

const MAX_TEAM_SIZE_LIMIT: u32 = 6;

fn require_user(db: &Database, clerk_id: &str) -> Result<User> {
    db.users()
        .find_by_clerk_id(clerk_id)?
        .ok_or_else(|| Error::NotFound(format!("User {clerk_id}")))
}

fn require_hackathon(db: &Database, id: i64) -> Result<Hackathon> {
    db.hackathons()
        .find_by_id(id)?
        .ok_or_else(|| Error::NotFound(format!("Hackathon {id}")))
}

/// Create a hackathon. Only organisers and admins may create; the
/// listing starts pending until an admin approves it.
#[instrument(skip(db, hackathon), fields(organiser_id = %hackathon.organiser_id))]
pub fn create_hackathon(db: &Database, hackathon: &NewHackathon) -> Result<Hackathon> {
    let user = require_user(db, &hackathon.organiser_id)?;
    if !matches!(user.role, Role::Organiser | Role::Admin) {
        return Err(Error::Unauthorized(
            "Only organisers can create hackathons".into(),
        ));
    }

    if hackathon.mode == HackathonMode::Offline
        && hackathon.address.as_deref().map_or(true, str::is_empty)
    {
        return Err(Error::Validation(
            "Offline hackathons require an address".into(),
        ));
    }
    if !(1..=MAX_TEAM_SIZE_LIMIT).contains(&hackathon.max_team_size) {
        return Err(Error::Validation(format!(
            "Max team size must be between 1 and {MAX_TEAM_SIZE_LIMIT}"
        )));
    }
    if hackathon.end_date <= hackathon.start_date {
        return Err(Error::Validation("End date must be after start date".into()));
    }
    if hackathon.registration_deadline > hackathon.start_date {
        return Err(Error::Validation(
            "Registration deadline must not be after the start date".into(),
        ));
    }

    let id = db.hackathons().create(hackathon)?;
    require_hackathon(db, id)
}

/// Approve a pending hackathon. Admin only; any other current state
/// conflicts because approval is a one-way pending exit.
#[instrument(skip(db))]
pub fn approve_hackathon(db: &Database, admin_id: &str, hackathon_id: i64) -> Result<Hackathon> {
    let admin = require_user(db, admin_id)?;
    if admin.role != Role::Admin {
        return Err(Error::Unauthorized(
            "Only admins can approve hackathons".into(),
        ));
    }

    let hackathon = require_hackathon(db, hackathon_id)?;
    if hackathon.status != HackathonStatus::Pending {
        return Err(Error::Conflict(format!(
            "Hackathon is {}, not pending",
            hackathon.status
        )));
    }

    db.hackathons()
        .set_status(hackathon_id, HackathonStatus::Approved)?;
    require_hackathon(db, hackathon_id)
}

/// Update hackathon details. Only the owning organiser may edit, and
/// winners can only be written once the event has expired.
#[instrument(skip(db, patch))]
pub fn update_hackathon_details(
    db: &Database,
    organiser_id: &str,
    hackathon_id: i64,
    patch: &HackathonPatch,
) -> Result<Hackathon> {
    let hackathon = require_hackathon(db, hackathon_id)?;
    if hackathon.organiser_id != organiser_id {
        return Err(Error::Unauthorized(
            "Only the organiser can update this hackathon".into(),
        ));
    }
    if patch.winners.is_some() && hackathon.status != HackathonStatus::Expired {
        return Err(Error::Conflict(
            "Winners can only be set after the hackathon ends".into(),
        ));
    }

    db.hackathons().update_details(hackathon_id, patch)?;
    require_hackathon(db, hackathon_id)
}

/// Register a user for a hackathon. Closed once the deadline passes.
#[instrument(skip(db))]
pub fn register_for_hackathon(
    db: &Database,
    user_id: &str,
    hackathon_id: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    require_user(db, user_id)?;
    let hackathon = require_hackathon(db, hackathon_id)?;

    if !matches!(
        hackathon.status,
        HackathonStatus::Approved | HackathonStatus::Live
    ) {
        return Err(Error::Conflict(format!(
            "Hackathon is {} and not open for registration",
            hackathon.status
        )));
    }
    if !hackathon.registration_open(now) {
        return Err(Error::Conflict("Registration closed".into()));
    }

    db.hackathons().register(hackathon_id, user_id)
}
