//! Team formation operations
//!
//! Roster changes read the current member list and write back a
//! replacement inside one immediate transaction, so concurrent joins
//! serialize instead of both landing on the same snapshot. All team
//! changes freeze once the registration deadline passes.

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::models::{
    team_room_id, Hackathon, HackathonStatus, NewChatRoom, NewTeam, Role, Team,
};
use crate::roster::{self, RosterError};
use crate::storage::{ChatStore, Database, HackathonStore, TeamStore};

fn require_open_hackathon(
    hackathons: &HackathonStore<'_>,
    id: i64,
    now: DateTime<Utc>,
) -> Result<Hackathon> {
    let hackathon = hackathons
        .find_by_id(id)?
        .ok_or_else(|| Error::NotFound(format!("Hackathon {id}")))?;
    if !matches!(
        hackathon.status,
        HackathonStatus::Approved | HackathonStatus::Live
    ) {
        return Err(Error::Conflict(format!(
            "Hackathon is {}",
            hackathon.status
        )));
    }
    if !hackathon.registration_open(now) {
        return Err(Error::Conflict("Registration closed".into()));
    }
    Ok(hackathon)
}

/// Create a team. The leader must hold a registration, may lead only
/// one team per hackathon, and becomes the first member. The team's
/// chat room is created in the same transaction so no team ever
/// exists without one.
#[instrument(skip(db, team), fields(hackathon_id = team.hackathon_id, leader_id = %team.leader_id))]
pub fn create_team(db: &mut Database, team: &NewTeam, now: DateTime<Utc>) -> Result<Team> {
    let tx = db.immediate_transaction()?;

    let hackathons = HackathonStore::new(&tx);
    let hackathon = require_open_hackathon(&hackathons, team.hackathon_id, now)?;
    if !hackathons.is_registered(team.hackathon_id, &team.leader_id)? {
        return Err(Error::Conflict(
            "Register for the hackathon before creating a team".into(),
        ));
    }

    let teams = TeamStore::new(&tx);
    if teams
        .find_by_leader(team.hackathon_id, &team.leader_id)?
        .is_some()
    {
        return Err(Error::Conflict(
            "You already lead a team in this hackathon".into(),
        ));
    }
    if teams
        .find_for_member(team.hackathon_id, &team.leader_id)?
        .is_some()
    {
        return Err(Error::Conflict("Already in a team".into()));
    }

    let team_id = teams.create(team, hackathon.max_team_size)?;

    ChatStore::new(&tx).create_room(&NewChatRoom {
        room_id: team_room_id(team_id),
        is_group: true,
        is_open_group: false,
        participants: vec![team.leader_id.clone()],
        topic: Some(team.name.clone()),
        description: None,
        created_by: team.leader_id.clone(),
        project_id: None,
        team_id: Some(team_id),
    })?;

    tx.commit()?;

    db.teams()
        .find_by_id(team_id)?
        .ok_or_else(|| Error::NotFound(format!("Team {team_id}")))
}

/// Join a team by its code. The joiner must be registered for the
/// same hackathon; the roster and the team chat move together.
#[instrument(skip(db, code))]
pub fn join_team(
    db: &mut Database,
    user_id: &str,
    code: &str,
    now: DateTime<Utc>,
) -> Result<Team> {
    let tx = db.immediate_transaction()?;

    let teams = TeamStore::new(&tx);
    let team = teams
        .find_by_code(code)?
        .ok_or_else(|| Error::NotFound("Invalid team code".into()))?;

    let hackathons = HackathonStore::new(&tx);
    require_open_hackathon(&hackathons, team.hackathon_id, now)?;
    if !hackathons.is_registered(team.hackathon_id, user_id)? {
        return Err(Error::Conflict(
            "Register for the hackathon before joining a team".into(),
        ));
    }
    if teams.find_for_member(team.hackathon_id, user_id)?.is_some() {
        return Err(Error::Conflict("Already in a team".into()));
    }

    let members = roster::add(
        &team.members,
        user_id.to_string(),
        Some(team.max_members as usize),
    )
    .map_err(|e| match e {
        RosterError::AlreadyPresent => Error::Conflict("Already in team".into()),
        RosterError::Full(cap) => Error::Conflict(format!("Team full (max {cap} members)")),
        other => Error::Conflict(other.to_string()),
    })?;
    teams.set_members(team.id, &members)?;

    let chats = ChatStore::new(&tx);
    let room_id = team_room_id(team.id);
    if let Some(room) = chats.find_by_room_id(&room_id)? {
        if let Ok(participants) =
            roster::add(&room.participants, user_id.to_string(), None)
        {
            chats.set_participants(&room_id, &participants)?;
        }
    }

    let team_id = team.id;
    tx.commit()?;

    db.teams()
        .find_by_id(team_id)?
        .ok_or_else(|| Error::NotFound(format!("Team {team_id}")))
}

/// Leave a team. The leader cannot leave their own team; rosters are
/// frozen once registration closes.
#[instrument(skip(db))]
pub fn leave_team(
    db: &mut Database,
    user_id: &str,
    team_id: i64,
    now: DateTime<Utc>,
) -> Result<Team> {
    let tx = db.immediate_transaction()?;

    let teams = TeamStore::new(&tx);
    let team = teams
        .find_by_id(team_id)?
        .ok_or_else(|| Error::NotFound(format!("Team {team_id}")))?;

    let hackathons = HackathonStore::new(&tx);
    require_open_hackathon(&hackathons, team.hackathon_id, now)?;

    let members = roster::remove(
        &team.members,
        &user_id.to_string(),
        Some(&team.leader_id),
    )
    .map_err(|e| match e {
        RosterError::Protected => Error::Conflict("Cannot remove team leader".into()),
        RosterError::NotPresent => Error::Conflict("Not in team".into()),
        other => Error::Conflict(other.to_string()),
    })?;
    teams.set_members(team_id, &members)?;

    let chats = ChatStore::new(&tx);
    let room_id = team_room_id(team_id);
    if let Some(room) = chats.find_by_room_id(&room_id)? {
        if let Ok(participants) =
            roster::remove(&room.participants, &user_id.to_string(), None)
        {
            chats.set_participants(&room_id, &participants)?;
        }
    }

    tx.commit()?;

    db.teams()
        .find_by_id(team_id)?
        .ok_or_else(|| Error::NotFound(format!("Team {team_id}")))
}

/// List the teams of a hackathon. Restricted to the owning organiser
/// and admins.
#[instrument(skip(db))]
pub fn teams_of_hackathon(
    db: &Database,
    requester_id: &str,
    hackathon_id: i64,
) -> Result<Vec<Team>> {
    let requester = db
        .users()
        .find_by_clerk_id(requester_id)?
        .ok_or_else(|| Error::NotFound(format!("User {requester_id}")))?;
    let hackathon = db
        .hackathons()
        .find_by_id(hackathon_id)?
        .ok_or_else(|| Error::NotFound(format!("Hackathon {hackathon_id}")))?;

    if hackathon.organiser_id != requester_id && requester.role != Role::Admin {
        return Err(Error::Unauthorized(
            "Only the organiser can list teams".into(),
        ));
    }

    db.teams().list_for_hackathon(hackathon_id)
}

/// Record a winning team. Only the owning organiser, only once the
/// hackathon has expired, and each team at most once.
#[instrument(skip(db))]
pub fn announce_winner(
    db: &mut Database,
    organiser_id: &str,
    hackathon_id: i64,
    team_id: i64,
) -> Result<Hackathon> {
    let tx = db.immediate_transaction()?;

    let hackathons = HackathonStore::new(&tx);
    let hackathon = hackathons
        .find_by_id(hackathon_id)?
        .ok_or_else(|| Error::NotFound(format!("Hackathon {hackathon_id}")))?;
    if hackathon.organiser_id != organiser_id {
        return Err(Error::Unauthorized(
            "Only the organiser can announce winners".into(),
        ));
    }
    if hackathon.status != HackathonStatus::Expired {
        return Err(Error::Conflict(
            "Winners can only be announced after the hackathon ends".into(),
        ));
    }

    let team = TeamStore::new(&tx)
        .find_by_id(team_id)?
        .ok_or_else(|| Error::NotFound(format!("Team {team_id}")))?;
    if team.hackathon_id != hackathon_id {
        return Err(Error::Validation(
            "Team does not belong to this hackathon".into(),
        ));
    }

    let winners = roster::add(&hackathon.winners, team_id, None).map_err(|e| match e {
        RosterError::AlreadyPresent => Error::Conflict("Team already announced".into()),
        other => Error::Conflict(other.to_string()),
    })?;
    hackathons.set_winners(hackathon_id, &winners)?;

    tx.commit()?;

    db.hackathons()
        .find_by_id(hackathon_id)?
        .ok_or_else(|| Error::NotFound(format!("Hackathon {hackathon_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HackathonMode, NewHackathon, User};
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

    fn seed_live_hackathon(db: &Database, max_team_size: u32) -> Hackathon {
        let now = Utc::now();
        let id = db
            .hackathons()
            .create(&NewHackathon {
                organiser_id: "org".into(),
                name: "Hack Week".into(),
                description: None,
                mode: HackathonMode::Online,
                address: None,
                start_date: now + Duration::days(7),
                end_date: now + Duration::days(9),
                registration_deadline: now + Duration::days(5),
                max_team_size,
                prize_pool: None,
                tags: vec![],
            })
            .unwrap();
        db.hackathons()
            .set_status(id, HackathonStatus::Approved)
            .unwrap();
        db.hackathons().find_by_id(id).unwrap().unwrap()
    }

    fn register(db: &Database, hackathon_id: i64, user_id: &str) {
        db.hackathons().register(hackathon_id, user_id).unwrap();
    }

    fn setup() -> (Database, Hackathon) {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "org", Role::Organiser);
        seed_user(&db, "leader", Role::Participant);
        seed_user(&db, "member", Role::Participant);
        let hackathon = seed_live_hackathon(&db, 2);
        register(&db, hackathon.id, "leader");
        register(&db, hackathon.id, "member");
        (db, hackathon)
    }

    fn new_team(hackathon_id: i64) -> NewTeam {
        NewTeam {
            hackathon_id,
            leader_id: "leader".into(),
            name: "Rustaceans".into(),
        }
    }

    #[test]
    fn test_create_team_creates_chat_room() {
        let (mut db, hackathon) = setup();

        let team = create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();
        assert_eq!(team.members, vec!["leader"]);
        assert_eq!(team.max_members, 2);

        let room = db
            .chats()
            .find_by_room_id(&team_room_id(team.id))
            .unwrap()
            .unwrap();
        assert_eq!(room.participants, vec!["leader"]);
        assert_eq!(room.team_id, Some(team.id));
    }

    #[test]
    fn test_create_team_requires_registration() {
        let (mut db, hackathon) = setup();
        seed_user(&db, "stranger", Role::Participant);

        let mut team = new_team(hackathon.id);
        team.leader_id = "stranger".into();
        let err = create_team(&mut db, &team, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_one_team_per_leader() {
        let (mut db, hackathon) = setup();
        create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();

        let err = create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_join_adds_member_and_chat_participant() {
        let (mut db, hackathon) = setup();
        let team = create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();

        let joined = join_team(&mut db, "member", &team.team_code, Utc::now()).unwrap();
        assert_eq!(joined.members, vec!["leader", "member"]);

        let room = db
            .chats()
            .find_by_room_id(&team_room_id(team.id))
            .unwrap()
            .unwrap();
        assert!(room.has_participant("member"));
    }

    #[test]
    fn test_concurrent_joiners_race_for_last_slot() {
        // Two joiners on separate connections contend for the single
        // open slot. The loser must wait on the write lock, re-read
        // the roster and report Conflict, not a database error.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hackmate.db");

        let mut db = Database::open(&path).unwrap();
        seed_user(&db, "org", Role::Organiser);
        seed_user(&db, "leader", Role::Participant);
        seed_user(&db, "member", Role::Participant);
        seed_user(&db, "rival", Role::Participant);
        let hackathon = seed_live_hackathon(&db, 2);
        for id in ["leader", "member", "rival"] {
            register(&db, hackathon.id, id);
        }
        let team = create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();

        let rival_path = path.clone();
        let rival_code = team.team_code.clone();
        let rival = std::thread::spawn(move || {
            let mut db = Database::open(&rival_path).unwrap();
            join_team(&mut db, "rival", &rival_code, Utc::now())
        });

        let mine = join_team(&mut db, "member", &team.team_code, Utc::now());
        let theirs = rival.join().unwrap();

        // Exactly one winner; the loser sees a full team
        assert_ne!(mine.is_ok(), theirs.is_ok());
        let loser = if mine.is_ok() { theirs } else { mine };
        assert!(matches!(loser.unwrap_err(), Error::Conflict(_)));

        let final_team = db.teams().find_by_id(team.id).unwrap().unwrap();
        assert_eq!(final_team.members.len(), 2);
    }

    #[test]
    fn test_join_full_team_conflicts() {
        let (mut db, hackathon) = setup();
        seed_user(&db, "third", Role::Participant);
        register(&db, hackathon.id, "third");

        let team = create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();
        join_team(&mut db, "member", &team.team_code, Utc::now()).unwrap();

        // max_team_size is 2
        let err = join_team(&mut db, "third", &team.team_code, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_join_twice_conflicts() {
        let (mut db, hackathon) = setup();
        let team = create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();
        join_team(&mut db, "member", &team.team_code, Utc::now()).unwrap();

        let err = join_team(&mut db, "member", &team.team_code, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_join_after_deadline_conflicts() {
        let (mut db, hackathon) = setup();
        let team = create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();

        let late = hackathon.registration_deadline + Duration::minutes(1);
        let err = join_team(&mut db, "member", &team.team_code, late).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_leader_cannot_leave() {
        let (mut db, hackathon) = setup();
        let team = create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();

        let err = leave_team(&mut db, "leader", team.id, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_member_leaves_team_and_chat() {
        let (mut db, hackathon) = setup();
        let team = create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();
        join_team(&mut db, "member", &team.team_code, Utc::now()).unwrap();

        let left = leave_team(&mut db, "member", team.id, Utc::now()).unwrap();
        assert_eq!(left.members, vec!["leader"]);

        let room = db
            .chats()
            .find_by_room_id(&team_room_id(team.id))
            .unwrap()
            .unwrap();
        assert!(!room.has_participant("member"));
    }

    #[test]
    fn test_team_listing_is_organiser_only() {
        let (mut db, hackathon) = setup();
        create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();

        let err = teams_of_hackathon(&db, "leader", hackathon.id).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));

        let teams = teams_of_hackathon(&db, "org", hackathon.id).unwrap();
        assert_eq!(teams.len(), 1);
    }

    #[test]
    fn test_announce_winner_flow() {
        let (mut db, hackathon) = setup();
        let team = create_team(&mut db, &new_team(hackathon.id), Utc::now()).unwrap();

        // Not expired yet
        let err = announce_winner(&mut db, "org", hackathon.id, team.id).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        db.hackathons()
            .set_status(hackathon.id, HackathonStatus::Expired)
            .unwrap();

        let updated = announce_winner(&mut db, "org", hackathon.id, team.id).unwrap();
        assert_eq!(updated.winners, vec![team.id]);

        // Same team twice
        let err = announce_winner(&mut db, "org", hackathon.id, team.id).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }
}
