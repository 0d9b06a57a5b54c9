//! Follow graph operations

use tracing::instrument;

use crate::error::{Error, Result};
use crate::models::Follow;
use crate::storage::Database;

fn require_user(db: &Database, clerk_id: &str) -> Result<()> {
    if db.users().find_by_clerk_id(clerk_id)?.is_none() {
        return Err(Error::NotFound(format!("User {clerk_id}")));
    }
    Ok(())
}

/// Ask to follow another user
#[instrument(skip(db))]
pub fn follow_user(db: &Database, follower_id: &str, followed_id: &str) -> Result<Follow> {
    if follower_id == followed_id {
        return Err(Error::Validation("Cannot follow yourself".into()));
    }
    require_user(db, follower_id)?;
    require_user(db, followed_id)?;

    db.follows().create_request(follower_id, followed_id)?;
    db.follows()
        .find(follower_id, followed_id)?
        .ok_or_else(|| Error::NotFound("Follow request".into()))
}

/// Accept a pending follow request addressed to `followed_id`
#[instrument(skip(db))]
pub fn accept_follow(db: &Database, followed_id: &str, follower_id: &str) -> Result<()> {
    db.follows().accept(follower_id, followed_id)
}

/// Reject a pending follow request addressed to `followed_id`
#[instrument(skip(db))]
pub fn reject_follow(db: &Database, followed_id: &str, follower_id: &str) -> Result<()> {
    db.follows().reject(follower_id, followed_id)
}

/// Stop following a user
#[instrument(skip(db))]
pub fn unfollow(db: &Database, follower_id: &str, followed_id: &str) -> Result<()> {
    db.follows().remove(follower_id, followed_id)
}

/// Remove one of your own followers
#[instrument(skip(db))]
pub fn remove_follower(db: &Database, followed_id: &str, follower_id: &str) -> Result<()> {
    db.follows().remove(follower_id, followed_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};

    fn seed_user(db: &Database, id: &str) {
        let user = User::new(
            id.to_string(),
            format!("User {id}"),
            format!("{id}@example.com"),
            Role::Participant,
        );
        db.users().create(&user).unwrap();
    }

    #[test]
    fn test_self_follow_rejected() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a");

        let err = follow_user(&db, "a", "a").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_follow_unknown_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a");

        let err = follow_user(&db, "a", "ghost").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_remove_follower_drops_the_edge() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a");
        seed_user(&db, "b");

        follow_user(&db, "a", "b").unwrap();
        accept_follow(&db, "b", "a").unwrap();
        assert!(db.follows().is_following("a", "b").unwrap());

        remove_follower(&db, "b", "a").unwrap();
        assert!(!db.follows().is_following("a", "b").unwrap());
    }
}
