//! Feed request operations

use tracing::instrument;

use crate::error::{Error, Result};
use crate::models::{FeedRequest, FeedRequestKind, FeedRequestStatus, NewFeedRequest};
use crate::storage::Database;

/// Send a feed request. Project requests must point at an existing
/// project and are addressed to its owner.
#[instrument(skip(db, request), fields(sender_id = %request.sender_id, receiver_id = %request.receiver_id))]
pub fn send_feed_request(db: &Database, request: &NewFeedRequest) -> Result<FeedRequest> {
    if request.sender_id == request.receiver_id {
        return Err(Error::Validation("Cannot send a request to yourself".into()));
    }
    if db.users().find_by_clerk_id(&request.sender_id)?.is_none() {
        return Err(Error::NotFound(format!("User {}", request.sender_id)));
    }
    if db.users().find_by_clerk_id(&request.receiver_id)?.is_none() {
        return Err(Error::NotFound(format!("User {}", request.receiver_id)));
    }

    match request.kind {
        FeedRequestKind::Project => {
            let project_id = request.project_id.ok_or_else(|| {
                Error::Validation("Project requests need a project id".into())
            })?;
            let project = db
                .projects()
                .find_by_id(project_id)?
                .ok_or_else(|| Error::NotFound(format!("Project {project_id}")))?;
            if project.owner_id != request.receiver_id {
                return Err(Error::Validation(
                    "Project requests go to the project owner".into(),
                ));
            }
        }
        FeedRequestKind::Person => {
            if request.project_id.is_some() {
                return Err(Error::Validation(
                    "Person requests carry no project id".into(),
                ));
            }
        }
    }

    let id = db.feed().create(request)?;
    db.feed()
        .find_by_id(id)?
        .ok_or_else(|| Error::NotFound(format!("Feed request {id}")))
}

/// Requests waiting on a user's decision plus ones already resolved
#[instrument(skip(db))]
pub fn inbox(db: &Database, user_id: &str) -> Result<Vec<FeedRequest>> {
    db.feed().list_for_receiver(user_id)
}

/// Requests a user has sent
#[instrument(skip(db))]
pub fn outbox(db: &Database, user_id: &str) -> Result<Vec<FeedRequest>> {
    db.feed().list_for_sender(user_id)
}

/// Resolve a request. Only the receiver may decide, and only while
/// the request is still pending.
#[instrument(skip(db))]
pub fn resolve_feed_request(
    db: &Database,
    receiver_id: &str,
    request_id: i64,
    approve: bool,
) -> Result<FeedRequest> {
    let request = db
        .feed()
        .find_by_id(request_id)?
        .ok_or_else(|| Error::NotFound(format!("Feed request {request_id}")))?;
    if request.receiver_id != receiver_id {
        return Err(Error::Unauthorized(
            "Only the receiver can resolve this request".into(),
        ));
    }

    let status = if approve {
        FeedRequestStatus::Approved
    } else {
        FeedRequestStatus::Rejected
    };
    db.feed().set_status(request_id, status)?;

    db.feed()
        .find_by_id(request_id)?
        .ok_or_else(|| Error::NotFound(format!("Feed request {request_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProject, Role, User};

    fn seed_user(db: &Database, id: &str) {
        let user = User::new(
            id.to_string(),
            format!("User {id}"),
            format!("{id}@example.com"),
            Role::Participant,
        );
        db.users().create(&user).unwrap();
    }

    fn person_request(sender: &str, receiver: &str) -> NewFeedRequest {
        NewFeedRequest {
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            kind: FeedRequestKind::Person,
            project_id: None,
            message: None,
        }
    }

    #[test]
    fn test_project_request_must_target_owner() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "owner");
        seed_user(&db, "asker");
        seed_user(&db, "bystander");
        let project_id = db
            .projects()
            .create(&NewProject::new(
                "owner".into(),
                "proj".into(),
                "A Project".into(),
                "short".into(),
                "big".into(),
            ))
            .unwrap();

        let mut request = person_request("asker", "bystander");
        request.kind = FeedRequestKind::Project;
        request.project_id = Some(project_id);
        let err = send_feed_request(&db, &request).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        request.receiver_id = "owner".into();
        let sent = send_feed_request(&db, &request).unwrap();
        assert_eq!(sent.status, FeedRequestStatus::Pending);
    }

    #[test]
    fn test_project_request_requires_project_id() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a");
        seed_user(&db, "b");

        let mut request = person_request("a", "b");
        request.kind = FeedRequestKind::Project;
        let err = send_feed_request(&db, &request).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_only_receiver_resolves() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a");
        seed_user(&db, "b");

        let sent = send_feed_request(&db, &person_request("a", "b")).unwrap();

        let err = resolve_feed_request(&db, "a", sent.id, true).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));

        let resolved = resolve_feed_request(&db, "b", sent.id, true).unwrap();
        assert_eq!(resolved.status, FeedRequestStatus::Approved);

        // A second decision conflicts
        let err = resolve_feed_request(&db, "b", sent.id, false).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_self_request_rejected() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a");

        let err = send_feed_request(&db, &person_request("a", "a")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_inbox_and_outbox() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a");
        seed_user(&db, "b");

        send_feed_request(&db, &person_request("a", "b")).unwrap();
        assert_eq!(inbox(&db, "b").unwrap().len(), 1);
        assert_eq!(outbox(&db, "a").unwrap().len(), 1);
        assert!(inbox(&db, "a").unwrap().is_empty());
    }
}
