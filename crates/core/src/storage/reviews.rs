//! Peer review storage operations

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::parse_datetime;
use crate::error::{Error, Result};
use crate::models::Review;

pub struct ReviewStore<'a> {
    conn: &'a Connection,
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        reviewer_id: row.get(1)?,
        reviewee_id: row.get(2)?,
        rating: row.get(3)?,
        comment: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

impl<'a> ReviewStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Store a review, returning its id
    #[instrument(skip(self), fields(reviewer_id = %reviewer_id, reviewee_id = %reviewee_id))]
    pub fn create(
        &self,
        reviewer_id: &str,
        reviewee_id: &str,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<i64> {
        if !(1..=5).contains(&rating) {
            return Err(Error::Validation("Rating must be between 1 and 5".into()));
        }
        if reviewer_id == reviewee_id {
            return Err(Error::Validation("Cannot review yourself".into()));
        }
        self.conn.execute(
            "INSERT INTO reviews (reviewer_id, reviewee_id, rating, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                reviewer_id,
                reviewee_id,
                rating,
                comment,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Reviews received by a user, newest first
    pub fn list_for_user(&self, reviewee_id: &str) -> Result<Vec<Review>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, reviewer_id, reviewee_id, rating, comment, created_at
             FROM reviews WHERE reviewee_id = ?1 ORDER BY created_at DESC",
        )?;

        let reviews = stmt
            .query_map(params![reviewee_id], review_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(reviews)
    }

    /// Mean rating for a user, None when unreviewed
    pub fn average_rating(&self, reviewee_id: &str) -> Result<Option<f64>> {
        let avg: Option<f64> = self.conn.query_row(
            "SELECT AVG(rating) FROM reviews WHERE reviewee_id = ?1",
            params![reviewee_id],
            |row| row.get(0),
        )?;
        Ok(avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use crate::storage::Database;

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
    fn test_rating_bounds() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a");
        seed_user(&db, "b");

        assert!(matches!(
            db.reviews().create("a", "b", 0, None).unwrap_err(),
            Error::Validation(_)
        ));
        assert!(matches!(
            db.reviews().create("a", "b", 6, None).unwrap_err(),
            Error::Validation(_)
        ));
        db.reviews().create("a", "b", 5, Some("great")).unwrap();
    }

    #[test]
    fn test_self_review_rejected() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a");

        let err = db.reviews().create("a", "a", 4, None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_average_rating() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a");
        seed_user(&db, "b");
        seed_user(&db, "c");

        assert!(db.reviews().average_rating("c").unwrap().is_none());

        db.reviews().create("a", "c", 4, None).unwrap();
        db.reviews().create("b", "c", 2, None).unwrap();
        let avg = db.reviews().average_rating("c").unwrap().unwrap();
        assert!((avg - 3.0).abs() < f64::EPSILON);
    }
}
