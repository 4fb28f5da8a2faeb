//! PostgreSQL-backed [`RatingRepository`] using Diesel.
//!
//! The unique index on `(ride_id, rater_id)` enforces one rating per party
//! per ride; a losing concurrent insert surfaces as
//! [`RepositoryError::Duplicate`] via the shared error mapping.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{RatingRepository, RepositoryError};
use crate::domain::Rating;

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::{NewRatingRow, RatingRow};
use super::pool::DbPool;
use super::schema::ratings;

/// Diesel-backed implementation of the rating repository port.
#[derive(Clone)]
pub struct DieselRatingRepository {
    pool: DbPool,
}

impl DieselRatingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_rating(row: RatingRow) -> Result<Rating, RepositoryError> {
    Rating::new(
        row.id,
        row.ride_id,
        row.rater_id,
        row.ratee_id,
        row.stars,
        row.comment,
        row.created_at,
    )
    .map_err(|err| RepositoryError::corrupted(format!("rating {}: {err}", row.id)))
}

#[async_trait]
impl RatingRepository for DieselRatingRepository {
    async fn insert(&self, rating: &Rating) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(ratings::table)
            .values(NewRatingRow {
                id: rating.id(),
                ride_id: rating.ride_id(),
                rater_id: rating.rater_id(),
                ratee_id: rating.ratee_id(),
                stars: rating.stars(),
                comment: rating.comment(),
                created_at: rating.created_at(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_ride_and_rater(
        &self,
        ride_id: Uuid,
        rater_id: Uuid,
    ) -> Result<Option<Rating>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = ratings::table
            .filter(
                ratings::ride_id
                    .eq(ride_id)
                    .and(ratings::rater_id.eq(rater_id)),
            )
            .select(RatingRow::as_select())
            .first::<RatingRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_rating).transpose()
    }

    async fn list_for_ratee(&self, ratee_id: Uuid) -> Result<Vec<Rating>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RatingRow> = ratings::table
            .filter(ratings::ratee_id.eq(ratee_id))
            .order(ratings::created_at.desc())
            .select(RatingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_rating).collect()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversion.

    use chrono::Utc;
    use rstest::rstest;

    use super::*;

    fn row(stars: i32) -> RatingRow {
        RatingRow {
            id: Uuid::new_v4(),
            ride_id: Uuid::new_v4(),
            rater_id: Uuid::new_v4(),
            ratee_id: Uuid::new_v4(),
            stars,
            comment: Some("Smooth trip".into()),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn valid_rows_restore() {
        let stored = row(4);
        let rating = row_to_rating(stored.clone()).expect("valid row");
        assert_eq!(rating.stars(), 4);
        assert_eq!(rating.comment(), Some("Smooth trip"));
        assert_eq!(rating.ratee_id(), stored.ratee_id);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    fn out_of_range_stars_are_corrupted(#[case] stars: i32) {
        assert!(matches!(
            row_to_rating(row(stars)),
            Err(RepositoryError::Corrupted(_))
        ));
    }
}
