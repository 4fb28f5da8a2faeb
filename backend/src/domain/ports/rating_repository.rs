//! Driven port for rating persistence.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::engagement::Rating;

use super::RepositoryError;

/// Persistence operations for post-ride ratings.
///
/// The (ride, rater) pair is unique: each party rates the other at most
/// once per ride. Inserting a second rating for the pair fails with
/// [`RepositoryError::Duplicate`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Persist a new rating.
    async fn insert(&self, rating: &Rating) -> Result<(), RepositoryError>;

    /// The rating `rater_id` left on `ride_id`, if any.
    async fn find_by_ride_and_rater(
        &self,
        ride_id: Uuid,
        rater_id: Uuid,
    ) -> Result<Option<Rating>, RepositoryError>;

    /// All ratings received by `ratee_id`, newest first.
    async fn list_for_ratee(&self, ratee_id: Uuid) -> Result<Vec<Rating>, RepositoryError>;
}

/// In-memory [`RatingRepository`] for tests and local development.
#[derive(Debug, Default)]
pub struct FixtureRatingRepository {
    ratings: Mutex<Vec<Rating>>,
}

impl FixtureRatingRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Rating>>, RepositoryError> {
        self.ratings
            .lock()
            .map_err(|_| RepositoryError::backend("rating fixture lock poisoned"))
    }
}

#[async_trait]
impl RatingRepository for FixtureRatingRepository {
    async fn insert(&self, rating: &Rating) -> Result<(), RepositoryError> {
        let mut ratings = self.lock()?;
        if ratings
            .iter()
            .any(|r| r.ride_id() == rating.ride_id() && r.rater_id() == rating.rater_id())
        {
            return Err(RepositoryError::duplicate(format!(
                "ride {} was already rated by {}",
                rating.ride_id(),
                rating.rater_id()
            )));
        }
        ratings.push(rating.clone());
        Ok(())
    }

    async fn find_by_ride_and_rater(
        &self,
        ride_id: Uuid,
        rater_id: Uuid,
    ) -> Result<Option<Rating>, RepositoryError> {
        Ok(self
            .lock()?
            .iter()
            .find(|r| r.ride_id() == ride_id && r.rater_id() == rater_id)
            .cloned())
    }

    async fn list_for_ratee(&self, ratee_id: Uuid) -> Result<Vec<Rating>, RepositoryError> {
        let ratings = self.lock()?;
        let mut received: Vec<Rating> = ratings
            .iter()
            .filter(|r| r.ratee_id() == ratee_id)
            .cloned()
            .collect();
        received.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(received)
    }
}
