//! Driven port for ride persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::matching::{Page, RideSearch, PAGE_SIZE};
use crate::domain::ride::{Ride, RideStatus};

use super::RepositoryError;

/// Persistence operations for rides.
///
/// Lifecycle writes are guarded: [`RideRepository::try_accept`] and
/// [`RideRepository::save_transition`] are conditional updates whose
/// predicate includes the expected current status, and they report whether
/// a row actually changed. Arbitration between racing writers happens here,
/// on the store's atomicity, never in service code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RideRepository: Send + Sync {
    /// Persist a freshly requested ride.
    async fn insert(&self, ride: &Ride) -> Result<(), RepositoryError>;

    /// Load a ride by identity.
    async fn find(&self, ride_id: Uuid) -> Result<Option<Ride>, RepositoryError>;

    /// Find a non-terminal ride where `user_id` is passenger or driver.
    async fn find_active_for_user(&self, user_id: Uuid)
        -> Result<Option<Ride>, RepositoryError>;

    /// One page of pending candidates for `driver_id`, newest first.
    async fn search_pending(
        &self,
        driver_id: Uuid,
        search: &RideSearch,
    ) -> Result<Page<Ride>, RepositoryError>;

    /// All rides where `user_id` is passenger or driver, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Ride>, RepositoryError>;

    /// Atomically claim a pending, unassigned ride for `driver_id`.
    ///
    /// Returns the updated ride when the claim won, or `None` when the
    /// conditional update matched zero rows because another driver got
    /// there first or the ride left the pending state.
    async fn try_accept(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<Option<Ride>, RepositoryError>;

    /// Write `ride` only if the stored row still holds `expected_status`.
    ///
    /// Returns `false` when the guard failed and nothing was written.
    async fn save_transition(
        &self,
        ride: &Ride,
        expected_status: RideStatus,
    ) -> Result<bool, RepositoryError>;

    /// Remove a ride row. Callers must have checked the ride is terminal.
    async fn delete(&self, ride_id: Uuid) -> Result<(), RepositoryError>;
}

/// In-memory [`RideRepository`] for tests and local development.
///
/// Guarded writes take the map lock for the whole read-check-write, which
/// gives the same exactly-one-winner behaviour the SQL adapter gets from
/// conditional updates.
#[derive(Debug, Default)]
pub struct FixtureRideRepository {
    rides: Mutex<HashMap<Uuid, Ride>>,
}

impl FixtureRideRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with existing rides.
    pub fn with_rides(rides: impl IntoIterator<Item = Ride>) -> Self {
        let map = rides.into_iter().map(|r| (r.id(), r)).collect();
        Self {
            rides: Mutex::new(map),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Ride>>, RepositoryError> {
        self.rides
            .lock()
            .map_err(|_| RepositoryError::backend("ride fixture lock poisoned"))
    }
}

#[async_trait]
impl RideRepository for FixtureRideRepository {
    async fn insert(&self, ride: &Ride) -> Result<(), RepositoryError> {
        let mut rides = self.lock()?;
        if rides.contains_key(&ride.id()) {
            return Err(RepositoryError::duplicate(format!(
                "ride {} already exists",
                ride.id()
            )));
        }
        rides.insert(ride.id(), ride.clone());
        Ok(())
    }

    async fn find(&self, ride_id: Uuid) -> Result<Option<Ride>, RepositoryError> {
        Ok(self.lock()?.get(&ride_id).cloned())
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Ride>, RepositoryError> {
        Ok(self
            .lock()?
            .values()
            .find(|r| !r.status().is_terminal() && r.is_participant(user_id))
            .cloned())
    }

    async fn search_pending(
        &self,
        driver_id: Uuid,
        search: &RideSearch,
    ) -> Result<Page<Ride>, RepositoryError> {
        let rides = self.lock()?;
        let mut candidates: Vec<Ride> = rides
            .values()
            .filter(|r| search.matches(r, driver_id))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| b.requested_at().cmp(&a.requested_at()));
        let total = i64::try_from(candidates.len()).unwrap_or(i64::MAX);
        let offset = usize::try_from(search.offset()).unwrap_or(usize::MAX);
        let page_size = usize::try_from(PAGE_SIZE).unwrap_or(usize::MAX);
        let items = candidates.into_iter().skip(offset).take(page_size).collect();
        Ok(Page { items, total })
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Ride>, RepositoryError> {
        let rides = self.lock()?;
        let mut mine: Vec<Ride> = rides
            .values()
            .filter(|r| r.is_participant(user_id))
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.requested_at().cmp(&a.requested_at()));
        Ok(mine)
    }

    async fn try_accept(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<Option<Ride>, RepositoryError> {
        let mut rides = self.lock()?;
        let Some(ride) = rides.get(&ride_id) else {
            return Ok(None);
        };
        if ride.status() != RideStatus::Pending || ride.driver_id().is_some() {
            return Ok(None);
        }
        match ride.clone().accept(driver_id) {
            Ok(accepted) => {
                rides.insert(ride_id, accepted.clone());
                Ok(Some(accepted))
            }
            Err(_) => Ok(None),
        }
    }

    async fn save_transition(
        &self,
        ride: &Ride,
        expected_status: RideStatus,
    ) -> Result<bool, RepositoryError> {
        let mut rides = self.lock()?;
        let Some(stored) = rides.get(&ride.id()) else {
            return Ok(false);
        };
        if stored.status() != expected_status {
            return Ok(false);
        }
        rides.insert(ride.id(), ride.clone());
        Ok(true)
    }

    async fn delete(&self, ride_id: Uuid) -> Result<(), RepositoryError> {
        self.lock()?.remove(&ride_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use chrono::Utc;
    use rstest::rstest;

    use crate::domain::ride::{Location, RideDraft};

    use super::*;

    fn pending_ride() -> Ride {
        Ride::request(RideDraft {
            id: Uuid::new_v4(),
            passenger_id: Uuid::new_v4(),
            pickup: Location::new("Old town", None).expect("non-blank pickup"),
            destination: Location::new("Harbour", None).expect("non-blank destination"),
            passengers_count: 1,
            requested_at: Utc::now(),
        })
        .expect("valid draft")
    }

    #[rstest]
    #[actix_rt::test]
    async fn try_accept_claims_a_pending_ride_once() {
        let ride = pending_ride();
        let repo = FixtureRideRepository::with_rides([ride.clone()]);
        let winner = Uuid::new_v4();
        let loser = Uuid::new_v4();

        let first = repo.try_accept(ride.id(), winner).await.expect("no fault");
        let second = repo.try_accept(ride.id(), loser).await.expect("no fault");

        assert_eq!(first.and_then(|r| r.driver_id()), Some(winner));
        assert!(second.is_none());
    }

    #[rstest]
    #[actix_rt::test]
    async fn save_transition_refuses_a_stale_guard() {
        let ride = pending_ride();
        let repo = FixtureRideRepository::with_rides([ride.clone()]);
        let driver = Uuid::new_v4();
        let accepted = repo
            .try_accept(ride.id(), driver)
            .await
            .expect("no fault")
            .expect("claim wins");

        let completed = accepted.complete(driver).expect("driver completes");
        assert!(repo
            .save_transition(&completed, RideStatus::Accepted)
            .await
            .expect("no fault"));
        // Second writer still expects `accepted`; the row has moved on.
        assert!(!repo
            .save_transition(&completed, RideStatus::Accepted)
            .await
            .expect("no fault"));
    }

    #[rstest]
    #[actix_rt::test]
    async fn duplicate_insert_is_reported() {
        let ride = pending_ride();
        let repo = FixtureRideRepository::new();
        repo.insert(&ride).await.expect("first insert");
        assert!(matches!(
            repo.insert(&ride).await,
            Err(RepositoryError::Duplicate(_))
        ));
    }

    #[rstest]
    #[actix_rt::test]
    async fn search_orders_newest_first_and_paginates() {
        let mut rides = Vec::new();
        for i in 0..25 {
            let mut draft = RideDraft {
                id: Uuid::new_v4(),
                passenger_id: Uuid::new_v4(),
                pickup: Location::new("Stop", None).expect("non-blank pickup"),
                destination: Location::new("End", None).expect("non-blank destination"),
                passengers_count: 1,
                requested_at: Utc::now(),
            };
            draft.requested_at += chrono::Duration::seconds(i);
            rides.push(Ride::request(draft).expect("valid draft"));
        }
        let newest = rides.last().map(Ride::id);
        let repo = FixtureRideRepository::with_rides(rides);

        let page = repo
            .search_pending(Uuid::new_v4(), &RideSearch::default())
            .await
            .expect("no fault");
        assert_eq!(page.total, 25);
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.items.first().map(Ride::id), newest);

        let second = repo
            .search_pending(
                Uuid::new_v4(),
                &RideSearch {
                    page: 1,
                    ..RideSearch::default()
                },
            )
            .await
            .expect("no fault");
        assert_eq!(second.items.len(), 5);
    }
}
