//! PostgreSQL-backed [`RideRepository`] using Diesel.
//!
//! Lifecycle writes are conditional updates whose predicate includes the
//! expected current status. PostgreSQL's row-level atomicity makes each
//! such update an arbitration point: of N racing writers, exactly one
//! matches the predicate and the rest see zero rows changed.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{RepositoryError, RideRepository};
use crate::domain::{GeoPoint, Location, Page, Ride, RideDraft, RideSearch, RideStatus, PAGE_SIZE};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::{NewRideRow, RideLifecycleUpdate, RideRow};
use super::pool::DbPool;
use super::schema::rides;

/// Diesel-backed implementation of the ride repository port.
#[derive(Clone)]
pub struct DieselRideRepository {
    pool: DbPool,
}

impl DieselRideRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn point(
    lat: Option<f64>,
    lng: Option<f64>,
    what: &str,
) -> Result<Option<GeoPoint>, RepositoryError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => GeoPoint::new(lat, lng)
            .map(Some)
            .map_err(|err| RepositoryError::corrupted(format!("{what}: {err}"))),
        (None, None) => Ok(None),
        _ => Err(RepositoryError::corrupted(format!(
            "{what} has only one coordinate axis"
        ))),
    }
}

fn location(
    text: String,
    lat: Option<f64>,
    lng: Option<f64>,
    what: &str,
) -> Result<Location, RepositoryError> {
    let coordinate = point(lat, lng, what)?;
    Location::new(text, coordinate)
        .ok_or_else(|| RepositoryError::corrupted(format!("{what} label is blank")))
}

/// Convert a database row into a validated domain ride.
fn row_to_ride(row: RideRow) -> Result<Ride, RepositoryError> {
    let RideRow {
        id,
        passenger_id,
        driver_id,
        pickup_text,
        pickup_lat,
        pickup_lng,
        destination_text,
        destination_lat,
        destination_lng,
        passengers_count,
        status,
        cancellation_reason,
        driver_lat,
        driver_lng,
        requested_at,
    } = row;

    let status: RideStatus = status
        .parse()
        .map_err(|err| RepositoryError::corrupted(format!("ride {id}: {err}")))?;
    let driver_position = point(driver_lat, driver_lng, "driver position")?;

    Ride::restore(
        RideDraft {
            id,
            passenger_id,
            pickup: location(pickup_text, pickup_lat, pickup_lng, "pickup")?,
            destination: location(
                destination_text,
                destination_lat,
                destination_lng,
                "destination",
            )?,
            passengers_count,
            requested_at,
        },
        status,
        driver_id,
        cancellation_reason,
        driver_position,
    )
    .map_err(|err| RepositoryError::corrupted(format!("ride {id}: {err}")))
}

fn ride_to_new_row(ride: &Ride) -> NewRideRow<'_> {
    NewRideRow {
        id: ride.id(),
        passenger_id: ride.passenger_id(),
        driver_id: ride.driver_id(),
        pickup_text: ride.pickup().text(),
        pickup_lat: ride.pickup().point().map(|p| p.lat()),
        pickup_lng: ride.pickup().point().map(|p| p.lng()),
        destination_text: ride.destination().text(),
        destination_lat: ride.destination().point().map(|p| p.lat()),
        destination_lng: ride.destination().point().map(|p| p.lng()),
        passengers_count: ride.passengers_count(),
        status: ride.status().as_str(),
        cancellation_reason: ride.cancellation_reason(),
        driver_lat: ride.driver_position().map(|p| p.lat()),
        driver_lng: ride.driver_position().map(|p| p.lng()),
        requested_at: ride.requested_at(),
    }
}

fn lifecycle_update(ride: &Ride) -> RideLifecycleUpdate<'_> {
    RideLifecycleUpdate {
        driver_id: ride.driver_id(),
        status: ride.status().as_str(),
        cancellation_reason: ride.cancellation_reason(),
        driver_lat: ride.driver_position().map(|p| p.lat()),
        driver_lng: ride.driver_position().map(|p| p.lng()),
    }
}

type BoxedRidesQuery<'a> = rides::BoxedQuery<'a, diesel::pg::Pg>;

/// The candidate predicate mirrored by [`RideSearch::matches`].
fn candidate_query<'a>(driver_id: Uuid, search: &'a RideSearch) -> BoxedRidesQuery<'a> {
    let mut query = rides::table
        .filter(rides::status.eq(RideStatus::Pending.as_str()))
        .filter(rides::driver_id.is_null())
        .filter(rides::passenger_id.ne(driver_id))
        .into_boxed();
    if let Some(pickup) = &search.pickup {
        query = query.filter(rides::pickup_text.ilike(like_pattern(pickup)));
    }
    if let Some(destination) = &search.destination {
        query = query.filter(rides::destination_text.ilike(like_pattern(destination)));
    }
    if let Some(count) = search.passengers_count {
        query = query.filter(rides::passengers_count.eq(count));
    }
    query
}

#[async_trait]
impl RideRepository for DieselRideRepository {
    async fn insert(&self, ride: &Ride) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(rides::table)
            .values(ride_to_new_row(ride))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(&self, ride_id: Uuid) -> Result<Option<Ride>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = rides::table
            .filter(rides::id.eq(ride_id))
            .select(RideRow::as_select())
            .first::<RideRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_ride).transpose()
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Ride>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = rides::table
            .filter(
                rides::passenger_id
                    .eq(user_id)
                    .or(rides::driver_id.eq(user_id)),
            )
            .filter(rides::status.eq_any([
                RideStatus::Pending.as_str(),
                RideStatus::Accepted.as_str(),
            ]))
            .select(RideRow::as_select())
            .first::<RideRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_ride).transpose()
    }

    async fn search_pending(
        &self,
        driver_id: Uuid,
        search: &RideSearch,
    ) -> Result<Page<Ride>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total = candidate_query(driver_id, search)
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows: Vec<RideRow> = candidate_query(driver_id, search)
            .order(rides::requested_at.desc())
            .offset(search.offset())
            .limit(PAGE_SIZE)
            .select(RideRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let items = rows
            .into_iter()
            .map(row_to_ride)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Ride>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RideRow> = rides::table
            .filter(
                rides::passenger_id
                    .eq(user_id)
                    .or(rides::driver_id.eq(user_id)),
            )
            .order(rides::requested_at.desc())
            .select(RideRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_ride).collect()
    }

    async fn try_accept(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<Option<Ride>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Arbitration: the predicate only matches an unclaimed pending row,
        // so of N racing drivers exactly one update reports a row.
        let row = diesel::update(
            rides::table.filter(
                rides::id
                    .eq(ride_id)
                    .and(rides::status.eq(RideStatus::Pending.as_str()))
                    .and(rides::driver_id.is_null())
                    .and(rides::passenger_id.ne(driver_id)),
            ),
        )
        .set((
            rides::status.eq(RideStatus::Accepted.as_str()),
            rides::driver_id.eq(driver_id),
        ))
        .returning(RideRow::as_returning())
        .get_result::<RideRow>(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        row.map(row_to_ride).transpose()
    }

    async fn save_transition(
        &self,
        ride: &Ride,
        expected_status: RideStatus,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changed = diesel::update(
            rides::table.filter(
                rides::id
                    .eq(ride.id())
                    .and(rides::status.eq(expected_status.as_str())),
            ),
        )
        .set(lifecycle_update(ride))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(changed > 0)
    }

    async fn delete(&self, ride_id: Uuid) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(rides::table.filter(rides::id.eq(ride_id)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversion and query building helpers.

    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn accepted_row() -> RideRow {
        RideRow {
            id: Uuid::new_v4(),
            passenger_id: Uuid::new_v4(),
            driver_id: Some(Uuid::new_v4()),
            pickup_text: "Central station".into(),
            pickup_lat: Some(48.85),
            pickup_lng: Some(2.35),
            destination_text: "Airport".into(),
            destination_lat: None,
            destination_lng: None,
            passengers_count: 2,
            status: "accepted".into(),
            cancellation_reason: None,
            driver_lat: Some(48.86),
            driver_lng: Some(2.36),
            requested_at: Utc::now(),
        }
    }

    #[rstest]
    fn valid_rows_restore_with_positions(accepted_row: RideRow) {
        let ride = row_to_ride(accepted_row.clone()).expect("valid row");
        assert_eq!(ride.status(), RideStatus::Accepted);
        assert_eq!(ride.driver_id(), accepted_row.driver_id);
        assert_eq!(
            ride.pickup().point().map(|p| p.lat()),
            accepted_row.pickup_lat
        );
        assert!(ride.driver_position().is_some());
    }

    #[rstest]
    fn half_a_coordinate_is_corrupted(mut accepted_row: RideRow) {
        accepted_row.pickup_lng = None;
        assert!(matches!(
            row_to_ride(accepted_row),
            Err(RepositoryError::Corrupted(_))
        ));
    }

    #[rstest]
    fn unknown_status_is_corrupted(mut accepted_row: RideRow) {
        accepted_row.status = "scheduled".into();
        assert!(matches!(
            row_to_ride(accepted_row),
            Err(RepositoryError::Corrupted(_))
        ));
    }

    #[rstest]
    fn accepted_row_without_driver_is_corrupted(mut accepted_row: RideRow) {
        accepted_row.driver_id = None;
        accepted_row.driver_lat = None;
        accepted_row.driver_lng = None;
        assert!(matches!(
            row_to_ride(accepted_row),
            Err(RepositoryError::Corrupted(_))
        ));
    }

    #[rstest]
    #[case("plain", "%plain%")]
    #[case("50%", "%50\\%%")]
    #[case("a_b", "%a\\_b%")]
    #[case("back\\slash", "%back\\\\slash%")]
    fn like_patterns_escape_wildcards(#[case] needle: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(needle), expected);
    }

    #[rstest]
    fn new_row_mirrors_the_ride(accepted_row: RideRow) {
        let ride = row_to_ride(accepted_row).expect("valid row");
        let row = ride_to_new_row(&ride);
        assert_eq!(row.id, ride.id());
        assert_eq!(row.status, "accepted");
        assert_eq!(row.driver_lat, ride.driver_position().map(|p| p.lat()));
    }
}
