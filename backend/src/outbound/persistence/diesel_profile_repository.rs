//! PostgreSQL-backed [`ProfileRepository`] using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ProfileRepository, RepositoryError};
use crate::domain::{Profile, Vehicle};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::{NewProfileRow, ProfileRow};
use super::pool::DbPool;
use super::schema::profiles;

/// Diesel-backed implementation of the profile repository port.
#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_profile(row: ProfileRow) -> Result<Profile, RepositoryError> {
    let corrupted = |err: &dyn std::fmt::Display| {
        RepositoryError::corrupted(format!("profile {}: {err}", row.id))
    };
    let role = row.role.parse().map_err(|err| corrupted(&err))?;
    let account_status = row.account_status.parse().map_err(|err| corrupted(&err))?;
    let vehicle = match (&row.vehicle_make, &row.vehicle_model, &row.vehicle_plate) {
        (Some(make), Some(model), Some(plate)) => Some(
            Vehicle::new(make.as_str(), model.as_str(), plate.as_str())
                .map_err(|err| corrupted(&err))?,
        ),
        (None, None, None) => None,
        _ => {
            return Err(corrupted(&"vehicle descriptor is incomplete"));
        }
    };
    Profile::restore(
        row.id,
        row.display_name.clone(),
        row.phone.clone(),
        role,
        account_status,
        row.created_at,
    )
    .and_then(|profile| profile.with_vehicle(vehicle))
    .map_err(|err| RepositoryError::corrupted(format!("profile {}: {err}", row.id)))
}

fn profile_to_new_row(profile: &Profile) -> NewProfileRow<'_> {
    NewProfileRow {
        id: profile.id(),
        display_name: profile.display_name(),
        phone: profile.phone(),
        role: profile.role().as_str(),
        account_status: profile.account_status().as_str(),
        vehicle_make: profile.vehicle().map(Vehicle::make),
        vehicle_model: profile.vehicle().map(Vehicle::model),
        vehicle_plate: profile.vehicle().map(Vehicle::plate),
        created_at: profile.created_at(),
    }
}

#[async_trait]
impl ProfileRepository for DieselProfileRepository {
    async fn find(&self, user_id: Uuid) -> Result<Option<Profile>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = profiles::table
            .filter(profiles::id.eq(user_id))
            .select(ProfileRow::as_select())
            .first::<ProfileRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_profile).transpose()
    }

    async fn find_many(&self, user_ids: &[Uuid]) -> Result<Vec<Profile>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ProfileRow> = profiles::table
            .filter(profiles::id.eq_any(user_ids))
            .select(ProfileRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_profile).collect()
    }

    async fn save(&self, profile: &Profile) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = profile_to_new_row(profile);
        diesel::insert_into(profiles::table)
            .values(&row)
            .on_conflict(profiles::id)
            .do_update()
            .set((
                profiles::display_name.eq(row.display_name),
                profiles::phone.eq(row.phone),
                profiles::role.eq(row.role),
                profiles::account_status.eq(row.account_status),
                profiles::vehicle_make.eq(row.vehicle_make),
                profiles::vehicle_model.eq(row.vehicle_model),
                profiles::vehicle_plate.eq(row.vehicle_plate),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversion.

    use chrono::Utc;
    use rstest::{fixture, rstest};

    use crate::domain::{AccountStatus, Role};

    use super::*;

    #[fixture]
    fn stored_row() -> ProfileRow {
        ProfileRow {
            id: Uuid::new_v4(),
            display_name: "Mara".into(),
            phone: Some("+33123456789".into()),
            role: "admin".into(),
            account_status: "active".into(),
            vehicle_make: None,
            vehicle_model: None,
            vehicle_plate: None,
            created_at: Utc::now(),
        }
    }

    fn driver_row() -> ProfileRow {
        ProfileRow {
            role: "driver".into(),
            vehicle_make: Some("Toyota".into()),
            vehicle_model: Some("Prius".into()),
            vehicle_plate: Some("B-RX 421".into()),
            ..stored_row()
        }
    }

    #[rstest]
    fn valid_rows_restore(stored_row: ProfileRow) {
        let profile = row_to_profile(stored_row.clone()).expect("valid row");
        assert_eq!(profile.id(), stored_row.id);
        assert_eq!(profile.role(), Role::Admin);
        assert_eq!(profile.account_status(), AccountStatus::Active);
        assert_eq!(profile.phone(), Some("+33123456789"));
    }

    #[rstest]
    fn driver_rows_carry_the_vehicle() {
        let profile = row_to_profile(driver_row()).expect("valid row");
        let vehicle = profile.vehicle().expect("vehicle restored");
        assert_eq!(vehicle.make(), "Toyota");
        assert_eq!(vehicle.plate(), "B-RX 421");
    }

    #[rstest]
    fn partial_vehicle_rows_are_corrupted() {
        let mut row = driver_row();
        row.vehicle_plate = None;
        assert!(matches!(
            row_to_profile(row),
            Err(RepositoryError::Corrupted(_))
        ));
    }

    #[rstest]
    #[case::role("role")]
    #[case::account_status("account_status")]
    fn unknown_enums_are_corrupted(mut stored_row: ProfileRow, #[case] field: &str) {
        match field {
            "role" => stored_row.role = "owner".into(),
            _ => stored_row.account_status = "frozen".into(),
        }
        assert!(matches!(
            row_to_profile(stored_row),
            Err(RepositoryError::Corrupted(_))
        ));
    }

    #[rstest]
    fn new_rows_mirror_the_profile() {
        let profile = row_to_profile(driver_row()).expect("valid row");
        let row = profile_to_new_row(&profile);
        assert_eq!(row.id, profile.id());
        assert_eq!(row.role, "driver");
        assert_eq!(row.account_status, "active");
        assert_eq!(row.vehicle_plate, Some("B-RX 421"));
    }
}
