//! Domain service for profile reads, edits, and account suspension.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, instrument};

use super::ports::{
    ProfileCommands, ProfileQueries, ProfileRepository, ProfileView, SetAccountStatusRequest,
    UpdateProfileRequest,
};
use super::profile::{Actor, Profile, ProfileValidationError, Vehicle};
use super::ride_service::map_repository_error;
use super::Error;

/// Profile service; see [`ProfileCommands`] and [`ProfileQueries`].
pub struct ProfileService<P> {
    profiles: Arc<P>,
}

impl<P> ProfileService<P>
where
    P: ProfileRepository,
{
    /// Create a service over the given adapter.
    pub fn new(profiles: Arc<P>) -> Self {
        Self { profiles }
    }

    async fn require_profile(&self, user_id: uuid::Uuid) -> Result<Profile, Error> {
        self.profiles
            .find(user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("profile does not exist"))
    }
}

fn map_profile_validation(error: ProfileValidationError) -> Error {
    let field = match &error {
        ProfileValidationError::BlankDisplayName => "displayName",
        ProfileValidationError::BlankVehicleField { .. }
        | ProfileValidationError::VehicleWithoutDriverRole => "vehicle",
        _ => "profile",
    };
    Error::invalid_request(error.to_string()).with_details(json!({ "field": field }))
}

#[async_trait]
impl<P> ProfileQueries for ProfileService<P>
where
    P: ProfileRepository,
{
    async fn my_profile(&self, actor: Actor) -> Result<ProfileView, Error> {
        let profile = self
            .profiles
            .find(actor.id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized("no profile exists for this account"))?;
        Ok(ProfileView::from(&profile))
    }
}

#[async_trait]
impl<P> ProfileCommands for ProfileService<P>
where
    P: ProfileRepository,
{
    #[instrument(skip(self, request), fields(user_id = %actor.id))]
    async fn update_my_profile(
        &self,
        actor: Actor,
        request: UpdateProfileRequest,
    ) -> Result<ProfileView, Error> {
        let profile = self
            .profiles
            .find(actor.id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized("no profile exists for this account"))?;
        let vehicle = request
            .vehicle
            .map(|v| Vehicle::new(v.make, v.model, v.plate))
            .transpose()
            .map_err(map_profile_validation)?;
        let updated = profile
            .update(request.display_name, request.phone)
            .and_then(|p| p.with_vehicle(vehicle))
            .map_err(map_profile_validation)?;
        self.profiles
            .save(&updated)
            .await
            .map_err(map_repository_error)?;
        info!("profile updated");
        Ok(ProfileView::from(&updated))
    }

    #[instrument(skip(self, request), fields(admin_id = %actor.id, user_id = %request.user_id))]
    async fn set_account_status(
        &self,
        actor: Actor,
        request: SetAccountStatusRequest,
    ) -> Result<ProfileView, Error> {
        if !actor.is_admin() {
            return Err(Error::forbidden("only administrators change account status"));
        }
        let profile = self.require_profile(request.user_id).await?;
        let updated = profile.with_account_status(request.status);
        self.profiles
            .save(&updated)
            .await
            .map_err(map_repository_error)?;
        info!(status = %updated.account_status().as_str(), "account status changed");
        Ok(ProfileView::from(&updated))
    }
}
