//! Domain service implementing the ride lifecycle commands and queries.
//!
//! Writes follow load → transition → guarded save: the entity applies the
//! lifecycle rules, the repository applies them again atomically, and a
//! failed guard surfaces as a conflict carrying the refreshed record so
//! clients can update without a second round trip. Events publish only
//! after the write commits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::events::{RideEvent, RideEventKind};
use super::matching::{Page, RideSearch};
use super::ports::{
    BrowsePendingRequest, CancelRideRequest, ProfileRepository, ReportPositionRequest,
    RepositoryError, RequestRideRequest, RideCommands, RideEvents, RideQueries, RideRepository,
    RideView,
};
use super::profile::{Actor, Profile, Role};
use super::ride::{
    CancellationReason, GeoPoint, Location, Ride, RideDraft, RideStatus, RideTransitionError,
};
use super::Error;

/// Fraction of the remaining distance covered by one simulated step.
const SIMULATION_STEP: f64 = 0.1;

/// Ride lifecycle service; see [`RideCommands`] and [`RideQueries`].
pub struct RideService<R, P, E> {
    rides: Arc<R>,
    profiles: Arc<P>,
    events: Arc<E>,
    simulation_enabled: bool,
}

impl<R, P, E> RideService<R, P, E>
where
    R: RideRepository,
    P: ProfileRepository,
    E: RideEvents,
{
    /// Create a service over the given adapters.
    pub fn new(rides: Arc<R>, profiles: Arc<P>, events: Arc<E>, simulation_enabled: bool) -> Self {
        Self {
            rides,
            profiles,
            events,
            simulation_enabled,
        }
    }

    async fn require_active_profile(&self, actor: Actor) -> Result<Profile, Error> {
        let profile = self
            .profiles
            .find(actor.id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized("no profile exists for this account"))?;
        if profile.is_blocked() {
            return Err(Error::forbidden(format!(
                "this account is {}",
                profile.account_status().as_str()
            )));
        }
        Ok(profile)
    }

    async fn require_ride(&self, ride_id: Uuid) -> Result<Ride, Error> {
        self.rides
            .find(ride_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("ride does not exist"))
    }

    async fn reject_second_active_ride(&self, user_id: Uuid) -> Result<(), Error> {
        if let Some(active) = self
            .rides
            .find_active_for_user(user_id)
            .await
            .map_err(map_repository_error)?
        {
            return Err(Error::conflict("you already have an active ride")
                .with_details(json!({ "code": "active_ride_exists", "rideId": active.id() })));
        }
        Ok(())
    }

    async fn view(&self, ride: &Ride) -> Result<RideView, Error> {
        let passenger = self
            .profiles
            .find(ride.passenger_id())
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::internal("passenger profile is missing"))?;
        let driver = match ride.driver_id() {
            Some(driver_id) => Some(
                self.profiles
                    .find(driver_id)
                    .await
                    .map_err(map_repository_error)?
                    .ok_or_else(|| Error::internal("driver profile is missing"))?,
            ),
            None => None,
        };
        Ok(RideView::assemble(ride, &passenger, driver.as_ref()))
    }

    async fn views(&self, rides: &[Ride]) -> Result<Vec<RideView>, Error> {
        let mut ids: Vec<Uuid> = rides.iter().map(Ride::passenger_id).collect();
        ids.extend(rides.iter().filter_map(Ride::driver_id));
        ids.sort_unstable();
        ids.dedup();
        let profiles = self
            .profiles
            .find_many(&ids)
            .await
            .map_err(map_repository_error)?;
        let by_id: std::collections::HashMap<Uuid, &Profile> =
            profiles.iter().map(|p| (p.id(), p)).collect();
        rides
            .iter()
            .map(|ride| {
                let passenger = by_id
                    .get(&ride.passenger_id())
                    .ok_or_else(|| Error::internal("passenger profile is missing"))?;
                let driver = match ride.driver_id() {
                    Some(driver_id) => Some(
                        *by_id
                            .get(&driver_id)
                            .ok_or_else(|| Error::internal("driver profile is missing"))?,
                    ),
                    None => None,
                };
                Ok(RideView::assemble(ride, passenger, driver))
            })
            .collect()
    }

    async fn conflict_with_refresh(&self, ride_id: Uuid, message: &str) -> Error {
        let mut error = Error::conflict(message);
        if let Ok(Some(current)) = self.rides.find(ride_id).await {
            if let Ok(view) = self.view(&current).await {
                if let Ok(value) = serde_json::to_value(&view) {
                    error = error.with_details(json!({ "code": "stale_state", "ride": value }));
                }
            }
        }
        error
    }

    async fn commit_transition(
        &self,
        ride: &Ride,
        expected: RideStatus,
        kind: RideEventKind,
    ) -> Result<(), Error> {
        let written = self
            .rides
            .save_transition(ride, expected)
            .await
            .map_err(map_repository_error)?;
        if !written {
            return Err(self
                .conflict_with_refresh(ride.id(), "ride changed underneath this request")
                .await);
        }
        self.events.publish(event(kind, ride));
        Ok(())
    }
}

fn event(kind: RideEventKind, ride: &Ride) -> RideEvent {
    RideEvent {
        kind,
        ride_id: ride.id(),
        passenger_id: ride.passenger_id(),
        driver_id: ride.driver_id(),
        status: ride.status(),
    }
}

/// Translate repository faults into domain errors.
pub(crate) fn map_repository_error(error: RepositoryError) -> Error {
    match error {
        RepositoryError::Unavailable(message) => {
            Error::service_unavailable(format!("storage is unavailable: {message}"))
        }
        RepositoryError::Backend(message) => {
            Error::internal(format!("storage operation failed: {message}"))
        }
        RepositoryError::Corrupted(message) => {
            Error::internal(format!("stored record is invalid: {message}"))
        }
        RepositoryError::Duplicate(message) => Error::conflict(message),
    }
}

fn map_transition_error(error: RideTransitionError) -> Error {
    match error {
        RideTransitionError::InvalidTransition { from, to } => {
            Error::conflict(error.to_string()).with_details(json!({
                "code": "invalid_transition",
                "from": from.as_str(),
                "to": to.as_str(),
            }))
        }
        RideTransitionError::AlreadyApplied { status } => Error::conflict(error.to_string())
            .with_details(json!({ "code": "already_applied", "status": status.as_str() })),
        RideTransitionError::SelfAccept
        | RideTransitionError::NotAssignedDriver
        | RideTransitionError::NotRequester
        | RideTransitionError::NotParticipant => Error::forbidden(error.to_string()),
    }
}

fn parse_location(field: &str, text: &str, point: Option<GeoPoint>) -> Result<Location, Error> {
    Location::new(text, point).ok_or_else(|| {
        Error::invalid_request(format!("{field} must not be blank"))
            .with_details(json!({ "field": field, "code": "blank" }))
    })
}

#[async_trait]
impl<R, P, E> RideCommands for RideService<R, P, E>
where
    R: RideRepository,
    P: ProfileRepository,
    E: RideEvents,
{
    #[instrument(skip(self, request), fields(subject_id = %actor.id, passenger_id = %request.passenger_id))]
    async fn request_ride(
        &self,
        actor: Actor,
        request: RequestRideRequest,
    ) -> Result<RideView, Error> {
        if request.passenger_id != actor.id && !actor.is_admin() {
            return Err(Error::forbidden(
                "rides can only be requested for your own account",
            ));
        }
        // Payload validation is pure and runs before any repository call.
        let pickup = parse_location("pickup", &request.pickup_text, request.pickup_point)?;
        let destination = parse_location(
            "destination",
            &request.destination_text,
            request.destination_point,
        )?;
        let ride = Ride::request(RideDraft {
            id: Uuid::new_v4(),
            passenger_id: request.passenger_id,
            pickup,
            destination,
            passengers_count: request.passengers_count,
            requested_at: Utc::now(),
        })
        .map_err(|e| {
            Error::invalid_request(e.to_string())
                .with_details(json!({ "field": "passengersCount", "code": "out_of_range" }))
        })?;

        let passenger = self
            .profiles
            .find(request.passenger_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| {
                if request.passenger_id == actor.id {
                    Error::unauthorized("no profile exists for this account")
                } else {
                    Error::not_found("passenger does not exist")
                }
            })?;
        if passenger.role() != Role::Passenger {
            return Err(Error::forbidden("only passenger accounts request rides"));
        }
        if passenger.is_blocked() {
            return Err(Error::forbidden(format!(
                "this account is {}",
                passenger.account_status().as_str()
            )));
        }
        self.reject_second_active_ride(request.passenger_id).await?;

        self.rides
            .insert(&ride)
            .await
            .map_err(map_repository_error)?;
        self.events.publish(event(RideEventKind::Requested, &ride));
        info!(ride_id = %ride.id(), "ride requested");
        Ok(RideView::assemble(&ride, &passenger, None))
    }

    #[instrument(skip(self), fields(driver_id = %actor.id, %ride_id))]
    async fn accept_ride(&self, actor: Actor, ride_id: Uuid) -> Result<RideView, Error> {
        let driver = self.require_active_profile(actor).await?;
        if driver.role() != Role::Driver {
            return Err(Error::forbidden("only driver accounts accept rides"));
        }
        self.reject_second_active_ride(actor.id).await?;

        let ride = self.require_ride(ride_id).await?;
        // Surfaces self-acceptance and off-table transitions before the
        // guarded write, which only ever reports win-or-lose.
        ride.clone().accept(actor.id).map_err(map_transition_error)?;

        let accepted = self
            .rides
            .try_accept(ride_id, actor.id)
            .await
            .map_err(map_repository_error)?;
        let Some(accepted) = accepted else {
            return Err(self
                .conflict_with_refresh(ride_id, "ride was just taken by another driver")
                .await);
        };
        self.events.publish(event(RideEventKind::Accepted, &accepted));
        info!("ride accepted");
        self.view(&accepted).await
    }

    #[instrument(skip(self), fields(driver_id = %actor.id, %ride_id))]
    async fn complete_ride(&self, actor: Actor, ride_id: Uuid) -> Result<RideView, Error> {
        self.require_active_profile(actor).await?;
        let ride = self.require_ride(ride_id).await?;
        let previous = ride.status();
        let completed = ride.complete(actor.id).map_err(map_transition_error)?;
        self.commit_transition(&completed, previous, RideEventKind::Completed)
            .await?;
        info!("ride completed");
        self.view(&completed).await
    }

    #[instrument(skip(self, request), fields(user_id = %actor.id, ride_id = %request.ride_id))]
    async fn cancel_ride(
        &self,
        actor: Actor,
        request: CancelRideRequest,
    ) -> Result<RideView, Error> {
        // Reason validation is pure and runs before any repository call.
        let reason = if actor.is_admin() {
            CancellationReason::admin()
        } else {
            CancellationReason::parse(&request.reason_code, request.custom_text.as_deref())
                .map_err(|e| {
                    Error::invalid_request(e.to_string())
                        .with_details(json!({ "field": "reasonCode", "code": "invalid_reason" }))
                })?
        };
        self.require_active_profile(actor).await?;

        let ride = self.require_ride(request.ride_id).await?;
        let previous = ride.status();
        let cancelled = ride.cancel(&actor, &reason).map_err(map_transition_error)?;
        self.commit_transition(&cancelled, previous, RideEventKind::Cancelled)
            .await?;
        info!("ride cancelled");
        self.view(&cancelled).await
    }

    #[instrument(skip(self, request), fields(driver_id = %actor.id, ride_id = %request.ride_id))]
    async fn report_position(
        &self,
        actor: Actor,
        request: ReportPositionRequest,
    ) -> Result<RideView, Error> {
        self.require_active_profile(actor).await?;
        let ride = self.require_ride(request.ride_id).await?;
        let updated = ride
            .with_driver_position(actor.id, request.point)
            .map_err(map_transition_error)?;
        self.commit_transition(&updated, RideStatus::Accepted, RideEventKind::PositionUpdated)
            .await?;
        self.view(&updated).await
    }

    #[instrument(skip(self), fields(driver_id = %actor.id, %ride_id))]
    async fn simulate_position_step(
        &self,
        actor: Actor,
        ride_id: Uuid,
    ) -> Result<RideView, Error> {
        if !self.simulation_enabled {
            return Err(Error::forbidden("position simulation is disabled"));
        }
        self.require_active_profile(actor).await?;
        let ride = self.require_ride(ride_id).await?;
        let current = ride
            .driver_position()
            .or_else(|| ride.pickup().point())
            .ok_or_else(|| {
                Error::invalid_request("ride has no coordinates to simulate from")
            })?;
        let target = ride.destination().point().ok_or_else(|| {
            Error::invalid_request("ride destination has no coordinates")
        })?;
        let next = current.step_towards(target, SIMULATION_STEP);
        let updated = ride
            .with_driver_position(actor.id, next)
            .map_err(map_transition_error)?;
        self.commit_transition(&updated, RideStatus::Accepted, RideEventKind::PositionUpdated)
            .await?;
        self.view(&updated).await
    }

    #[instrument(skip(self), fields(user_id = %actor.id, %ride_id))]
    async fn delete_ride(&self, actor: Actor, ride_id: Uuid) -> Result<(), Error> {
        self.require_active_profile(actor).await?;
        let ride = self.require_ride(ride_id).await?;
        if !actor.is_admin() && !ride.is_participant(actor.id) {
            return Err(Error::forbidden("only ride participants may delete it"));
        }
        if !ride.status().is_terminal() {
            return Err(Error::conflict("only completed or cancelled rides can be deleted")
                .with_details(json!({ "code": "ride_still_active", "status": ride.status().as_str() })));
        }
        self.rides
            .delete(ride_id)
            .await
            .map_err(map_repository_error)?;
        self.events.publish(event(RideEventKind::Deleted, &ride));
        info!("ride deleted");
        Ok(())
    }
}

#[async_trait]
impl<R, P, E> RideQueries for RideService<R, P, E>
where
    R: RideRepository,
    P: ProfileRepository,
    E: RideEvents,
{
    async fn browse_pending(
        &self,
        actor: Actor,
        request: BrowsePendingRequest,
    ) -> Result<Page<RideView>, Error> {
        if !actor.is_admin() {
            let profile = self.require_active_profile(actor).await?;
            if profile.role() != Role::Driver {
                return Err(Error::forbidden("only drivers browse pending rides"));
            }
        }
        let search = RideSearch {
            pickup: request.pickup,
            destination: request.destination,
            passengers_count: request.passengers_count,
            page: request.page,
        };
        let page = self
            .rides
            .search_pending(actor.id, &search)
            .await
            .map_err(map_repository_error)?;
        let items = self.views(&page.items).await?;
        Ok(Page {
            items,
            total: page.total,
        })
    }

    async fn my_rides(&self, actor: Actor) -> Result<Vec<RideView>, Error> {
        let rides = self
            .rides
            .list_for_user(actor.id)
            .await
            .map_err(map_repository_error)?;
        self.views(&rides).await
    }

    async fn ride(&self, actor: Actor, ride_id: Uuid) -> Result<RideView, Error> {
        let ride = self.require_ride(ride_id).await?;
        let visible = actor.is_admin()
            || ride.is_participant(actor.id)
            || ride.status() == RideStatus::Pending;
        if !visible {
            return Err(Error::forbidden("only ride participants may view this ride"));
        }
        self.view(&ride).await
    }
}

#[cfg(test)]
impl<R, P, E> RideService<R, P, E> {
    pub(crate) fn profiles_for_tests(&self) -> Arc<P> {
        Arc::clone(&self.profiles)
    }
}

#[cfg(test)]
#[path = "ride_service_tests.rs"]
mod tests;
