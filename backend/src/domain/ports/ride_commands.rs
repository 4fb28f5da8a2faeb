//! Driving port for ride lifecycle commands.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::profile::Actor;
use crate::domain::ride::GeoPoint;
use crate::domain::Error;

use super::ride_queries::RideView;

/// Payload for requesting a new ride.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRideRequest {
    /// The passenger the ride is for. Must be the acting user unless the
    /// actor is an administrator.
    pub passenger_id: Uuid,
    /// Pickup label as entered by the passenger.
    pub pickup_text: String,
    /// Geocoded pickup coordinate, when available.
    pub pickup_point: Option<GeoPoint>,
    /// Destination label as entered by the passenger.
    pub destination_text: String,
    /// Geocoded destination coordinate, when available.
    pub destination_point: Option<GeoPoint>,
    /// Number of passengers travelling.
    pub passengers_count: i32,
}

/// Payload for cancelling a ride.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelRideRequest {
    /// The ride to cancel.
    pub ride_id: Uuid,
    /// Canned reason code, or `custom`.
    pub reason_code: String,
    /// Free text accompanying the `custom` code.
    pub custom_text: Option<String>,
}

/// Payload for reporting a driver position snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPositionRequest {
    /// The accepted ride the driver is on.
    pub ride_id: Uuid,
    /// Current driver position.
    pub point: GeoPoint,
}

/// Mutating operations over the ride lifecycle.
///
/// Every successful command publishes a thin change event after the write
/// commits, so subscribers observe mutations in commit order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RideCommands: Send + Sync {
    /// Create a new pending ride for the acting passenger.
    async fn request_ride(
        &self,
        actor: Actor,
        request: RequestRideRequest,
    ) -> Result<RideView, Error>;

    /// Claim a pending ride for the acting driver.
    ///
    /// Losing an acceptance race yields [`crate::domain::ErrorCode::Conflict`]
    /// together with the ride's refreshed state in the error details.
    async fn accept_ride(&self, actor: Actor, ride_id: Uuid) -> Result<RideView, Error>;

    /// Mark an accepted ride as completed; assigned driver only.
    async fn complete_ride(&self, actor: Actor, ride_id: Uuid) -> Result<RideView, Error>;

    /// Cancel a pending or accepted ride with a reason.
    async fn cancel_ride(
        &self,
        actor: Actor,
        request: CancelRideRequest,
    ) -> Result<RideView, Error>;

    /// Record the driver's current position on an accepted ride.
    async fn report_position(
        &self,
        actor: Actor,
        request: ReportPositionRequest,
    ) -> Result<RideView, Error>;

    /// Advance the driver position one simulated step toward the
    /// destination. Only available when simulation is enabled in
    /// configuration; development aid, not a production feature.
    async fn simulate_position_step(
        &self,
        actor: Actor,
        ride_id: Uuid,
    ) -> Result<RideView, Error>;

    /// Remove a terminal ride from the actor's history.
    async fn delete_ride(&self, actor: Actor, ride_id: Uuid) -> Result<(), Error>;
}
