//! Driving port for the ride query side.
//!
//! Queries return [`RideView`] payloads: the ride joined with the profiles
//! of its participants. WebSocket subscribers re-fetch through this port
//! after receiving a thin change event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::matching::Page;
use crate::domain::profile::{Actor, Profile};
use crate::domain::ride::{GeoPoint, Location, Ride, RideStatus};
use crate::domain::Error;

/// A ride participant as shown to the other party.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    /// User identity.
    pub id: Uuid,
    /// Name shown to other ride participants.
    pub display_name: String,
    /// Contact phone, shared between matched parties.
    pub phone: Option<String>,
}

impl From<&Profile> for ParticipantView {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id(),
            display_name: profile.display_name().to_owned(),
            phone: profile.phone().map(str::to_owned),
        }
    }
}

/// A ride joined with its participants, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RideView {
    /// Ride identity.
    pub id: Uuid,
    /// The requesting passenger.
    pub passenger: ParticipantView,
    /// The assigned driver, once one accepted.
    pub driver: Option<ParticipantView>,
    /// Pickup endpoint.
    pub pickup: Location,
    /// Destination endpoint.
    pub destination: Location,
    /// Number of passengers travelling.
    pub passengers_count: i32,
    /// Current lifecycle status.
    pub status: RideStatus,
    /// Reason recorded on cancellation.
    pub cancellation_reason: Option<String>,
    /// Last driver position snapshot.
    pub driver_position: Option<GeoPoint>,
    /// Creation timestamp.
    pub requested_at: DateTime<Utc>,
}

impl RideView {
    /// Join a ride with its participant profiles.
    pub fn assemble(ride: &Ride, passenger: &Profile, driver: Option<&Profile>) -> Self {
        Self {
            id: ride.id(),
            passenger: passenger.into(),
            driver: driver.map(ParticipantView::from),
            pickup: ride.pickup().clone(),
            destination: ride.destination().clone(),
            passengers_count: ride.passengers_count(),
            status: ride.status(),
            cancellation_reason: ride.cancellation_reason().map(str::to_owned),
            driver_position: ride.driver_position(),
            requested_at: ride.requested_at(),
        }
    }
}

/// Filters and page selection for browsing pending rides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowsePendingRequest {
    /// Case-insensitive substring match on the pickup label.
    pub pickup: Option<String>,
    /// Case-insensitive substring match on the destination label.
    pub destination: Option<String>,
    /// Exact match on the passenger count.
    pub passengers_count: Option<i32>,
    /// Zero-based page index.
    pub page: i64,
}

/// Read operations over rides.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RideQueries: Send + Sync {
    /// One page of pending candidates the acting driver could accept.
    async fn browse_pending(
        &self,
        actor: Actor,
        request: BrowsePendingRequest,
    ) -> Result<Page<RideView>, Error>;

    /// Every ride the actor participates in, newest first.
    async fn my_rides(&self, actor: Actor) -> Result<Vec<RideView>, Error>;

    /// A single ride; participants and administrators only.
    async fn ride(&self, actor: Actor, ride_id: Uuid) -> Result<RideView, Error>;
}
