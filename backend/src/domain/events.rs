//! Thin change events emitted after every committed ride mutation.
//!
//! Events carry identifiers and the event kind only; subscribers re-fetch
//! the full record (with profile joins) through the query side. This keeps
//! the fan-out payload small and makes dropped events recoverable with a
//! single refetch.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ride::RideStatus;

/// What happened to a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideEventKind {
    /// A new pending ride entered the candidate set.
    Requested,
    /// A driver claimed the ride; it left the candidate set.
    Accepted,
    /// The assigned driver finished the ride.
    Completed,
    /// A party or an administrator cancelled the ride.
    Cancelled,
    /// The assigned driver reported a position snapshot.
    PositionUpdated,
    /// A terminal ride was removed from a party's history.
    Deleted,
    /// A chat message was posted on the ride.
    MessagePosted,
}

/// A topic a WebSocket session may subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// The pending candidate set, as browsed by drivers.
    PendingRides,
    /// All rides where the given user is the assigned driver.
    DriverRides(Uuid),
    /// All rides requested by the given passenger.
    PassengerRides(Uuid),
    /// A single ride, for participants watching it in detail.
    Ride(Uuid),
}

impl Topic {
    /// Parse a topic from its wire form.
    ///
    /// Wire forms: `rides:pending`, `rides:driver:<uuid>`,
    /// `rides:passenger:<uuid>`, `ride:<uuid>`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "rides:pending" {
            return Some(Self::PendingRides);
        }
        if let Some(rest) = raw.strip_prefix("rides:driver:") {
            return rest.parse().ok().map(Self::DriverRides);
        }
        if let Some(rest) = raw.strip_prefix("rides:passenger:") {
            return rest.parse().ok().map(Self::PassengerRides);
        }
        if let Some(rest) = raw.strip_prefix("ride:") {
            return rest.parse().ok().map(Self::Ride);
        }
        None
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingRides => f.write_str("rides:pending"),
            Self::DriverRides(id) => write!(f, "rides:driver:{id}"),
            Self::PassengerRides(id) => write!(f, "rides:passenger:{id}"),
            Self::Ride(id) => write!(f, "ride:{id}"),
        }
    }
}

/// A thin ride change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideEvent {
    /// What happened.
    pub kind: RideEventKind,
    /// The ride the event concerns.
    pub ride_id: Uuid,
    /// The requesting passenger.
    pub passenger_id: Uuid,
    /// The assigned driver, when one exists.
    pub driver_id: Option<Uuid>,
    /// Ride status after the mutation committed.
    pub status: RideStatus,
}

impl RideEvent {
    /// The topics this event should be delivered to.
    ///
    /// Acceptance and cancellation also notify the pending-rides topic:
    /// drivers browsing the candidate set need to learn the ride left it.
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics = vec![
            Topic::Ride(self.ride_id),
            Topic::PassengerRides(self.passenger_id),
        ];
        if let Some(driver_id) = self.driver_id {
            topics.push(Topic::DriverRides(driver_id));
        }
        match self.kind {
            RideEventKind::Requested
            | RideEventKind::Accepted
            | RideEventKind::Cancelled
            | RideEventKind::Deleted => topics.push(Topic::PendingRides),
            RideEventKind::Completed
            | RideEventKind::PositionUpdated
            | RideEventKind::MessagePosted => {}
        }
        topics
    }
}
