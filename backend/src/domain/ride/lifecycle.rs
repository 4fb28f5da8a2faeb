//! The ride entity and its lifecycle state machine.
//!
//! States: `pending` → `accepted` → `completed`; `pending` → `cancelled`;
//! `accepted` → `cancelled`. No other transition is valid. Re-issuing an
//! already-applied transition fails with [`RideTransitionError::AlreadyApplied`]
//! rather than silently succeeding; this is what makes acceptance
//! arbitration observable to the losing driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::profile::{Actor, Role};

use super::{CancellationReason, GeoPoint, Location};

/// Lifecycle status of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    /// Requested by a passenger, visible to drivers, no driver assigned.
    Pending,
    /// Claimed by exactly one driver; the ride is underway.
    Accepted,
    /// Finished by the assigned driver. Terminal.
    Completed,
    /// Abandoned by either party or an administrator, with a reason. Terminal.
    Cancelled,
}

impl RideStatus {
    /// Stable lowercase identifier used on the wire and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the transition `self` → `to` appears in the lifecycle table.
    ///
    /// This is the closure property tests exercise: every pair not admitted
    /// here must be rejected by the corresponding [`Ride`] method.
    pub fn admits(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Accepted)
                | (Self::Accepted, Self::Completed)
                | (Self::Pending | Self::Accepted, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RideStatus {
    type Err = RideValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(RideValidationError::UnknownStatus {
                status: other.to_owned(),
            }),
        }
    }
}

/// Validation errors raised when constructing or restoring a ride.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RideValidationError {
    /// Passenger count must lie within [1, 10].
    #[error("passengers count must be within [1, 10], got {count}")]
    PassengersOutOfRange {
        /// The rejected count.
        count: i32,
    },
    /// A pending ride must not carry a driver.
    #[error("a pending ride must not have a driver assigned")]
    PendingRideWithDriver,
    /// Accepted and completed rides must carry a driver.
    #[error("a {status} ride must have a driver assigned")]
    MissingDriver {
        /// The offending status.
        status: RideStatus,
    },
    /// A cancelled ride must carry a reason.
    #[error("a cancelled ride must record a cancellation reason")]
    MissingCancellationReason,
    /// A driver position snapshot requires an assigned driver.
    #[error("a driver position requires an assigned driver")]
    PositionWithoutDriver,
    /// Stored status string did not match any known status.
    #[error("unknown ride status: {status}")]
    UnknownStatus {
        /// The rejected status string.
        status: String,
    },
}

/// Rejected lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RideTransitionError {
    /// The (from, to) pair is not in the lifecycle table.
    #[error("cannot move a {from} ride to {to}")]
    InvalidTransition {
        /// Current status.
        from: RideStatus,
        /// Attempted status.
        to: RideStatus,
    },
    /// The transition was already applied; the caller lost a race or
    /// retried a completed action.
    #[error("ride is already {status}")]
    AlreadyApplied {
        /// The status the ride already holds.
        status: RideStatus,
    },
    /// A passenger cannot accept their own request.
    #[error("a passenger cannot accept their own ride")]
    SelfAccept,
    /// Only the assigned driver may perform this action.
    #[error("only the assigned driver may perform this action")]
    NotAssignedDriver,
    /// Only the requesting passenger or an administrator may cancel a
    /// pending ride.
    #[error("only the requesting passenger or an administrator may cancel a pending ride")]
    NotRequester,
    /// Only a participant or an administrator may cancel an accepted ride.
    #[error("only a ride participant or an administrator may cancel an accepted ride")]
    NotParticipant,
}

/// Input payload for [`Ride::request`].
#[derive(Debug, Clone)]
pub struct RideDraft {
    /// Ride identity, chosen by the caller.
    pub id: Uuid,
    /// The requesting passenger.
    pub passenger_id: Uuid,
    /// Pickup endpoint.
    pub pickup: Location,
    /// Destination endpoint.
    pub destination: Location,
    /// Number of passengers travelling, within [1, 10].
    pub passengers_count: i32,
    /// Creation timestamp, immutable once set.
    pub requested_at: DateTime<Utc>,
}

/// A ride request and its lifecycle state.
///
/// ## Invariants
/// - `driver_id` is `Some` iff status is `accepted`, `completed`, or the
///   ride was cancelled after acceptance (the driver is retained for audit).
/// - A `pending` ride always has `driver_id = None`.
/// - `cancellation_reason` is `Some` iff status is `cancelled`.
/// - `driver_position` is only ever set while a driver is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    id: Uuid,
    passenger_id: Uuid,
    driver_id: Option<Uuid>,
    pickup: Location,
    destination: Location,
    passengers_count: i32,
    status: RideStatus,
    cancellation_reason: Option<String>,
    driver_position: Option<GeoPoint>,
    requested_at: DateTime<Utc>,
}

fn validate_passengers(count: i32) -> Result<(), RideValidationError> {
    if (1..=10).contains(&count) {
        Ok(())
    } else {
        Err(RideValidationError::PassengersOutOfRange { count })
    }
}

impl Ride {
    /// Create a fresh `pending` ride from a passenger request.
    ///
    /// # Errors
    /// Returns [`RideValidationError::PassengersOutOfRange`] for counts
    /// outside [1, 10].
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{Location, Ride, RideDraft, RideStatus};
    /// use chrono::Utc;
    /// use uuid::Uuid;
    ///
    /// let ride = Ride::request(RideDraft {
    ///     id: Uuid::new_v4(),
    ///     passenger_id: Uuid::new_v4(),
    ///     pickup: Location::new("Central station", None).expect("non-blank"),
    ///     destination: Location::new("Airport", None).expect("non-blank"),
    ///     passengers_count: 2,
    ///     requested_at: Utc::now(),
    /// })
    /// .expect("valid draft");
    /// assert_eq!(ride.status(), RideStatus::Pending);
    /// assert!(ride.driver_id().is_none());
    /// ```
    pub fn request(draft: RideDraft) -> Result<Self, RideValidationError> {
        validate_passengers(draft.passengers_count)?;
        Ok(Self {
            id: draft.id,
            passenger_id: draft.passenger_id,
            driver_id: None,
            pickup: draft.pickup,
            destination: draft.destination,
            passengers_count: draft.passengers_count,
            status: RideStatus::Pending,
            cancellation_reason: None,
            driver_position: None,
            requested_at: draft.requested_at,
        })
    }

    /// Rebuild a ride from persistence, re-checking the stored invariants.
    ///
    /// # Errors
    /// Returns a [`RideValidationError`] when the stored row violates the
    /// single-driver or cancellation-reason invariants.
    pub fn restore(
        draft: RideDraft,
        status: RideStatus,
        driver_id: Option<Uuid>,
        cancellation_reason: Option<String>,
        driver_position: Option<GeoPoint>,
    ) -> Result<Self, RideValidationError> {
        validate_passengers(draft.passengers_count)?;
        match status {
            RideStatus::Pending if driver_id.is_some() => {
                return Err(RideValidationError::PendingRideWithDriver);
            }
            RideStatus::Accepted | RideStatus::Completed if driver_id.is_none() => {
                return Err(RideValidationError::MissingDriver { status });
            }
            RideStatus::Cancelled if cancellation_reason.is_none() => {
                return Err(RideValidationError::MissingCancellationReason);
            }
            _ => {}
        }
        if driver_position.is_some() && driver_id.is_none() {
            return Err(RideValidationError::PositionWithoutDriver);
        }
        Ok(Self {
            id: draft.id,
            passenger_id: draft.passenger_id,
            driver_id,
            pickup: draft.pickup,
            destination: draft.destination,
            passengers_count: draft.passengers_count,
            status,
            cancellation_reason,
            driver_position,
            requested_at: draft.requested_at,
        })
    }

    /// Ride identity.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The requesting passenger.
    pub fn passenger_id(&self) -> Uuid {
        self.passenger_id
    }

    /// The assigned driver, once one accepted.
    pub fn driver_id(&self) -> Option<Uuid> {
        self.driver_id
    }

    /// Pickup endpoint.
    pub fn pickup(&self) -> &Location {
        &self.pickup
    }

    /// Destination endpoint.
    pub fn destination(&self) -> &Location {
        &self.destination
    }

    /// Number of passengers travelling.
    pub fn passengers_count(&self) -> i32 {
        self.passengers_count
    }

    /// Current lifecycle status.
    pub fn status(&self) -> RideStatus {
        self.status
    }

    /// Reason recorded on cancellation.
    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// Last driver position snapshot.
    pub fn driver_position(&self) -> Option<GeoPoint> {
        self.driver_position
    }

    /// Creation timestamp.
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// Whether `user_id` is the passenger or the assigned driver.
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.passenger_id == user_id || self.driver_id == Some(user_id)
    }

    fn guard_transition(&self, to: RideStatus) -> Result<(), RideTransitionError> {
        if self.status == to {
            return Err(RideTransitionError::AlreadyApplied { status: to });
        }
        if !self.status.admits(to) {
            return Err(RideTransitionError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        Ok(())
    }

    /// Assign `driver_id` and move `pending` → `accepted`.
    ///
    /// # Errors
    /// - [`RideTransitionError::AlreadyApplied`] when the ride is already
    ///   accepted (a lost race).
    /// - [`RideTransitionError::InvalidTransition`] from terminal states.
    /// - [`RideTransitionError::SelfAccept`] when the driver requested the
    ///   ride themselves.
    pub fn accept(mut self, driver_id: Uuid) -> Result<Self, RideTransitionError> {
        self.guard_transition(RideStatus::Accepted)?;
        if driver_id == self.passenger_id {
            return Err(RideTransitionError::SelfAccept);
        }
        self.driver_id = Some(driver_id);
        self.status = RideStatus::Accepted;
        Ok(self)
    }

    /// Move `accepted` → `completed`; only the assigned driver may do this.
    ///
    /// # Errors
    /// See [`RideTransitionError`].
    pub fn complete(mut self, actor_id: Uuid) -> Result<Self, RideTransitionError> {
        self.guard_transition(RideStatus::Completed)?;
        if self.driver_id != Some(actor_id) {
            return Err(RideTransitionError::NotAssignedDriver);
        }
        self.status = RideStatus::Completed;
        Ok(self)
    }

    /// Cancel the ride, recording `reason`.
    ///
    /// A pending ride may be cancelled by its passenger or an administrator;
    /// an accepted ride also by the assigned driver. A driver assigned
    /// before cancellation is retained for audit.
    ///
    /// # Errors
    /// See [`RideTransitionError`].
    pub fn cancel(
        mut self,
        actor: &Actor,
        reason: &CancellationReason,
    ) -> Result<Self, RideTransitionError> {
        self.guard_transition(RideStatus::Cancelled)?;
        let allowed = match self.status {
            RideStatus::Pending => {
                actor.role == Role::Admin || actor.id == self.passenger_id
            }
            RideStatus::Accepted => {
                actor.role == Role::Admin || self.is_participant(actor.id)
            }
            RideStatus::Completed | RideStatus::Cancelled => false,
        };
        if !allowed {
            return Err(match self.status {
                RideStatus::Pending => RideTransitionError::NotRequester,
                _ => RideTransitionError::NotParticipant,
            });
        }
        self.status = RideStatus::Cancelled;
        self.cancellation_reason = Some(reason.as_text().to_owned());
        Ok(self)
    }

    /// Record a driver position snapshot; only valid while `accepted` and
    /// only for the assigned driver.
    ///
    /// # Errors
    /// See [`RideTransitionError`].
    pub fn with_driver_position(
        mut self,
        actor_id: Uuid,
        point: GeoPoint,
    ) -> Result<Self, RideTransitionError> {
        if self.status != RideStatus::Accepted {
            return Err(RideTransitionError::InvalidTransition {
                from: self.status,
                to: RideStatus::Accepted,
            });
        }
        if self.driver_id != Some(actor_id) {
            return Err(RideTransitionError::NotAssignedDriver);
        }
        self.driver_position = Some(point);
        Ok(self)
    }
}
