//! Ride aggregate: route value objects, cancellation reasons, and the
//! lifecycle state machine.
//!
//! All status transitions flow through [`Ride`] so acceptance, completion,
//! and cancellation guards exist in exactly one place. Adapters translate
//! [`RideTransitionError`] into their own envelopes; they never re-implement
//! the rules.

mod lifecycle;
mod location;
mod reason;

pub use lifecycle::{Ride, RideDraft, RideStatus, RideTransitionError, RideValidationError};
pub use location::{GeoPoint, GeoPointValidationError, Location};
pub use reason::{CancellationReason, ReasonValidationError, ADMIN_CANCELLATION_REASON};
