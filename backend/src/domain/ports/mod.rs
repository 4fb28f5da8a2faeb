//! Ports: the seams between the domain and the outside world.
//!
//! Driven ports (repositories, the event publisher, the token verifier)
//! are implemented by outbound adapters; driving ports (commands and
//! queries) are implemented by domain services and consumed by inbound
//! adapters. All ports are `Send + Sync` object-safe traits so adapters can
//! hold them as `Arc<dyn Port>`.

mod complaint_repository;
mod engagement_flows;
mod message_repository;
mod profile_flows;
mod profile_repository;
mod rating_repository;
mod ride_commands;
mod ride_events;
mod ride_queries;
mod ride_repository;
mod token_verifier;

pub use complaint_repository::{ComplaintRepository, FixtureComplaintRepository};
pub use engagement_flows::{
    ComplaintView, EngagementCommands, EngagementQueries, FileComplaintRequest, MessageView,
    PostMessageRequest, RateRideRequest, RatingView, ReviewComplaintRequest,
};
pub use message_repository::{FixtureMessageRepository, MessageRepository};
pub use profile_flows::{
    ProfileCommands, ProfileQueries, ProfileView, SetAccountStatusRequest, UpdateProfileRequest,
    VehicleUpdate,
};
pub use profile_repository::{FixtureProfileRepository, ProfileRepository};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
#[cfg(test)]
pub use ride_repository::MockRideRepository;
pub use rating_repository::{FixtureRatingRepository, RatingRepository};
pub use ride_commands::{
    CancelRideRequest, ReportPositionRequest, RequestRideRequest, RideCommands,
};
pub use ride_events::{BroadcastRideEvents, RideEvents, EVENT_BUFFER};
pub use ride_queries::{BrowsePendingRequest, ParticipantView, RideQueries, RideView};
pub use ride_repository::{FixtureRideRepository, RideRepository};
pub use token_verifier::{FixtureTokenVerifier, TokenVerificationError, TokenVerifier};

/// Failures reported by driven repository ports.
///
/// Repositories signal absence with `Option`, so these variants only cover
/// infrastructure faults and integrity violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// The backing store is temporarily unreachable.
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    /// The backing store rejected or failed the operation.
    #[error("repository operation failed: {0}")]
    Backend(String),
    /// A stored record violates a domain invariant.
    #[error("stored record is invalid: {0}")]
    Corrupted(String),
    /// A uniqueness rule was violated.
    #[error("duplicate record: {0}")]
    Duplicate(String),
}

impl RepositoryError {
    /// The backing store is temporarily unreachable.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// The backing store rejected or failed the operation.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// A stored record violates a domain invariant.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// A uniqueness rule was violated.
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate(message.into())
    }
}
