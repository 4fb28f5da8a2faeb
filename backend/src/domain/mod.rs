//! Domain layer: entities, ports, and the services behind them.
//!
//! Inbound adapters (HTTP, WebSocket) talk to driving ports; outbound
//! adapters (Postgres, the identity provider, the event feed) implement the
//! driven ports. Nothing in this module knows about actix, diesel, or wire
//! formats beyond serde derives on the view types.

mod engagement;
mod engagement_service;
mod error;
mod events;
mod matching;
pub mod ports;
mod profile;
mod profile_service;
mod ride;
mod ride_service;

pub use engagement::{
    Complaint, ComplaintStatus, EngagementValidationError, Message, Rating,
};
pub use engagement_service::EngagementService;
pub use error::{Error, ErrorCode};
pub use events::{RideEvent, RideEventKind, Topic};
pub use matching::{Page, RideSearch, PAGE_SIZE};
pub use ports::{
    EngagementCommands, EngagementQueries, ProfileCommands, ProfileQueries, RideCommands,
    RideQueries,
};
pub use profile::{AccountStatus, Actor, Profile, ProfileValidationError, Role, Vehicle};
pub use profile_service::ProfileService;
pub use ride::{
    CancellationReason, GeoPoint, GeoPointValidationError, Location, ReasonValidationError, Ride,
    RideDraft, RideStatus, RideTransitionError, RideValidationError, ADMIN_CANCELLATION_REASON,
};
pub use ride_service::RideService;
