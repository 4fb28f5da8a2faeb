//! Assembles adapter state bundles from the server configuration.
//!
//! Database-backed repositories are used when a pool is configured; the
//! in-memory fixtures otherwise. The WebSocket and HTTP states share one
//! event feed and one token verifier so both surfaces agree on identity
//! and see the same ride changes.

use std::sync::Arc;

use crate::domain::ports::{
    BroadcastRideEvents, ComplaintRepository, FixtureComplaintRepository,
    FixtureMessageRepository, FixtureProfileRepository, FixtureRatingRepository,
    FixtureRideRepository, FixtureTokenVerifier, MessageRepository, ProfileRepository,
    RatingRepository, RideRepository, TokenVerifier,
};
use crate::domain::{EngagementService, ProfileService, RideService};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::ws::state::WsState;
use crate::outbound::auth::HttpTokenVerifier;
use crate::outbound::persistence::{
    DieselComplaintRepository, DieselMessageRepository, DieselProfileRepository,
    DieselRatingRepository, DieselRideRepository,
};

use super::ServerConfig;

struct Repositories<R, P, M, T, C> {
    rides: Arc<R>,
    profiles: Arc<P>,
    messages: Arc<M>,
    ratings: Arc<T>,
    complaints: Arc<C>,
}

fn build_ports<R, P, M, T, C>(
    repos: Repositories<R, P, M, T, C>,
    events: Arc<BroadcastRideEvents>,
    tokens: Arc<dyn TokenVerifier>,
    simulation_enabled: bool,
) -> HttpStatePorts
where
    R: RideRepository + 'static,
    P: ProfileRepository + 'static,
    M: MessageRepository + 'static,
    T: RatingRepository + 'static,
    C: ComplaintRepository + 'static,
{
    let Repositories {
        rides,
        profiles,
        messages,
        ratings,
        complaints,
    } = repos;
    let ride_service = Arc::new(RideService::new(
        rides.clone(),
        profiles.clone(),
        events.clone(),
        simulation_enabled,
    ));
    let engagement_service = Arc::new(EngagementService::new(
        rides,
        profiles.clone(),
        messages,
        ratings,
        complaints,
        events,
    ));
    let profile_service = Arc::new(ProfileService::new(profiles));
    HttpStatePorts {
        ride_commands: ride_service.clone(),
        ride_queries: ride_service,
        engagement_commands: engagement_service.clone(),
        engagement_queries: engagement_service,
        profile_commands: profile_service.clone(),
        profile_queries: profile_service,
        tokens,
    }
}

/// Build the HTTP and WebSocket state bundles for the configured backends.
///
/// # Errors
/// Returns [`std::io::Error`] when the token verifier cannot be built.
pub(super) fn build_states(config: &ServerConfig) -> std::io::Result<(HttpState, WsState)> {
    let events = Arc::new(BroadcastRideEvents::new());
    let tokens: Arc<dyn TokenVerifier> = match &config.introspection_url {
        Some(url) => Arc::new(
            HttpTokenVerifier::new(url.clone()).map_err(|error| {
                std::io::Error::other(format!("token verifier construction failed: {error}"))
            })?,
        ),
        None => Arc::new(FixtureTokenVerifier::new()),
    };

    let ports = match &config.db_pool {
        Some(pool) => build_ports(
            Repositories {
                rides: Arc::new(DieselRideRepository::new(pool.clone())),
                profiles: Arc::new(DieselProfileRepository::new(pool.clone())),
                messages: Arc::new(DieselMessageRepository::new(pool.clone())),
                ratings: Arc::new(DieselRatingRepository::new(pool.clone())),
                complaints: Arc::new(DieselComplaintRepository::new(pool.clone())),
            },
            events.clone(),
            tokens.clone(),
            config.simulation_enabled,
        ),
        None => build_ports(
            Repositories {
                rides: Arc::new(FixtureRideRepository::new()),
                profiles: Arc::new(FixtureProfileRepository::new()),
                messages: Arc::new(FixtureMessageRepository::new()),
                ratings: Arc::new(FixtureRatingRepository::new()),
                complaints: Arc::new(FixtureComplaintRepository::new()),
            },
            events.clone(),
            tokens.clone(),
            config.simulation_enabled,
        ),
    };

    let ws_state = WsState::new(events, tokens, config.allowed_origins.clone());
    Ok((HttpState::new(ports), ws_state))
}
