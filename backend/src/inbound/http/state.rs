//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    EngagementCommands, EngagementQueries, ProfileCommands, ProfileQueries, RideCommands,
    RideQueries, TokenVerifier,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub ride_commands: Arc<dyn RideCommands>,
    pub ride_queries: Arc<dyn RideQueries>,
    pub engagement_commands: Arc<dyn EngagementCommands>,
    pub engagement_queries: Arc<dyn EngagementQueries>,
    pub profile_commands: Arc<dyn ProfileCommands>,
    pub profile_queries: Arc<dyn ProfileQueries>,
    pub tokens: Arc<dyn TokenVerifier>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub ride_commands: Arc<dyn RideCommands>,
    pub ride_queries: Arc<dyn RideQueries>,
    pub engagement_commands: Arc<dyn EngagementCommands>,
    pub engagement_queries: Arc<dyn EngagementQueries>,
    pub profile_commands: Arc<dyn ProfileCommands>,
    pub profile_queries: Arc<dyn ProfileQueries>,
    pub tokens: Arc<dyn TokenVerifier>,
}

impl HttpState {
    /// Construct state from a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            ride_commands,
            ride_queries,
            engagement_commands,
            engagement_queries,
            profile_commands,
            profile_queries,
            tokens,
        } = ports;
        Self {
            ride_commands,
            ride_queries,
            engagement_commands,
            engagement_queries,
            profile_commands,
            profile_queries,
            tokens,
        }
    }
}
