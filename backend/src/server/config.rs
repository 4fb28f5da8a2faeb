//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use url::Url;

use crate::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) allowed_origins: Vec<Url>,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) introspection_url: Option<Url>,
    pub(crate) simulation_enabled: bool,
}

impl ServerConfig {
    /// Construct a server configuration with the mandatory settings.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, allowed_origins: Vec<Url>) -> Self {
        Self {
            bind_addr,
            allowed_origins,
            db_pool: None,
            introspection_url: None,
            simulation_enabled: false,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, the server uses database-backed repositories; without
    /// one it falls back to the in-memory fixtures for local development.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Verify bearer tokens against this introspection endpoint.
    ///
    /// Without one, the fixture verifier accepts `<uuid>[:role]` tokens;
    /// only suitable for local development.
    #[must_use]
    pub fn with_introspection_url(mut self, url: Url) -> Self {
        self.introspection_url = Some(url);
        self
    }

    /// Enable the driver position simulation endpoint.
    #[must_use]
    pub fn with_simulation(mut self, enabled: bool) -> Self {
        self.simulation_enabled = enabled;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
