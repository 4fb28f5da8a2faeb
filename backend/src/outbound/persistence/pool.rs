//! bb8-backed pool of async Diesel PostgreSQL connections.
//!
//! Checkout respects a hard timeout so a saturated pool surfaces as a
//! transient fault instead of a hung request.

use std::time::Duration;

use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

/// A connection checked out for the duration of one repository call.
pub type DbConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_IDLE_CONNECTIONS: u32 = 2;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure while building the pool or checking a connection out of it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The pool could not be constructed against the configured URL.
    #[error("failed to build connection pool: {0}")]
    Build(String),

    /// No connection became available within the checkout timeout.
    #[error("failed to check out a database connection: {0}")]
    Checkout(String),
}

/// Pool sizing and checkout behaviour.
///
/// The defaults suit a single service instance in front of one Postgres;
/// the checkout timeout is deliberately short so ride mutations fail fast
/// and surface as `service_unavailable` rather than stalling the caller.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_connections: u32,
    idle_connections: u32,
    checkout_timeout: Duration,
}

impl PoolConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_connections: DEFAULT_IDLE_CONNECTIONS,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Cap the number of simultaneously open connections.
    #[must_use]
    pub fn max_connections(mut self, limit: u32) -> Self {
        self.max_connections = limit;
        self
    }

    /// Number of warm connections kept open while the pool is idle.
    #[must_use]
    pub fn idle_connections(mut self, count: u32) -> Self {
        self.idle_connections = count;
        self
    }

    /// How long a caller may wait for a free connection.
    #[must_use]
    pub fn checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }
}

/// Shared handle to the PostgreSQL connection pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool. Connections are opened lazily, so a wrong URL may
    /// only surface on first checkout.
    ///
    /// # Errors
    /// Returns [`PoolError::Build`] when the pool cannot be constructed.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.idle_connections))
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map_err(|error| PoolError::Build(error.to_string()))?;
        Ok(Self { inner })
    }

    /// Check a connection out of the pool.
    ///
    /// # Errors
    /// Returns [`PoolError::Checkout`] when no connection frees up within
    /// the configured timeout.
    pub async fn get(&self) -> Result<DbConnection<'_>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|error| PoolError::Checkout(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_favour_fast_failure() {
        let config = PoolConfig::new("postgres://localhost/rides");
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.idle_connections, DEFAULT_IDLE_CONNECTIONS);
        assert_eq!(config.checkout_timeout, DEFAULT_CHECKOUT_TIMEOUT);
    }

    #[test]
    fn builder_overrides_every_knob() {
        let config = PoolConfig::new("postgres://localhost/rides")
            .max_connections(32)
            .idle_connections(4)
            .checkout_timeout(Duration::from_millis(250));
        assert_eq!(config.max_connections, 32);
        assert_eq!(config.idle_connections, 4);
        assert_eq!(config.checkout_timeout, Duration::from_millis(250));
    }

    #[test]
    fn errors_carry_the_underlying_message() {
        let error = PoolError::Checkout("timed out waiting for connection".into());
        assert!(error.to_string().contains("timed out"));
    }
}
