//! Backend entry-point: wires REST endpoints, WebSocket entry, and OpenAPI docs.

use std::env;
use std::net::SocketAddr;

use actix_web::web;
use diesel::{Connection, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{DbPool, PoolConfig};
use backend::server::{create_server, ServerConfig};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

fn bind_addr_from_env() -> std::io::Result<SocketAddr> {
    let raw = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());
    raw.parse()
        .map_err(|error| std::io::Error::other(format!("invalid BIND_ADDR {raw:?}: {error}")))
}

fn allowed_origins_from_env() -> std::io::Result<Vec<Url>> {
    let raw = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.into());
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            Url::parse(entry).map_err(|error| {
                std::io::Error::other(format!("invalid origin {entry:?} in ALLOWED_ORIGINS: {error}"))
            })
        })
        .collect()
}

fn introspection_url_from_env() -> std::io::Result<Option<Url>> {
    match env::var("TOKEN_INTROSPECTION_URL") {
        Ok(raw) => Url::parse(&raw)
            .map(Some)
            .map_err(|error| {
                std::io::Error::other(format!("invalid TOKEN_INTROSPECTION_URL: {error}"))
            }),
        Err(_) => Ok(None),
    }
}

fn run_migrations(database_url: &str) -> std::io::Result<()> {
    let mut connection = PgConnection::establish(database_url)
        .map_err(|error| std::io::Error::other(format!("database connection failed: {error}")))?;
    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| std::io::Error::other(format!("migrations failed: {error}")))?;
    info!(count = applied.len(), "migrations applied");
    Ok(())
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let bind_addr = bind_addr_from_env()?;
    let allowed_origins = allowed_origins_from_env()?;
    let simulation_enabled = env::var("SIMULATE_POSITIONS").ok().as_deref() == Some("1");

    let mut config = ServerConfig::new(bind_addr, allowed_origins).with_simulation(simulation_enabled);

    if let Some(url) = introspection_url_from_env()? {
        config = config.with_introspection_url(url);
    } else {
        warn!("TOKEN_INTROSPECTION_URL unset; accepting fixture tokens (dev only)");
    }

    match env::var("DATABASE_URL") {
        Ok(database_url) => {
            run_migrations(&database_url)?;
            let pool = DbPool::new(PoolConfig::new(&database_url))
                .await
                .map_err(|error| std::io::Error::other(error.to_string()))?;
            config = config.with_db_pool(pool);
        }
        Err(_) => {
            warn!("DATABASE_URL unset; using in-memory fixtures (dev only)");
        }
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "server started");
    server.await
}
