//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! The persistence layer follows these principles:
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are internal implementation details, never
//!   exposed to the domain layer.
//! - **Guarded writes**: Ride lifecycle mutations are conditional updates
//!   whose predicate includes the expected current status, so arbitration
//!   between racing writers happens on the database's row atomicity.
//! - **Strongly typed errors**: All database errors are mapped to the
//!   shared repository error taxonomy.
//!
//! # Example
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, PoolConfig, DieselRideRepository};
//!
//! let config = PoolConfig::new("postgres://localhost/rides");
//! let pool = DbPool::new(config).await?;
//! let repo = DieselRideRepository::new(pool);
//! ```

mod diesel_complaint_repository;
mod diesel_message_repository;
mod diesel_profile_repository;
mod diesel_rating_repository;
mod diesel_ride_repository;
mod error_map;
mod models;
mod pool;
mod schema;

pub use diesel_complaint_repository::DieselComplaintRepository;
pub use diesel_message_repository::DieselMessageRepository;
pub use diesel_profile_repository::DieselProfileRepository;
pub use diesel_rating_repository::DieselRatingRepository;
pub use diesel_ride_repository::DieselRideRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
