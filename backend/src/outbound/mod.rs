//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits for various infrastructure concerns:
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **auth**: HTTP token introspection against the identity provider
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod auth;
pub mod persistence;
