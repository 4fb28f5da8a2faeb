//! Shared mapping from pool and Diesel failures to repository errors.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::RepositoryError;

use super::pool::PoolError;

/// Pool faults are transient: the caller may retry once the pool recovers.
pub(super) fn map_pool_error(error: PoolError) -> RepositoryError {
    let message = match error {
        PoolError::Checkout(message) | PoolError::Build(message) => message,
    };
    RepositoryError::unavailable(message)
}

/// Map Diesel failures onto the shared repository error taxonomy.
///
/// Unique violations surface as [`RepositoryError::Duplicate`] so services
/// can turn them into conflicts; closed connections are transient; the
/// rest is a backend fault with the detail kept out of the message.
pub(super) fn map_diesel_error(error: DieselError) -> RepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            RepositoryError::duplicate(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RepositoryError::unavailable("database connection closed")
        }
        DieselError::NotFound => RepositoryError::backend("record not found"),
        _ => RepositoryError::backend("database error"),
    }
}
