// ============================================================================
// REPOSITORIES
// ============================================================================
// Persistence seams used by the service layer. The Postgres implementations
// live next to the traits; tests provide in-memory ones.
// ============================================================================

pub mod user_repository;
pub mod vehicle_repository;

pub use user_repository::{PgUserRepository, UserRepository};
pub use vehicle_repository::{PgVehicleRepository, VehicleRepository};

use shared::AppError;

const UNIQUE_VIOLATION: &str = "23505";

/// Maps a unique-constraint violation to `Conflict`, everything else passes through.
pub(crate) fn map_unique_violation(err: sqlx::Error, message: impl Into<String>) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            AppError::conflict(message)
        }
        _ => AppError::Database(err),
    }
}
