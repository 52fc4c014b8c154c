//! Entitlement errors

use thiserror::Error;

/// Entitlement errors
#[derive(Error, Debug)]
pub enum EntitlementError {
    /// Content unit not found
    #[error("content unit not found")]
    ContentNotFound,

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] fanforge_db::DbError),
}
