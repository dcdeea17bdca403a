//! Storage errors that callers need to tell apart from generic failures

use thiserror::Error;

/// Typed storage failures.
///
/// Repositories return `anyhow::Result`; these values are the root error so
/// services can recover them with `downcast_ref::<StorageError>()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    /// A UNIQUE constraint on the named field was violated
    #[error("duplicate value for unique field: {0}")]
    Duplicate(&'static str),
}

impl StorageError {
    /// Find a `StorageError` anywhere in an `anyhow` chain.
    pub fn find(err: &anyhow::Error) -> Option<&StorageError> {
        err.downcast_ref::<StorageError>()
    }
}

/// Turn a unique-constraint violation into [`StorageError::Duplicate`],
/// otherwise attach `context` to the driver error.
pub fn map_unique_violation(
    err: sqlx::Error,
    field: &'static str,
    context: &'static str,
) -> anyhow::Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StorageError::Duplicate(field).into();
        }
    }
    anyhow::Error::new(err).context(context)
}
