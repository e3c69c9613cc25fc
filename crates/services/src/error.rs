//! Shared error types for the services crate.

use thiserror::Error;

use goals_core::WeekWindowError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `WeekSummaryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SummaryError {
    /// The reference instant has no representable week around it.
    #[error(transparent)]
    InvalidInput(#[from] WeekWindowError),
    /// The storage collaborator failed; passed through untouched.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
