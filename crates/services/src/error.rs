//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::QuizResultError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
///
/// Validation failures are raised before any storage mutation; storage
/// failures surface after the transaction aborted with no partial state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Result(#[from] QuizResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading the theme catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
