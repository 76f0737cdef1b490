//! Composition root for the service layer.
//!
//! `SharedStorage` opens the database lazily and exactly once, even under
//! concurrent first use; `AppServices` bundles the services a frontend needs.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use quiz_core::Clock;
use storage::repository::Storage;

use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::notify::BadgeNotifier;
use crate::progress_service::ProgressService;
use crate::stats::{StatsConfig, VisualizationData, visualization_data};

/// Lazily-initialized storage handle. Concurrent first callers coalesce on
/// one connection attempt; afterwards every call is a cheap clone.
#[derive(Clone)]
pub struct SharedStorage {
    database_url: String,
    cell: Arc<OnceCell<Storage>>,
}

impl SharedStorage {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// The storage, connecting and migrating on first call.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Sqlite` if the database cannot be opened;
    /// a later call will retry.
    pub async fn get(&self) -> Result<Storage, AppServicesError> {
        let storage = self
            .cell
            .get_or_try_init(|| async {
                debug!(url = %self.database_url, "opening quiz database");
                Storage::sqlite(&self.database_url).await
            })
            .await?;
        Ok(storage.clone())
    }
}

/// Everything a frontend needs, wired together.
pub struct AppServices {
    pub progress: ProgressService,
    pub catalog: CatalogService,
    pub stats_config: StatsConfig,
}

impl AppServices {
    /// Open the SQLite store at `database_url` and build the service stack.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Sqlite` if the database cannot be opened
    /// or migrated.
    pub async fn new_sqlite(
        database_url: &str,
        clock: Clock,
        metadata_path: Option<PathBuf>,
        stats_config: StatsConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = SharedStorage::new(database_url).get().await?;
        Ok(Self::new(storage, clock, metadata_path, stats_config))
    }

    /// Build the service stack over an already-open storage.
    #[must_use]
    pub fn new(
        storage: Storage,
        clock: Clock,
        metadata_path: Option<PathBuf>,
        stats_config: StatsConfig,
    ) -> Self {
        Self {
            progress: ProgressService::new(storage, clock),
            catalog: CatalogService::new(metadata_path),
            stats_config,
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn BadgeNotifier>) -> Self {
        self.progress = self.progress.with_notifier(notifier);
        self
    }

    /// The full statistics read model: persisted aggregate joined with the
    /// entry list and the catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` on storage failure.
    pub async fn statistics(&self) -> Result<VisualizationData, AppServicesError> {
        let stats = self.progress.global_stats().await.map_err(storage_err)?;
        let entries = self.progress.list_entries().await.map_err(storage_err)?;
        let catalog = self.catalog.catalog().await;
        Ok(visualization_data(
            &stats,
            &entries,
            catalog,
            self.stats_config,
        ))
    }
}

fn storage_err(err: crate::error::ProgressServiceError) -> AppServicesError {
    match err {
        crate::error::ProgressServiceError::Storage(e) => AppServicesError::Storage(e),
        // Reads never validate results, so this arm is unreachable in
        // practice; map it through the storage variant rather than panic.
        crate::error::ProgressServiceError::Result(e) => AppServicesError::Storage(
            storage::repository::StorageError::Serialization(e.to_string()),
        ),
    }
}
