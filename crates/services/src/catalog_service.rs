//! Theme catalog loading.
//!
//! The catalog is a static JSON file; it is read at most once per process
//! and cached. A missing or malformed file degrades the statistics screen
//! (fallback denominator, themes labeled by id) instead of failing it.

use std::path::{Path, PathBuf};

use tokio::sync::OnceCell;
use tracing::warn;

use quiz_core::model::ThemeCatalog;

use crate::error::CatalogError;

/// Parse a catalog file.
///
/// # Errors
///
/// `CatalogError::Io` if the file cannot be read, `CatalogError::Parse` if
/// it is not valid catalog JSON.
pub fn load_catalog(path: &Path) -> Result<ThemeCatalog, CatalogError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Load-once cache around the catalog file.
pub struct CatalogService {
    path: Option<PathBuf>,
    cache: OnceCell<Option<ThemeCatalog>>,
}

impl CatalogService {
    /// `None` means no metadata was configured; `catalog()` then always
    /// returns `None` without touching the filesystem.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            cache: OnceCell::new(),
        }
    }

    /// The parsed catalog, loaded on first call. Load failures are logged
    /// once and cached as `None` so every caller sees the same answer.
    pub async fn catalog(&self) -> Option<&ThemeCatalog> {
        self.cache
            .get_or_init(|| async {
                let path = self.path.as_deref()?;
                match load_catalog(path) {
                    Ok(catalog) => Some(catalog),
                    Err(err) => {
                        warn!(path = %path.display(), %err, "theme catalog unavailable");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }
}
