//! Extraction cache
//!
//! One JSON document per category under the cache directory, keyed by asset
//! short name. The cache is a pure snapshot: reading it has no host side
//! effects, and a non-empty entry is trusted over re-extraction.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use editor_host::PropertyValue;
use tracing::debug;

/// Error type for cache IO.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Asset short name → property key → value. Struct fields are stored flat
/// under `Property.Field` keys.
pub type CategoryData = BTreeMap<String, BTreeMap<String, PropertyValue>>;

pub struct ExtractionCache {
    dir: PathBuf,
}

impl ExtractionCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn category_path(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{}.json", category))
    }

    /// Load a category. A missing file is an empty category, not an error.
    pub fn load_category(&self, category: &str) -> Result<CategoryData, CacheError> {
        let path = self.category_path(category);
        if !path.exists() {
            return Ok(CategoryData::new());
        }
        let content = fs::read_to_string(&path)?;
        let data = serde_json::from_str(&content)?;
        debug!("loaded cache category {} from {}", category, path.display());
        Ok(data)
    }

    pub fn save_category(&self, category: &str, data: &CategoryData) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(data)?;
        fs::write(self.category_path(category), content)?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
