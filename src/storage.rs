//! Record store contract for the interactive selection path.
//!
//! Interactive single-shot selections accumulate records across
//! independent invocations. The store holds one named collection of
//! previously accumulated records; orchestrated runs never touch it —
//! their dataset lives in the session.

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::scrape::Record;

// ============================================================================
// Constants
// ============================================================================

/// Collection name used by the interactive selection path.
pub const DEFAULT_COLLECTION: &str = "scraped_data";

// ============================================================================
// RecordStore
// ============================================================================

/// Get/set contract over a named collection of records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Loads a collection; a collection that was never saved is empty.
    async fn load(&self, collection: &str) -> Result<Vec<Record>>;

    /// Replaces a collection.
    async fn save(&self, collection: &str, records: &[Record]) -> Result<()>;

    /// Appends records to a collection, returning its new size.
    async fn append(&self, collection: &str, new_records: Vec<Record>) -> Result<usize> {
        let mut all = self.load(collection).await?;
        all.extend(new_records);
        self.save(collection, &all).await?;
        Ok(all.len())
    }
}

// ============================================================================
// JsonFileStore
// ============================================================================

/// Store persisting each collection as `<dir>/<collection>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`. The directory is created on
    /// first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load(&self, collection: &str) -> Result<Vec<Record>> {
        let path = self.path(collection);

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        Ok(serde_json::from_str(&text)?)
    }

    async fn save(&self, collection: &str, records: &[Record]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(collection);
        let body = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&path, body.as_bytes()).await?;
        debug!(path = %path.display(), records = records.len(), "collection saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
