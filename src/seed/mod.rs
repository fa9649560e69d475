//! Seed data import.
//!
//! A [`DataLoader`] produces the rows to seed; the `DataBootstrapper` service
//! writes them through the unit of work, one table at a time, skipping tables
//! that already hold data.

pub mod document;

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::ports::SeedBatch;

pub use document::{remap_duplicate_ids, SeedDocument, DUPLICATE_ID_REMAP};

/// Rows for every seeded table, in insertion order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SeedData {
    pub batches: Vec<SeedBatch>,
}

impl From<SeedDocument> for SeedData {
    fn from(doc: SeedDocument) -> Self {
        Self {
            batches: vec![
                SeedBatch::SqlStatements(doc.sql_statements()),
                SeedBatch::DatasetConfigs(doc.dataset_configs()),
                SeedBatch::ViewConfigs(doc.view_configs()),
                SeedBatch::DataPoints(doc.data_points()),
            ],
        }
    }
}

#[async_trait]
pub trait DataLoader: Send + Sync {
    /// `None` when there is nothing to seed.
    async fn load(&self) -> Result<Option<SeedData>>;
}

/// Reads a JSON seed document from disk. A missing file is not an error.
#[derive(Debug, Clone)]
pub struct JsonSeedLoader {
    path: PathBuf,
}

impl JsonSeedLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataLoader for JsonSeedLoader {
    async fn load(&self) -> Result<Option<SeedData>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "No seed data file");
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::Seed(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let document: SeedDocument = serde_json::from_str(&contents)?;
        info!(
            path = %self.path.display(),
            datasets = document.datasets.items.len(),
            queries = document.queries.len(),
            metric_records = document.metric_records.len(),
            "Loaded seed data file"
        );
        Ok(Some(SeedData::from(document)))
    }
}
