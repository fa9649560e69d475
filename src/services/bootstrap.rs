//! Startup seeding.

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::ports::{GenericDataSeeder, Session, UnitOfWork};
use crate::seed::DataLoader;

/// Rows inserted per table by one bootstrap run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: Vec<(&'static str, u64)>,
}

impl SeedReport {
    pub fn total(&self) -> u64 {
        self.inserted.iter().map(|(_, n)| n).sum()
    }
}

/// Seeds empty tables from every loader in a single unit of work.
pub struct DataBootstrapper<U> {
    uow: Arc<U>,
    loaders: Vec<Arc<dyn DataLoader>>,
}

impl<U: UnitOfWork> DataBootstrapper<U> {
    pub fn new(uow: Arc<U>, loaders: Vec<Arc<dyn DataLoader>>) -> Self {
        Self { uow, loaders }
    }

    pub async fn run(&self) -> Result<SeedReport> {
        let mut data = Vec::with_capacity(self.loaders.len());
        for loader in &self.loaders {
            if let Some(loaded) = loader.load().await? {
                data.push(loaded);
            }
        }

        let mut report = SeedReport::default();
        if data.is_empty() {
            return Ok(report);
        }

        let session = self.uow.begin().await?;
        let seeder = session.persistence_factory::<dyn GenericDataSeeder>();
        for batch in data.iter().flat_map(|d| d.batches.iter()) {
            let inserted = seeder.seed(batch).await?;
            report.inserted.push((batch.table(), inserted));
        }
        session.save().await?;

        info!(rows = report.total(), "Seed data import complete");
        Ok(report)
    }
}
