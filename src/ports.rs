//! Persistence and generation roles.
//!
//! Each role is a single-operation trait. A unit of work session exposes a
//! typed factory over a fixed set of role bindings via [`Provide`]; services
//! ask for a role with `session.persistence_factory::<dyn Role>()`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{DataPoint, DatasetConfig, DatasetConfigAggregate, Record, SqlStatement, ViewConfig};

#[async_trait]
pub trait DbHealthReader: Send + Sync {
    /// Returns a row when the store answers a trivial query.
    async fn check(&self) -> Result<Option<i32>>;
}

#[async_trait]
pub trait DatasetAggregateReader: Send + Sync {
    /// Configuration + layouts + statement, with `records` left empty.
    async fn read(&self, id: Uuid) -> Result<Option<DatasetConfigAggregate>>;
}

#[async_trait]
pub trait DataPointReader: Send + Sync {
    /// Runs an already parameterized statement with the three window
    /// parameters bound.
    async fn read(
        &self,
        statement: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        day_range: i32,
    ) -> Result<Vec<Record>>;
}

#[async_trait]
pub trait DatasetAggregateWriter: Send + Sync {
    /// Persists the configuration, its layouts and its statement.
    async fn write(&self, aggregate: &DatasetConfigAggregate) -> Result<()>;
}

#[async_trait]
pub trait DataPointWriter: Send + Sync {
    async fn write(&self, record: &DataPoint) -> Result<()>;
}

/// Rows for one table of the seed import.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedBatch {
    DatasetConfigs(Vec<DatasetConfig>),
    ViewConfigs(Vec<ViewConfig>),
    SqlStatements(Vec<SqlStatement>),
    DataPoints(Vec<DataPoint>),
}

impl SeedBatch {
    pub fn table(&self) -> &'static str {
        match self {
            Self::DatasetConfigs(_) => "dataset_configs",
            Self::ViewConfigs(_) => "view_configs",
            Self::SqlStatements(_) => "sql_statements",
            Self::DataPoints(_) => "data_points",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::DatasetConfigs(rows) => rows.len(),
            Self::ViewConfigs(rows) => rows.len(),
            Self::SqlStatements(rows) => rows.len(),
            Self::DataPoints(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
pub trait GenericDataSeeder: Send + Sync {
    /// Inserts the batch only if its table is empty. Returns rows inserted.
    async fn seed(&self, batch: &SeedBatch) -> Result<u64>;
}

#[async_trait]
pub trait StatementGenerator: Send + Sync {
    /// Produces statement text for a prompt. `statement_id` is the id the
    /// statement will be stored under and the key data points carry.
    async fn generate(&self, prompt: &str, statement_id: Uuid) -> Result<String>;
}

/// Binding of one role to a session implementation.
pub trait Provide<R: ?Sized> {
    fn provide(&self) -> Arc<R>;
}

/// One transactional scope. Dropping a session without [`Session::save`]
/// discards everything written through it.
#[async_trait]
pub trait Session:
    Send
    + Sized
    + Provide<dyn DbHealthReader>
    + Provide<dyn DatasetAggregateReader>
    + Provide<dyn DataPointReader>
    + Provide<dyn DatasetAggregateWriter>
    + Provide<dyn DataPointWriter>
    + Provide<dyn GenericDataSeeder>
{
    fn persistence_factory<R: ?Sized>(&self) -> Arc<R>
    where
        Self: Provide<R>,
    {
        <Self as Provide<R>>::provide(self)
    }

    /// Commits all writes made through this session.
    async fn save(self) -> Result<()>;
}

#[async_trait]
pub trait UnitOfWork: Send + Sync + 'static {
    type Session: Session;

    async fn begin(&self) -> Result<Self::Session>;
}
