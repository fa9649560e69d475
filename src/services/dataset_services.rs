use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{DataPoint, DatasetConfigAggregate, SqlStatement};
use crate::ports::{
    DataPointReader, DataPointWriter, DatasetAggregateReader, DatasetAggregateWriter,
    DbHealthReader, Session, StatementGenerator, UnitOfWork,
};
use crate::statement::parameterize_statement;

/// Reports whether the backing store answers.
pub struct SystemStatusChecker<U> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> SystemStatusChecker<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Never fails: an unreachable store is reported as `false`.
    pub async fn check(&self) -> bool {
        match self.probe().await {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        }
    }

    async fn probe(&self) -> Result<bool> {
        let session = self.uow.begin().await?;
        let reader = session.persistence_factory::<dyn DbHealthReader>();
        Ok(reader.check().await?.is_some())
    }
}

/// Reads a dataset configuration and runs its statement over a date window.
pub struct DataRetrievalHandler<U> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> DataRetrievalHandler<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    pub async fn handle(
        &self,
        id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        day_range: i32,
    ) -> Result<Option<DatasetConfigAggregate>> {
        // read-only: the session is dropped without saving
        let session = self.uow.begin().await?;
        let config_reader = session.persistence_factory::<dyn DatasetAggregateReader>();

        let Some(mut aggregate) = config_reader.read(id).await? else {
            return Ok(None);
        };

        match aggregate.statement_text() {
            Some(statement) => {
                let records_reader = session.persistence_factory::<dyn DataPointReader>();
                let records = records_reader
                    .read(statement, start_date, end_date, day_range)
                    .await?;
                aggregate.records = records;
            }
            None => warn!(
                dataset_configuration_id = %id,
                statement_id = ?aggregate.statement_id,
                "Dataset has no stored statement, returning no records"
            ),
        }

        Ok(Some(aggregate))
    }
}

/// Creates dataset configurations with a freshly generated statement.
pub struct ConfigurationManager<U> {
    uow: Arc<U>,
    generator: Arc<dyn StatementGenerator>,
}

impl<U: UnitOfWork> ConfigurationManager<U> {
    pub fn new(uow: Arc<U>, generator: Arc<dyn StatementGenerator>) -> Self {
        Self { uow, generator }
    }

    /// Generates and stores the statement, persists the aggregate with its
    /// layouts, and returns the aggregate id. A generation failure aborts
    /// before anything is written.
    pub async fn create(&self, mut aggregate: DatasetConfigAggregate, prompt: &str) -> Result<Uuid> {
        let session = self.uow.begin().await?;

        let statement_id = Uuid::new_v4();
        let generated = self.generator.generate(prompt, statement_id).await?;

        aggregate.statement_id = Some(statement_id);
        aggregate.statement = Some(SqlStatement {
            id: statement_id,
            statement: parameterize_statement(&generated),
        });

        let writer = session.persistence_factory::<dyn DatasetAggregateWriter>();
        writer.write(&aggregate).await?;
        session.save().await?;

        info!(
            dataset_configuration_id = %aggregate.id,
            %statement_id,
            "Dataset configuration created"
        );
        Ok(aggregate.id)
    }
}

/// Appends raw data points under an existing dataset configuration.
pub struct DataPointCreationService<U> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> DataPointCreationService<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Returns `None` without writing when the dataset does not exist.
    pub async fn create(&self, dataset_id: Uuid, mut data_point: DataPoint) -> Result<Option<Uuid>> {
        let session = self.uow.begin().await?;
        let reader = session.persistence_factory::<dyn DatasetAggregateReader>();

        let Some(aggregate) = reader.read(dataset_id).await? else {
            return Ok(None);
        };

        data_point.id = aggregate.statement_id;
        let writer = session.persistence_factory::<dyn DataPointWriter>();
        writer.write(&data_point).await?;
        session.save().await?;

        Ok(Some(aggregate.id))
    }
}
