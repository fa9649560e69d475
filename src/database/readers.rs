//! Postgres reader roles.
//!
//! All SQL is runtime-checked (sqlx::query, not sqlx::query!) so the crate
//! builds without a live database.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::{debug, info};
use uuid::Uuid;

use super::row_mapping::row_to_record;
use super::unit_of_work::SessionTx;
use crate::cache::AggregateCache;
use crate::error::{Result, StoreError};
use crate::models::{Coordinates, DatasetConfigAggregate, Record, SqlStatement, ViewConfig};
use crate::ports::{DataPointReader, DatasetAggregateReader, DbHealthReader};
use crate::statement::{bind_named_parameters, StatementParameter};

#[derive(Debug, FromRow)]
struct DatasetConfigRow {
    id: Uuid,
    statement_id: Option<Uuid>,
    is_mutable: bool,
}

#[derive(Debug, FromRow)]
struct ViewConfigRow {
    id: Uuid,
    element_id: Uuid,
    breakpoint: String,
    coordinates: Option<Json<Coordinates>>,
    #[sqlx(rename = "static")]
    is_static: Option<bool>,
}

impl From<ViewConfigRow> for ViewConfig {
    fn from(row: ViewConfigRow) -> Self {
        Self {
            id: row.id,
            element_id: row.element_id,
            breakpoint: row.breakpoint,
            coordinates: row.coordinates.map(|Json(c)| c),
            is_static: row.is_static,
        }
    }
}

#[derive(Debug, FromRow)]
struct SqlStatementRow {
    id: Uuid,
    statement: String,
}

pub struct PgDbHealthReader {
    tx: SessionTx,
}

impl PgDbHealthReader {
    pub fn new(tx: SessionTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl DbHealthReader for PgDbHealthReader {
    async fn check(&self) -> Result<Option<i32>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::SessionClosed)?;
        let row = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row)
    }
}

/// Loads a dataset configuration with its layouts and statement, through
/// the shared aggregate cache.
pub struct PgDatasetAggregateReader {
    tx: SessionTx,
    cache: Arc<AggregateCache>,
}

impl PgDatasetAggregateReader {
    pub fn new(tx: SessionTx, cache: Arc<AggregateCache>) -> Self {
        Self { tx, cache }
    }

    async fn load(&self, id: Uuid) -> Result<Option<DatasetConfigAggregate>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::SessionClosed)?;

        info!(
            dataset_configuration_id = %id,
            "Retrieving dataset configuration from db"
        );

        let config = sqlx::query_as::<_, DatasetConfigRow>(
            r#"
            SELECT id, statement_id, is_mutable
            FROM dataset_configs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(config) = config else {
            return Ok(None);
        };

        let layouts = sqlx::query_as::<_, ViewConfigRow>(
            r#"
            SELECT id, element_id, breakpoint, coordinates, "static"
            FROM view_configs
            WHERE element_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await?;

        let statement = match config.statement_id {
            Some(statement_id) => sqlx::query_as::<_, SqlStatementRow>(
                r#"
                SELECT id, statement
                FROM sql_statements
                WHERE id = $1
                "#,
            )
            .bind(statement_id)
            .fetch_optional(&mut **tx)
            .await?
            .map(|row| SqlStatement {
                id: row.id,
                statement: row.statement,
            }),
            None => None,
        };

        Ok(Some(DatasetConfigAggregate {
            id: config.id,
            statement_id: config.statement_id,
            is_mutable: config.is_mutable,
            layouts: layouts.into_iter().map(ViewConfig::from).collect(),
            statement,
            records: Vec::new(),
        }))
    }
}

#[async_trait]
impl DatasetAggregateReader for PgDatasetAggregateReader {
    async fn read(&self, id: Uuid) -> Result<Option<DatasetConfigAggregate>> {
        self.cache.get_or_load(id, || self.load(id)).await
    }
}

/// Executes a stored statement with the window parameters bound.
pub struct PgDataPointReader {
    tx: SessionTx,
}

impl PgDataPointReader {
    pub fn new(tx: SessionTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl DataPointReader for PgDataPointReader {
    async fn read(
        &self,
        statement: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        day_range: i32,
    ) -> Result<Vec<Record>> {
        let bound = bind_named_parameters(statement);

        let mut query = sqlx::query(&bound.sql);
        for parameter in &bound.parameters {
            query = match parameter {
                StatementParameter::StartDate => query.bind(start_date),
                StatementParameter::EndDate => query.bind(end_date),
                StatementParameter::DayRange => query.bind(day_range),
            };
        }

        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::SessionClosed)?;
        let rows = query.fetch_all(&mut **tx).await?;

        debug!(
            rows = rows.len(),
            parameters = bound.parameters.len(),
            "Executed dataset statement"
        );

        rows.iter().map(row_to_record).collect()
    }
}
