//! Postgres writer roles.
//!
//! Writes go through the session transaction and become visible only when
//! the session is saved.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::info;

use super::unit_of_work::{SessionTx, WrittenAggregates};
use crate::error::{Result, StoreError};
use crate::models::{DataPoint, DatasetConfig, DatasetConfigAggregate, SqlStatement, ViewConfig};
use crate::ports::{DataPointWriter, DatasetAggregateWriter, GenericDataSeeder, SeedBatch};

/// Layouts must belong to the aggregate they are written with.
pub fn validate_layouts(aggregate: &DatasetConfigAggregate) -> Result<()> {
    if let Some(orphan) = aggregate
        .layouts
        .iter()
        .find(|layout| layout.element_id != aggregate.id)
    {
        return Err(StoreError::Integrity(format!(
            "layout {} references dataset {} but is written with dataset {}",
            orphan.id, orphan.element_id, aggregate.id
        )));
    }

    if let (Some(statement_id), Some(statement)) = (aggregate.statement_id, &aggregate.statement) {
        if statement.id != statement_id {
            return Err(StoreError::Integrity(format!(
                "dataset {} links statement {} but carries statement {}",
                aggregate.id, statement_id, statement.id
            )));
        }
    }
    Ok(())
}

pub struct PgDatasetAggregateWriter {
    tx: SessionTx,
    written: WrittenAggregates,
}

impl PgDatasetAggregateWriter {
    pub fn new(tx: SessionTx, written: WrittenAggregates) -> Self {
        Self { tx, written }
    }
}

#[async_trait]
impl DatasetAggregateWriter for PgDatasetAggregateWriter {
    async fn write(&self, aggregate: &DatasetConfigAggregate) -> Result<()> {
        validate_layouts(aggregate)?;

        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::SessionClosed)?;

        if let Some(statement) = &aggregate.statement {
            insert_statements(tx, std::slice::from_ref(statement)).await?;
        }
        insert_configs(tx, &[aggregate.config()]).await?;
        insert_layouts(tx, &aggregate.layouts).await?;

        info!(
            dataset_configuration_id = %aggregate.id,
            layouts = aggregate.layouts.len(),
            "Dataset configuration staged for commit"
        );
        self.written.record(aggregate.id).await;
        Ok(())
    }
}

pub struct PgDataPointWriter {
    tx: SessionTx,
}

impl PgDataPointWriter {
    pub fn new(tx: SessionTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl DataPointWriter for PgDataPointWriter {
    async fn write(&self, record: &DataPoint) -> Result<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::SessionClosed)?;
        insert_data_points(tx, std::slice::from_ref(record)).await?;
        Ok(())
    }
}

/// Seeds a table only when it is empty.
pub struct PgGenericDataSeeder {
    tx: SessionTx,
}

impl PgGenericDataSeeder {
    pub fn new(tx: SessionTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl GenericDataSeeder for PgGenericDataSeeder {
    async fn seed(&self, batch: &SeedBatch) -> Result<u64> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::SessionClosed)?;

        info!(table = batch.table(), "{} input rows", batch.len());

        // table names come from a closed set, never from input
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", batch.table()))
            .fetch_one(&mut **tx)
            .await?;

        info!(table = batch.table(), "{} rows found in db", count);
        if count > 0 || batch.is_empty() {
            return Ok(0);
        }

        match batch {
            SeedBatch::DatasetConfigs(rows) => insert_configs(tx, rows).await,
            SeedBatch::ViewConfigs(rows) => insert_layouts(tx, rows).await,
            SeedBatch::SqlStatements(rows) => insert_statements(tx, rows).await,
            SeedBatch::DataPoints(rows) => insert_data_points(tx, rows).await,
        }
    }
}

/// Postgres rejects a statement with more bind parameters than this.
const MAX_BIND_PARAMETERS: usize = 65_535;

/// Rows per multi-row `INSERT` for a table with `columns` bound columns.
fn rows_per_insert(columns: usize) -> usize {
    (MAX_BIND_PARAMETERS / columns).max(1)
}

async fn insert_statements(conn: &mut PgConnection, rows: &[SqlStatement]) -> Result<u64> {
    let mut inserted = 0;
    for chunk in rows.chunks(rows_per_insert(2)) {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO sql_statements (id, statement) ");
        builder.push_values(chunk, |mut b, row| {
            b.push_bind(row.id).push_bind(&row.statement);
        });
        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(inserted)
}

async fn insert_configs(conn: &mut PgConnection, rows: &[DatasetConfig]) -> Result<u64> {
    let mut inserted = 0;
    for chunk in rows.chunks(rows_per_insert(3)) {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO dataset_configs (id, statement_id, is_mutable) ");
        builder.push_values(chunk, |mut b, row| {
            b.push_bind(row.id)
                .push_bind(row.statement_id)
                .push_bind(row.is_mutable);
        });
        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(inserted)
}

async fn insert_layouts(conn: &mut PgConnection, rows: &[ViewConfig]) -> Result<u64> {
    let per_insert = rows_per_insert(6);
    let mut inserted = 0;
    for (chunk_index, chunk) in rows.chunks(per_insert).enumerate() {
        let offset = chunk_index * per_insert;
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"INSERT INTO view_configs (id, element_id, breakpoint, position, coordinates, "static") "#,
        );
        // position is the index in the whole write, not in the chunk
        builder.push_values(chunk.iter().enumerate(), |mut b, (index, row)| {
            b.push_bind(row.id)
                .push_bind(row.element_id)
                .push_bind(&row.breakpoint)
                .push_bind((offset + index) as i32)
                .push_bind(row.coordinates.map(Json))
                .push_bind(row.is_static);
        });
        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(inserted)
}

async fn insert_data_points(conn: &mut PgConnection, rows: &[DataPoint]) -> Result<u64> {
    let mut inserted = 0;
    for chunk in rows.chunks(rows_per_insert(8)) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            INSERT INTO data_points (
                record_id, id, timestamp, decay_value, decay_rate,
                items_flagged, notification_type, notification_category
            )
            "#,
        );
        builder.push_values(chunk, |mut b, row| {
            b.push_bind(row.record_id)
                .push_bind(row.id)
                .push_bind(row.timestamp)
                .push_bind(row.decay_value)
                .push_bind(row.decay_rate)
                .push_bind(row.items_flagged)
                .push_bind(&row.notification_type)
                .push_bind(&row.notification_category);
        });
        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;
    use uuid::Uuid;

    fn layout(element_id: Uuid) -> ViewConfig {
        ViewConfig {
            id: Uuid::new_v4(),
            element_id,
            breakpoint: "md".into(),
            coordinates: Some(Coordinates::new(1, 1, 1, 1)),
            is_static: Some(true),
        }
    }

    #[test]
    fn insert_chunks_stay_under_bind_limit() {
        for columns in [2, 3, 6, 8] {
            let rows = rows_per_insert(columns);
            assert!(rows * columns <= MAX_BIND_PARAMETERS);
            assert!((rows + 1) * columns > MAX_BIND_PARAMETERS);
        }
        assert_eq!(rows_per_insert(8), 8_191);
    }

    #[test]
    fn accepts_layouts_owned_by_aggregate() {
        let id = Uuid::new_v4();
        let aggregate = DatasetConfigAggregate {
            id,
            layouts: vec![layout(id), layout(id)],
            ..Default::default()
        };
        assert!(validate_layouts(&aggregate).is_ok());
    }

    #[test]
    fn rejects_layout_for_other_dataset() {
        let id = Uuid::new_v4();
        let aggregate = DatasetConfigAggregate {
            id,
            layouts: vec![layout(id), layout(Uuid::new_v4())],
            ..Default::default()
        };
        assert!(matches!(
            validate_layouts(&aggregate),
            Err(StoreError::Integrity(_))
        ));
    }

    #[test]
    fn rejects_mismatched_statement_link() {
        let aggregate = DatasetConfigAggregate {
            id: Uuid::new_v4(),
            statement_id: Some(Uuid::new_v4()),
            statement: Some(SqlStatement {
                id: Uuid::new_v4(),
                statement: "SELECT 1".into(),
            }),
            ..Default::default()
        };
        assert!(matches!(
            validate_layouts(&aggregate),
            Err(StoreError::Integrity(_))
        ));
    }
}
