//! In-memory unit of work used by the service and HTTP tests.
//!
//! Writes are buffered per session and applied to the shared store on
//! `save`, so a dropped session leaves the store untouched, as with the
//! Postgres transaction.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use dataset_service::cache::AggregateCache;
use dataset_service::database::writers::validate_layouts;
use dataset_service::error::{Result, StoreError};
use dataset_service::models::{
    DataPoint, DatasetConfig, DatasetConfigAggregate, Record, SqlStatement, ViewConfig,
};
use dataset_service::ports::{
    DataPointReader, DataPointWriter, DatasetAggregateReader, DatasetAggregateWriter,
    DbHealthReader, GenericDataSeeder, Provide, SeedBatch, Session, StatementGenerator,
    UnitOfWork,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub configs: HashMap<Uuid, DatasetConfig>,
    pub layouts: Vec<ViewConfig>,
    pub statements: HashMap<Uuid, SqlStatement>,
    pub data_points: Vec<DataPoint>,
}

impl MemoryStore {
    fn table_len(&self, table: &str) -> usize {
        match table {
            "dataset_configs" => self.configs.len(),
            "view_configs" => self.layouts.len(),
            "sql_statements" => self.statements.len(),
            _ => self.data_points.len(),
        }
    }

    fn apply(&mut self, write: PendingWrite) {
        match write {
            PendingWrite::Aggregate(aggregate) => {
                if let Some(statement) = aggregate.statement.clone() {
                    self.statements.insert(statement.id, statement);
                }
                self.configs.insert(aggregate.id, aggregate.config());
                self.layouts.extend(aggregate.layouts);
            }
            PendingWrite::DataPoint(point) => self.data_points.push(point),
            PendingWrite::Seed(SeedBatch::DatasetConfigs(rows)) => {
                self.configs.extend(rows.into_iter().map(|c| (c.id, c)));
            }
            PendingWrite::Seed(SeedBatch::ViewConfigs(rows)) => self.layouts.extend(rows),
            PendingWrite::Seed(SeedBatch::SqlStatements(rows)) => {
                self.statements.extend(rows.into_iter().map(|s| (s.id, s)));
            }
            PendingWrite::Seed(SeedBatch::DataPoints(rows)) => self.data_points.extend(rows),
        }
    }

    fn aggregate(&self, id: Uuid) -> Option<DatasetConfigAggregate> {
        let config = self.configs.get(&id)?;
        Some(DatasetConfigAggregate {
            id: config.id,
            statement_id: config.statement_id,
            is_mutable: config.is_mutable,
            layouts: self
                .layouts
                .iter()
                .filter(|l| l.element_id == id)
                .cloned()
                .collect(),
            statement: config
                .statement_id
                .and_then(|sid| self.statements.get(&sid).cloned()),
            records: Vec::new(),
        })
    }
}

#[derive(Debug)]
enum PendingWrite {
    Aggregate(DatasetConfigAggregate),
    DataPoint(DataPoint),
    Seed(SeedBatch),
}

#[derive(Clone)]
pub struct InMemoryUnitOfWork {
    pub store: Arc<Mutex<MemoryStore>>,
    pub cache: Arc<AggregateCache>,
    pub aggregate_loads: Arc<AtomicUsize>,
    pub commits: Arc<AtomicUsize>,
    pub healthy: Arc<AtomicBool>,
}

impl Default for InMemoryUnitOfWork {
    fn default() -> Self {
        Self::with_cache(AggregateCache::default())
    }
}

impl InMemoryUnitOfWork {
    pub fn with_cache(cache: AggregateCache) -> Self {
        Self {
            store: Arc::default(),
            cache: Arc::new(cache),
            aggregate_loads: Arc::default(),
            commits: Arc::default(),
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn loads(&self) -> usize {
        self.aggregate_loads.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn data_point_count(&self) -> usize {
        self.store.lock().unwrap().data_points.len()
    }

    pub fn config_count(&self) -> usize {
        self.store.lock().unwrap().configs.len()
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    type Session = InMemorySession;

    async fn begin(&self) -> Result<InMemorySession> {
        Ok(InMemorySession {
            uow: self.clone(),
            pending: Arc::default(),
        })
    }
}

pub struct InMemorySession {
    uow: InMemoryUnitOfWork,
    pending: Arc<Mutex<Vec<PendingWrite>>>,
}

#[async_trait]
impl Session for InMemorySession {
    async fn save(self) -> Result<()> {
        let writes = std::mem::take(&mut *self.pending.lock().unwrap());
        let mut written = Vec::new();
        {
            let mut store = self.uow.store.lock().unwrap();
            for write in writes {
                if let PendingWrite::Aggregate(aggregate) = &write {
                    written.push(aggregate.id);
                }
                store.apply(write);
            }
        }
        self.uow.commits.fetch_add(1, Ordering::SeqCst);
        for id in written {
            self.uow.cache.invalidate(id).await;
        }
        Ok(())
    }
}

struct MemoryHealthReader(bool);

#[async_trait]
impl DbHealthReader for MemoryHealthReader {
    async fn check(&self) -> Result<Option<i32>> {
        if self.0 {
            Ok(Some(1))
        } else {
            Err(StoreError::Integrity("store unavailable".into()))
        }
    }
}

struct MemoryAggregateReader(InMemoryUnitOfWork);

#[async_trait]
impl DatasetAggregateReader for MemoryAggregateReader {
    async fn read(&self, id: Uuid) -> Result<Option<DatasetConfigAggregate>> {
        let uow = &self.0;
        uow.cache
            .get_or_load(id, || async move {
                uow.aggregate_loads.fetch_add(1, Ordering::SeqCst);
                Ok(uow.store.lock().unwrap().aggregate(id))
            })
            .await
    }
}

/// Matches data points whose `id` appears in the statement text and that
/// fall inside the day window, and emits the template's five columns.
struct MemoryDataPointReader(Arc<Mutex<MemoryStore>>);

#[async_trait]
impl DataPointReader for MemoryDataPointReader {
    async fn read(
        &self,
        statement: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
        day_range: i32,
    ) -> Result<Vec<Record>> {
        let since = Utc::now().date_naive() - ChronoDuration::days(i64::from(day_range));
        let store = self.0.lock().unwrap();
        Ok(store
            .data_points
            .iter()
            .filter(|p| p.id.is_some_and(|id| statement.contains(&id.to_string())))
            .filter(|p| p.timestamp.date_naive() >= since)
            .map(|p| {
                let mut record = Record::new();
                record.insert("decay_value".into(), p.decay_value.into());
                record.insert("decay_rate".into(), p.decay_rate.into());
                record.insert("items_flagged".into(), p.items_flagged.into());
                record.insert(
                    "notification_type".into(),
                    p.notification_type.clone().map_or(Value::Null, Value::from),
                );
                record.insert(
                    "notification_category".into(),
                    p.notification_category
                        .clone()
                        .map_or(Value::Null, Value::from),
                );
                record
            })
            .collect())
    }
}

struct MemoryAggregateWriter(Arc<Mutex<Vec<PendingWrite>>>);

#[async_trait]
impl DatasetAggregateWriter for MemoryAggregateWriter {
    async fn write(&self, aggregate: &DatasetConfigAggregate) -> Result<()> {
        validate_layouts(aggregate)?;
        self.0
            .lock()
            .unwrap()
            .push(PendingWrite::Aggregate(aggregate.clone()));
        Ok(())
    }
}

struct MemoryDataPointWriter(Arc<Mutex<Vec<PendingWrite>>>);

#[async_trait]
impl DataPointWriter for MemoryDataPointWriter {
    async fn write(&self, record: &DataPoint) -> Result<()> {
        self.0
            .lock()
            .unwrap()
            .push(PendingWrite::DataPoint(record.clone()));
        Ok(())
    }
}

struct MemorySeeder {
    store: Arc<Mutex<MemoryStore>>,
    pending: Arc<Mutex<Vec<PendingWrite>>>,
}

#[async_trait]
impl GenericDataSeeder for MemorySeeder {
    async fn seed(&self, batch: &SeedBatch) -> Result<u64> {
        if batch.is_empty() || self.store.lock().unwrap().table_len(batch.table()) > 0 {
            return Ok(0);
        }
        self.pending
            .lock()
            .unwrap()
            .push(PendingWrite::Seed(batch.clone()));
        Ok(batch.len() as u64)
    }
}

impl Provide<dyn DbHealthReader> for InMemorySession {
    fn provide(&self) -> Arc<dyn DbHealthReader> {
        Arc::new(MemoryHealthReader(self.uow.healthy.load(Ordering::SeqCst)))
    }
}

impl Provide<dyn DatasetAggregateReader> for InMemorySession {
    fn provide(&self) -> Arc<dyn DatasetAggregateReader> {
        Arc::new(MemoryAggregateReader(self.uow.clone()))
    }
}

impl Provide<dyn DataPointReader> for InMemorySession {
    fn provide(&self) -> Arc<dyn DataPointReader> {
        Arc::new(MemoryDataPointReader(Arc::clone(&self.uow.store)))
    }
}

impl Provide<dyn DatasetAggregateWriter> for InMemorySession {
    fn provide(&self) -> Arc<dyn DatasetAggregateWriter> {
        Arc::new(MemoryAggregateWriter(Arc::clone(&self.pending)))
    }
}

impl Provide<dyn DataPointWriter> for InMemorySession {
    fn provide(&self) -> Arc<dyn DataPointWriter> {
        Arc::new(MemoryDataPointWriter(Arc::clone(&self.pending)))
    }
}

impl Provide<dyn GenericDataSeeder> for InMemorySession {
    fn provide(&self) -> Arc<dyn GenericDataSeeder> {
        Arc::new(MemorySeeder {
            store: Arc::clone(&self.uow.store),
            pending: Arc::clone(&self.pending),
        })
    }
}

/// Generator that always fails, for abort-on-generation-failure tests.
pub struct FailingGenerator;

#[async_trait]
impl StatementGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str, _statement_id: Uuid) -> Result<String> {
        Err(StoreError::Generation("generation backend unavailable".into()))
    }
}

/// Generator returning a fixed text with literal windows, to observe rewriting.
pub struct LiteralWindowGenerator;

#[async_trait]
impl StatementGenerator for LiteralWindowGenerator {
    async fn generate(&self, _prompt: &str, statement_id: Uuid) -> Result<String> {
        Ok(format!(
            "SELECT * FROM data_points WHERE id = '{statement_id}' \
             AND timestamp BETWEEN '2025-01-01' AND '2025-01-31' \
             AND timestamp >= CURRENT_DATE - INTERVAL '7' DAY"
        ))
    }
}
