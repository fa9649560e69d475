//! Postgres unit of work.
//!
//! Each [`PgUnitOfWork::begin`] opens one transaction. The roles handed out by
//! the session share that transaction; `save` commits it, and dropping the
//! session without saving rolls it back. Aggregate ids written through the
//! session are evicted from the cache once the commit succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::readers::{PgDataPointReader, PgDatasetAggregateReader, PgDbHealthReader};
use super::writers::{PgDataPointWriter, PgDatasetAggregateWriter, PgGenericDataSeeder};
use crate::cache::AggregateCache;
use crate::error::{Result, StoreError};
use crate::ports::{
    DataPointReader, DataPointWriter, DatasetAggregateReader, DatasetAggregateWriter,
    DbHealthReader, GenericDataSeeder, Provide, Session, UnitOfWork,
};

type PgTransaction = Transaction<'static, Postgres>;

/// Transaction handle shared by all roles of one session.
#[derive(Clone)]
pub struct SessionTx(Arc<Mutex<Option<PgTransaction>>>);

impl SessionTx {
    fn new(tx: PgTransaction) -> Self {
        Self(Arc::new(Mutex::new(Some(tx))))
    }

    /// Locks the transaction. The guard holds `None` once the session is saved.
    pub async fn lock(&self) -> MutexGuard<'_, Option<PgTransaction>> {
        self.0.lock().await
    }

    async fn take(&self) -> Option<PgTransaction> {
        self.0.lock().await.take()
    }
}

/// Ids of aggregates written in a session, evicted from the cache on commit.
#[derive(Clone, Default)]
pub struct WrittenAggregates(Arc<Mutex<Vec<Uuid>>>);

impl WrittenAggregates {
    pub async fn record(&self, id: Uuid) {
        self.0.lock().await.push(id);
    }

    async fn drain(&self) -> Vec<Uuid> {
        std::mem::take(&mut *self.0.lock().await)
    }
}

#[derive(Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
    cache: Arc<AggregateCache>,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool, cache: Arc<AggregateCache>) -> Self {
        Self { pool, cache }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession> {
        let tx = self.pool.begin().await?;
        Ok(PgSession {
            tx: SessionTx::new(tx),
            cache: Arc::clone(&self.cache),
            written: WrittenAggregates::default(),
        })
    }
}

pub struct PgSession {
    tx: SessionTx,
    cache: Arc<AggregateCache>,
    written: WrittenAggregates,
}

#[async_trait]
impl Session for PgSession {
    async fn save(self) -> Result<()> {
        let tx = self.tx.take().await.ok_or(StoreError::SessionClosed)?;
        tx.commit().await?;

        for id in self.written.drain().await {
            debug!(dataset_configuration_id = %id, "Evicting committed aggregate from cache");
            self.cache.invalidate(id).await;
        }
        Ok(())
    }
}

impl Provide<dyn DbHealthReader> for PgSession {
    fn provide(&self) -> Arc<dyn DbHealthReader> {
        Arc::new(PgDbHealthReader::new(self.tx.clone()))
    }
}

impl Provide<dyn DatasetAggregateReader> for PgSession {
    fn provide(&self) -> Arc<dyn DatasetAggregateReader> {
        Arc::new(PgDatasetAggregateReader::new(
            self.tx.clone(),
            Arc::clone(&self.cache),
        ))
    }
}

impl Provide<dyn DataPointReader> for PgSession {
    fn provide(&self) -> Arc<dyn DataPointReader> {
        Arc::new(PgDataPointReader::new(self.tx.clone()))
    }
}

impl Provide<dyn DatasetAggregateWriter> for PgSession {
    fn provide(&self) -> Arc<dyn DatasetAggregateWriter> {
        Arc::new(PgDatasetAggregateWriter::new(
            self.tx.clone(),
            self.written.clone(),
        ))
    }
}

impl Provide<dyn DataPointWriter> for PgSession {
    fn provide(&self) -> Arc<dyn DataPointWriter> {
        Arc::new(PgDataPointWriter::new(self.tx.clone()))
    }
}

impl Provide<dyn GenericDataSeeder> for PgSession {
    fn provide(&self) -> Arc<dyn GenericDataSeeder> {
        Arc::new(PgGenericDataSeeder::new(self.tx.clone()))
    }
}
