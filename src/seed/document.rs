//! Seed document format.
//!
//! ```json
//! {
//!   "datasets": {
//!     "items":   [{ "id": "...", "statementId": "...", "isMutable": true }],
//!     "layouts": { "md": [{ "i": "...", "x": 0, "y": 0, "w": 4, "h": 2, "static": false }] }
//!   },
//!   "queries":        [{ "id": "...", "statement": "SELECT ..." }],
//!   "metric_records": [{ "id": "...", "timestamp": "2025-06-03T10:00:00", "decay_value": 0.4 }]
//! }
//! ```

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::models::{Coordinates, DataPoint, DatasetConfig, SqlStatement, ViewConfig};
use crate::statement::parameterize_statement;

/// Ids that appear twice in the exported dataset list. The second
/// occurrence is re-keyed to the mapped id.
pub const DUPLICATE_ID_REMAP: &[(Uuid, Uuid)] = &[(
    uuid::uuid!("53aaf9d4-04d3-43d3-9f40-6ce4a9282a5c"),
    uuid::uuid!("1379a764-2543-45fd-a78b-8c5a65827417"),
)];

#[derive(Debug, Default, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub datasets: SeedDatasets,
    #[serde(default)]
    pub queries: Vec<SeedQuery>,
    #[serde(default)]
    pub metric_records: Vec<SeedMetricRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedDatasets {
    #[serde(default)]
    pub items: Vec<SeedDatasetItem>,
    /// Layouts keyed by breakpoint name
    #[serde(default)]
    pub layouts: BTreeMap<String, Vec<SeedLayout>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedDatasetItem {
    pub id: Uuid,
    #[serde(default, alias = "statementId")]
    pub statement_id: Option<Uuid>,
    #[serde(alias = "isMutable")]
    pub is_mutable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedLayout {
    /// Owning dataset id
    pub i: Uuid,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    #[serde(default, rename = "static")]
    pub is_static: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedQuery {
    pub id: Uuid,
    pub statement: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedMetricRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub decay_value: Option<f64>,
    #[serde(default)]
    pub decay_rate: Option<f64>,
    #[serde(default)]
    pub items_flagged: Option<i32>,
    #[serde(default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub notification_category: Option<String>,
}

/// Accepts RFC 3339 timestamps and offset-less ISO timestamps (read as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Re-keys the second and later occurrences of ids listed in `remap`.
pub fn remap_duplicate_ids(items: Vec<SeedDatasetItem>, remap: &[(Uuid, Uuid)]) -> Vec<SeedDatasetItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|mut item| {
            if seen.contains(&item.id) {
                if let Some((_, replacement)) = remap.iter().find(|(from, _)| *from == item.id) {
                    item.id = *replacement;
                }
            }
            seen.insert(item.id);
            item
        })
        .collect()
}

impl SeedDocument {
    pub fn dataset_configs(&self) -> Vec<DatasetConfig> {
        remap_duplicate_ids(self.datasets.items.clone(), DUPLICATE_ID_REMAP)
            .into_iter()
            .map(|item| DatasetConfig {
                id: item.id,
                statement_id: item.statement_id,
                is_mutable: item.is_mutable,
            })
            .collect()
    }

    pub fn view_configs(&self) -> Vec<ViewConfig> {
        self.datasets
            .layouts
            .iter()
            .flat_map(|(breakpoint, layouts)| {
                layouts.iter().map(move |layout| ViewConfig {
                    id: Uuid::new_v4(),
                    element_id: layout.i,
                    breakpoint: breakpoint.clone(),
                    coordinates: Some(Coordinates::new(layout.x, layout.y, layout.w, layout.h)),
                    is_static: layout.is_static,
                })
            })
            .collect()
    }

    /// Stored statements with their literal windows replaced by parameters.
    pub fn sql_statements(&self) -> Vec<SqlStatement> {
        self.queries
            .iter()
            .map(|query| SqlStatement {
                id: query.id,
                statement: parameterize_statement(&query.statement),
            })
            .collect()
    }

    pub fn data_points(&self) -> Vec<DataPoint> {
        self.metric_records
            .iter()
            .map(|record| DataPoint {
                record_id: Uuid::new_v4(),
                id: record.id,
                timestamp: record.timestamp,
                decay_value: record.decay_value,
                decay_rate: record.decay_rate,
                items_flagged: record.items_flagged,
                notification_type: record.notification_type.clone(),
                notification_category: record.notification_category.clone(),
            })
            .collect()
    }
}
