//! Domain models for dataset configurations
//!
//! Relations between these types are logical id references only
//! (`ViewConfig::element_id` -> `DatasetConfig::id`,
//! `DataPoint::id` -> `SqlStatement::id`). Joins happen in the readers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One result row of a dataset statement, column name -> value.
///
/// Key order follows the statement's column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Grid position of a layout element, always serialized as `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Coordinates {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

impl From<[i32; 4]> for Coordinates {
    fn from([x, y, w, h]: [i32; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl From<Coordinates> for [i32; 4] {
    fn from(c: Coordinates) -> Self {
        [c.x, c.y, c.w, c.h]
    }
}

/// Dataset configuration row, used for stateless writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub id: Uuid,
    pub statement_id: Option<Uuid>,
    pub is_mutable: bool,
}

/// Stored statement text. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlStatement {
    pub id: Uuid,
    pub statement: String,
}

/// Breakpoint-specific layout of one dataset element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub id: Uuid,
    /// Owning dataset configuration id
    pub element_id: Uuid,
    pub breakpoint: String,
    pub coordinates: Option<Coordinates>,
    pub is_static: Option<bool>,
}

/// Read model: a dataset configuration with its layouts and statement.
///
/// `records` is transient and only populated by a read that also ran the
/// data point reader. It is never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetConfigAggregate {
    pub id: Uuid,
    pub statement_id: Option<Uuid>,
    pub is_mutable: bool,
    pub layouts: Vec<ViewConfig>,
    pub statement: Option<SqlStatement>,
    #[serde(skip)]
    pub records: Vec<Record>,
}

impl DatasetConfigAggregate {
    pub fn config(&self) -> DatasetConfig {
        DatasetConfig {
            id: self.id,
            statement_id: self.statement_id,
            is_mutable: self.is_mutable,
        }
    }

    /// Statement text to run for records, if the statement is linked.
    pub fn statement_text(&self) -> Option<&str> {
        self.statement.as_ref().map(|s| s.statement.as_str())
    }
}

impl From<DatasetConfig> for DatasetConfigAggregate {
    fn from(config: DatasetConfig) -> Self {
        Self {
            id: config.id,
            statement_id: config.statement_id,
            is_mutable: config.is_mutable,
            ..Default::default()
        }
    }
}

/// One raw fact row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Generated per insert; identifies the row itself, not its dataset
    pub record_id: Uuid,
    /// Statement id of the owning dataset, the join key used by reads
    pub id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub decay_value: Option<f64>,
    pub decay_rate: Option<f64>,
    pub items_flagged: Option<i32>,
    pub notification_type: Option<String>,
    pub notification_category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_serialize_as_ordered_array() {
        let c = Coordinates::new(2, 4, 5, 1);
        assert_eq!(serde_json::to_string(&c).unwrap(), "[2,4,5,1]");
    }

    #[test]
    fn coordinates_keep_zero_and_negative_values() {
        let c: Coordinates = serde_json::from_str("[0,-3,0,-1]").unwrap();
        assert_eq!(c, Coordinates::new(0, -3, 0, -1));
        assert_eq!(<[i32; 4]>::from(c), [0, -3, 0, -1]);
    }

    #[test]
    fn coordinates_reject_partial_arrays() {
        assert!(serde_json::from_str::<Coordinates>("[1,2,3]").is_err());
        assert!(serde_json::from_str::<Coordinates>("[1,null,3,4]").is_err());
    }

    #[test]
    fn aggregate_from_config_has_no_records() {
        let config = DatasetConfig {
            id: Uuid::new_v4(),
            statement_id: Some(Uuid::new_v4()),
            is_mutable: true,
        };
        let aggregate = DatasetConfigAggregate::from(config.clone());
        assert_eq!(aggregate.config(), config);
        assert!(aggregate.records.is_empty());
        assert!(aggregate.statement_text().is_none());
    }
}
