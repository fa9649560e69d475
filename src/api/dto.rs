//! Request and response contracts.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Coordinates, DataPoint, DatasetConfigAggregate, Record, ViewConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub application: bool,
    pub database: bool,
}

/// One layout as seen by callers: `{breakpoint, coordinates: [x,y,w,h], static}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutContract {
    pub breakpoint: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default, rename = "static")]
    pub is_static: Option<bool>,
}

impl LayoutContract {
    fn into_view_config(self, element_id: Uuid) -> ViewConfig {
        ViewConfig {
            id: Uuid::new_v4(),
            element_id,
            breakpoint: self.breakpoint,
            coordinates: self.coordinates,
            is_static: self.is_static,
        }
    }
}

impl From<&ViewConfig> for LayoutContract {
    fn from(view: &ViewConfig) -> Self {
        Self {
            breakpoint: view.breakpoint.clone(),
            coordinates: view.coordinates,
            is_static: view.is_static,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetResponse {
    pub id: Uuid,
    pub is_mutable: bool,
    pub records: Vec<Record>,
    pub layouts: Vec<LayoutContract>,
}

impl From<DatasetConfigAggregate> for DatasetResponse {
    fn from(aggregate: DatasetConfigAggregate) -> Self {
        Self {
            id: aggregate.id,
            is_mutable: aggregate.is_mutable,
            layouts: aggregate.layouts.iter().map(LayoutContract::from).collect(),
            records: aggregate.records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDatasetConfigRequest {
    pub is_mutable: bool,
    pub layouts: Vec<LayoutContract>,
    pub statement_generation_prompt: String,
}

impl CreateDatasetConfigRequest {
    /// Mints the dataset id and parents every layout to it. Returns the
    /// aggregate (without statement) and the prompt.
    pub fn into_aggregate(self) -> (DatasetConfigAggregate, String) {
        let id = Uuid::new_v4();
        let aggregate = DatasetConfigAggregate {
            id,
            is_mutable: self.is_mutable,
            layouts: self
                .layouts
                .into_iter()
                .map(|layout| layout.into_view_config(id))
                .collect(),
            ..Default::default()
        };
        (aggregate, self.statement_generation_prompt)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateDataPointRequest {
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

impl From<CreateDataPointRequest> for DataPoint {
    fn from(request: CreateDataPointRequest) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            id: None,
            timestamp: Utc::now(),
            decay_value: request.decay_value,
            decay_rate: request.decay_rate,
            items_flagged: request.items_flagged,
            notification_type: request.notification_type,
            notification_category: request.notification_category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// Window parameters for `GET /data/:dataset_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetWindowQuery {
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,
    /// Days before today
    #[serde(default = "default_day_range")]
    pub day_range: i32,
}

impl Default for DatasetWindowQuery {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            day_range: default_day_range(),
        }
    }
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap_or_default()
}

fn default_day_range() -> i32 {
    30
}
