//! Models module for the dataset domain
//!
//! Plain data carried between the persistence roles, the application
//! services and the HTTP contracts.

pub mod dataset_models;

pub use dataset_models::{
    Coordinates, DataPoint, DatasetConfig, DatasetConfigAggregate, Record, SqlStatement,
    ViewConfig,
};
