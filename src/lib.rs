//! Dataset Service
//!
//! Analytics dataset configurations backed by Postgres. A dataset
//! configuration couples a set of layout coordinates with a generated,
//! parameterized statement; reading a dataset re-runs that statement over a
//! date window against the `data_points` fact table.
//!
//! Call chain:
//! HTTP handler -> application service -> unit of work session
//! -> role (reader / writer) -> Postgres transaction

pub mod api;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod ports;
pub mod seed;
pub mod services;
pub mod statement;
pub mod telemetry;

pub use error::StoreError;
