//! Application services.
//!
//! Each service opens one unit of work session per call and resolves the
//! roles it needs from that session.

pub mod bootstrap;
pub mod dataset_services;

pub use bootstrap::{DataBootstrapper, SeedReport};
pub use dataset_services::{
    ConfigurationManager, DataPointCreationService, DataRetrievalHandler, SystemStatusChecker,
};
