//! HTTP surface.
//!
//! `/health` is public; every `/data` route requires a bearer token checked
//! by the configured [`Authenticator`].

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;

use std::sync::Arc;

use crate::ports::{StatementGenerator, UnitOfWork};
use crate::services::{
    ConfigurationManager, DataPointCreationService, DataRetrievalHandler, SystemStatusChecker,
};

pub use auth::{AuthError, Authenticator, JwtAuthenticator, Principal};
pub use error::ApiError;
pub use router::build_router;

/// Shared handler state: the application services over one unit of work.
pub struct AppState<U> {
    pub status: SystemStatusChecker<U>,
    pub retrieval: DataRetrievalHandler<U>,
    pub configurations: ConfigurationManager<U>,
    pub data_points: DataPointCreationService<U>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl<U: UnitOfWork> AppState<U> {
    pub fn new(
        uow: Arc<U>,
        generator: Arc<dyn StatementGenerator>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            status: SystemStatusChecker::new(Arc::clone(&uow)),
            retrieval: DataRetrievalHandler::new(Arc::clone(&uow)),
            configurations: ConfigurationManager::new(Arc::clone(&uow), generator),
            data_points: DataPointCreationService::new(uow),
            authenticator,
        }
    }
}
