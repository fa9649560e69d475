//! Router construction.

use std::sync::Arc;

use axum::http::{header, Method};
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{auth, handlers, AppState};
use crate::ports::UnitOfWork;

/// Build the full axum router with all routes and middleware.
pub fn build_router<U: UnitOfWork>(state: Arc<AppState<U>>) -> Router {
    // Routes that require a bearer token
    let protected = Router::new()
        .route("/data", post(handlers::create_dataset::<U>))
        .route("/data/:dataset_id", get(handlers::get_dataset::<U>))
        .route(
            "/data/:dataset_id/data-points",
            post(handlers::create_data_point::<U>),
        )
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&state.authenticator),
            auth::require_bearer,
        ));

    // Public routes (no auth)
    let public = Router::new().route("/health", get(handlers::health::<U>));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(Any);

    public
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
