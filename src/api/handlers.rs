//! Route handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use super::dto::{
    CreateDataPointRequest, CreateDatasetConfigRequest, CreatedResponse, DatasetResponse,
    DatasetWindowQuery, HealthResponse,
};
use super::error::ApiError;
use super::AppState;
use crate::models::DataPoint;
use crate::ports::UnitOfWork;

/// GET /health
pub async fn health<U: UnitOfWork>(State(state): State<Arc<AppState<U>>>) -> Json<HealthResponse> {
    info!(operation = "get_system_health", "Endpoint called");
    let database = state.status.check().await;
    Json(HealthResponse {
        application: true,
        database,
    })
}

/// GET /data/:dataset_id
pub async fn get_dataset<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<DatasetWindowQuery>, QueryRejection>,
) -> Result<Json<DatasetResponse>, ApiError> {
    let Path(dataset_id) = path?;
    let Query(window) = query?;

    info!(
        operation = "get_analytics_dataset",
        id = %dataset_id,
        start_date = %window.start_date,
        end_date = %window.end_date,
        day_range = window.day_range,
        "Endpoint called"
    );

    let aggregate = state
        .retrieval
        .handle(
            dataset_id,
            window.start_date,
            window.end_date,
            window.day_range,
        )
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(DatasetResponse::from(aggregate)))
}

/// POST /data
pub async fn create_dataset<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    body: Result<Json<CreateDatasetConfigRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(request) = body?;

    info!(
        operation = "create_analytics_configuration",
        is_mutable = request.is_mutable,
        statement_generation_prompt = %request.statement_generation_prompt,
        "Endpoint called"
    );

    let (aggregate, prompt) = request.into_aggregate();
    let id = state.configurations.create(aggregate, &prompt).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// POST /data/:dataset_id/data-points
pub async fn create_data_point<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CreateDataPointRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(dataset_id) = path?;
    let Json(request) = body?;

    info!(
        operation = "create_data_point",
        dataset_id = %dataset_id,
        decay_rate = ?request.decay_rate,
        decay_value = ?request.decay_value,
        notification_type = ?request.notification_type,
        notification_category = ?request.notification_category,
        "Endpoint called"
    );

    state
        .data_points
        .create(dataset_id, DataPoint::from(request))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(StatusCode::CREATED)
}
