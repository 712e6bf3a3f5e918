use axum::{http::StatusCode, Json};
use contracts::dashboards::d100_sales_overview::{
    DashboardAggregates, DashboardError, DashboardFilters, DatasetSummary, MapLayerConfig,
};

use crate::dashboards::d100_sales_overview::cache::{self, DatasetCache};
use crate::dashboards::d100_sales_overview::error::LoadError;
use crate::dashboards::d100_sales_overview::service;
use crate::shared::config;

type ApiError = (StatusCode, Json<DashboardError>);

fn error_body(status: StatusCode, kind: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(DashboardError {
            kind: kind.to_string(),
            message: message.into(),
        }),
    )
}

/// HTTP status for a failed load attempt
pub fn load_error_status(error: &LoadError) -> StatusCode {
    match error {
        LoadError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        LoadError::SchemaValidation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn load_error(error: LoadError) -> ApiError {
    error_body(load_error_status(&error), error.kind(), error.to_string())
}

fn not_loaded() -> ApiError {
    error_body(
        StatusCode::CONFLICT,
        "not_loaded",
        "dataset is not loaded, call /api/dashboard/load first",
    )
}

fn dataset_cache() -> Result<&'static DatasetCache, ApiError> {
    cache::get_cache().ok_or_else(|| {
        tracing::error!("D100 Dashboard: dataset cache is not initialized");
        error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            "not_initialized",
            "dataset cache is not initialized",
        )
    })
}

/// POST /api/dashboard/load
pub async fn load() -> Result<Json<DatasetSummary>, ApiError> {
    let cache = dataset_cache()?;
    tracing::info!("D100 Dashboard: Load requested ({})", cache.source_location());

    match cache.get_or_load().await {
        Ok(dataset) => Ok(Json(service::summarize(&dataset))),
        Err(e) => {
            tracing::error!("D100 Dashboard: Failed to load dataset: {}", e);
            Err(load_error(e))
        }
    }
}

/// POST /api/dashboard/reload
pub async fn reload() -> Result<Json<DatasetSummary>, ApiError> {
    let cache = dataset_cache()?;
    tracing::info!("D100 Dashboard: Reload requested ({})", cache.source_location());

    match cache.reload().await {
        Ok(dataset) => Ok(Json(service::summarize(&dataset))),
        Err(e) => {
            tracing::error!("D100 Dashboard: Failed to reload dataset: {}", e);
            Err(load_error(e))
        }
    }
}

/// POST /api/dashboard/clear
pub async fn clear() -> Result<StatusCode, ApiError> {
    dataset_cache()?.clear().await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/dashboard/summary
pub async fn get_summary() -> Result<Json<DatasetSummary>, ApiError> {
    let dataset = dataset_cache()?.current().await.ok_or_else(not_loaded)?;
    Ok(Json(service::summarize(&dataset)))
}

/// POST /api/dashboard/render
pub async fn render(
    Json(filters): Json<DashboardFilters>,
) -> Result<Json<DashboardAggregates>, ApiError> {
    let dataset = dataset_cache()?.current().await.ok_or_else(not_loaded)?;

    let response = service::render(&dataset, &filters, config::current().dashboard.top_n);
    tracing::info!(
        "D100 Dashboard: Rendered {} of {} rows ({:?} .. {:?}, {} categories)",
        response.filtered_row_count,
        dataset.len(),
        filters.date_from,
        filters.date_to,
        filters
            .categories
            .as_ref()
            .map_or_else(|| "all".to_string(), |c| c.len().to_string())
    );
    Ok(Json(response))
}

/// GET /api/dashboard/map
pub async fn get_map_layer() -> Json<MapLayerConfig> {
    Json(service::map_layer(&config::current().map))
}
