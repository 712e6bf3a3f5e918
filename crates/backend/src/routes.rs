use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers;

/// All application routes
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // D100 SALES OVERVIEW DASHBOARD
        // ========================================
        .route(
            "/api/dashboard/load",
            post(handlers::d100_sales_overview::load),
        )
        .route(
            "/api/dashboard/reload",
            post(handlers::d100_sales_overview::reload),
        )
        .route(
            "/api/dashboard/clear",
            post(handlers::d100_sales_overview::clear),
        )
        .route(
            "/api/dashboard/summary",
            get(handlers::d100_sales_overview::get_summary),
        )
        .route(
            "/api/dashboard/render",
            post(handlers::d100_sales_overview::render),
        )
        .route(
            "/api/dashboard/map",
            get(handlers::d100_sales_overview::get_map_layer),
        )
}
