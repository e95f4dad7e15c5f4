//! HTTP surface of the storefront/supplier order sync.
//!
//! Provides the signed webhook ingress, the job-trigger endpoints and the
//! health and metrics endpoints, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod webhook;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use platforms::{StorefrontOrders, SupplierOrders};
use tower_http::trace::TraceLayer;

pub use state::{AppState, create_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, P>(state: Arc<AppState<S, P>>, metrics_handle: PrometheusHandle) -> Router
where
    S: StorefrontOrders + 'static,
    P: SupplierOrders + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/webhooks/orders/paid", post(routes::webhooks::orders_paid::<S, P>))
        .route(
            "/webhooks/orders/cancelled",
            post(routes::webhooks::orders_cancelled::<S, P>),
        )
        .route("/jobs/sync-recent", post(routes::jobs::sync_recent::<S, P>))
        .route("/jobs/resync/{order_id}", post(routes::jobs::resync::<S, P>))
        .with_state(state)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
}
