//! Job-trigger endpoints for the reconciliation sweep and single resync.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use common::StorefrontOrderId;
use domain::SupplierOrder;
use platforms::{StorefrontOrders, SupplierOrders};
use serde::{Deserialize, Serialize};
use sync::SweepReport;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the job token.
pub const JOB_TOKEN_HEADER: &str = "x-job-token";

#[derive(Debug, Deserialize)]
pub struct SyncRecentParams {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResyncResponse {
    Synced { supplier_order: Box<SupplierOrder> },
    NotLinked,
}

fn authorize<S, P>(state: &AppState<S, P>, headers: &HeaderMap) -> Result<(), ApiError>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    let Some(expected) = state.job_token.as_deref() else {
        return Ok(());
    };
    let provided = headers
        .get(JOB_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("missing or invalid job token".to_string()))
    }
}

/// POST /jobs/sync-recent?days=N: runs a reconciliation sweep to completion.
pub async fn sync_recent<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    headers: HeaderMap,
    Query(params): Query<SyncRecentParams>,
) -> Result<Json<SweepReport>, ApiError>
where
    S: StorefrontOrders + 'static,
    P: SupplierOrders + 'static,
{
    authorize(&state, &headers)?;
    let days = params.days.unwrap_or(state.sync.window_days);
    if days == 0 {
        return Err(ApiError::BadRequest("days must be at least 1".to_string()));
    }

    let report = state.reconciler.sync_recent(days).await?;
    Ok(Json(report))
}

/// POST /jobs/resync/{order_id}: re-applies the projection for one order.
pub async fn resync<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Json<ResyncResponse>, ApiError>
where
    S: StorefrontOrders + 'static,
    P: SupplierOrders + 'static,
{
    authorize(&state, &headers)?;
    let id: StorefrontOrderId = order_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid order id: {order_id}")))?;

    let response = match state.reconciler.resync_one(id).await? {
        Some(order) => ResyncResponse::Synced {
            supplier_order: Box::new(order),
        },
        None => ResyncResponse::NotLinked,
    };
    Ok(Json(response))
}
