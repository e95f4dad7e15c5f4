//! Storefront webhook ingress.
//!
//! Once the signature checks out every delivery is acknowledged with 200 and
//! the work runs in the background, so slow or failing platforms never cause
//! redelivery storms.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use platforms::{StorefrontOrders, SupplierOrders};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;
use crate::webhook::{
    SIGNATURE_HEADER, TOPIC_HEADER, TOPIC_ORDERS_CANCELLED, TOPIC_ORDERS_PAID, parse_order,
    parse_order_id,
};

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Accepted,
    Ignored,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: WebhookStatus,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn ack(topic: &'static str, status: WebhookStatus) -> Json<WebhookAck> {
    let outcome = match status {
        WebhookStatus::Accepted => "accepted",
        WebhookStatus::Ignored => "ignored",
    };
    metrics::counter!("pod_webhooks_total", "topic" => topic, "outcome" => outcome).increment(1);
    Json(WebhookAck { status })
}

/// Verifies the signature and the declared topic.
///
/// Returns false for a delivery addressed to another topic.
fn authenticate<S, P>(
    state: &AppState<S, P>,
    headers: &HeaderMap,
    body: &[u8],
    expected_topic: &'static str,
) -> Result<bool, ApiError>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    if let Err(e) = state.webhooks.verify(header(headers, SIGNATURE_HEADER), body) {
        tracing::warn!(topic = expected_topic, "rejected webhook with invalid signature");
        metrics::counter!("pod_webhooks_total", "topic" => expected_topic, "outcome" => "rejected")
            .increment(1);
        return Err(e.into());
    }

    let topic = header(headers, TOPIC_HEADER).map(str::trim);
    if topic != Some(expected_topic) {
        tracing::info!(expected = expected_topic, received = ?topic, "webhook topic mismatch, ignored");
        return Ok(false);
    }
    Ok(true)
}

/// POST /webhooks/orders/paid: queues supplier order submission.
pub async fn orders_paid<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError>
where
    S: StorefrontOrders + 'static,
    P: SupplierOrders + 'static,
{
    if !authenticate(&state, &headers, &body, TOPIC_ORDERS_PAID)? {
        return Ok(ack(TOPIC_ORDERS_PAID, WebhookStatus::Ignored));
    }

    let order = match parse_order(&body) {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!(error = %e, "paid webhook body unreadable, ignored");
            return Ok(ack(TOPIC_ORDERS_PAID, WebhookStatus::Ignored));
        }
    };

    let order_id = order.id;
    if let Err(e) = state.submission.enqueue(order) {
        tracing::error!(%order_id, error = %e, "failed to queue submission");
    }
    Ok(ack(TOPIC_ORDERS_PAID, WebhookStatus::Accepted))
}

/// POST /webhooks/orders/cancelled: cancels the supplier order in the background.
pub async fn orders_cancelled<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError>
where
    S: StorefrontOrders + 'static,
    P: SupplierOrders + 'static,
{
    if !authenticate(&state, &headers, &body, TOPIC_ORDERS_CANCELLED)? {
        return Ok(ack(TOPIC_ORDERS_CANCELLED, WebhookStatus::Ignored));
    }

    let order_id = match parse_order_id(&body) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "cancelled webhook body unreadable, ignored");
            return Ok(ack(TOPIC_ORDERS_CANCELLED, WebhookStatus::Ignored));
        }
    };

    tokio::spawn(async move {
        let outcome = state.cancellation.cancel(order_id).await;
        tracing::info!(%order_id, ?outcome, "cancellation finished");
    });
    Ok(ack(TOPIC_ORDERS_CANCELLED, WebhookStatus::Accepted))
}
