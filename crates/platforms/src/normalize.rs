//! Normalization of the supplier's inconsistent response envelopes.
//!
//! The supplier wraps the same resource differently depending on endpoint
//! and API version (`data.id` vs `data.order.id`, lists under `data`,
//! `orders` or `data.orders`). Each function probes the known shapes in a
//! fixed order and returns `MalformedResponse` when none matches.

use common::SupplierOrderId;
use domain::SupplierOrder;
use serde_json::Value;

use crate::error::SupplierError;

const ERROR_SNIPPET_LIMIT: usize = 300;

/// Extracts the new order id from a create response.
pub fn created_order_id(body: &Value) -> Result<SupplierOrderId, SupplierError> {
    let candidates = [
        body.pointer("/data/id"),
        body.pointer("/data/order/id"),
        body.pointer("/order/id"),
        body.pointer("/id"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(id_from_value)
        .ok_or_else(|| malformed("create response carries no order id", body))
}

/// Extracts a single order from a get response.
pub fn single_order(body: Value) -> Result<SupplierOrder, SupplierError> {
    let candidate = ["/data/order", "/data", "/order", ""]
        .into_iter()
        .filter_map(|path| body.pointer(path))
        .find(|v| v.get("id").is_some_and(|id| !id.is_null()))
        .cloned();

    match candidate {
        Some(order) => serde_json::from_value(order)
            .map_err(|e| SupplierError::MalformedResponse(format!("order did not parse: {e}"))),
        None => Err(malformed("response carries no order", &body)),
    }
}

/// Extracts the order list from a list response.
pub fn order_list(body: Value) -> Result<Vec<SupplierOrder>, SupplierError> {
    let candidate = ["/data", "/orders", "/data/orders", "/data/data", ""]
        .into_iter()
        .filter_map(|path| body.pointer(path))
        .find(|v| v.is_array())
        .cloned();

    match candidate {
        Some(list) => serde_json::from_value(list)
            .map_err(|e| SupplierError::MalformedResponse(format!("order list did not parse: {e}"))),
        None => Err(malformed("response carries no order list", &body)),
    }
}

/// Reduces an error response body to a human-readable message.
pub fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return truncate(body.trim());
    };

    for key in ["message", "error", "errors", "msg"] {
        if let Some(text) = json.get(key).and_then(flatten_message) {
            return text;
        }
    }
    if let Some(text) = json.pointer("/data/message").and_then(flatten_message) {
        return text;
    }
    truncate(body.trim())
}

fn flatten_message(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(flatten_message)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| flatten_message(v).map(|m| format!("{k}: {m}")))
            .collect::<Vec<_>>()
            .join("; "),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    (!text.is_empty()).then_some(text)
}

fn id_from_value(value: &Value) -> Option<SupplierOrderId> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(SupplierOrderId::new(s.trim())),
        Value::Number(n) => Some(SupplierOrderId::new(n.to_string())),
        _ => None,
    }
}

fn malformed(context: &str, body: &Value) -> SupplierError {
    SupplierError::MalformedResponse(format!("{context}: {}", truncate(&body.to_string())))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= ERROR_SNIPPET_LIMIT {
        return text.to_string();
    }
    let cut: String = text.chars().take(ERROR_SNIPPET_LIMIT).collect();
    format!("{cut}...")
}
