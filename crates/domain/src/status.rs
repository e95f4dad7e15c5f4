//! Supplier lifecycle status and its projection onto a normalized tag.

use chrono::{DateTime, Duration, Utc};

use crate::supplier::SupplierOrder;
use crate::tags::PodTag;

/// Supplier lifecycle status, parsed from the supplier's free-text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplierStatus {
    Received,
    InProgress,
    Paid,
    StockAllocation,
    Printing,
    QualityControl,
    Shipped,
    Refunded,
    InternalOrderQuery,
    Cancelled,
    /// Anything outside the known vocabulary, normalized to lowercase.
    Other(String),
}

impl SupplierStatus {
    /// Parses a status case-insensitively; `_` and `-` count as spaces.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw
            .trim()
            .to_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "received" => SupplierStatus::Received,
            "in progress" => SupplierStatus::InProgress,
            "paid" => SupplierStatus::Paid,
            "stock allocation" => SupplierStatus::StockAllocation,
            "printing" => SupplierStatus::Printing,
            "quality control" => SupplierStatus::QualityControl,
            "shipped" => SupplierStatus::Shipped,
            "refunded" => SupplierStatus::Refunded,
            "internal order query" => SupplierStatus::InternalOrderQuery,
            "cancelled" | "canceled" => SupplierStatus::Cancelled,
            _ => SupplierStatus::Other(normalized),
        }
    }
}

/// Maps supplier lifecycle fields onto a normalized tag.
///
/// Exception states win over shipping-derived states, which win over
/// production states. `delivered` is an estimate: the ship timestamp is at
/// least `tracking_window` old, not a carrier confirmation. Unrecognized
/// statuses yield `None` so the current tag is left alone.
pub fn map_status_to_pod_tag(
    status: &SupplierStatus,
    has_tracking: bool,
    shipped_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    tracking_window: Duration,
) -> Option<PodTag> {
    match status {
        SupplierStatus::Refunded => return Some(PodTag::Refunded),
        SupplierStatus::InternalOrderQuery => return Some(PodTag::OnHold),
        _ => {}
    }

    if has_tracking || shipped_at.is_some() {
        return Some(match shipped_at {
            Some(ts) if now - ts >= tracking_window => PodTag::Delivered,
            _ => PodTag::Shipped,
        });
    }

    match status {
        SupplierStatus::StockAllocation
        | SupplierStatus::Printing
        | SupplierStatus::QualityControl => Some(PodTag::Printing),
        SupplierStatus::Received | SupplierStatus::InProgress | SupplierStatus::Paid => {
            Some(PodTag::InProduction)
        }
        _ => None,
    }
}

/// Convenience wrapper reading the fields straight off a supplier order.
pub fn pod_tag_for(
    order: &SupplierOrder,
    now: DateTime<Utc>,
    tracking_window: Duration,
) -> Option<PodTag> {
    map_status_to_pod_tag(
        &SupplierStatus::parse(&order.status),
        !order.tracking_numbers().is_empty(),
        order.shipped_at(),
        now,
        tracking_window,
    )
}
