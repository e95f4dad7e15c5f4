//! Supplier order model and submission payload.

use chrono::{DateTime, NaiveDateTime, Utc};
use common::{CorrelationId, SupplierOrderId};
use serde::{Deserialize, Serialize};

use crate::serde_util::{null_as_default, one_or_many, opt_string_or_number};

/// A supplier order as returned by the supplier's get/list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierOrder {
    pub id: SupplierOrderId,

    /// Correlation id supplied at creation time.
    #[serde(default)]
    pub external_id: Option<CorrelationId>,

    /// Supplier-defined lifecycle status, free text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,

    #[serde(default)]
    pub shipping: Option<SupplierShipping>,

    #[serde(default)]
    pub summary: Option<SupplierSummary>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<SupplierItem>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl SupplierOrder {
    /// Creates a bare order with an id, correlation id and status.
    pub fn new(
        id: impl Into<SupplierOrderId>,
        external_id: Option<CorrelationId>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            external_id,
            status: status.into(),
            shipping: None,
            summary: None,
            items: Vec::new(),
            created_at: None,
        }
    }

    /// Tracking numbers recorded on the shipping sub-record.
    pub fn tracking_numbers(&self) -> &[String] {
        self.shipping
            .as_ref()
            .map(|s| s.tracking_number.as_slice())
            .unwrap_or_default()
    }

    /// Parsed ship timestamp, if present and readable.
    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipping.as_ref().and_then(SupplierShipping::shipped_at)
    }

    /// Carrier reported by the supplier.
    pub fn carrier(&self) -> Option<&str> {
        self.shipping
            .as_ref()
            .and_then(|s| s.carrier.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Shipping sub-record of a supplier order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierShipping {
    /// One or more tracking numbers; the supplier sends either form.
    #[serde(default, deserialize_with = "one_or_many")]
    pub tracking_number: Vec<String>,

    #[serde(default)]
    pub carrier: Option<String>,

    /// Raw ship timestamp as sent by the supplier.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub shipped_at: Option<String>,
}

impl SupplierShipping {
    /// Parses `shipped_at` as RFC 3339 or `YYYY-MM-DD HH:MM:SS` (UTC).
    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.shipped_at.as_deref()?.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Cost summary of a supplier order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierSummary {
    /// Decimal shipping cost, kept as text to avoid float rounding.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub shipping_cost: Option<String>,

    #[serde(default)]
    pub currency: Option<String>,
}

/// A line of a supplier order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierItem {
    pub pn: String,
    pub quantity: u32,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub designs: Designs,
}

/// Design-asset URLs by placement side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Designs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
}

impl Designs {
    /// Returns true when no placement carries a design.
    pub fn is_empty(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }
}

/// Body of a supplier create-order request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierOrderPayload {
    pub external_id: CorrelationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<String>,
    pub shipping_address: SupplierAddress,
    pub items: Vec<PayloadItem>,
}

impl SupplierOrderPayload {
    /// Fills brand name and shipping method where the mapper left them unset.
    pub fn apply_defaults(&mut self, brand_name: Option<&str>, shipping_method: Option<&str>) {
        if self.brand_name.is_none() {
            self.brand_name = brand_name.map(str::to_string);
        }
        if self.shipping_method.is_none() {
            self.shipping_method = shipping_method.map(str::to_string);
        }
    }
}

/// Outbound shipping address. Missing components are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierAddress {
    pub firstname: String,
    pub lastname: String,
    pub company: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub county: String,
    pub postcode: String,
    pub country: String,
    pub phone: String,
}

/// Outbound line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadItem {
    pub pn: String,
    pub quantity: u32,
    pub retail_price: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Designs::is_empty")]
    pub designs: Designs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deserialize_loose_supplier_shape() {
        let json = serde_json::json!({
            "id": 555,
            "external_id": "shopify:9001",
            "status": "Shipped",
            "shipping": {
                "tracking_number": "TRK-1",
                "carrier": "Royal Mail",
                "shipped_at": "2024-03-01 10:00:00"
            },
            "summary": {"shipping_cost": 3.5, "currency": "GBP"},
            "items": [{"pn": "TEE", "quantity": 2, "price": "9.50", "description": null}]
        });

        let order: SupplierOrder = serde_json::from_value(json).unwrap();
        assert_eq!(order.id.as_str(), "555");
        assert_eq!(order.tracking_numbers(), &["TRK-1".to_string()]);
        assert_eq!(
            order.shipped_at(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(order.carrier(), Some("Royal Mail"));
        let summary = order.summary.unwrap();
        assert_eq!(summary.shipping_cost.as_deref(), Some("3.5"));
        assert!(order.items[0].designs.is_empty());
    }

    #[test]
    fn test_tracking_accepts_list_and_blank() {
        let listed: SupplierShipping =
            serde_json::from_value(serde_json::json!({"tracking_number": ["A", " ", "B"]}))
                .unwrap();
        assert_eq!(listed.tracking_number, vec!["A", "B"]);

        let blank: SupplierShipping =
            serde_json::from_value(serde_json::json!({"tracking_number": ""})).unwrap();
        assert!(blank.tracking_number.is_empty());
    }

    #[test]
    fn test_shipped_at_rfc3339_and_garbage() {
        let shipping = SupplierShipping {
            shipped_at: Some("2024-03-01T10:00:00+01:00".into()),
            ..Default::default()
        };
        assert_eq!(
            shipping.shipped_at(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
        );

        let garbage = SupplierShipping {
            shipped_at: Some("yesterday".into()),
            ..Default::default()
        };
        assert_eq!(garbage.shipped_at(), None);
    }

    #[test]
    fn test_apply_defaults_keeps_existing_values() {
        let mut payload = SupplierOrderPayload {
            external_id: CorrelationId::new("shopify:1"),
            brand_name: Some("Own".into()),
            shipping_method: None,
            shipping_address: SupplierAddress::default(),
            items: vec![],
        };
        payload.apply_defaults(Some("Default"), Some("tracked"));
        assert_eq!(payload.brand_name.as_deref(), Some("Own"));
        assert_eq!(payload.shipping_method.as_deref(), Some("tracked"));
    }
}
