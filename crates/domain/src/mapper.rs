//! Translates a storefront order into a supplier submission payload.
//!
//! Everything here is pure. The only failure is an order whose line items
//! were all filtered out by SKU validation.

use std::collections::HashSet;

use common::CorrelationId;

use crate::error::DomainError;
use crate::storefront::{LineItem, ShippingAddress, StorefrontOrder};
use crate::supplier::{Designs, PayloadItem, SupplierAddress, SupplierOrderPayload};

/// Set of SKUs the supplier is known to produce.
///
/// An empty allow-list disables validation so orders are not blocked before
/// the catalogue is curated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkuAllowList {
    skus: HashSet<String>,
}

impl SkuAllowList {
    /// Builds an allow-list, ignoring blank entries.
    pub fn new<I, S>(skus: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            skus: skus
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Returns true if validation is disabled.
    pub fn is_empty(&self) -> bool {
        self.skus.is_empty()
    }

    /// Returns true if the SKU passes validation.
    pub fn permits(&self, sku: &str) -> bool {
        self.skus.is_empty() || self.skus.contains(sku)
    }
}

/// Why a line item was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    MissingSku,
    NotAllowed,
}

/// A line item rejected by SKU validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    pub line_item_id: u64,
    pub title: String,
    pub sku: Option<String>,
    pub reason: InvalidReason,
}

impl std::fmt::Display for InvalidLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = if self.title.is_empty() {
            format!("line {}", self.line_item_id)
        } else {
            self.title.clone()
        };
        match (&self.reason, &self.sku) {
            (InvalidReason::NotAllowed, Some(sku)) => write!(f, "{label} (SKU {sku})"),
            _ => write!(f, "{label} (no SKU)"),
        }
    }
}

/// Line items split by SKU validation.
#[derive(Debug, Clone, Default)]
pub struct SkuPartition<'a> {
    pub valid: Vec<&'a LineItem>,
    pub invalid: Vec<InvalidLine>,
}

/// Splits line items into those the supplier can fulfil and those it cannot.
pub fn partition_line_items<'a>(items: &'a [LineItem], allow_list: &SkuAllowList) -> SkuPartition<'a> {
    let mut partition = SkuPartition::default();
    for item in items {
        match item.sku() {
            Some(sku) if allow_list.permits(sku) => partition.valid.push(item),
            Some(sku) => partition.invalid.push(InvalidLine {
                line_item_id: item.id,
                title: item.title.clone(),
                sku: Some(sku.to_string()),
                reason: InvalidReason::NotAllowed,
            }),
            None => partition.invalid.push(InvalidLine {
                line_item_id: item.id,
                title: item.title.clone(),
                sku: None,
                reason: InvalidReason::MissingSku,
            }),
        }
    }
    partition
}

/// Pulls design URLs out of a line item's properties.
///
/// The first property whose name starts with `prefix` is the front design,
/// the second the back; any further matches are ignored.
pub fn extract_designs(item: &LineItem, prefix: &str) -> Designs {
    let mut urls = item
        .properties
        .iter()
        .filter(|p| p.name.starts_with(prefix))
        .map(|p| p.value.trim())
        .filter(|v| !v.is_empty());

    Designs {
        front: urls.next().map(str::to_string),
        back: urls.next().map(str::to_string),
    }
}

/// Knobs for [`map_to_supplier_payload`].
#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    /// Property-name prefix marking design-asset references.
    pub design_prefix: String,
    /// Overrides the derived `shopify:<id>` correlation id.
    pub correlation_id: Option<CorrelationId>,
}

/// Builds the supplier payload from an order and its validated line items.
///
/// Brand name and shipping method are left unset for the caller to default.
pub fn map_to_supplier_payload(
    order: &StorefrontOrder,
    valid_items: &[&LineItem],
    options: &MapOptions,
) -> Result<SupplierOrderPayload, DomainError> {
    if valid_items.is_empty() {
        return Err(DomainError::NoFulfillableItems);
    }

    let items = valid_items
        .iter()
        .map(|item| PayloadItem {
            pn: item.sku().unwrap_or_default().to_string(),
            quantity: item.quantity,
            retail_price: item.price.as_f64(),
            description: describe(item),
            designs: extract_designs(item, &options.design_prefix),
        })
        .collect();

    Ok(SupplierOrderPayload {
        external_id: options
            .correlation_id
            .clone()
            .unwrap_or_else(|| CorrelationId::for_order(order.id)),
        brand_name: None,
        shipping_method: None,
        shipping_address: map_address(order.shipping_address.as_ref()),
        items,
    })
}

fn describe(item: &LineItem) -> String {
    match item.variant_title.as_deref().map(str::trim) {
        Some(variant) if !variant.is_empty() && !item.title.is_empty() => {
            format!("{} - {}", item.title, variant)
        }
        Some(variant) if !variant.is_empty() => variant.to_string(),
        _ => item.title.clone(),
    }
}

fn map_address(address: Option<&ShippingAddress>) -> SupplierAddress {
    let Some(a) = address else {
        return SupplierAddress::default();
    };
    let field = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();

    SupplierAddress {
        firstname: field(&a.first_name),
        lastname: field(&a.last_name),
        company: field(&a.company),
        address1: field(&a.address1),
        address2: field(&a.address2),
        city: field(&a.city),
        county: field(&a.province),
        postcode: field(&a.zip),
        country: field(&a.country_code),
        phone: field(&a.phone),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Money;
    use common::StorefrontOrderId;

    fn item(id: u64, sku: &str) -> LineItem {
        LineItem::new(id, sku, 1, Money::from_cents(1000)).with_title(format!("Item {id}"))
    }

    #[test]
    fn test_empty_allow_list_is_permissive() {
        let items = vec![item(1, "A"), item(2, "ANYTHING")];
        let partition = partition_line_items(&items, &SkuAllowList::default());
        assert_eq!(partition.valid.len(), 2);
        assert!(partition.invalid.is_empty());
    }

    #[test]
    fn test_missing_sku_is_invalid_even_without_allow_list() {
        let mut no_sku = item(2, "");
        no_sku.sku = None;
        let items = vec![item(1, "A"), no_sku];
        let partition = partition_line_items(&items, &SkuAllowList::default());
        assert_eq!(partition.valid.len(), 1);
        assert_eq!(partition.invalid[0].reason, InvalidReason::MissingSku);
        assert_eq!(partition.invalid[0].to_string(), "Item 2 (no SKU)");
    }

    #[test]
    fn test_allow_list_filters() {
        let items = vec![item(1, "A"), item(2, "B")];
        let allow = SkuAllowList::new(["A", " "]);
        let partition = partition_line_items(&items, &allow);
        assert_eq!(partition.valid.len(), 1);
        assert_eq!(partition.valid[0].id, 1);
        assert_eq!(partition.invalid[0].to_string(), "Item 2 (SKU B)");
    }

    #[test]
    fn test_design_extraction_front_back_and_ignored() {
        let line = item(1, "A")
            .with_property("gift_message", "hi")
            .with_property("_design_1", "https://cdn/front.png")
            .with_property("_design_2", "https://cdn/back.png")
            .with_property("_design_3", "https://cdn/ignored.png");

        let designs = extract_designs(&line, "_design");
        assert_eq!(designs.front.as_deref(), Some("https://cdn/front.png"));
        assert_eq!(designs.back.as_deref(), Some("https://cdn/back.png"));

        assert!(extract_designs(&item(2, "B"), "_design").is_empty());
    }

    #[test]
    fn test_payload_defaults_and_correlation() {
        let order = StorefrontOrder::new(StorefrontOrderId::new(9001))
            .with_line_item(item(1, "A"))
            .with_shipping_address(ShippingAddress {
                first_name: Some("Ada".into()),
                country_code: Some("GB".into()),
                ..Default::default()
            });
        let valid: Vec<&LineItem> = order.line_items.iter().collect();

        let payload = map_to_supplier_payload(&order, &valid, &MapOptions::default()).unwrap();
        assert_eq!(payload.external_id.as_str(), "shopify:9001");
        assert_eq!(payload.shipping_address.firstname, "Ada");
        assert_eq!(payload.shipping_address.lastname, "");
        assert_eq!(payload.shipping_address.country, "GB");
        assert_eq!(payload.items[0].pn, "A");
        assert_eq!(payload.items[0].description, "Item 1");
        assert!(payload.brand_name.is_none());
    }

    #[test]
    fn test_payload_without_address_uses_empty_strings() {
        let order = StorefrontOrder::new(StorefrontOrderId::new(1)).with_line_item(item(1, "A"));
        let valid: Vec<&LineItem> = order.line_items.iter().collect();
        let payload = map_to_supplier_payload(&order, &valid, &MapOptions::default()).unwrap();
        assert_eq!(payload.shipping_address, SupplierAddress::default());
    }

    #[test]
    fn test_caller_supplied_correlation_wins() {
        let order = StorefrontOrder::new(StorefrontOrderId::new(1)).with_line_item(item(1, "A"));
        let valid: Vec<&LineItem> = order.line_items.iter().collect();
        let options = MapOptions {
            correlation_id: Some(CorrelationId::new("shopify:777")),
            ..Default::default()
        };
        let payload = map_to_supplier_payload(&order, &valid, &options).unwrap();
        assert_eq!(payload.external_id.as_str(), "shopify:777");
    }

    #[test]
    fn test_no_valid_items_is_an_error() {
        let order = StorefrontOrder::new(StorefrontOrderId::new(1));
        let result = map_to_supplier_payload(&order, &[], &MapOptions::default());
        assert_eq!(result, Err(DomainError::NoFulfillableItems));
    }

    #[test]
    fn test_variant_in_description() {
        let mut line = item(1, "A");
        line.variant_title = Some("Black / M".into());
        assert_eq!(describe(&line), "Item 1 - Black / M");
    }
}
