//! Partial fulfillment planning keyed by SKU quantities.

use serde::{Deserialize, Serialize};

use crate::storefront::LineItem;
use crate::supplier::SupplierOrder;

/// A requested quantity for one SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuQuantity {
    pub sku: String,
    pub quantity: u32,
}

impl SkuQuantity {
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

/// A storefront line item quantity to include in a fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentLine {
    pub line_item_id: u64,
    pub quantity: u32,
}

/// Result of an idempotent fulfillment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentOutcome {
    /// A fulfillment with this tracking number already exists.
    AlreadyExists,
    Created,
    /// Nothing left to fulfil.
    NoItems,
}

/// Per-SKU quantities shipped by a supplier order.
pub fn shipped_quantities(order: &SupplierOrder) -> Vec<SkuQuantity> {
    order
        .items
        .iter()
        .filter(|i| !i.pn.trim().is_empty() && i.quantity > 0)
        .map(|i| SkuQuantity::new(i.pn.trim(), i.quantity))
        .collect()
}

/// Matches requested SKU quantities against storefront line items.
///
/// Each line contributes at most its open quantity; a SKU spread over
/// several lines fills them in order. Unknown SKUs are skipped.
pub fn plan_fulfillment(line_items: &[LineItem], requested: &[SkuQuantity]) -> Vec<FulfillmentLine> {
    let mut remaining: Vec<u32> = line_items.iter().map(LineItem::open_quantity).collect();
    let mut plan: Vec<FulfillmentLine> = Vec::new();

    for request in requested {
        let mut wanted = request.quantity;
        for (idx, item) in line_items.iter().enumerate() {
            if wanted == 0 {
                break;
            }
            if item.sku() != Some(request.sku.as_str()) || remaining[idx] == 0 {
                continue;
            }
            let take = wanted.min(remaining[idx]);
            remaining[idx] -= take;
            wanted -= take;

            match plan.iter_mut().find(|l| l.line_item_id == item.id) {
                Some(line) => line.quantity += take,
                None => plan.push(FulfillmentLine {
                    line_item_id: item.id,
                    quantity: take,
                }),
            }
        }
    }

    plan
}

/// Every open line at its full open quantity.
pub fn plan_full_fulfillment(line_items: &[LineItem]) -> Vec<FulfillmentLine> {
    line_items
        .iter()
        .filter(|i| i.open_quantity() > 0)
        .map(|i| FulfillmentLine {
            line_item_id: i.id,
            quantity: i.open_quantity(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Money;

    fn lines() -> Vec<LineItem> {
        vec![
            LineItem::new(1, "A", 2, Money::zero()),
            LineItem::new(2, "B", 1, Money::zero()),
            LineItem::new(3, "A", 1, Money::zero()),
        ]
    }

    #[test]
    fn test_caps_at_ordered_quantity() {
        let plan = plan_fulfillment(&lines(), &[SkuQuantity::new("B", 5)]);
        assert_eq!(
            plan,
            vec![FulfillmentLine {
                line_item_id: 2,
                quantity: 1
            }]
        );
    }

    #[test]
    fn test_spreads_sku_over_lines() {
        let plan = plan_fulfillment(&lines(), &[SkuQuantity::new("A", 3)]);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].quantity, 2);
        assert_eq!(plan[1].line_item_id, 3);
        assert_eq!(plan[1].quantity, 1);
    }

    #[test]
    fn test_respects_fulfillable_quantity() {
        let mut items = lines();
        items[0].fulfillable_quantity = Some(0);
        let plan = plan_fulfillment(&items, &[SkuQuantity::new("A", 2)]);
        assert_eq!(
            plan,
            vec![FulfillmentLine {
                line_item_id: 3,
                quantity: 1
            }]
        );
    }

    #[test]
    fn test_unknown_sku_plans_nothing() {
        assert!(plan_fulfillment(&lines(), &[SkuQuantity::new("Z", 1)]).is_empty());
    }

    #[test]
    fn test_repeated_requests_merge_per_line() {
        let plan = plan_fulfillment(
            &lines(),
            &[SkuQuantity::new("A", 1), SkuQuantity::new("A", 1)],
        );
        assert_eq!(
            plan,
            vec![FulfillmentLine {
                line_item_id: 1,
                quantity: 2
            }]
        );
    }

    #[test]
    fn test_full_plan_skips_closed_lines() {
        let mut items = lines();
        items[1].fulfillable_quantity = Some(0);
        let plan = plan_full_fulfillment(&items);
        assert_eq!(plan.len(), 2);
    }
}
