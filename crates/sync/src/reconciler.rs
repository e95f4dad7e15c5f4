//! Status reconciler: supplier state → storefront tags, metafields and
//! fulfillments.
//!
//! The supplier order is the source of truth; everything written to the
//! storefront is a projection recomputed on each pass. Every write converges,
//! so an overlapping second sweep only repeats work.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use common::StorefrontOrderId;
use domain::{FulfillmentOutcome, Money, PodTag, SupplierOrder, pod_tag_for, shipped_quantities};
use platforms::{
    METAFIELD_NAMESPACE, MetafieldType, SHIPPING_COST_KEY, SHIPPING_CURRENCY_KEY,
    StorefrontOrders, SupplierListQuery, SupplierOrders,
};
use serde::Serialize;
use uuid::Uuid;

use crate::annotate;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::linkage;

/// Upper bound on pages per sweep, against a supplier that ignores paging.
const MAX_PAGES: u32 = 1_000;

/// Aggregate result of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub synced: u32,
    pub errors: u32,
}

/// What a projection did for one supplier order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionOutcome {
    Applied {
        storefront_order_id: StorefrontOrderId,
        tag: Option<PodTag>,
        fulfillment: Option<FulfillmentOutcome>,
    },
    /// The correlation id is absent or not ours.
    Skipped,
}

/// Projects supplier order state onto storefront orders.
pub struct StatusReconciler<S, P>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    storefront: S,
    supplier: P,
    config: Arc<SyncConfig>,
}

impl<S, P> StatusReconciler<S, P>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    pub fn new(storefront: S, supplier: P, config: Arc<SyncConfig>) -> Self {
        Self {
            storefront,
            supplier,
            config,
        }
    }

    /// Re-applies the projection to every supplier order created in the last
    /// `window_days` days.
    ///
    /// Per-order failures are counted, never raised. A failing first page is
    /// an error; a failing later page ends the sweep with one more error.
    #[tracing::instrument(skip(self), fields(run_id = %Uuid::new_v4()))]
    pub async fn sync_recent(&self, window_days: u32) -> Result<SweepReport> {
        let started = Instant::now();
        let now = Utc::now();
        let from = now - chrono::Duration::days(i64::from(window_days));
        let page_size = self.config.page_size.max(1);
        let mut report = SweepReport::default();

        for page in 1..=MAX_PAGES {
            let query = SupplierListQuery::created_between(from, now)
                .page(page)
                .limit(page_size);
            let orders = match self.supplier.list(&query).await {
                Ok(orders) => orders,
                Err(e) if page == 1 => return Err(e.into()),
                Err(e) => {
                    tracing::error!(page, error = %e, "listing failed, sweep stopped early");
                    report.errors += 1;
                    break;
                }
            };

            for order in &orders {
                match self.apply_projection(order, now).await {
                    Ok(ProjectionOutcome::Applied { .. }) => {
                        report.synced += 1;
                        metrics::counter!("pod_reconcile_orders_total", "outcome" => "synced")
                            .increment(1);
                    }
                    Ok(ProjectionOutcome::Skipped) => {
                        metrics::counter!("pod_reconcile_orders_total", "outcome" => "skipped")
                            .increment(1);
                    }
                    Err(e) => {
                        tracing::warn!(supplier_order_id = %order.id, error = %e, "projection failed");
                        report.errors += 1;
                        metrics::counter!("pod_reconcile_orders_total", "outcome" => "error")
                            .increment(1);
                    }
                }
            }

            if orders.len() < page_size as usize {
                break;
            }
            if page == MAX_PAGES {
                tracing::warn!(page, "page limit reached, sweep truncated");
            }
        }

        metrics::histogram!("pod_reconcile_sweep_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(synced = report.synced, errors = report.errors, "sweep finished");
        Ok(report)
    }

    /// Re-applies the projection for one storefront order.
    ///
    /// Returns the supplier order as fetched, or `None` when the order is not
    /// linked by metafield or correlation id.
    #[tracing::instrument(skip(self))]
    pub async fn resync_one(&self, id: StorefrontOrderId) -> Result<Option<SupplierOrder>> {
        let Some(supplier_order_id) =
            linkage::resolve_linkage(&self.storefront, &self.supplier, id).await?
        else {
            tracing::info!("order is not linked");
            return Ok(None);
        };

        let order = self.supplier.get_by_id(&supplier_order_id).await?;
        self.apply_projection(&order, Utc::now()).await?;
        Ok(Some(order))
    }

    /// Projects one supplier order onto its storefront order.
    ///
    /// The status tag and fulfillment are required; the shipping-cost
    /// metafields are best-effort.
    #[tracing::instrument(skip(self, order, now), fields(supplier_order_id = %order.id))]
    pub async fn apply_projection(
        &self,
        order: &SupplierOrder,
        now: DateTime<Utc>,
    ) -> Result<ProjectionOutcome> {
        let Some(id) = order
            .external_id
            .as_ref()
            .and_then(|c| c.storefront_order_id())
        else {
            tracing::debug!(external_id = ?order.external_id, "not a storefront order, skipped");
            return Ok(ProjectionOutcome::Skipped);
        };

        let tag = pod_tag_for(order, now, self.config.tracking_window());
        if let Some(tag) = tag {
            if annotate::replace_pod_tag(&self.storefront, id, tag).await? {
                tracing::info!(order_id = %id, %tag, "status tag updated");
            }
        }

        self.record_shipping_cost(id, order).await;

        let fulfillment = match order.tracking_numbers().first() {
            Some(tracking_number) => {
                let carrier = order.carrier().unwrap_or(&self.config.default_carrier);
                let matched = shipped_quantities(order);
                let matched = (!matched.is_empty()).then_some(matched.as_slice());
                let outcome = self
                    .storefront
                    .ensure_fulfillment_with_tracking(id, tracking_number, carrier, matched)
                    .await?;
                if outcome == FulfillmentOutcome::Created {
                    tracing::info!(order_id = %id, tracking_number, carrier, "fulfillment created");
                }
                Some(outcome)
            }
            None => None,
        };

        Ok(ProjectionOutcome::Applied {
            storefront_order_id: id,
            tag,
            fulfillment,
        })
    }

    async fn record_shipping_cost(&self, id: StorefrontOrderId, order: &SupplierOrder) {
        let Some(summary) = &order.summary else {
            return;
        };
        let Some(raw) = summary.shipping_cost.as_deref() else {
            return;
        };
        let cost = match Money::parse_decimal(raw) {
            Ok(cost) => cost,
            Err(e) => {
                tracing::warn!(order_id = %id, raw, error = %e, "unreadable shipping cost");
                return;
            }
        };

        let mut writes = vec![(SHIPPING_COST_KEY, cost.to_string(), MetafieldType::NumberDecimal)];
        if let Some(currency) = summary.currency.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            writes.push((SHIPPING_CURRENCY_KEY, currency.to_string(), MetafieldType::SingleLineText));
        }
        for (key, value, kind) in writes {
            if let Err(e) = self
                .storefront
                .set_metafield(id, METAFIELD_NAMESPACE, key, &value, kind)
                .await
            {
                tracing::warn!(order_id = %id, key, error = %e, "failed to record shipping cost");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{LineItem, StorefrontOrder, SupplierItem, SupplierShipping, SupplierSummary};
    use platforms::{InMemoryStorefront, InMemorySupplier, SUPPLIER_ORDER_ID_KEY, correlation_for};

    use crate::error::SyncError;

    struct Harness {
        reconciler: StatusReconciler<InMemoryStorefront, InMemorySupplier>,
        storefront: InMemoryStorefront,
        supplier: InMemorySupplier,
    }

    fn harness(config: SyncConfig) -> Harness {
        let storefront = InMemoryStorefront::new();
        let supplier = InMemorySupplier::new();
        let reconciler = StatusReconciler::new(storefront.clone(), supplier.clone(), Arc::new(config));
        Harness {
            reconciler,
            storefront,
            supplier,
        }
    }

    async fn storefront_order(h: &Harness, id: u64, tags: &str) -> StorefrontOrderId {
        let order_id = StorefrontOrderId::new(id);
        h.storefront
            .insert_order(
                StorefrontOrder::new(order_id)
                    .with_tags(tags)
                    .with_line_item(LineItem::new(1, "A", 2, Money::from_cents(1000)))
                    .with_line_item(LineItem::new(2, "B", 1, Money::from_cents(1000))),
            )
            .await;
        order_id
    }

    fn shipped(id: &str, storefront_id: u64, tracking: &str, shipped_at: &str) -> SupplierOrder {
        let mut order = SupplierOrder::new(id, Some(correlation_for(storefront_id)), "Shipped");
        order.shipping = Some(SupplierShipping {
            tracking_number: vec![tracking.to_string()],
            carrier: Some("Royal Mail".into()),
            shipped_at: Some(shipped_at.to_string()),
        });
        order.items = vec![SupplierItem {
            pn: "A".into(),
            quantity: 2,
            price: None,
            description: String::new(),
            designs: Default::default(),
        }];
        order
    }

    #[tokio::test]
    async fn test_printing_without_summary_sets_tag_only() {
        let h = harness(SyncConfig::default());
        let id = storefront_order(&h, 9001, "vip, in production").await;
        let order = SupplierOrder::new("700", Some(correlation_for(9001)), "printing");

        let outcome = h.reconciler.apply_projection(&order, Utc::now()).await.unwrap();

        assert_eq!(
            outcome,
            ProjectionOutcome::Applied {
                storefront_order_id: id,
                tag: Some(PodTag::Printing),
                fulfillment: None,
            }
        );
        assert_eq!(h.storefront.order(id).await.unwrap().tags, "vip, printing");
        assert_eq!(h.storefront.metafield_writes().await, 0);
    }

    #[tokio::test]
    async fn test_foreign_correlation_is_skipped() {
        let h = harness(SyncConfig::default());
        let order = SupplierOrder::new("701", Some(common::CorrelationId::new("etsy:1")), "printing");
        let outcome = h.reconciler.apply_projection(&order, Utc::now()).await.unwrap();
        assert_eq!(outcome, ProjectionOutcome::Skipped);

        let bare = SupplierOrder::new("702", None, "printing");
        let outcome = h.reconciler.apply_projection(&bare, Utc::now()).await.unwrap();
        assert_eq!(outcome, ProjectionOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_unrecognized_status_leaves_tags_alone() {
        let h = harness(SyncConfig::default());
        let id = storefront_order(&h, 5, "printing").await;
        let order = SupplierOrder::new("703", Some(correlation_for(5)), "Awaiting Artwork");

        h.reconciler.apply_projection(&order, Utc::now()).await.unwrap();
        assert_eq!(h.storefront.order(id).await.unwrap().tags, "printing");
    }

    #[tokio::test]
    async fn test_shipping_cost_and_currency_recorded() {
        let h = harness(SyncConfig::default());
        let id = storefront_order(&h, 6, "").await;
        let mut order = SupplierOrder::new("704", Some(correlation_for(6)), "Received");
        order.summary = Some(SupplierSummary {
            shipping_cost: Some("4.5".into()),
            currency: Some("GBP".into()),
        });

        h.reconciler.apply_projection(&order, Utc::now()).await.unwrap();

        assert_eq!(h.storefront.metafield(id, "pod", SHIPPING_COST_KEY).await.as_deref(), Some("4.50"));
        assert_eq!(h.storefront.metafield(id, "pod", SHIPPING_CURRENCY_KEY).await.as_deref(), Some("GBP"));
        assert_eq!(h.storefront.order(id).await.unwrap().tags, "in production");
    }

    #[tokio::test]
    async fn test_tracking_creates_partial_fulfillment_once() {
        let h = harness(SyncConfig::default());
        let id = storefront_order(&h, 7, "printing").await;
        let recent = (Utc::now() - chrono::Duration::days(1)).to_rfc3339();
        let order = shipped("705", 7, "TRK-7", &recent);

        let first = h.reconciler.apply_projection(&order, Utc::now()).await.unwrap();
        let second = h.reconciler.apply_projection(&order, Utc::now()).await.unwrap();

        assert!(matches!(
            first,
            ProjectionOutcome::Applied { tag: Some(PodTag::Shipped), fulfillment: Some(FulfillmentOutcome::Created), .. }
        ));
        assert!(matches!(
            second,
            ProjectionOutcome::Applied { fulfillment: Some(FulfillmentOutcome::AlreadyExists), .. }
        ));
        let stored = h.storefront.order(id).await.unwrap();
        assert_eq!(stored.tags, "shipped");
        assert_eq!(stored.fulfillments.len(), 1);
        assert_eq!(stored.fulfillments[0].tracking_company.as_deref(), Some("Royal Mail"));
        assert_eq!(stored.line_items[1].open_quantity(), 1);
    }

    #[tokio::test]
    async fn test_old_shipment_is_delivered() {
        let h = harness(SyncConfig::default());
        let id = storefront_order(&h, 8, "shipped").await;
        let order = shipped("706", 8, "TRK-8", "2020-01-01 00:00:00");

        h.reconciler.apply_projection(&order, Utc::now()).await.unwrap();
        assert_eq!(h.storefront.order(id).await.unwrap().tags, "delivered");
    }

    #[tokio::test]
    async fn test_sweep_pages_and_isolates_failures() {
        let h = harness(SyncConfig {
            page_size: 2,
            ..Default::default()
        });
        for n in 1..=4u64 {
            storefront_order(&h, n, "").await;
            h.supplier
                .insert_order(SupplierOrder::new(format!("80{n}"), Some(correlation_for(n)), "Printing"))
                .await;
        }
        // Linked to a storefront order that does not exist.
        h.supplier
            .insert_order(SupplierOrder::new("899", Some(correlation_for(999)), "Printing"))
            .await;

        let report = h.reconciler.sync_recent(14).await.unwrap();

        assert_eq!(report, SweepReport { synced: 4, errors: 1 });
        assert_eq!(h.supplier.list_calls().await, 3);
        for n in 1..=4u64 {
            let tags = h.storefront.order(StorefrontOrderId::new(n)).await.unwrap().tags;
            assert_eq!(tags, "printing");
        }
    }

    #[tokio::test]
    async fn test_resync_not_linked_returns_none() {
        let h = harness(SyncConfig::default());
        let id = storefront_order(&h, 10, "").await;
        assert_eq!(h.reconciler.resync_one(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resync_linked_returns_order_and_projects() {
        let h = harness(SyncConfig::default());
        let id = storefront_order(&h, 11, "").await;
        h.supplier
            .insert_order(SupplierOrder::new("711", Some(correlation_for(11)), "Refunded"))
            .await;
        h.storefront
            .set_metafield(id, "pod", SUPPLIER_ORDER_ID_KEY, "711", MetafieldType::SingleLineText)
            .await
            .unwrap();

        let order = h.reconciler.resync_one(id).await.unwrap().unwrap();
        assert_eq!(order.id.as_str(), "711");
        assert_eq!(h.storefront.order(id).await.unwrap().tags, "refunded");
    }

    #[tokio::test]
    async fn test_resync_dangling_linkage_is_an_error() {
        let h = harness(SyncConfig::default());
        let id = storefront_order(&h, 12, "").await;
        h.storefront
            .set_metafield(id, "pod", SUPPLIER_ORDER_ID_KEY, "missing", MetafieldType::SingleLineText)
            .await
            .unwrap();

        let result = h.reconciler.resync_one(id).await;
        assert!(matches!(result, Err(SyncError::Supplier(_))));
    }
}
