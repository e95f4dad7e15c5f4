//! Cancellation engine: storefront cancellation → supplier deletion.

use common::{StorefrontOrderId, SupplierOrderId};
use domain::PodTag;
use platforms::{StorefrontOrders, SupplierOrders};
use serde::Serialize;

use crate::annotate;
use crate::error::{Result, SyncError};
use crate::linkage;

/// How a cancellation request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CancellationOutcome {
    /// The supplier order was deleted.
    Cancelled { supplier_order_id: SupplierOrderId },
    /// No supplier order is linked; nothing was deleted.
    NotLinked,
    /// Lookup or deletion failed; the order carries a note explaining why.
    Failed { message: String },
}

impl CancellationOutcome {
    fn label(&self) -> &'static str {
        match self {
            CancellationOutcome::Cancelled { .. } => "cancelled",
            CancellationOutcome::NotLinked => "not_linked",
            CancellationOutcome::Failed { .. } => "failed",
        }
    }
}

/// Propagates storefront cancellations to the supplier.
///
/// Never returns an error: the triggering webhook is already acknowledged,
/// so every outcome is recorded on the storefront order instead.
pub struct CancellationEngine<S, P>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    storefront: S,
    supplier: P,
}

impl<S, P> CancellationEngine<S, P>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    pub fn new(storefront: S, supplier: P) -> Self {
        Self { storefront, supplier }
    }

    /// Cancels the supplier order linked to `id`, if any.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: StorefrontOrderId) -> CancellationOutcome {
        let outcome = match self.resolve(id).await {
            Ok(supplier_order_id) => self.delete(id, supplier_order_id).await,
            Err(SyncError::LinkageNotFound(_)) => {
                tracing::info!("no linked supplier order");
                annotate::note(
                    &self.storefront,
                    id,
                    "Order cancelled; no linked supplier order found, nothing to cancel at supplier.",
                )
                .await;
                CancellationOutcome::NotLinked
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(error = %message, "linkage lookup failed");
                annotate::tag(&self.storefront, id, PodTag::SupplierError).await;
                annotate::note(
                    &self.storefront,
                    id,
                    &format!("Order cancelled; could not look up the supplier order: {message}"),
                )
                .await;
                CancellationOutcome::Failed { message }
            }
        };

        metrics::counter!("pod_cancellations_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn resolve(&self, id: StorefrontOrderId) -> Result<SupplierOrderId> {
        linkage::resolve_linkage(&self.storefront, &self.supplier, id)
            .await?
            .ok_or(SyncError::LinkageNotFound(id))
    }

    async fn delete(&self, id: StorefrontOrderId, supplier_order_id: SupplierOrderId) -> CancellationOutcome {
        // Deletion is attempted even when shipped; the supplier decides.
        match self.supplier.get_by_id(&supplier_order_id).await {
            Ok(order) => {
                if let Some(shipped_at) = order.shipped_at() {
                    tracing::warn!(%supplier_order_id, %shipped_at, "cancelling an order that already shipped");
                    annotate::note(
                        &self.storefront,
                        id,
                        &format!(
                            "Warning: supplier order {supplier_order_id} already shipped at {}; attempting cancellation anyway.",
                            shipped_at.format("%Y-%m-%d %H:%M UTC")
                        ),
                    )
                    .await;
                }
            }
            Err(e) => {
                tracing::warn!(%supplier_order_id, error = %e, "could not fetch supplier order before deletion");
            }
        }

        match self.supplier.delete(&supplier_order_id).await {
            Ok(()) => {
                tracing::info!(%supplier_order_id, "supplier order cancelled");
                annotate::tag(&self.storefront, id, PodTag::CancelledAtSupplier).await;
                annotate::note(
                    &self.storefront,
                    id,
                    &format!("Supplier order {supplier_order_id} cancelled."),
                )
                .await;
                CancellationOutcome::Cancelled { supplier_order_id }
            }
            Err(e) => {
                let message = e.message();
                tracing::error!(%supplier_order_id, error = %message, "supplier cancellation failed");
                annotate::tag(&self.storefront, id, PodTag::SupplierError).await;
                annotate::note(
                    &self.storefront,
                    id,
                    &format!("Supplier cancellation failed for order {supplier_order_id}: {message}"),
                )
                .await;
                CancellationOutcome::Failed { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{StorefrontOrder, SupplierOrder, SupplierShipping};
    use platforms::{
        InMemoryStorefront, InMemorySupplier, METAFIELD_NAMESPACE, MetafieldType,
        SUPPLIER_ORDER_ID_KEY, correlation_for,
    };

    struct Harness {
        engine: CancellationEngine<InMemoryStorefront, InMemorySupplier>,
        storefront: InMemoryStorefront,
        supplier: InMemorySupplier,
    }

    async fn harness(id: u64) -> (Harness, StorefrontOrderId) {
        let storefront = InMemoryStorefront::new();
        let supplier = InMemorySupplier::new();
        let order_id = StorefrontOrderId::new(id);
        storefront
            .insert_order(StorefrontOrder::new(order_id).with_tags("printing"))
            .await;
        let engine = CancellationEngine::new(storefront.clone(), supplier.clone());
        (
            Harness {
                engine,
                storefront,
                supplier,
            },
            order_id,
        )
    }

    async fn link(h: &Harness, id: StorefrontOrderId, order: SupplierOrder) {
        h.storefront
            .set_metafield(
                id,
                METAFIELD_NAMESPACE,
                SUPPLIER_ORDER_ID_KEY,
                order.id.as_str(),
                MetafieldType::SingleLineText,
            )
            .await
            .unwrap();
        h.supplier.insert_order(order).await;
    }

    #[tokio::test]
    async fn test_unlinked_order_gets_note_and_no_delete() {
        let (h, id) = harness(1).await;

        let outcome = h.engine.cancel(id).await;

        assert_eq!(outcome, CancellationOutcome::NotLinked);
        assert_eq!(h.supplier.delete_count().await, 0);
        let note = h.storefront.order(id).await.unwrap().note.unwrap();
        assert!(note.contains("no linked supplier order"));
    }

    #[tokio::test]
    async fn test_linked_order_is_deleted_and_tagged() {
        let (h, id) = harness(2).await;
        link(&h, id, SupplierOrder::new("500", Some(correlation_for(2)), "Received")).await;

        let outcome = h.engine.cancel(id).await;

        assert_eq!(
            outcome,
            CancellationOutcome::Cancelled {
                supplier_order_id: SupplierOrderId::new("500")
            }
        );
        assert_eq!(h.supplier.delete_count().await, 1);
        let stored = h.storefront.order(id).await.unwrap();
        assert_eq!(stored.tags, "cancelled at supplier");
        assert_eq!(stored.note.as_deref(), Some("[POD] Supplier order 500 cancelled."));
    }

    #[tokio::test]
    async fn test_shipped_order_warns_then_attempts_delete() {
        let (h, id) = harness(3).await;
        let mut shipped = SupplierOrder::new("501", Some(correlation_for(3)), "Shipped");
        shipped.shipping = Some(SupplierShipping {
            tracking_number: vec!["TRK".into()],
            carrier: None,
            shipped_at: Some("2024-03-01 10:00:00".into()),
        });
        link(&h, id, shipped).await;
        h.supplier
            .set_delete_failure(Some("Order already dispatched".into()))
            .await;

        let outcome = h.engine.cancel(id).await;

        assert!(matches!(outcome, CancellationOutcome::Failed { .. }));
        let stored = h.storefront.order(id).await.unwrap();
        assert_eq!(stored.tags, "supplier error");
        let note = stored.note.unwrap();
        let lines: Vec<&str> = note.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("already shipped at 2024-03-01 10:00 UTC"));
        assert!(lines[1].ends_with("Order already dispatched"));
    }

    #[tokio::test]
    async fn test_correlation_fallback_finds_unlinked_order() {
        let (h, id) = harness(4).await;
        h.supplier
            .insert_order(SupplierOrder::new("502", Some(correlation_for(4)), "Received"))
            .await;

        let outcome = h.engine.cancel(id).await;

        assert!(matches!(outcome, CancellationOutcome::Cancelled { .. }));
        assert_eq!(h.supplier.delete_count().await, 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_tagged_and_noted() {
        let (h, id) = harness(6).await;
        h.storefront.set_fail_metafield_reads(true).await;

        let outcome = h.engine.cancel(id).await;

        assert!(matches!(outcome, CancellationOutcome::Failed { .. }));
        assert_eq!(h.supplier.delete_count().await, 0);
        let stored = h.storefront.order(id).await.unwrap();
        assert_eq!(stored.tags, "supplier error");
        assert!(stored.note.unwrap().contains("could not look up the supplier order"));
    }

    #[tokio::test]
    async fn test_missing_storefront_order_is_recorded_not_raised() {
        let (h, _) = harness(5).await;
        let outcome = h.engine.cancel(StorefrontOrderId::new(404)).await;
        assert!(matches!(outcome, CancellationOutcome::Failed { .. }));
    }
}
