//! Resolution of the storefront → supplier order linkage.
//!
//! The forward path reads the `pod.supplier_order_id` metafield. When it is
//! missing (a lost write, or an order linked before the metafield existed)
//! the supplier is searched by correlation id and, on a hit, the metafield is
//! rewritten so the next lookup takes the fast path.

use common::{CorrelationId, StorefrontOrderId, SupplierOrderId};
use platforms::{
    METAFIELD_NAMESPACE, MetafieldType, SUPPLIER_ORDER_ID_KEY, StorefrontOrders,
    SupplierListQuery, SupplierOrders,
};

use crate::error::Result;

/// Reads the linkage metafield only.
pub(crate) async fn linked_supplier_order<S: StorefrontOrders>(
    storefront: &S,
    id: StorefrontOrderId,
) -> Result<Option<SupplierOrderId>> {
    let value = storefront
        .get_metafield(id, METAFIELD_NAMESPACE, SUPPLIER_ORDER_ID_KEY)
        .await?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SupplierOrderId::new))
}

/// Writes the linkage metafield.
pub(crate) async fn record_linkage<S: StorefrontOrders>(
    storefront: &S,
    id: StorefrontOrderId,
    supplier_order_id: &SupplierOrderId,
) -> Result<()> {
    storefront
        .set_metafield(
            id,
            METAFIELD_NAMESPACE,
            SUPPLIER_ORDER_ID_KEY,
            supplier_order_id.as_str(),
            MetafieldType::SingleLineText,
        )
        .await?;
    Ok(())
}

/// Resolves the linkage by metafield, falling back to the correlation id.
#[tracing::instrument(skip(storefront, supplier))]
pub(crate) async fn resolve_linkage<S, P>(
    storefront: &S,
    supplier: &P,
    id: StorefrontOrderId,
) -> Result<Option<SupplierOrderId>>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    if let Some(linked) = linked_supplier_order(storefront, id).await? {
        return Ok(Some(linked));
    }

    let correlation = CorrelationId::for_order(id);
    let found = supplier
        .list(&SupplierListQuery::for_correlation(correlation.clone()))
        .await?
        .into_iter()
        .find(|o| o.external_id.as_ref() == Some(&correlation));

    let Some(order) = found else {
        return Ok(None);
    };

    tracing::info!(order_id = %id, supplier_order_id = %order.id, "linkage recovered by correlation id");
    if let Err(e) = record_linkage(storefront, id, &order.id).await {
        tracing::warn!(order_id = %id, error = %e, "failed to heal linkage metafield");
    }
    Ok(Some(order.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{StorefrontOrder, SupplierOrder};
    use platforms::{InMemoryStorefront, InMemorySupplier, correlation_for};

    async fn setup(id: u64) -> (InMemoryStorefront, InMemorySupplier, StorefrontOrderId) {
        let storefront = InMemoryStorefront::new();
        let order_id = StorefrontOrderId::new(id);
        storefront.insert_order(StorefrontOrder::new(order_id)).await;
        (storefront, InMemorySupplier::new(), order_id)
    }

    #[tokio::test]
    async fn test_metafield_wins_without_supplier_lookup() {
        let (storefront, supplier, id) = setup(1).await;
        record_linkage(&storefront, id, &SupplierOrderId::new("77")).await.unwrap();

        let resolved = resolve_linkage(&storefront, &supplier, id).await.unwrap();
        assert_eq!(resolved, Some(SupplierOrderId::new("77")));
        assert_eq!(supplier.list_calls().await, 0);
    }

    #[tokio::test]
    async fn test_correlation_fallback_heals_metafield() {
        let (storefront, supplier, id) = setup(2).await;
        supplier
            .insert_order(SupplierOrder::new("55", Some(correlation_for(99)), "Printing"))
            .await;
        supplier
            .insert_order(SupplierOrder::new("56", Some(correlation_for(2)), "Printing"))
            .await;

        let resolved = resolve_linkage(&storefront, &supplier, id).await.unwrap();
        assert_eq!(resolved, Some(SupplierOrderId::new("56")));
        assert_eq!(
            storefront.metafield(id, METAFIELD_NAMESPACE, SUPPLIER_ORDER_ID_KEY).await.as_deref(),
            Some("56")
        );
    }

    #[tokio::test]
    async fn test_unlinked_order_resolves_to_none() {
        let (storefront, supplier, id) = setup(3).await;
        assert_eq!(resolve_linkage(&storefront, &supplier, id).await.unwrap(), None);
        assert_eq!(storefront.metafield_writes().await, 0);
    }
}
