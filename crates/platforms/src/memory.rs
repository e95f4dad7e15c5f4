//! In-memory storefront and supplier implementations.
//!
//! These behave like the real platforms at the capability boundary and add
//! failure-injection switches and call counters for tests and local runs.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CorrelationId, StorefrontOrderId, SupplierOrderId};
use domain::{
    FulfilledLine, Fulfillment, FulfillmentOutcome, SkuQuantity, StorefrontOrder, SupplierItem,
    SupplierOrder, SupplierOrderPayload, plan_fulfillment, plan_full_fulfillment,
};
use tokio::sync::RwLock;

use crate::error::{StorefrontError, SupplierError};
use crate::storefront::{MetafieldType, StorefrontOrders};
use crate::supplier::{SupplierListQuery, SupplierOrders};

#[derive(Debug, Default)]
struct StorefrontState {
    orders: HashMap<StorefrontOrderId, StorefrontOrder>,
    metafields: HashMap<(StorefrontOrderId, String, String), (String, MetafieldType)>,
    next_fulfillment_id: u64,
    fulfillments_created: usize,
    metafield_writes: usize,
    fail_metafield_reads: bool,
    fail_metafield_writes: bool,
    fail_notes: bool,
}

/// In-memory storefront for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorefront {
    state: Arc<RwLock<StorefrontState>>,
}

impl InMemoryStorefront {
    /// Creates an empty storefront.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an order.
    pub async fn insert_order(&self, order: StorefrontOrder) {
        self.state.write().await.orders.insert(order.id, order);
    }

    /// Returns a snapshot of an order.
    pub async fn order(&self, id: StorefrontOrderId) -> Option<StorefrontOrder> {
        self.state.read().await.orders.get(&id).cloned()
    }

    /// Returns the stored value of a metafield.
    pub async fn metafield(&self, id: StorefrontOrderId, namespace: &str, key: &str) -> Option<String> {
        self.state
            .read()
            .await
            .metafields
            .get(&(id, namespace.to_string(), key.to_string()))
            .map(|(value, _)| value.clone())
    }

    /// Number of fulfillments created through `ensure_fulfillment_with_tracking`.
    pub async fn fulfillments_created(&self) -> usize {
        self.state.read().await.fulfillments_created
    }

    /// Number of successful metafield writes.
    pub async fn metafield_writes(&self) -> usize {
        self.state.read().await.metafield_writes
    }

    /// Makes every metafield read fail.
    pub async fn set_fail_metafield_reads(&self, fail: bool) {
        self.state.write().await.fail_metafield_reads = fail;
    }

    /// Makes every metafield write fail.
    pub async fn set_fail_metafield_writes(&self, fail: bool) {
        self.state.write().await.fail_metafield_writes = fail;
    }

    /// Makes every note append fail.
    pub async fn set_fail_notes(&self, fail: bool) {
        self.state.write().await.fail_notes = fail;
    }
}

fn unavailable(what: &str) -> StorefrontError {
    StorefrontError::Api {
        status: 503,
        body: format!("{what} unavailable"),
    }
}

#[async_trait]
impl StorefrontOrders for InMemoryStorefront {
    async fn get_order(&self, id: StorefrontOrderId) -> Result<StorefrontOrder, StorefrontError> {
        self.state
            .read()
            .await
            .orders
            .get(&id)
            .cloned()
            .ok_or(StorefrontError::OrderNotFound(id))
    }

    async fn set_tags(&self, id: StorefrontOrderId, tags: &str) -> Result<(), StorefrontError> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(StorefrontError::OrderNotFound(id))?;
        order.tags = tags.to_string();
        Ok(())
    }

    async fn append_note(&self, id: StorefrontOrderId, text: &str) -> Result<(), StorefrontError> {
        let mut state = self.state.write().await;
        if state.fail_notes {
            return Err(unavailable("notes"));
        }
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(StorefrontError::OrderNotFound(id))?;
        order.note = Some(match order.note.take().filter(|n| !n.is_empty()) {
            Some(existing) => format!("{existing}\n{text}"),
            None => text.to_string(),
        });
        Ok(())
    }

    async fn get_metafield(
        &self,
        id: StorefrontOrderId,
        namespace: &str,
        key: &str,
    ) -> Result<Option<String>, StorefrontError> {
        let state = self.state.read().await;
        if state.fail_metafield_reads {
            return Err(unavailable("metafields"));
        }
        if !state.orders.contains_key(&id) {
            return Err(StorefrontError::OrderNotFound(id));
        }
        Ok(state
            .metafields
            .get(&(id, namespace.to_string(), key.to_string()))
            .map(|(value, _)| value.clone()))
    }

    async fn set_metafield(
        &self,
        id: StorefrontOrderId,
        namespace: &str,
        key: &str,
        value: &str,
        kind: MetafieldType,
    ) -> Result<(), StorefrontError> {
        let mut state = self.state.write().await;
        if state.fail_metafield_writes {
            return Err(unavailable("metafields"));
        }
        if !state.orders.contains_key(&id) {
            return Err(StorefrontError::OrderNotFound(id));
        }
        state.metafields.insert(
            (id, namespace.to_string(), key.to_string()),
            (value.to_string(), kind),
        );
        state.metafield_writes += 1;
        Ok(())
    }

    async fn ensure_fulfillment_with_tracking(
        &self,
        id: StorefrontOrderId,
        tracking_number: &str,
        carrier: &str,
        matched: Option<&[SkuQuantity]>,
    ) -> Result<FulfillmentOutcome, StorefrontError> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get(&id)
            .ok_or(StorefrontError::OrderNotFound(id))?;

        if order.has_fulfillment_with_tracking(tracking_number) {
            return Ok(FulfillmentOutcome::AlreadyExists);
        }

        let plan = match matched {
            Some(requested) => plan_fulfillment(&order.line_items, requested),
            None => plan_full_fulfillment(&order.line_items),
        };
        if plan.is_empty() {
            return Ok(FulfillmentOutcome::NoItems);
        }

        state.next_fulfillment_id += 1;
        state.fulfillments_created += 1;
        let fulfillment_id = state.next_fulfillment_id;
        let Some(order) = state.orders.get_mut(&id) else {
            return Err(StorefrontError::OrderNotFound(id));
        };

        for line in &plan {
            if let Some(item) = order.line_items.iter_mut().find(|i| i.id == line.line_item_id) {
                item.fulfillable_quantity = Some(item.open_quantity().saturating_sub(line.quantity));
            }
        }
        order.fulfillments.push(Fulfillment {
            id: fulfillment_id,
            status: Some("success".to_string()),
            tracking_number: Some(tracking_number.to_string()),
            tracking_numbers: vec![tracking_number.to_string()],
            tracking_company: Some(carrier.to_string()),
            line_items: plan
                .into_iter()
                .map(|l| FulfilledLine {
                    id: l.line_item_id,
                    quantity: l.quantity,
                })
                .collect(),
        });

        Ok(FulfillmentOutcome::Created)
    }
}

#[derive(Debug, Default)]
struct SupplierState {
    /// Keyed by insertion sequence so listing follows creation order.
    orders: BTreeMap<u64, SupplierOrder>,
    seq: u64,
    next_id: u64,
    create_failures: VecDeque<String>,
    delete_failure: Option<String>,
    create_attempts: usize,
    delete_count: usize,
    list_calls: usize,
    payloads: Vec<SupplierOrderPayload>,
}

/// In-memory supplier for testing.
///
/// Ids are assigned sequentially starting at 1001 and orders are listed in
/// creation order.
#[derive(Debug, Clone, Default)]
pub struct InMemorySupplier {
    state: Arc<RwLock<SupplierState>>,
}

impl InMemorySupplier {
    /// Creates an empty supplier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an order as-is, e.g. to simulate supplier-side progress.
    pub async fn insert_order(&self, order: SupplierOrder) {
        let mut state = self.state.write().await;
        state.seq += 1;
        let seq = state.seq;
        state.orders.insert(seq, order);
    }

    /// Replaces a stored order with the same id.
    pub async fn update_order(&self, order: SupplierOrder) {
        let mut state = self.state.write().await;
        if let Some(existing) = state.orders.values_mut().find(|o| o.id == order.id) {
            *existing = order;
        }
    }

    /// Queues a failure message for the next `create` call.
    pub async fn push_create_failure(&self, message: impl Into<String>) {
        self.state
            .write()
            .await
            .create_failures
            .push_back(message.into());
    }

    /// Makes `delete` fail with the given message until cleared.
    pub async fn set_delete_failure(&self, message: Option<String>) {
        self.state.write().await.delete_failure = message;
    }

    /// Number of orders currently stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Number of `create` calls, successful or not.
    pub async fn create_attempts(&self) -> usize {
        self.state.read().await.create_attempts
    }

    /// Number of successful deletions.
    pub async fn delete_count(&self) -> usize {
        self.state.read().await.delete_count
    }

    /// Number of `list` calls.
    pub async fn list_calls(&self) -> usize {
        self.state.read().await.list_calls
    }

    /// Payloads accepted by `create`.
    pub async fn payloads(&self) -> Vec<SupplierOrderPayload> {
        self.state.read().await.payloads.clone()
    }
}

fn created_within(order: &SupplierOrder, query: &SupplierListQuery) -> bool {
    let Some(created) = order
        .created_at
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
    else {
        return true;
    };
    query.created_from.is_none_or(|from| created >= from)
        && query.created_to.is_none_or(|to| created <= to)
}

#[async_trait]
impl SupplierOrders for InMemorySupplier {
    async fn create(&self, payload: &SupplierOrderPayload) -> Result<SupplierOrderId, SupplierError> {
        let mut state = self.state.write().await;
        state.create_attempts += 1;

        if let Some(message) = state.create_failures.pop_front() {
            return Err(SupplierError::Api {
                status: 422,
                message,
            });
        }

        state.next_id += 1;
        state.seq += 1;
        let seq = state.seq;
        let id = SupplierOrderId::new((1000 + state.next_id).to_string());
        let mut order = SupplierOrder::new(id.clone(), Some(payload.external_id.clone()), "Received");
        order.created_at = Some(Utc::now().to_rfc3339());
        order.items = payload
            .items
            .iter()
            .map(|i| SupplierItem {
                pn: i.pn.clone(),
                quantity: i.quantity,
                price: Some(i.retail_price.to_string()),
                description: i.description.clone(),
                designs: i.designs.clone(),
            })
            .collect();

        state.orders.insert(seq, order);
        state.payloads.push(payload.clone());
        Ok(id)
    }

    async fn get_by_id(&self, id: &SupplierOrderId) -> Result<SupplierOrder, SupplierError> {
        self.state
            .read()
            .await
            .orders
            .values()
            .find(|o| &o.id == id)
            .cloned()
            .ok_or_else(|| SupplierError::OrderNotFound(id.to_string()))
    }

    async fn list(&self, query: &SupplierListQuery) -> Result<Vec<SupplierOrder>, SupplierError> {
        let mut state = self.state.write().await;
        state.list_calls += 1;

        let page = query.page.max(1) as usize;
        let limit = query.limit.max(1) as usize;
        let matches_correlation = |o: &SupplierOrder| {
            query
                .external_id
                .as_ref()
                .is_none_or(|wanted| o.external_id.as_ref() == Some(wanted))
        };
        let matches_status = |o: &SupplierOrder| {
            query
                .status
                .as_deref()
                .is_none_or(|s| o.status.eq_ignore_ascii_case(s))
        };

        Ok(state
            .orders
            .values()
            .filter(|o| matches_correlation(o) && matches_status(o) && created_within(o, query))
            .skip((page - 1) * limit)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &SupplierOrderId) -> Result<(), SupplierError> {
        let mut state = self.state.write().await;
        if let Some(message) = state.delete_failure.clone() {
            return Err(SupplierError::Api {
                status: 409,
                message,
            });
        }
        let key = state
            .orders
            .iter()
            .find(|(_, o)| &o.id == id)
            .map(|(k, _)| *k)
            .ok_or_else(|| SupplierError::OrderNotFound(id.to_string()))?;
        state.orders.remove(&key);
        state.delete_count += 1;
        Ok(())
    }
}

/// Helper for fixtures: a correlation id pointing at a storefront order.
pub fn correlation_for(id: u64) -> CorrelationId {
    CorrelationId::for_order(StorefrontOrderId::new(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{LineItem, Money, SupplierAddress};

    fn payload(order_id: u64) -> SupplierOrderPayload {
        SupplierOrderPayload {
            external_id: correlation_for(order_id),
            brand_name: None,
            shipping_method: None,
            shipping_address: SupplierAddress::default(),
            items: vec![],
        }
    }

    #[tokio::test]
    async fn test_scripted_create_failure_then_success() {
        let supplier = InMemorySupplier::new();
        supplier.push_create_failure("Design URL is not valid").await;

        let first = supplier.create(&payload(1)).await;
        assert!(matches!(first, Err(SupplierError::Api { status: 422, .. })));

        let id = supplier.create(&payload(1)).await.unwrap();
        assert_eq!(id.as_str(), "1001");
        assert_eq!(supplier.create_attempts().await, 2);
        assert_eq!(supplier.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let supplier = InMemorySupplier::new();
        for n in 1..=5 {
            supplier.create(&payload(n)).await.unwrap();
        }

        let page1 = supplier
            .list(&SupplierListQuery::default().limit(2))
            .await
            .unwrap();
        let page3 = supplier
            .list(&SupplierListQuery::default().limit(2).page(3))
            .await
            .unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page3.len(), 1);

        let by_correlation = supplier
            .list(&SupplierListQuery::for_correlation(correlation_for(4)))
            .await
            .unwrap();
        assert_eq!(by_correlation.len(), 1);
        assert_eq!(by_correlation[0].external_id, Some(correlation_for(4)));
    }

    #[tokio::test]
    async fn test_delete_and_injected_failure() {
        let supplier = InMemorySupplier::new();
        let id = supplier.create(&payload(1)).await.unwrap();

        supplier.set_delete_failure(Some("already shipped".into())).await;
        assert!(supplier.delete(&id).await.is_err());

        supplier.set_delete_failure(None).await;
        supplier.delete(&id).await.unwrap();
        assert_eq!(supplier.delete_count().await, 1);
        assert!(matches!(
            supplier.get_by_id(&id).await,
            Err(SupplierError::OrderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fulfillment_is_idempotent_per_tracking_number() {
        let storefront = InMemoryStorefront::new();
        let id = StorefrontOrderId::new(1);
        storefront
            .insert_order(
                StorefrontOrder::new(id)
                    .with_line_item(LineItem::new(11, "A", 2, Money::zero()))
                    .with_line_item(LineItem::new(12, "B", 1, Money::zero())),
            )
            .await;

        let matched = [SkuQuantity::new("A", 2)];
        let first = storefront
            .ensure_fulfillment_with_tracking(id, "TRK-1", "Royal Mail", Some(&matched))
            .await
            .unwrap();
        let second = storefront
            .ensure_fulfillment_with_tracking(id, "TRK-1", "Royal Mail", Some(&matched))
            .await
            .unwrap();

        assert_eq!(first, FulfillmentOutcome::Created);
        assert_eq!(second, FulfillmentOutcome::AlreadyExists);
        assert_eq!(storefront.fulfillments_created().await, 1);

        let order = storefront.order(id).await.unwrap();
        assert_eq!(order.fulfillments[0].line_items.len(), 1);
        assert_eq!(order.line_items[0].open_quantity(), 0);
        assert_eq!(order.line_items[1].open_quantity(), 1);
    }

    #[tokio::test]
    async fn test_fulfillment_with_nothing_open_is_no_items() {
        let storefront = InMemoryStorefront::new();
        let id = StorefrontOrderId::new(2);
        storefront
            .insert_order(StorefrontOrder::new(id).with_line_item(LineItem::new(
                21,
                "A",
                1,
                Money::zero(),
            )))
            .await;

        let outcome = storefront
            .ensure_fulfillment_with_tracking(id, "TRK-9", "DPD", Some(&[SkuQuantity::new("Z", 1)]))
            .await
            .unwrap();
        assert_eq!(outcome, FulfillmentOutcome::NoItems);
    }

    #[tokio::test]
    async fn test_note_append_and_metafields() {
        let storefront = InMemoryStorefront::new();
        let id = StorefrontOrderId::new(3);
        storefront.insert_order(StorefrontOrder::new(id)).await;

        storefront.append_note(id, "first").await.unwrap();
        storefront.append_note(id, "second").await.unwrap();
        assert_eq!(
            storefront.order(id).await.unwrap().note.as_deref(),
            Some("first\nsecond")
        );

        assert_eq!(storefront.get_metafield(id, "pod", "k").await.unwrap(), None);
        storefront
            .set_metafield(id, "pod", "k", "v1", MetafieldType::SingleLineText)
            .await
            .unwrap();
        storefront
            .set_metafield(id, "pod", "k", "v2", MetafieldType::SingleLineText)
            .await
            .unwrap();
        assert_eq!(storefront.metafield(id, "pod", "k").await.as_deref(), Some("v2"));
    }
}
