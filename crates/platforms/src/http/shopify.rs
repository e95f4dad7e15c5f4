//! Shopify admin REST client.

use std::time::Duration;

use async_trait::async_trait;
use common::StorefrontOrderId;
use domain::{
    FulfillmentLine, FulfillmentOutcome, SkuQuantity, StorefrontOrder, plan_fulfillment,
    plan_full_fulfillment,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::StorefrontError;
use crate::storefront::{MetafieldType, StorefrontOrders};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Settings for [`ShopifyClient`].
#[derive(Debug, Clone)]
pub struct ShopifyClientConfig {
    /// Shop domain, e.g. `my-shop.myshopify.com`.
    pub shop_domain: String,
    pub access_token: String,
    pub api_version: String,
    pub timeout: Duration,
}

/// HTTP implementation of [`StorefrontOrders`] against the Shopify admin API.
#[derive(Debug, Clone)]
pub struct ShopifyClient {
    http: Client,
    base: Url,
}

#[derive(Deserialize)]
struct OrderEnvelope {
    order: StorefrontOrder,
}

#[derive(Deserialize)]
struct MetafieldList {
    #[serde(default)]
    metafields: Vec<MetafieldRecord>,
}

#[derive(Deserialize)]
struct MetafieldRecord {
    id: u64,
    namespace: String,
    key: String,
    #[serde(default)]
    value: Value,
}

#[derive(Deserialize)]
struct FulfillmentOrderList {
    #[serde(default)]
    fulfillment_orders: Vec<FulfillmentOrder>,
}

#[derive(Deserialize)]
struct FulfillmentOrder {
    id: u64,
    #[serde(default)]
    status: String,
    #[serde(default)]
    line_items: Vec<FulfillmentOrderLine>,
}

#[derive(Deserialize)]
struct FulfillmentOrderLine {
    id: u64,
    line_item_id: u64,
    #[serde(default)]
    fulfillable_quantity: u32,
}

impl ShopifyClient {
    pub fn new(config: &ShopifyClientConfig) -> Result<Self, StorefrontError> {
        let base = format!(
            "https://{}/admin/api/{}/",
            config.shop_domain.trim().trim_end_matches('/'),
            config.api_version.trim()
        );
        let base = Url::parse(&base).map_err(|e| StorefrontError::Api {
            status: 0,
            body: format!("invalid shop domain: {e}"),
        })?;

        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&config.access_token).map_err(|e| StorefrontError::Api {
            status: 0,
            body: format!("invalid access token: {e}"),
        })?;
        headers.insert(ACCESS_TOKEN_HEADER, token);

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { http, base })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, String), StorefrontError> {
        let url = self.base.join(path).map_err(|e| StorefrontError::Api {
            status: 0,
            body: format!("invalid path {path}: {e}"),
        })?;

        tracing::debug!(%method, path, "storefront request");
        let mut builder = self.http.request(method, url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        metrics::counter!("pod_storefront_requests_total", "status" => status.as_u16().to_string())
            .increment(1);
        Ok((status, text))
    }

    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<String, StorefrontError> {
        let (status, text) = self.request(method, path, body).await?;
        if !status.is_success() {
            return Err(StorefrontError::Api {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    async fn find_metafield(
        &self,
        id: StorefrontOrderId,
        namespace: &str,
        key: &str,
    ) -> Result<Option<MetafieldRecord>, StorefrontError> {
        let path = format!("orders/{id}/metafields.json?namespace={namespace}&key={key}");
        let text = match self.call(Method::GET, &path, None).await {
            Err(StorefrontError::Api { status: 404, .. }) => {
                return Err(StorefrontError::OrderNotFound(id));
            }
            other => other?,
        };
        let list: MetafieldList = serde_json::from_str(&text)?;
        Ok(list
            .metafields
            .into_iter()
            .find(|m| m.namespace == namespace && m.key == key))
    }

    async fn fulfillment_orders(&self, id: StorefrontOrderId) -> Result<Vec<FulfillmentOrder>, StorefrontError> {
        let text = self
            .call(Method::GET, &format!("orders/{id}/fulfillment_orders.json"), None)
            .await?;
        let list: FulfillmentOrderList = serde_json::from_str(&text)?;
        Ok(list
            .fulfillment_orders
            .into_iter()
            .filter(|fo| matches!(fo.status.as_str(), "open" | "in_progress" | "scheduled"))
            .collect())
    }
}

/// Spreads planned line quantities over the open fulfillment-order lines.
fn by_fulfillment_order(plan: &[FulfillmentLine], orders: &[FulfillmentOrder]) -> Vec<Value> {
    let mut remaining: Vec<(u64, u32)> = plan.iter().map(|l| (l.line_item_id, l.quantity)).collect();
    let mut groups = Vec::new();

    for fo in orders {
        let mut lines = Vec::new();
        for fo_line in &fo.line_items {
            let Some((_, wanted)) = remaining
                .iter_mut()
                .find(|(line_item_id, qty)| *line_item_id == fo_line.line_item_id && *qty > 0)
            else {
                continue;
            };
            let take = (*wanted).min(fo_line.fulfillable_quantity);
            if take == 0 {
                continue;
            }
            *wanted -= take;
            lines.push(json!({ "id": fo_line.id, "quantity": take }));
        }
        if !lines.is_empty() {
            groups.push(json!({
                "fulfillment_order_id": fo.id,
                "fulfillment_order_line_items": lines,
            }));
        }
    }
    groups
}

#[async_trait]
impl StorefrontOrders for ShopifyClient {
    #[tracing::instrument(skip(self))]
    async fn get_order(&self, id: StorefrontOrderId) -> Result<StorefrontOrder, StorefrontError> {
        let text = match self.call(Method::GET, &format!("orders/{id}.json"), None).await {
            Err(StorefrontError::Api { status: 404, .. }) => {
                return Err(StorefrontError::OrderNotFound(id));
            }
            other => other?,
        };
        let envelope: OrderEnvelope = serde_json::from_str(&text)?;
        Ok(envelope.order)
    }

    #[tracing::instrument(skip(self))]
    async fn set_tags(&self, id: StorefrontOrderId, tags: &str) -> Result<(), StorefrontError> {
        let body = json!({ "order": { "id": id, "tags": tags } });
        self.call(Method::PUT, &format!("orders/{id}.json"), Some(body))
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, text))]
    async fn append_note(&self, id: StorefrontOrderId, text: &str) -> Result<(), StorefrontError> {
        let order = self.get_order(id).await?;
        let note = match order.note.filter(|n| !n.trim().is_empty()) {
            Some(existing) => format!("{existing}\n{text}"),
            None => text.to_string(),
        };
        let body = json!({ "order": { "id": id, "note": note } });
        self.call(Method::PUT, &format!("orders/{id}.json"), Some(body))
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_metafield(
        &self,
        id: StorefrontOrderId,
        namespace: &str,
        key: &str,
    ) -> Result<Option<String>, StorefrontError> {
        let value = self
            .find_metafield(id, namespace, key)
            .await?
            .map(|m| match m.value {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .filter(|v| !v.trim().is_empty());
        Ok(value)
    }

    #[tracing::instrument(skip(self, value))]
    async fn set_metafield(
        &self,
        id: StorefrontOrderId,
        namespace: &str,
        key: &str,
        value: &str,
        kind: MetafieldType,
    ) -> Result<(), StorefrontError> {
        let body = json!({
            "metafield": {
                "namespace": namespace,
                "key": key,
                "value": value,
                "type": kind.as_str(),
            }
        });
        let path = format!("orders/{id}/metafields.json");
        match self.call(Method::POST, &path, Some(body)).await {
            Ok(_) => Ok(()),
            // Already exists: update in place.
            Err(StorefrontError::Api { status: 422, body: rejected }) => {
                let Some(existing) = self.find_metafield(id, namespace, key).await? else {
                    return Err(StorefrontError::Api {
                        status: 422,
                        body: rejected,
                    });
                };
                let body = json!({
                    "metafield": { "id": existing.id, "value": value, "type": kind.as_str() }
                });
                self.call(Method::PUT, &format!("metafields/{}.json", existing.id), Some(body))
                    .await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self, matched))]
    async fn ensure_fulfillment_with_tracking(
        &self,
        id: StorefrontOrderId,
        tracking_number: &str,
        carrier: &str,
        matched: Option<&[SkuQuantity]>,
    ) -> Result<FulfillmentOutcome, StorefrontError> {
        let order = self.get_order(id).await?;
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

        let fulfillment_orders = self.fulfillment_orders(id).await?;
        let groups = by_fulfillment_order(&plan, &fulfillment_orders);
        if groups.is_empty() {
            return Ok(FulfillmentOutcome::NoItems);
        }

        let body = json!({
            "fulfillment": {
                "line_items_by_fulfillment_order": groups,
                "tracking_info": { "number": tracking_number, "company": carrier },
                "notify_customer": true,
            }
        });
        self.call(Method::POST, "fulfillments.json", Some(body)).await?;
        tracing::info!(order_id = %id, tracking_number, "fulfillment created");
        Ok(FulfillmentOutcome::Created)
    }
}
