//! Supplier REST client.

use std::time::Duration;

use async_trait::async_trait;
use common::SupplierOrderId;
use domain::{SupplierOrder, SupplierOrderPayload};
use reqwest::{Client, Method, Response, Url};
use serde_json::Value;

use crate::error::SupplierError;
use crate::normalize;
use crate::signing::RequestSigner;
use crate::supplier::{SupplierListQuery, SupplierOrders};

/// Settings for [`SupplierClient`].
#[derive(Debug, Clone)]
pub struct SupplierClientConfig {
    /// API root, e.g. `https://api.supplier.example/v1/`.
    pub base_url: String,
    pub app_id: String,
    pub secret_key: String,
    pub timeout: Duration,
}

/// Signed HTTP implementation of [`SupplierOrders`].
#[derive(Debug, Clone)]
pub struct SupplierClient {
    http: Client,
    base: Url,
    signer: RequestSigner,
}

impl SupplierClient {
    /// Builds the client. Fails only on an unparsable base url or TLS setup.
    pub fn new(config: &SupplierClientConfig) -> Result<Self, SupplierError> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)
            .map_err(|e| SupplierError::MalformedResponse(format!("invalid supplier base url: {e}")))?;
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base,
            signer: RequestSigner::new(&config.app_id, &config.secret_key),
        })
    }

    fn url(&self, path: &str) -> Result<Url, SupplierError> {
        self.base
            .join(path)
            .map_err(|e| SupplierError::MalformedResponse(format!("invalid supplier path {path}: {e}")))
    }

    async fn send_query(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, SupplierError> {
        let mut url = self.url(path)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        self.signer.sign_query(&mut url);

        tracing::debug!(%method, path, "supplier request");
        let response = self.http.request(method, url).send().await?;
        read_json(response).await
    }

    async fn send_body(&self, path: &str, body: &impl serde::Serialize) -> Result<Value, SupplierError> {
        let body = serde_json::to_string(body)
            .map_err(|e| SupplierError::MalformedResponse(format!("payload did not serialize: {e}")))?;
        let mut url = self.url(path)?;
        self.signer.sign_body(&mut url, &body);

        tracing::debug!(path, "supplier request");
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json(response: Response) -> Result<Value, SupplierError> {
    let status = response.status();
    let text = response.text().await?;
    metrics::counter!("pod_supplier_requests_total", "status" => status.as_u16().to_string())
        .increment(1);

    if !status.is_success() {
        return Err(SupplierError::Api {
            status: status.as_u16(),
            message: normalize::error_message(&text),
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text)
        .map_err(|e| SupplierError::MalformedResponse(format!("response is not JSON: {e}")))
}

#[async_trait]
impl SupplierOrders for SupplierClient {
    #[tracing::instrument(skip(self, payload), fields(external_id = %payload.external_id))]
    async fn create(&self, payload: &SupplierOrderPayload) -> Result<SupplierOrderId, SupplierError> {
        let body = self.send_body("orders", payload).await?;
        normalize::created_order_id(&body)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: &SupplierOrderId) -> Result<SupplierOrder, SupplierError> {
        let path = format!("orders/{id}");
        match self.send_query(Method::GET, &path, &[]).await {
            Err(SupplierError::Api { status: 404, .. }) => {
                Err(SupplierError::OrderNotFound(id.to_string()))
            }
            other => normalize::single_order(other?),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, query: &SupplierListQuery) -> Result<Vec<SupplierOrder>, SupplierError> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(from) = query.created_from {
            params.push(("created_at_from", from.format("%Y-%m-%d %H:%M:%S").to_string()));
        }
        if let Some(to) = query.created_to {
            params.push(("created_at_to", to.format("%Y-%m-%d %H:%M:%S").to_string()));
        }
        if let Some(status) = &query.status {
            params.push(("status", status.clone()));
        }
        if let Some(external_id) = &query.external_id {
            params.push(("external_id", external_id.to_string()));
        }

        let body = self.send_query(Method::GET, "orders", &params).await?;
        normalize::order_list(body)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &SupplierOrderId) -> Result<(), SupplierError> {
        let path = format!("orders/{id}");
        self.send_query(Method::DELETE, &path, &[]).await?;
        Ok(())
    }
}
