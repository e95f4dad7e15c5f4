//! Supplier order capability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CorrelationId, SupplierOrderId};
use domain::{SupplierOrder, SupplierOrderPayload};

use crate::error::SupplierError;

/// Filters for listing supplier orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierListQuery {
    /// Orders created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,
    /// Orders created at or before this instant.
    pub created_to: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub external_id: Option<CorrelationId>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for SupplierListQuery {
    fn default() -> Self {
        Self {
            created_from: None,
            created_to: None,
            status: None,
            external_id: None,
            page: 1,
            limit: 50,
        }
    }
}

impl SupplierListQuery {
    /// Orders created within `[from, to]`.
    pub fn created_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            created_from: Some(from),
            created_to: Some(to),
            ..Default::default()
        }
    }

    /// Orders carrying a given correlation id.
    pub fn for_correlation(external_id: CorrelationId) -> Self {
        Self {
            external_id: Some(external_id),
            ..Default::default()
        }
    }

    /// Sets the page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Signed order primitives offered by the supplier API.
#[async_trait]
pub trait SupplierOrders: Send + Sync {
    /// Submits a new order and returns the id the supplier assigned.
    async fn create(&self, payload: &SupplierOrderPayload) -> Result<SupplierOrderId, SupplierError>;

    async fn get_by_id(&self, id: &SupplierOrderId) -> Result<SupplierOrder, SupplierError>;

    async fn list(&self, query: &SupplierListQuery) -> Result<Vec<SupplierOrder>, SupplierError>;

    async fn delete(&self, id: &SupplierOrderId) -> Result<(), SupplierError>;
}
