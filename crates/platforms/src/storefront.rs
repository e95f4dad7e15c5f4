//! Storefront order capability.

use async_trait::async_trait;
use common::StorefrontOrderId;
use domain::{FulfillmentOutcome, SkuQuantity, StorefrontOrder};

use crate::error::StorefrontError;

/// Metafield namespace owned by this system.
pub const METAFIELD_NAMESPACE: &str = "pod";

/// Forward linkage to the supplier order.
pub const SUPPLIER_ORDER_ID_KEY: &str = "supplier_order_id";

/// Shipping cost reported by the supplier.
pub const SHIPPING_COST_KEY: &str = "shipping_cost";

/// Currency of [`SHIPPING_COST_KEY`].
pub const SHIPPING_CURRENCY_KEY: &str = "shipping_currency";

/// Prefix applied to every note line this system appends.
pub const NOTE_PREFIX: &str = "[POD] ";

/// Storefront metafield value types used by this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetafieldType {
    SingleLineText,
    NumberDecimal,
}

impl MetafieldType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetafieldType::SingleLineText => "single_line_text_field",
            MetafieldType::NumberDecimal => "number_decimal",
        }
    }
}

/// Order primitives offered by the storefront admin API.
///
/// Implementations are pure I/O adapters. Every write is safe to re-apply.
#[async_trait]
pub trait StorefrontOrders: Send + Sync {
    /// Fetches an order with tags, note, line items and fulfillments.
    async fn get_order(&self, id: StorefrontOrderId) -> Result<StorefrontOrder, StorefrontError>;

    /// Replaces the order's tag string.
    async fn set_tags(&self, id: StorefrontOrderId, tags: &str) -> Result<(), StorefrontError>;

    /// Appends a line to the order note.
    async fn append_note(&self, id: StorefrontOrderId, text: &str) -> Result<(), StorefrontError>;

    /// Reads a metafield value, `None` if it does not exist.
    async fn get_metafield(
        &self,
        id: StorefrontOrderId,
        namespace: &str,
        key: &str,
    ) -> Result<Option<String>, StorefrontError>;

    /// Creates or updates a metafield.
    async fn set_metafield(
        &self,
        id: StorefrontOrderId,
        namespace: &str,
        key: &str,
        value: &str,
        kind: MetafieldType,
    ) -> Result<(), StorefrontError>;

    /// Creates a fulfillment carrying `tracking_number` unless one already exists.
    ///
    /// With `matched` set, only those SKU quantities are fulfilled (each capped
    /// at the line's open quantity); otherwise every open line is.
    async fn ensure_fulfillment_with_tracking(
        &self,
        id: StorefrontOrderId,
        tracking_number: &str,
        carrier: &str,
        matched: Option<&[SkuQuantity]>,
    ) -> Result<FulfillmentOutcome, StorefrontError>;
}
