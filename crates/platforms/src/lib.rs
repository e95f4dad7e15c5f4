//! Platform capability interfaces.
//!
//! The sync engines talk to the storefront and the supplier only through the
//! [`StorefrontOrders`] and [`SupplierOrders`] traits. This crate provides
//! the HTTP clients used in production and in-memory implementations used in
//! tests and local runs.

pub mod error;
pub mod http;
pub mod memory;
pub mod normalize;
pub mod signing;
pub mod storefront;
pub mod supplier;

pub use error::{StorefrontError, SupplierError};
pub use http::{ShopifyClient, ShopifyClientConfig, SupplierClient, SupplierClientConfig};
pub use memory::{InMemoryStorefront, InMemorySupplier, correlation_for};
pub use signing::RequestSigner;
pub use storefront::{
    METAFIELD_NAMESPACE, MetafieldType, NOTE_PREFIX, SHIPPING_COST_KEY, SHIPPING_CURRENCY_KEY,
    SUPPLIER_ORDER_ID_KEY, StorefrontOrders,
};
pub use supplier::{SupplierListQuery, SupplierOrders};
