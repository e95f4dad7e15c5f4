//! reqwest-backed platform clients.
//!
//! Each call carries the configured timeout. Transport failures are returned
//! to the caller as-is; retry policy lives in the sync engines.

mod shopify;
mod supplier;

pub use shopify::{ShopifyClient, ShopifyClientConfig};
pub use supplier::{SupplierClient, SupplierClientConfig};
