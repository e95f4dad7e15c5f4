//! Identifier types shared by every layer of the order sync.

mod types;

pub use types::{CORRELATION_PREFIX, CorrelationId, StorefrontOrderId, SupplierOrderId};
