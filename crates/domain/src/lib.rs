//! Domain layer for the storefront/supplier order sync.
//!
//! This crate is pure: no I/O, no clocks. It provides:
//! - Storefront and supplier order models tolerant of loose wire shapes
//! - The normalized status tag vocabulary and tag-set operations
//! - The order mapper (SKU validation, design extraction, payload build)
//! - The supplier status policy and partial fulfillment planning

pub mod error;
pub mod fulfillment;
pub mod mapper;
mod serde_util;
pub mod status;
pub mod storefront;
pub mod supplier;
pub mod tags;
pub mod value_objects;

pub use error::DomainError;
pub use fulfillment::{
    FulfillmentLine, FulfillmentOutcome, SkuQuantity, plan_fulfillment, plan_full_fulfillment,
    shipped_quantities,
};
pub use mapper::{
    InvalidLine, InvalidReason, MapOptions, SkuAllowList, SkuPartition, extract_designs,
    map_to_supplier_payload, partition_line_items,
};
pub use status::{SupplierStatus, map_status_to_pod_tag, pod_tag_for};
pub use storefront::{
    FulfilledLine, Fulfillment, LineItem, LineItemProperty, ShippingAddress, StorefrontOrder,
};
pub use supplier::{
    Designs, PayloadItem, SupplierAddress, SupplierItem, SupplierOrder, SupplierOrderPayload,
    SupplierShipping, SupplierSummary,
};
pub use tags::{PodTag, TagSet};
pub use value_objects::Money;
