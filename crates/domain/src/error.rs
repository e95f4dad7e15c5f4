//! Domain error types.

use thiserror::Error;

/// Errors raised by the pure mapping and parsing layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Every line item was filtered out by SKU validation.
    #[error("Order has no fulfillable line items")]
    NoFulfillableItems,

    /// A monetary amount could not be parsed.
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),
}
