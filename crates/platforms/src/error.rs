use common::StorefrontOrderId;
use thiserror::Error;

/// Errors from the storefront admin API.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Transport failure or timeout.
    #[error("Storefront HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The storefront answered with a non-success status.
    #[error("Storefront API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The order does not exist on the storefront.
    #[error("Storefront order not found: {0}")]
    OrderNotFound(StorefrontOrderId),

    /// A response body could not be decoded.
    #[error("Storefront response parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors from the supplier API.
#[derive(Debug, Error)]
pub enum SupplierError {
    /// Transport failure or timeout.
    #[error("Supplier HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The supplier rejected the request; `message` is extracted from the body.
    #[error("Supplier API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response parsed as JSON but not into any known shape.
    #[error("Malformed supplier response: {0}")]
    MalformedResponse(String),

    /// The requested order does not exist at the supplier.
    #[error("Supplier order not found: {0}")]
    OrderNotFound(String),
}

impl SupplierError {
    /// Human-readable message suitable for an order note.
    pub fn message(&self) -> String {
        match self {
            SupplierError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
