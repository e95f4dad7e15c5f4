//! Sync engine error types.

use common::StorefrontOrderId;
use domain::DomainError;
use platforms::{StorefrontError, SupplierError};
use thiserror::Error;

/// Errors that can occur while syncing orders.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The supplier rejected a create with a known "asset not ready" message.
    #[error("Transient supplier error on attempt {attempt}: {message}")]
    TransientSupplier { attempt: u32, message: String },

    /// Any other supplier failure, or retries exhausted.
    #[error("Supplier error: {message}")]
    TerminalSupplier { message: String },

    /// No supplier order is linked to the storefront order.
    #[error("No supplier order linked to storefront order {0}")]
    LinkageNotFound(StorefrontOrderId),

    /// The retry queue is no longer consumed.
    #[error("Submission scheduler is closed")]
    SchedulerClosed,

    /// Storefront call failed.
    #[error("Storefront error: {0}")]
    Storefront(#[from] StorefrontError),

    /// Supplier call failed.
    #[error("Supplier call failed: {0}")]
    Supplier(#[from] SupplierError),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Convenience type alias for sync results.
pub type Result<T> = std::result::Result<T, SyncError>;
