//! Order sync engines between the storefront and the print-on-demand
//! supplier.
//!
//! - [`SubmissionEngine`] creates supplier orders for paid storefront orders,
//!   retrying a known transient failure through the [`Scheduler`] queue
//! - [`CancellationEngine`] deletes the linked supplier order when a
//!   storefront order is cancelled
//! - [`StatusReconciler`] projects supplier status, shipping cost and tracking
//!   back onto storefront orders
//!
//! Every failure that stops automation is written to the storefront order as
//! a tag and a note before it is returned.

mod annotate;
pub mod cancellation;
pub mod config;
pub mod error;
mod linkage;
pub mod reconciler;
pub mod scheduler;
pub mod submission;

pub use cancellation::{CancellationEngine, CancellationOutcome};
pub use config::SyncConfig;
pub use error::SyncError;
pub use reconciler::{ProjectionOutcome, StatusReconciler, SweepReport};
pub use scheduler::{ManualScheduler, Scheduler, SubmissionJob, SubmissionWorker, TokioScheduler};
pub use submission::{SubmissionEngine, SubmissionOutcome};
