//! Submission engine: paid storefront order → supplier order.

use std::sync::Arc;

use common::{StorefrontOrderId, SupplierOrderId};
use domain::{MapOptions, PodTag, StorefrontOrder, map_to_supplier_payload, partition_line_items};
use platforms::{StorefrontOrders, SupplierOrders};
use serde::Serialize;

use crate::annotate;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::linkage;
use crate::scheduler::{Scheduler, SubmissionJob};

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// A supplier order was created and linked.
    Created { supplier_order_id: SupplierOrderId },
    /// The order was already linked; nothing was sent.
    AlreadyExists { supplier_order_id: SupplierOrderId },
    /// Every line item failed SKU validation; nothing was sent.
    NoItems,
    /// A transient failure; the next attempt is queued.
    RetryScheduled { next_attempt: u32 },
}

impl SubmissionOutcome {
    fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Created { .. } => "created",
            SubmissionOutcome::AlreadyExists { .. } => "already_exists",
            SubmissionOutcome::NoItems => "no_items",
            SubmissionOutcome::RetryScheduled { .. } => "retry_scheduled",
        }
    }
}

/// Creates supplier orders for paid storefront orders.
///
/// Idempotency rests on the linkage, resolved on every attempt from the
/// metafield or, failing that, the correlation id. Two deliveries racing past that check can still produce two
/// supplier orders; no claim record is kept.
pub struct SubmissionEngine<S, P>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    storefront: S,
    supplier: P,
    scheduler: Arc<dyn Scheduler>,
    config: Arc<SyncConfig>,
}

impl<S, P> SubmissionEngine<S, P>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    pub fn new(storefront: S, supplier: P, scheduler: Arc<dyn Scheduler>, config: Arc<SyncConfig>) -> Self {
        Self {
            storefront,
            supplier,
            scheduler,
            config,
        }
    }

    /// Queues the first attempt after the configured send delay.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub fn enqueue(&self, order: StorefrontOrder) -> Result<()> {
        tracing::info!(delay_secs = self.config.send_delay.as_secs(), "submission queued");
        self.scheduler
            .schedule(SubmissionJob::first(order), self.config.send_delay)
    }

    /// Runs one submission attempt.
    ///
    /// A transient create failure below the attempt ceiling queues the next
    /// attempt and returns `RetryScheduled`. Any other failure tags the order
    /// `supplier error`, appends a note and returns the error.
    #[tracing::instrument(skip(self, job), fields(order_id = %job.order.id, attempt = job.attempt))]
    pub async fn submit(&self, job: &SubmissionJob) -> Result<SubmissionOutcome> {
        let result = self.attempt(job).await;
        let label = match &result {
            Ok(outcome) => outcome.label(),
            Err(_) => "failed",
        };
        metrics::counter!("pod_submissions_total", "outcome" => label).increment(1);
        result
    }

    async fn attempt(&self, job: &SubmissionJob) -> Result<SubmissionOutcome> {
        let order = &job.order;
        let attempt = job.attempt;
        let id = order.id;

        // 1. A previous attempt may have succeeded after its response or its
        // linkage write was lost.
        match linkage::resolve_linkage(&self.storefront, &self.supplier, id).await {
            Ok(Some(existing)) => {
                tracing::info!(supplier_order_id = %existing, "order already linked");
                return Ok(SubmissionOutcome::AlreadyExists {
                    supplier_order_id: existing,
                });
            }
            Ok(None) => {}
            Err(e) => {
                self.annotate_failure(id, &format!("could not check for an existing supplier order: {e}"))
                    .await;
                return Err(e);
            }
        }

        // 2. SKU validation; invalid lines are reported once, on the first attempt.
        let partition = partition_line_items(&order.line_items, &self.config.sku_allow_list);
        if !partition.invalid.is_empty() && attempt == 1 {
            let listed = partition
                .invalid
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(invalid = %listed, "order has unknown SKUs");
            annotate::tag(&self.storefront, id, PodTag::UnknownSku).await;
            annotate::note(
                &self.storefront,
                id,
                &format!("Skipped line items with unknown SKU: {listed}"),
            )
            .await;
        }

        // 3. Nothing left to send.
        if partition.valid.is_empty() {
            tracing::info!("no fulfillable line items");
            return Ok(SubmissionOutcome::NoItems);
        }

        // 4. Payload with configured defaults.
        let options = MapOptions {
            design_prefix: self.config.design_prefix.clone(),
            correlation_id: None,
        };
        let mut payload = map_to_supplier_payload(order, &partition.valid, &options)?;
        payload.apply_defaults(
            self.config.brand_name.as_deref(),
            self.config.shipping_method.as_deref(),
        );

        // 5. Create and link.
        match self.supplier.create(&payload).await {
            Ok(supplier_order_id) => {
                self.link(id, &supplier_order_id).await;
                tracing::info!(%supplier_order_id, attempt, "supplier order created");
                Ok(SubmissionOutcome::Created { supplier_order_id })
            }
            Err(e) => {
                let message = e.message();
                if !self.config.is_transient(&message) {
                    return Err(self.fail(id, message).await);
                }
                if attempt >= self.config.max_attempts {
                    let message = format!("{message} (gave up after {attempt} attempts)");
                    return Err(self.fail(id, message).await);
                }

                let next = job.next();
                let next_attempt = next.attempt;
                tracing::warn!(
                    attempt,
                    next_attempt,
                    error = %message,
                    "transient supplier error, retry scheduled"
                );
                if let Err(e) = self.scheduler.schedule(next, self.config.retry_delay) {
                    self.annotate_failure(id, &format!("{message} (retry could not be queued: {e})"))
                        .await;
                    return Err(e);
                }
                metrics::counter!("pod_submission_retries_total").increment(1);
                Ok(SubmissionOutcome::RetryScheduled { next_attempt })
            }
        }
    }

    /// A lost linkage write is recoverable through the correlation id.
    async fn link(&self, id: StorefrontOrderId, supplier_order_id: &SupplierOrderId) {
        if let Err(e) = linkage::record_linkage(&self.storefront, id, supplier_order_id).await {
            tracing::warn!(%supplier_order_id, error = %e, "failed to record linkage metafield");
        }
    }

    async fn fail(&self, id: StorefrontOrderId, message: String) -> SyncError {
        self.annotate_failure(id, &message).await;
        SyncError::TerminalSupplier { message }
    }

    /// Tags the order `supplier error` and notes why creation stopped.
    async fn annotate_failure(&self, id: StorefrontOrderId, message: &str) {
        tracing::error!(order_id = %id, error = %message, "supplier order creation failed");
        annotate::tag(&self.storefront, id, PodTag::SupplierError).await;
        annotate::note(
            &self.storefront,
            id,
            &format!("Supplier order creation failed: {message}"),
        )
        .await;
    }
}
