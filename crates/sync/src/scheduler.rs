//! Deferred submission queue.
//!
//! Submission attempts are messages: a [`SubmissionJob`] carries the order
//! snapshot and the attempt number. A [`Scheduler`] defers jobs without
//! blocking the caller; the [`SubmissionWorker`] consumes them and drives
//! the submission engine.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use domain::StorefrontOrder;
use platforms::{StorefrontOrders, SupplierOrders};
use tokio::sync::mpsc;

use crate::error::{Result, SyncError};
use crate::submission::SubmissionEngine;

/// One submission attempt for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionJob {
    pub order: StorefrontOrder,
    /// 1-based attempt number.
    pub attempt: u32,
}

impl SubmissionJob {
    /// The first attempt for an order.
    pub fn first(order: StorefrontOrder) -> Self {
        Self { order, attempt: 1 }
    }

    /// The attempt following this one.
    pub fn next(&self) -> Self {
        Self {
            order: self.order.clone(),
            attempt: self.attempt + 1,
        }
    }
}

/// Defers submission jobs.
///
/// Once scheduled a job fires unless the process exits; there is no abort.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, job: SubmissionJob, delay: Duration) -> Result<()>;
}

/// Defers jobs on the tokio timer and delivers them over a channel.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<SubmissionJob>,
}

impl TokioScheduler {
    /// Creates the scheduler and the receiving end for a [`SubmissionWorker`].
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SubmissionJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, job: SubmissionJob, delay: Duration) -> Result<()> {
        if self.tx.is_closed() {
            return Err(SyncError::SchedulerClosed);
        }
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let order_id = job.order.id;
            if tx.send(job).is_err() {
                tracing::warn!(%order_id, "submission worker gone, job dropped");
            }
        });
        Ok(())
    }
}

/// Records jobs instead of running them.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    jobs: Arc<Mutex<Vec<(SubmissionJob, Duration)>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs scheduled so far with their delays.
    pub fn scheduled(&self) -> Vec<(SubmissionJob, Duration)> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Removes and returns every scheduled job.
    pub fn drain(&self) -> Vec<(SubmissionJob, Duration)> {
        std::mem::take(&mut *self.jobs.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, job: SubmissionJob, delay: Duration) -> Result<()> {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((job, delay));
        Ok(())
    }
}

/// Consumes scheduled jobs and runs each as an independent task.
pub struct SubmissionWorker<S, P>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    engine: Arc<SubmissionEngine<S, P>>,
    rx: mpsc::UnboundedReceiver<SubmissionJob>,
}

impl<S, P> SubmissionWorker<S, P>
where
    S: StorefrontOrders + 'static,
    P: SupplierOrders + 'static,
{
    pub fn new(engine: Arc<SubmissionEngine<S, P>>, rx: mpsc::UnboundedReceiver<SubmissionJob>) -> Self {
        Self { engine, rx }
    }

    /// Runs until every scheduler handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("submission worker started");
        while let Some(job) = self.rx.recv().await {
            let engine = Arc::clone(&self.engine);
            tokio::spawn(async move {
                let order_id = job.order.id;
                let attempt = job.attempt;
                match engine.submit(&job).await {
                    Ok(outcome) => {
                        tracing::info!(%order_id, attempt, ?outcome, "submission attempt finished")
                    }
                    Err(e) => {
                        tracing::error!(%order_id, attempt, error = %e, "submission failed")
                    }
                }
            });
        }
        tracing::info!("submission worker stopped");
    }
}
