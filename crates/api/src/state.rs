//! Shared application state.

use std::sync::Arc;

use platforms::{StorefrontOrders, SupplierOrders};
use sync::{
    CancellationEngine, Scheduler, StatusReconciler, SubmissionEngine, SubmissionWorker, SyncConfig,
    TokioScheduler,
};

use crate::webhook::WebhookVerifier;

/// Engines and credentials accessible from all handlers.
pub struct AppState<S, P>
where
    S: StorefrontOrders,
    P: SupplierOrders,
{
    pub submission: Arc<SubmissionEngine<S, P>>,
    pub cancellation: CancellationEngine<S, P>,
    pub reconciler: StatusReconciler<S, P>,
    pub webhooks: WebhookVerifier,
    /// Required in `X-Job-Token` on job endpoints when set.
    pub job_token: Option<String>,
    pub sync: Arc<SyncConfig>,
}

impl<S, P> AppState<S, P>
where
    S: StorefrontOrders + Clone,
    P: SupplierOrders + Clone,
{
    pub fn new(
        storefront: S,
        supplier: P,
        scheduler: Arc<dyn Scheduler>,
        sync: SyncConfig,
        webhooks: WebhookVerifier,
        job_token: Option<String>,
    ) -> Self {
        let sync = Arc::new(sync);
        Self {
            submission: Arc::new(SubmissionEngine::new(
                storefront.clone(),
                supplier.clone(),
                scheduler,
                sync.clone(),
            )),
            cancellation: CancellationEngine::new(storefront.clone(), supplier.clone()),
            reconciler: StatusReconciler::new(storefront, supplier, sync.clone()),
            webhooks,
            job_token,
            sync,
        }
    }
}

/// Builds the state around a tokio-timer retry queue.
///
/// The returned worker must be spawned for queued submissions to run.
pub fn create_state<S, P>(
    storefront: S,
    supplier: P,
    sync: SyncConfig,
    webhooks: WebhookVerifier,
    job_token: Option<String>,
) -> (Arc<AppState<S, P>>, SubmissionWorker<S, P>)
where
    S: StorefrontOrders + Clone + 'static,
    P: SupplierOrders + Clone + 'static,
{
    let (scheduler, rx) = TokioScheduler::new();
    let state = Arc::new(AppState::new(
        storefront,
        supplier,
        Arc::new(scheduler),
        sync,
        webhooks,
        job_token,
    ));
    let worker = SubmissionWorker::new(state.submission.clone(), rx);
    (state, worker)
}
