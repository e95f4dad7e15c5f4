//! Engine configuration.

use std::time::Duration;

use domain::SkuAllowList;

/// Settings shared by the submission, cancellation and reconciliation engines.
///
/// Built once at startup and handed to each engine; nothing in the engines
/// reads the process environment.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Total submission attempts per order, including the first.
    pub max_attempts: u32,
    /// Fixed delay between a transient failure and the next attempt.
    pub retry_delay: Duration,
    /// Delay between the paid webhook and the first attempt.
    pub send_delay: Duration,
    pub brand_name: Option<String>,
    pub shipping_method: Option<String>,
    pub sku_allow_list: SkuAllowList,
    /// Case-insensitive substrings marking a create failure as retryable.
    pub transient_signatures: Vec<String>,
    /// Line item property prefix carrying design-asset urls.
    pub design_prefix: String,
    /// Days after shipping at which an order is presumed delivered.
    pub tracking_window_days: u32,
    /// Carrier reported on fulfillments when the supplier names none.
    pub default_carrier: String,
    /// Page size used by the reconciliation sweep.
    pub page_size: u32,
    /// Default look-back of the reconciliation sweep.
    pub window_days: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(60),
            send_delay: Duration::from_secs(30),
            brand_name: None,
            shipping_method: None,
            sku_allow_list: SkuAllowList::default(),
            transient_signatures: vec!["not valid".to_string()],
            design_prefix: "_design".to_string(),
            tracking_window_days: 7,
            default_carrier: "Other".to_string(),
            page_size: 50,
            window_days: 14,
        }
    }
}

impl SyncConfig {
    /// Returns true if a supplier error message matches a transient signature.
    pub fn is_transient(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.transient_signatures
            .iter()
            .map(|s| s.trim().to_lowercase())
            .any(|s| !s.is_empty() && message.contains(&s))
    }

    /// Tracking window as a signed duration for timestamp arithmetic.
    pub fn tracking_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.tracking_window_days))
    }
}
