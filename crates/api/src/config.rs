//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::SkuAllowList;
use platforms::{ShopifyClientConfig, SupplierClientConfig};
use sync::SyncConfig;
use thiserror::Error;

/// Required settings that were not provided.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing required configuration: {}", .0.join(", "))]
pub struct ConfigError(pub Vec<&'static str>);

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `SHOPIFY_SHOP_DOMAIN`, `SHOPIFY_ACCESS_TOKEN`, `SHOPIFY_WEBHOOK_SECRET`: required
/// - `SHOPIFY_API_VERSION`: admin API version (default: `"2024-10"`)
/// - `SUPPLIER_BASE_URL`, `SUPPLIER_APP_ID`, `SUPPLIER_SECRET_KEY`: required
/// - `HTTP_TIMEOUT_SECS`: per-call timeout for both platforms (default: `20`)
/// - `JOB_TOKEN`: when set, job endpoints require it in `X-Job-Token`
/// - `POD_*`: engine settings, see [`Config::sync_from`]
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub shop_domain: String,
    pub access_token: String,
    pub api_version: String,
    pub webhook_secret: String,
    pub supplier_base_url: String,
    pub supplier_app_id: String,
    pub supplier_secret_key: String,
    pub http_timeout: Duration,
    pub job_token: Option<String>,
    pub sync: SyncConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            shop_domain: String::new(),
            access_token: String::new(),
            api_version: "2024-10".to_string(),
            webhook_secret: String::new(),
            supplier_base_url: String::new(),
            supplier_app_id: String::new(),
            supplier_secret_key: String::new(),
            http_timeout: Duration::from_secs(20),
            job_token: None,
            sync: SyncConfig::default(),
        }
    }
}

fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            shop_domain: get("SHOPIFY_SHOP_DOMAIN").unwrap_or_default(),
            access_token: get("SHOPIFY_ACCESS_TOKEN").unwrap_or_default(),
            api_version: get("SHOPIFY_API_VERSION").unwrap_or(defaults.api_version),
            webhook_secret: get("SHOPIFY_WEBHOOK_SECRET").unwrap_or_default(),
            supplier_base_url: get("SUPPLIER_BASE_URL").unwrap_or_default(),
            supplier_app_id: get("SUPPLIER_APP_ID").unwrap_or_default(),
            supplier_secret_key: get("SUPPLIER_SECRET_KEY").unwrap_or_default(),
            http_timeout: get("HTTP_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            job_token: get("JOB_TOKEN"),
            sync: Self::sync_from(&get),
        }
    }

    /// Engine settings from `POD_MAX_ATTEMPTS`, `POD_RETRY_DELAY_SECS`,
    /// `POD_SEND_DELAY_SECS`, `POD_BRAND_NAME`, `POD_SHIPPING_METHOD`,
    /// `POD_SKU_ALLOW_LIST`, `POD_TRANSIENT_SIGNATURES`, `POD_DESIGN_PREFIX`,
    /// `POD_TRACKING_WINDOW_DAYS`, `POD_DEFAULT_CARRIER`, `POD_PAGE_SIZE` and
    /// `POD_WINDOW_DAYS`. Lists are comma-separated.
    fn sync_from(get: &dyn Fn(&str) -> Option<String>) -> SyncConfig {
        let defaults = SyncConfig::default();
        let number = |key: &str, default: u32| get(key).and_then(|v| v.parse().ok()).unwrap_or(default);
        let secs = |key: &str, default: Duration| {
            get(key)
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        SyncConfig {
            max_attempts: number("POD_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            retry_delay: secs("POD_RETRY_DELAY_SECS", defaults.retry_delay),
            send_delay: secs("POD_SEND_DELAY_SECS", defaults.send_delay),
            brand_name: get("POD_BRAND_NAME"),
            shipping_method: get("POD_SHIPPING_METHOD"),
            sku_allow_list: get("POD_SKU_ALLOW_LIST")
                .map(|raw| SkuAllowList::new(list(&raw)))
                .unwrap_or(defaults.sku_allow_list),
            transient_signatures: get("POD_TRANSIENT_SIGNATURES")
                .map(|raw| list(&raw))
                .unwrap_or(defaults.transient_signatures),
            design_prefix: get("POD_DESIGN_PREFIX").unwrap_or(defaults.design_prefix),
            tracking_window_days: number("POD_TRACKING_WINDOW_DAYS", defaults.tracking_window_days),
            default_carrier: get("POD_DEFAULT_CARRIER").unwrap_or(defaults.default_carrier),
            page_size: number("POD_PAGE_SIZE", defaults.page_size).max(1),
            window_days: number("POD_WINDOW_DAYS", defaults.window_days),
        }
    }

    /// Fails when a credential the server cannot run without is missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("SHOPIFY_SHOP_DOMAIN", &self.shop_domain),
            ("SHOPIFY_ACCESS_TOKEN", &self.access_token),
            ("SHOPIFY_WEBHOOK_SECRET", &self.webhook_secret),
            ("SUPPLIER_BASE_URL", &self.supplier_base_url),
            ("SUPPLIER_APP_ID", &self.supplier_app_id),
            ("SUPPLIER_SECRET_KEY", &self.supplier_secret_key),
        ];
        let missing: Vec<&'static str> = required
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| key)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError(missing))
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shopify(&self) -> ShopifyClientConfig {
        ShopifyClientConfig {
            shop_domain: self.shop_domain.clone(),
            access_token: self.access_token.clone(),
            api_version: self.api_version.clone(),
            timeout: self.http_timeout,
        }
    }

    pub fn supplier(&self) -> SupplierClientConfig {
        SupplierClientConfig {
            base_url: self.supplier_base_url.clone(),
            app_id: self.supplier_app_id.clone(),
            secret_key: self.supplier_secret_key.clone(),
            timeout: self.http_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.http_timeout, Duration::from_secs(20));
        assert_eq!(config.job_token, None);
        assert_eq!(config.sync.max_attempts, 3);
    }

    #[test]
    fn test_addr_formatting() {
        let config = load(&[("HOST", "127.0.0.1"), ("PORT", "8080")]);
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = load(&[("PORT", "http"), ("POD_MAX_ATTEMPTS", "lots"), ("POD_PAGE_SIZE", "0")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.sync.max_attempts, 3);
        assert_eq!(config.sync.page_size, 1);
    }

    #[test]
    fn test_sync_knobs() {
        let config = load(&[
            ("POD_RETRY_DELAY_SECS", "5"),
            ("POD_SKU_ALLOW_LIST", "TEE-1, MUG-2,,"),
            ("POD_TRANSIENT_SIGNATURES", "not valid, still rendering"),
            ("POD_BRAND_NAME", "Acme"),
            ("JOB_TOKEN", " s3cret "),
        ]);
        assert_eq!(config.sync.retry_delay, Duration::from_secs(5));
        assert!(config.sync.sku_allow_list.permits("MUG-2"));
        assert!(!config.sync.sku_allow_list.permits("HAT-3"));
        assert_eq!(config.sync.transient_signatures, vec!["not valid", "still rendering"]);
        assert_eq!(config.sync.brand_name.as_deref(), Some("Acme"));
        assert_eq!(config.job_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_validate_lists_missing() {
        let err = load(&[("SHOPIFY_SHOP_DOMAIN", "shop.myshopify.com")])
            .validate()
            .unwrap_err();
        assert!(!err.0.contains(&"SHOPIFY_SHOP_DOMAIN"));
        assert!(err.0.contains(&"SUPPLIER_SECRET_KEY"));
        assert_eq!(err.0.len(), 5);
    }
}
