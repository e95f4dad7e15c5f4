//! Webhook authentication and payload parsing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::StorefrontOrderId;
use domain::StorefrontOrder;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `base64(HMAC-SHA256(secret, raw body))`.
pub const SIGNATURE_HEADER: &str = "x-shopify-hmac-sha256";

/// Header carrying the event topic.
pub const TOPIC_HEADER: &str = "x-shopify-topic";

pub const TOPIC_ORDERS_PAID: &str = "orders/paid";
pub const TOPIC_ORDERS_CANCELLED: &str = "orders/cancelled";

const DIGEST_LEN: usize = 32;

/// Errors raised at the webhook boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// Missing, undecodable or mismatching signature.
    #[error("Webhook signature invalid")]
    SignatureInvalid,

    /// The body is not the expected order payload.
    #[error("Malformed webhook body: {0}")]
    MalformedBody(String),
}

/// Verifies webhook signatures with the shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier").finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self, body: &[u8]) -> HmacSha256 {
        // HMAC accepts keys of any length.
        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA256 accepts any key length"),
        };
        mac.update(body);
        mac
    }

    /// Computes the header value for `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        STANDARD.encode(self.mac(body).finalize().into_bytes())
    }

    /// Checks `signature` against the raw body in constant time.
    ///
    /// A missing header or a digest of the wrong length is rejected without
    /// comparing.
    pub fn verify(&self, signature: Option<&str>, body: &[u8]) -> Result<(), WebhookError> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::SignatureInvalid)?;
        let provided = STANDARD
            .decode(signature)
            .map_err(|_| WebhookError::SignatureInvalid)?;
        if provided.len() != DIGEST_LEN {
            return Err(WebhookError::SignatureInvalid);
        }
        self.mac(body)
            .verify_slice(&provided)
            .map_err(|_| WebhookError::SignatureInvalid)
    }
}

#[derive(Deserialize)]
struct OrderRef {
    id: StorefrontOrderId,
}

/// Parses an `orders/paid` body.
pub fn parse_order(body: &[u8]) -> Result<StorefrontOrder, WebhookError> {
    serde_json::from_slice(body).map_err(|e| WebhookError::MalformedBody(e.to_string()))
}

/// Parses the order id out of an `orders/cancelled` body.
pub fn parse_order_id(body: &[u8]) -> Result<StorefrontOrderId, WebhookError> {
    serde_json::from_slice::<OrderRef>(body)
        .map(|r| r.id)
        .map_err(|e| WebhookError::MalformedBody(e.to_string()))
}
