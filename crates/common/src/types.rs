use serde::{Deserialize, Deserializer, Serialize};

/// Prefix that marks a correlation id as pointing back at a storefront order.
pub const CORRELATION_PREFIX: &str = "shopify:";

/// Platform-assigned identifier of a storefront order.
///
/// The storefront hands these out as unsigned integers; wrapping them keeps
/// them from being confused with supplier-side ids or line item ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorefrontOrderId(u64);

impl StorefrontOrderId {
    /// Wraps a raw storefront order id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StorefrontOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StorefrontOrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for StorefrontOrderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Supplier-assigned order identifier.
///
/// The supplier API is inconsistent about whether ids are numbers or strings,
/// so deserialization accepts both and normalizes to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SupplierOrderId(String);

impl SupplierOrderId {
    /// Creates a supplier order id from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SupplierOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SupplierOrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SupplierOrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for SupplierOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for SupplierOrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// Caller-supplied join key embedded in a supplier order.
///
/// Orders created by this system always carry `shopify:<storefront id>`;
/// anything else (manual orders, other channels) is kept verbatim but does
/// not resolve to a storefront order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Builds the correlation id for a storefront order.
    pub fn for_order(order_id: StorefrontOrderId) -> Self {
        Self(format!("{CORRELATION_PREFIX}{order_id}"))
    }

    /// Wraps an arbitrary correlation string as received from the supplier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw correlation string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolves the storefront order this correlation id points at.
    ///
    /// Returns `None` unless the value is exactly the prefix followed by a
    /// decimal id.
    pub fn storefront_order_id(&self) -> Option<StorefrontOrderId> {
        let digits = self.0.trim().strip_prefix(CORRELATION_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(StorefrontOrderId)
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StorefrontOrderId> for CorrelationId {
    fn from(id: StorefrontOrderId) -> Self {
        Self::for_order(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_id_round_trips_storefront_id() {
        let id = StorefrontOrderId::new(9001);
        let correlation = CorrelationId::for_order(id);
        assert_eq!(correlation.as_str(), "shopify:9001");
        assert_eq!(correlation.storefront_order_id(), Some(id));
    }

    #[test]
    fn correlation_id_rejects_foreign_forms() {
        for raw in ["", "shopify:", "shopify:abc", "etsy:12", "9001", "shopify:12x", "shopify:-1"] {
            assert_eq!(CorrelationId::new(raw).storefront_order_id(), None, "{raw}");
        }
    }

    #[test]
    fn supplier_order_id_accepts_number_or_string() {
        let from_number: SupplierOrderId = serde_json::from_str("12345").unwrap();
        let from_text: SupplierOrderId = serde_json::from_str("\"12345\"").unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(from_number.as_str(), "12345");
    }

    #[test]
    fn storefront_order_id_parses_trimmed_input() {
        let id: StorefrontOrderId = " 42 ".parse().unwrap();
        assert_eq!(id.as_u64(), 42);
        assert!("forty-two".parse::<StorefrontOrderId>().is_err());
    }
}
