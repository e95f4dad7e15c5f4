//! Storefront order model.
//!
//! Mirrors the subset of the storefront's order resource this system reads.
//! The storefront owns these records; only tags, the note and `pod`
//! metafields are ever written back.

use common::StorefrontOrderId;
use serde::{Deserialize, Serialize};

use crate::serde_util::{null_as_default, opt_string_or_number, string_or_number};
use crate::tags::TagSet;
use crate::value_objects::Money;

/// A storefront order as delivered by webhooks and the admin API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontOrder {
    pub id: StorefrontOrderId,

    /// Human-facing order name, e.g. `#1001`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub line_items: Vec<LineItem>,

    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,

    /// Comma-joined tag string, exactly as the storefront stores it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: String,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub fulfillments: Vec<Fulfillment>,
}

impl StorefrontOrder {
    /// Creates an order with no items, tags or address.
    pub fn new(id: StorefrontOrderId) -> Self {
        Self {
            id,
            name: String::new(),
            email: None,
            line_items: Vec::new(),
            shipping_address: None,
            tags: String::new(),
            note: None,
            fulfillments: Vec::new(),
        }
    }

    /// Adds a line item (builder style, mostly for fixtures).
    pub fn with_line_item(mut self, item: LineItem) -> Self {
        self.line_items.push(item);
        self
    }

    /// Sets the shipping address (builder style).
    pub fn with_shipping_address(mut self, address: ShippingAddress) -> Self {
        self.shipping_address = Some(address);
        self
    }

    /// Sets the raw tag string (builder style).
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Parses the tag string.
    pub fn tag_set(&self) -> TagSet {
        TagSet::parse(&self.tags)
    }

    /// Returns true if any existing fulfillment already carries `tracking_number`.
    pub fn has_fulfillment_with_tracking(&self, tracking_number: &str) -> bool {
        self.fulfillments
            .iter()
            .any(|f| f.tracking_numbers().any(|t| t == tracking_number))
    }
}

/// A single line of a storefront order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub id: u64,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub sku: Option<String>,

    pub quantity: u32,

    /// Quantity not yet covered by a fulfillment; absent on some payloads.
    #[serde(default)]
    pub fulfillable_quantity: Option<u32>,

    #[serde(default)]
    pub price: Money,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default)]
    pub variant_title: Option<String>,

    /// Free-form properties; design-asset references travel here.
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Vec<LineItemProperty>,
}

impl LineItem {
    /// Creates a line item with a SKU, quantity and unit price.
    pub fn new(id: u64, sku: impl Into<String>, quantity: u32, price: Money) -> Self {
        Self {
            id,
            sku: Some(sku.into()),
            quantity,
            fulfillable_quantity: None,
            price,
            title: String::new(),
            variant_title: None,
            properties: Vec::new(),
        }
    }

    /// Adds a free-form property (builder style).
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(LineItemProperty {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Sets the title (builder style).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Returns the trimmed SKU, treating blank as missing.
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Quantity still open for fulfillment.
    pub fn open_quantity(&self) -> u32 {
        self.fulfillable_quantity.unwrap_or(self.quantity)
    }
}

/// A `name`/`value` pair attached to a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemProperty {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
}

/// Storefront shipping address. Every component is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// An existing fulfillment record on a storefront order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tracking_numbers: Vec<String>,
    #[serde(default)]
    pub tracking_company: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub line_items: Vec<FulfilledLine>,
}

impl Fulfillment {
    /// Iterates every tracking number recorded on this fulfillment.
    pub fn tracking_numbers(&self) -> impl Iterator<Item = &str> {
        self.tracking_number
            .iter()
            .chain(self.tracking_numbers.iter())
            .map(String::as_str)
    }
}

/// A line item quantity covered by a fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfilledLine {
    pub id: u64,
    pub quantity: u32,
}
