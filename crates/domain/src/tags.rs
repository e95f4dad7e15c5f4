//! Normalized status tags and the storefront tag set.

use serde::{Deserialize, Serialize};

/// The closed vocabulary of status tags projected onto a storefront order.
///
/// At most one of these is present on an order at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PodTag {
    InProduction,
    Printing,
    Shipped,
    Delivered,
    CancelledAtSupplier,
    SupplierError,
    UnknownSku,
    Refunded,
    OnHold,
}

impl PodTag {
    /// Every member of the vocabulary.
    pub const ALL: [PodTag; 9] = [
        PodTag::InProduction,
        PodTag::Printing,
        PodTag::Shipped,
        PodTag::Delivered,
        PodTag::CancelledAtSupplier,
        PodTag::SupplierError,
        PodTag::UnknownSku,
        PodTag::Refunded,
        PodTag::OnHold,
    ];

    /// Returns the tag exactly as it appears on the storefront.
    pub fn as_str(&self) -> &'static str {
        match self {
            PodTag::InProduction => "in production",
            PodTag::Printing => "printing",
            PodTag::Shipped => "shipped",
            PodTag::Delivered => "delivered",
            PodTag::CancelledAtSupplier => "cancelled at supplier",
            PodTag::SupplierError => "supplier error",
            PodTag::UnknownSku => "unknown SKU",
            PodTag::Refunded => "refunded",
            PodTag::OnHold => "on hold",
        }
    }

    /// Recognizes a storefront tag. Membership is case-sensitive.
    pub fn from_tag(tag: &str) -> Option<PodTag> {
        PodTag::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl std::fmt::Display for PodTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed form of the storefront's comma-joined tag string.
///
/// Free-form tags keep their original order; status tags are held as enum
/// values so replacing the status is a set operation rather than string
/// surgery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    free: Vec<String>,
    pod: Vec<PodTag>,
}

impl TagSet {
    /// Parses the wire format: split on `,`, trim, drop empties, dedupe.
    pub fn parse(raw: &str) -> Self {
        let mut set = TagSet::default();
        for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            set.insert(tag);
        }
        set
    }

    /// Serializes back to the comma-joined wire format.
    pub fn to_wire(&self) -> String {
        self.free
            .iter()
            .map(String::as_str)
            .chain(self.pod.iter().map(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Adds a tag if it is not already present.
    pub fn insert(&mut self, tag: &str) {
        match PodTag::from_tag(tag) {
            Some(pod) if !self.pod.contains(&pod) => self.pod.push(pod),
            Some(_) => {}
            None if !self.free.iter().any(|t| t == tag) => self.free.push(tag.to_string()),
            None => {}
        }
    }

    /// Returns true if the exact tag is present.
    pub fn contains(&self, tag: &str) -> bool {
        match PodTag::from_tag(tag) {
            Some(pod) => self.pod.contains(&pod),
            None => self.free.iter().any(|t| t == tag),
        }
    }

    /// Returns the status tags currently present.
    ///
    /// Normally zero or one; orders tagged by hand may carry more until the
    /// next replacement.
    pub fn pod_tags(&self) -> &[PodTag] {
        &self.pod
    }

    /// Strips every status tag and adds `tag`.
    pub fn replace_pod_tag(&mut self, tag: PodTag) {
        self.pod.clear();
        self.pod.push(tag);
    }

    /// Strips every status tag.
    pub fn clear_pod_tags(&mut self) {
        self.pod.clear();
    }

    /// Returns the number of tags in the set.
    pub fn len(&self) -> usize {
        self.free.len() + self.pod.len()
    }

    /// Returns true if the set holds no tags.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire())
    }
}
