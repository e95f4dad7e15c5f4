//! Tag and note writes shared by the engines.

use common::StorefrontOrderId;
use domain::PodTag;
use platforms::{NOTE_PREFIX, StorefrontError, StorefrontOrders};

/// Replaces the order's status tag with `tag`.
///
/// Returns false when the tag set already held exactly that status, in which
/// case nothing is written.
pub(crate) async fn replace_pod_tag<S: StorefrontOrders>(
    storefront: &S,
    id: StorefrontOrderId,
    tag: PodTag,
) -> Result<bool, StorefrontError> {
    let order = storefront.get_order(id).await?;
    let mut tags = order.tag_set();
    if tags.pod_tags() == [tag] {
        return Ok(false);
    }
    tags.replace_pod_tag(tag);
    storefront.set_tags(id, &tags.to_wire()).await?;
    Ok(true)
}

/// Best-effort status tag write; failures are logged.
pub(crate) async fn tag<S: StorefrontOrders>(storefront: &S, id: StorefrontOrderId, tag: PodTag) {
    if let Err(e) = replace_pod_tag(storefront, id, tag).await {
        tracing::warn!(order_id = %id, %tag, error = %e, "failed to tag order");
    }
}

/// Best-effort note append; failures are logged.
pub(crate) async fn note<S: StorefrontOrders>(storefront: &S, id: StorefrontOrderId, text: &str) {
    let line = format!("{NOTE_PREFIX}{text}");
    if let Err(e) = storefront.append_note(id, &line).await {
        tracing::warn!(order_id = %id, error = %e, note = %line, "failed to append note");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::StorefrontOrder;
    use platforms::InMemoryStorefront;

    #[tokio::test]
    async fn test_replace_strips_previous_status() {
        let storefront = InMemoryStorefront::new();
        let id = StorefrontOrderId::new(1);
        storefront
            .insert_order(StorefrontOrder::new(id).with_tags("vip, printing"))
            .await;

        assert!(replace_pod_tag(&storefront, id, PodTag::Shipped).await.unwrap());
        assert!(!replace_pod_tag(&storefront, id, PodTag::Shipped).await.unwrap());
        assert_eq!(storefront.order(id).await.unwrap().tags, "vip, shipped");
    }

    #[tokio::test]
    async fn test_note_is_prefixed_and_failure_is_swallowed() {
        let storefront = InMemoryStorefront::new();
        let id = StorefrontOrderId::new(2);
        storefront.insert_order(StorefrontOrder::new(id)).await;

        note(&storefront, id, "hello").await;
        storefront.set_fail_notes(true).await;
        note(&storefront, id, "lost").await;

        assert_eq!(
            storefront.order(id).await.unwrap().note.as_deref(),
            Some("[POD] hello")
        );
    }
}
