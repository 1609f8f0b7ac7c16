//! Per-viewer filtering of reconstructed entries.

use rmaudit_core::model::{PROP_HOLD_NAME, PROP_HOLD_NODEREF};
use rmaudit_core::{Actor, NodeRef, PropertyMap, PropertyValue};
use rmaudit_repo::Repository;

use crate::error::TrailError;

/// Capability required to see audit entries of file plan components.
pub const ACCESS_AUDIT_CAPABILITY: &str = "AccessAudit";

/// Whether `viewer` may see entries about `node`. Anything short of an
/// explicit grant hides the entry.
pub async fn can_view_node(
    repo: &Repository,
    viewer: &Actor,
    node: &NodeRef,
) -> Result<bool, TrailError> {
    if repo.file_plans.is_file_plan_component(node).await?
        && !repo
            .capabilities
            .capability_access_state(viewer, node, ACCESS_AUDIT_CAPABILITY)
            .await?
            .is_allowed()
    {
        return Ok(false);
    }
    Ok(repo
        .permissions
        .has_read_permission(viewer, node)
        .await?
        .is_allowed())
}

fn hold_ref(properties: &PropertyMap) -> Option<NodeRef> {
    match properties.get(&PROP_HOLD_NODEREF)? {
        PropertyValue::NodeRef(node) => Some(node.clone()),
        PropertyValue::Text(text) => text.parse().ok(),
        _ => None,
    }
}

/// Replace the hold name with `placeholder` when `viewer` cannot read the
/// referenced hold.
pub async fn redact_hold_name(
    repo: &Repository,
    viewer: &Actor,
    placeholder: &str,
    properties: &mut PropertyMap,
) -> Result<(), TrailError> {
    let Some(hold) = hold_ref(properties) else {
        return Ok(());
    };
    if !repo
        .permissions
        .has_read_permission(viewer, &hold)
        .await?
        .is_allowed()
        && let Some(name) = properties.get_mut(&PROP_HOLD_NAME)
    {
        *name = PropertyValue::text(placeholder);
    }
    Ok(())
}

/// Remove raw hold references, which are never shown.
pub fn strip_hold_refs(properties: &mut PropertyMap) {
    properties.remove(&PROP_HOLD_NODEREF);
}
