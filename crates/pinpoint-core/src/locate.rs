//! Element locator.
//!
//! Resolves a screen coordinate to a [`TargetedElement`], walking the
//! host's component ownership chain for a name and source tag.

use crate::element::{
    filter_marker, summarize_child, truncate_text, SourceLocation, TargetedElement,
};
use crate::host::{HostAdapter, NodeId};

/// Resolve the topmost element under `(x, y)`.
///
/// Returns `None` when the point lands on our own floating label or
/// overlay chrome, so the UI never selects itself. Pure query, safe to
/// call at pointer-move frequency.
pub fn locate(host: &dyn HostAdapter, x: f64, y: f64) -> Option<TargetedElement> {
    let node = host.node_at(x, y)?;
    if host.is_selection_label(node) || host.is_overlay_chrome(node) {
        return None;
    }
    describe_target(host, node)
}

/// Build a full target snapshot for a known node.
pub fn describe_target(host: &dyn HostAdapter, node: NodeId) -> Option<TargetedElement> {
    let desc = host.describe(node)?;

    let mut component_name = desc.tag_name.clone();
    let mut source_location = None;
    for link in host.owner_chain(node) {
        if let Some(name) = link.name {
            component_name = name;
        }
        if let Some(tag) = link.source_location {
            // Nearest attached source tag wins; stop the walk there.
            source_location = Some(SourceLocation::parse(&tag));
            break;
        }
    }

    let child_summaries = desc
        .child_texts
        .iter()
        .map(|t| summarize_child(t))
        .filter(|s| !s.is_empty())
        .collect();

    Some(TargetedElement {
        node,
        component_name,
        source_location,
        tag_name: desc.tag_name,
        class_names: filter_marker(&desc.class_names),
        element_id: desc.element_id,
        truncated_text: truncate_text(&desc.text_content),
        child_count: desc.child_texts.len(),
        child_summaries,
    })
}

/// Cheap snapshot used for instant highlight feedback: tag-level fields
/// only, no ownership walk. The debounced refresh upgrades it.
pub fn shallow_target(host: &dyn HostAdapter, node: NodeId) -> Option<TargetedElement> {
    let desc = host.describe(node)?;
    Some(TargetedElement {
        node,
        component_name: desc.tag_name.clone(),
        source_location: None,
        tag_name: desc.tag_name,
        class_names: filter_marker(&desc.class_names),
        element_id: desc.element_id,
        truncated_text: truncate_text(&desc.text_content),
        child_count: desc.child_texts.len(),
        child_summaries: Vec::new(),
    })
}
