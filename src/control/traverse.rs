//! Depth-first scan of a control's governed region

use crate::dom::{Document, NodeId};
use crate::error::Result;

/// Whether to descend into a visited node's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Descend,
    Prune,
}

/// Visit every descendant of `node` depth-first, skipping pruned subtrees
pub fn traverse_children<F>(doc: &dyn Document, node: NodeId, visit: &mut F) -> Result<()>
where
    F: FnMut(NodeId) -> Result<Visit>,
{
    for child in doc.children(node) {
        if visit(child)? == Visit::Descend {
            traverse_children(doc, child, visit)?;
        }
    }
    Ok(())
}

/// Attribute names that end a control's region
#[derive(Debug, Clone, Copy)]
pub struct Boundaries<'a> {
    /// Marks a child control: recorded as an anchor, not descended into
    pub control_attribute: &'a str,
    /// Marks an independent load tree: not descended into, not an anchor
    pub load_attribute: &'a str,
}

/// Scan below `root`, calling `index` on every visited node; returns the anchors.
///
/// Per node, in order: rejected by `should_visit` → prune without indexing;
/// index it; control attribute → anchor + prune; load attribute → prune;
/// otherwise descend.
pub fn collect_anchors(
    doc: &dyn Document,
    root: NodeId,
    bounds: Boundaries<'_>,
    should_visit: impl Fn(NodeId) -> bool,
    mut index: impl FnMut(NodeId) -> Result<()>,
) -> Result<Vec<NodeId>> {
    let mut anchors = Vec::new();
    traverse_children(doc, root, &mut |item| {
        if !should_visit(item) {
            return Ok(Visit::Prune);
        }
        index(item)?;
        if doc.has_attribute(item, bounds.control_attribute) {
            anchors.push(item);
            Ok(Visit::Prune)
        } else if doc.has_attribute(item, bounds.load_attribute) {
            Ok(Visit::Prune)
        } else {
            Ok(Visit::Descend)
        }
    })?;
    Ok(anchors)
}
