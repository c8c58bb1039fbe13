//! Document tree primitive
//!
//! The hosting tree is supplied by the environment. The loader only needs
//! node identity, attribute access and child enumeration, so [`Document`] is
//! kept to exactly that surface. [`MemoryDocument`] is the bundled
//! implementation used by tests and headless hosts.

mod memory;
mod selector;

pub use memory::MemoryDocument;
pub use selector::Selector;

use serde::{Deserialize, Serialize};

/// Stable handle of a tree node (never reused by a document)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Environment-supplied tree of addressable elements.
///
/// Implementations must be safe to share across the tasks that load
/// controls concurrently.
pub trait Document: Send + Sync {
    /// Fixed root that selector-based loads search under
    fn body(&self) -> NodeId;

    /// False once the node has been destroyed
    fn is_live(&self, node: NodeId) -> bool;

    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// All attributes in document order
    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;

    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&self, node: NodeId, name: &str);

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Element children in order
    fn children(&self, node: NodeId) -> Vec<NodeId>;
}

/// Upper-cased tag name, or `?` for a dead node
pub fn tag_of(doc: &dyn Document, node: NodeId) -> String {
    doc.tag_name(node)
        .map(|t| t.to_ascii_uppercase())
        .unwrap_or_else(|| "?".to_string())
}

/// Descendants of `root` in pre-order, `root` excluded
pub fn descendants(doc: &dyn Document, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(root).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(doc.children(node).into_iter().rev());
    }
    out
}

/// Descendants of `root` matching `selector`, in pre-order
pub fn query_selector_all(doc: &dyn Document, root: NodeId, selector: &Selector) -> Vec<NodeId> {
    descendants(doc, root)
        .into_iter()
        .filter(|&node| selector.matches(doc, node))
        .collect()
}
