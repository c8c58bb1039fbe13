//! In-memory document arena

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{Document, NodeId};

#[derive(Debug)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Arena {
    nodes: FxHashMap<NodeId, NodeData>,
    next_id: u64,
}

impl Arena {
    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            NodeData {
                tag: tag.to_string(),
                attributes: Vec::new(),
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get_mut(&node).and_then(|n| n.parent.take());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|&c| c != node);
        }
    }
}

/// Thread-safe in-memory tree with a `body` root
#[derive(Debug)]
pub struct MemoryDocument {
    arena: RwLock<Arena>,
    body: NodeId,
}

impl MemoryDocument {
    pub fn new() -> Self {
        let mut arena = Arena::default();
        let body = arena.alloc("body");
        Self {
            arena: RwLock::new(arena),
            body,
        }
    }

    /// Create a detached element
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.arena.write().alloc(tag)
    }

    /// Move `child` under `parent` as its last child
    ///
    /// Returns false when either node is dead or `child` is an ancestor of `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut arena = self.arena.write();
        if !arena.nodes.contains_key(&parent) || !arena.nodes.contains_key(&child) {
            return false;
        }
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return false;
            }
            cursor = arena.nodes.get(&node).and_then(|n| n.parent);
        }
        arena.detach(child);
        if let Some(data) = arena.nodes.get_mut(&child) {
            data.parent = Some(parent);
        }
        if let Some(data) = arena.nodes.get_mut(&parent) {
            data.children.push(child);
        }
        true
    }

    /// Create an element with attributes and append it to `parent`
    pub fn append(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(node, name, value);
        }
        self.append_child(parent, node);
        node
    }

    /// Destroy `node` and its subtree, returning every destroyed id
    pub fn remove(&self, node: NodeId) -> Vec<NodeId> {
        let mut arena = self.arena.write();
        if node == self.body || !arena.nodes.contains_key(&node) {
            return Vec::new();
        }
        arena.detach(node);
        let mut removed = Vec::new();
        let mut stack = vec![node];
        while let Some(next) = stack.pop() {
            if let Some(data) = arena.nodes.remove(&next) {
                stack.extend(data.children);
                removed.push(next);
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.arena.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn body(&self) -> NodeId {
        self.body
    }

    fn is_live(&self, node: NodeId) -> bool {
        self.arena.read().nodes.contains_key(&node)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.arena.read().nodes.get(&node).map(|n| n.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.arena.read().nodes.get(&node).and_then(|n| {
            n.attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.arena
            .read()
            .nodes
            .get(&node)
            .map(|n| n.attributes.clone())
            .unwrap_or_default()
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut arena = self.arena.write();
        let Some(data) = arena.nodes.get_mut(&node) else {
            return;
        };
        match data.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => data.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        if let Some(data) = self.arena.write().nodes.get_mut(&node) {
            data.attributes.retain(|(k, _)| k != name);
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.read().nodes.get(&node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.arena
            .read()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }
}
