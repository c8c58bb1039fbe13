//! Node → control binding registry
//!
//! Keyed by [`NodeId`] handles, so an entry never keeps a node alive.
//! Entries for destroyed nodes are pruned on lookup or via `retain_live`.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use crate::control::Control;
use crate::dom::{Document, NodeId};

pub type Bindings = FxHashMap<NodeId, Arc<Control>>;

/// At most one control per node; all mutation under one mutex
#[derive(Default)]
pub struct BindingRegistry {
    bindings: Mutex<Bindings>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<Arc<Control>> {
        self.bindings.lock().get(&node).cloned()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.bindings.lock().contains_key(&node)
    }

    /// Bind `control` to `node`; hands back the existing control on conflict
    pub fn attach(&self, node: NodeId, control: Arc<Control>) -> Result<(), Arc<Control>> {
        let mut bindings = self.bindings.lock();
        if let Some(existing) = bindings.get(&node) {
            return Err(Arc::clone(existing));
        }
        bindings.insert(node, control);
        Ok(())
    }

    pub fn detach(&self, node: NodeId) -> Option<Arc<Control>> {
        self.bindings.lock().remove(&node)
    }

    /// Hold the registry for a compound operation (rebinding)
    pub fn lock(&self) -> MutexGuard<'_, Bindings> {
        self.bindings.lock()
    }

    /// Drop entries whose node is gone; returns how many were dropped
    pub fn retain_live(&self, doc: &dyn Document) -> usize {
        let mut bindings = self.bindings.lock();
        let before = bindings.len();
        bindings.retain(|&node, _| doc.is_live(node));
        before - bindings.len()
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.bindings.lock().keys().copied().collect();
        nodes.sort();
        nodes
    }

    pub fn len(&self) -> usize {
        self.bindings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("nodes", &self.nodes())
            .finish()
    }
}
