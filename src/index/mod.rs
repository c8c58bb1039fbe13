//! Index definitions and per-control index tables
//!
//! An index maps a logical key to a descendant node. Membership and keys
//! come from pluggable [`IndexDefinition`] rules; the built-in `names`
//! index is keyed by the naming attribute.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::dom::{Document, NodeId};
use crate::error::{LoadError, Result};

/// Name of the built-in index
pub const NAMES_INDEX: &str = "names";

/// One definition per naming attribute, shared by every control
static DEFINITION_CACHE: Lazy<DashMap<String, Arc<AttributeIndexDefinition>>> =
    Lazy::new(DashMap::new);

/// Matching rule for a named index.
///
/// Both methods fail with `NotImplemented` unless overridden.
pub trait IndexDefinition: Send + Sync + std::fmt::Debug {
    fn matches(&self, _doc: &dyn Document, _node: NodeId) -> Result<bool> {
        Err(LoadError::NotImplemented { operation: "match" })
    }

    fn id(&self, _doc: &dyn Document, _node: NodeId) -> Result<String> {
        Err(LoadError::NotImplemented { operation: "id" })
    }
}

/// Index by presence of an attribute, keyed by its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeIndexDefinition {
    attribute_name: String,
}

impl AttributeIndexDefinition {
    pub fn new(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
        }
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }
}

impl IndexDefinition for AttributeIndexDefinition {
    fn matches(&self, doc: &dyn Document, node: NodeId) -> Result<bool> {
        Ok(doc.has_attribute(node, &self.attribute_name))
    }

    fn id(&self, doc: &dyn Document, node: NodeId) -> Result<String> {
        Ok(doc.attribute(node, &self.attribute_name).unwrap_or_default())
    }
}

/// index-name → rule
pub type IndexDefinitions = BTreeMap<String, Arc<dyn IndexDefinition>>;

/// `{"names": AttributeIndexDefinition(name_attribute)}`
pub fn default_index_definitions(name_attribute: &str) -> IndexDefinitions {
    let definition = DEFINITION_CACHE
        .entry(name_attribute.to_string())
        .or_insert_with(|| Arc::new(AttributeIndexDefinition::new(name_attribute)))
        .clone();
    let mut definitions = IndexDefinitions::new();
    definitions.insert(NAMES_INDEX.to_string(), definition as Arc<dyn IndexDefinition>);
    definitions
}

/// index-name → (key → node), owned by one control
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexTable {
    indexes: BTreeMap<String, FxHashMap<String, NodeId>>,
}

impl IndexTable {
    /// One empty index per definition
    pub fn for_definitions(definitions: &IndexDefinitions) -> Self {
        Self {
            indexes: definitions
                .keys()
                .map(|name| (name.clone(), FxHashMap::default()))
                .collect(),
        }
    }

    /// Offer `node` to every definition; a node may land in several indexes
    pub fn update(
        &mut self,
        definitions: &IndexDefinitions,
        doc: &dyn Document,
        node: NodeId,
    ) -> Result<()> {
        for (name, definition) in definitions {
            let index = self.indexes.entry(name.clone()).or_default();
            if definition.matches(doc, node)? {
                index.insert(definition.id(doc, node)?, node);
            }
        }
        Ok(())
    }

    pub fn get(&self, index: &str, key: &str) -> Option<NodeId> {
        self.indexes.get(index).and_then(|i| i.get(key)).copied()
    }

    pub fn index(&self, name: &str) -> Option<&FxHashMap<String, NodeId>> {
        self.indexes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(String::as_str)
    }

    /// Point every entry referencing `old` at `new`; returns the rewrite count
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> usize {
        let mut replaced = 0;
        for index in self.indexes.values_mut() {
            for node in index.values_mut() {
                if *node == old {
                    *node = new;
                    replaced += 1;
                }
            }
        }
        replaced
    }

    /// Total entries across all indexes
    pub fn len(&self) -> usize {
        self.indexes.values().map(|i| i.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
