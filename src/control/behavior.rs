//! User-overridable control hooks

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use super::Control;
use crate::dom::NodeId;
use crate::index::{default_index_definitions, IndexDefinitions};
use crate::options::OptionMap;

/// Behavior attached to a control.
///
/// Every hook is optional. The async hooks run strictly in order
/// `initialize → render → (child controls) → on`; an error from any of them
/// fails the control with that error.
#[async_trait]
pub trait Behavior: Any + Send + Sync {
    async fn initialize(&self, _control: &Arc<Control>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn render(&self, _control: &Arc<Control>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Wire events/behavior once children are loaded
    async fn on(&self, _control: &Arc<Control>) -> anyhow::Result<()> {
        Ok(())
    }

    /// False skips child discovery entirely
    fn can_have_children(&self) -> bool {
        true
    }

    /// False prunes `node` (and its subtree) from the control's scan
    fn should_visit_element(&self, _control: &Control, _node: NodeId) -> bool {
        true
    }

    /// Option values for the child anchored at `anchor` (the parent link is added for you)
    fn child_options(&self, _control: &Control, _anchor: NodeId) -> OptionMap {
        OptionMap::new()
    }

    /// Naming attribute override; the loader's configured one when `None`
    fn name_attribute(&self) -> Option<&str> {
        None
    }

    fn index_definitions(&self, name_attribute: &str) -> IndexDefinitions {
        default_index_definitions(name_attribute)
    }
}

/// Behavior with every hook at its default
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainControl;

impl Behavior for PlainControl {}
