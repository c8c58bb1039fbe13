//! Control lifecycle states

use serde::{Deserialize, Serialize};

/// `Constructing → Initializing → Rendering → LoadingChildren → Binding → Ready`,
/// with `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleState {
    Constructing,
    Initializing,
    Rendering,
    LoadingChildren,
    Binding,
    Ready,
    Failed { reason: String },
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constructing => "constructing",
            Self::Initializing => "initializing",
            Self::Rendering => "rendering",
            Self::LoadingChildren => "loading_children",
            Self::Binding => "binding",
            Self::Ready => "ready",
            Self::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
