//! nodebind - binds async behaviors ("controls") to document tree nodes
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  dom/       Document trait, NodeId, MemoryDocument, Selector │
//! │  options/   Naming-convention attributes → option maps       │
//! │  index/     IndexDefinition rules, per-control IndexTable    │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  loader/    Loader trait, ControlLoader, BindingRegistry     │
//! │  control/   Control lifecycle, Behavior hooks, traversal     │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  event/     Lifecycle event log                              │
//! │  logging    tracing-subscriber setup                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use nodebind::{ControlClass, ControlLoader, Document, Loader, MemoryDocument, Module, ModuleMap, PlainControl};
//!
//! # async fn demo() -> nodebind::Result<()> {
//! let doc = Arc::new(MemoryDocument::new());
//! let app = doc.append(doc.body(), "div", &[("id", "app"), ("data-app", "app#Main")]);
//! doc.append(app, "button", &[("data-control", "button")]);
//!
//! let modules = ModuleMap::new()
//!     .with(Module::new("app").with_export("Main", ControlClass::of::<PlainControl>("Main")))
//!     .with(Module::new("button").with_default(ControlClass::of::<PlainControl>("Button")));
//!
//! let loader = ControlLoader::new(doc, Arc::new(modules));
//! loader.clone().load("#app".into()).await?;
//! # Ok(())
//! # }
//! ```

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL
// ═══════════════════════════════════════════════════════════════
pub mod dom;
pub mod index;
pub mod options;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER
// ═══════════════════════════════════════════════════════════════
pub mod control;
pub mod loader;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER
// ═══════════════════════════════════════════════════════════════
pub mod event;
pub mod logging;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

pub use config::LoaderConfig;
pub use control::{Behavior, Control, LifecycleState, PlainControl};
pub use dom::{Document, MemoryDocument, NodeId, Selector};
pub use error::{FixSuggestion, LoadError, Result};
pub use event::{Event, EventKind, EventLog};
pub use index::{
    default_index_definitions, AttributeIndexDefinition, IndexDefinition, IndexDefinitions,
    IndexTable, NAMES_INDEX,
};
pub use loader::{
    AliasResolver, BindingRegistry, ControlClass, ControlLoader, ControlLoaderBuilder,
    IdentityResolver, LoadRoot, Loader, Module, ModuleImporter, ModuleMap, Resolve, UrlInfo,
    VisitedSet,
};
pub use options::{camel_case, extract_element_options, ControlOptions, OptionMap};
