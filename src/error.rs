// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Loader Error Types with Error Codes
//!
//! Error code ranges:
//! - BIND-000-009: Binding registry errors
//! - BIND-010-019: Module resolution errors
//! - BIND-020-029: Root/selector errors
//! - BIND-030-039: Control lifecycle errors
//! - BIND-040-049: Contract errors
//! - BIND-050-059: Task/aggregation errors
//! - BIND-060-069: Configuration errors

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoadError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

fn format_aggregate(errors: &[LoadError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// All error variants are part of the public API.
#[derive(Error, Debug, Diagnostic)]
pub enum LoadError {
    // ═══════════════════════════════════════════
    // BINDING ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[BIND-001] Invalid element data. Control already bound: {tag}[{url}]")]
    #[diagnostic(
        code(nodebind::binding_conflict),
        help("A node hosts at most one control; move or detach the existing one first")
    )]
    BindingConflict { tag: String, url: String },

    // ═══════════════════════════════════════════
    // MODULE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[BIND-010] Failed to import module \"{url}\": {source}")]
    #[diagnostic(
        code(nodebind::module_import),
        help("Check the identifier and the resolver aliases")
    )]
    ModuleImport {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("[BIND-011] Module does not contain valid class export. URL: \"{resource}\". Class not found: \"{export}\"")]
    #[diagnostic(
        code(nodebind::export_not_found),
        help("Export the class under that name, or drop the '#name' suffix to use the default export")
    )]
    ExportNotFound { resource: String, export: String },

    #[error("[BIND-012] Node {tag} has no '{attribute}' attribute to load from")]
    #[diagnostic(code(nodebind::missing_load_attribute))]
    MissingLoadAttribute { tag: String, attribute: String },

    // ═══════════════════════════════════════════
    // ROOT ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[BIND-020] Root not found: {selector}")]
    #[diagnostic(
        code(nodebind::root_not_found),
        help("The selector must match at least one node under the document body")
    )]
    RootNotFound { selector: String },

    #[error("[BIND-021] Invalid selector '{selector}': {reason}")]
    #[diagnostic(
        code(nodebind::invalid_selector),
        help("Use tag, #id, .class, [attr] or [attr=value], separated by commas")
    )]
    InvalidSelector { selector: String, reason: String },

    // ═══════════════════════════════════════════
    // LIFECYCLE ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[BIND-030] Child control \"{url}\" failed: {cause}")]
    #[diagnostic(code(nodebind::child_load))]
    ChildLoad {
        url: String,
        #[source]
        cause: Box<LoadError>,
    },

    /// A lifecycle hook failed; shown exactly as the hook reported it.
    #[error(transparent)]
    Hook(anyhow::Error),

    // ═══════════════════════════════════════════
    // CONTRACT ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[BIND-040] Not implemented: {operation}")]
    #[diagnostic(
        code(nodebind::not_implemented),
        help("Implement both `matches` and `id` on custom index definitions")
    )]
    NotImplemented { operation: &'static str },

    #[error("[BIND-041] Control loader was dropped while controls were still running")]
    #[diagnostic(code(nodebind::loader_dropped))]
    LoaderDropped,

    // ═══════════════════════════════════════════
    // TASK ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[BIND-050] Load task panicked: {reason}")]
    #[diagnostic(code(nodebind::task_panicked))]
    TaskPanicked { reason: String },

    #[error("[BIND-051] {} loads failed: {}", .errors.len(), format_aggregate(.errors))]
    #[diagnostic(code(nodebind::aggregate))]
    Aggregate {
        #[related]
        errors: Vec<LoadError>,
    },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (060-069)
    // ═══════════════════════════════════════════
    #[error("[BIND-060] Configuration error: {reason}")]
    #[diagnostic(code(nodebind::config))]
    Config { reason: String },
}

impl LoadError {
    /// Stable error code, e.g. `BIND-001`
    pub fn code(&self) -> &'static str {
        match self {
            Self::BindingConflict { .. } => "BIND-001",
            Self::ModuleImport { .. } => "BIND-010",
            Self::ExportNotFound { .. } => "BIND-011",
            Self::MissingLoadAttribute { .. } => "BIND-012",
            Self::RootNotFound { .. } => "BIND-020",
            Self::InvalidSelector { .. } => "BIND-021",
            Self::ChildLoad { .. } => "BIND-030",
            Self::Hook(_) => "BIND-031",
            Self::NotImplemented { .. } => "BIND-040",
            Self::LoaderDropped => "BIND-041",
            Self::TaskPanicked { .. } => "BIND-050",
            Self::Aggregate { .. } => "BIND-051",
            Self::Config { .. } => "BIND-060",
        }
    }

    pub(crate) fn from_join(err: tokio::task::JoinError) -> Self {
        Self::TaskPanicked {
            reason: err.to_string(),
        }
    }

    /// Fold the failures of a join into one result.
    ///
    /// No failure is `Ok`, a single failure is returned as-is, anything more
    /// becomes `Aggregate` (nested aggregates are flattened).
    pub fn collect(errors: Vec<LoadError>) -> Result<()> {
        let mut flat = Vec::with_capacity(errors.len());
        for err in errors {
            match err {
                LoadError::Aggregate { errors } => flat.extend(errors),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Ok(()),
            1 => Err(flat.remove(0)),
            _ => Err(LoadError::Aggregate { errors: flat }),
        }
    }

    /// Walk `ChildLoad` wrappers down to the failure that started it
    pub fn root_cause(&self) -> &LoadError {
        match self {
            LoadError::ChildLoad { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

impl FixSuggestion for LoadError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            LoadError::BindingConflict { .. } => {
                Some("Detach the existing control or bind to a different node")
            }
            LoadError::ModuleImport { .. } => Some("Check the module identifier is registered"),
            LoadError::ExportNotFound { .. } => {
                Some("Check the '#ExportName' suffix matches an export of the module")
            }
            LoadError::MissingLoadAttribute { .. } => {
                Some("Set the load attribute on the node or pass an explicit identifier")
            }
            LoadError::RootNotFound { .. } => Some("Check the selector matches an existing node"),
            LoadError::InvalidSelector { .. } => {
                Some("Descendant combinators are not supported; use a compound selector")
            }
            LoadError::ChildLoad { .. } => Some("Inspect the wrapped cause of the failing child"),
            LoadError::Hook(_) => None,
            LoadError::NotImplemented { .. } => {
                Some("Provide `matches` and `id` in the IndexDefinition impl")
            }
            LoadError::LoaderDropped => Some("Keep the ControlLoader alive until load() resolves"),
            LoadError::TaskPanicked { .. } => Some("A lifecycle hook panicked; check its logs"),
            LoadError::Aggregate { .. } => Some("Each related error carries its own suggestion"),
            LoadError::Config { .. } => Some("Check config.toml and NODEBIND_* variables"),
        }
    }
}
