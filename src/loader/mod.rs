//! Loader - convention-driven discovery and construction of controls
//!
//! ## Data flow
//!
//! ```text
//! load(root) ──► query_and_self ──► VisitedSet dedup ──► load_control (fan-out)
//!                                                            │
//!       parse_url ──► resolve ──► import_module ──► export ──┘──► create_control
//! ```
//!
//! [`Loader`] carries the algorithms as provided methods; implementors
//! supply the attribute convention, the environment primitives and the
//! `create_control` factory. [`ControlLoader`] is the concrete loader.

mod control_loader;
mod module;
mod registry;
mod resolve;

pub use control_loader::{ControlLoader, ControlLoaderBuilder};
pub use module::{ControlClass, Module, ModuleImporter, ModuleMap};
pub use registry::BindingRegistry;
pub use resolve::{AliasResolver, IdentityResolver, Resolve};

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tokio::task::JoinSet;
use tracing::{debug, error, instrument};

use crate::control::Control;
use crate::dom::{self, tag_of, Document, NodeId, Selector};
use crate::error::{LoadError, Result};
use crate::options::ControlOptions;

/// `resource[#exportName]`; segments after a second `#` are ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlInfo {
    pub resource: String,
    /// `None` selects the default export
    pub export_name: Option<String>,
}

impl UrlInfo {
    pub fn parse(raw: &str) -> Self {
        let mut segments = raw.split('#');
        let resource = segments.next().unwrap_or_default();
        let export_name = segments
            .next()
            .filter(|export| !export.is_empty())
            .map(str::to_string);
        Self {
            resource: resource.to_string(),
            export_name,
        }
    }
}

/// Where a `load()` starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRoot {
    Node(NodeId),
    /// Matched against the document body (and the body itself)
    Selector(String),
}

impl From<NodeId> for LoadRoot {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for LoadRoot {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for LoadRoot {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

/// Nodes already claimed by one `load()` call
#[derive(Debug, Clone, Default)]
pub struct VisitedSet(Arc<Mutex<FxHashSet<NodeId>>>);

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `node` was not claimed before
    pub fn claim(&self, node: NodeId) -> bool {
        self.0.lock().insert(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.0.lock().contains(&node)
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scans a tree for load-attribute nodes and turns each into a running control
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    /// Attribute marking nodes that require a control
    fn attribute_name(&self) -> &str;

    fn document(&self) -> &Arc<dyn Document>;

    fn importer(&self) -> &Arc<dyn ModuleImporter>;

    /// Alias expansion hook; identity by default
    fn resolve(&self, url: &str) -> String {
        url.to_string()
    }

    fn selector(&self) -> Selector {
        Selector::attribute(self.attribute_name())
    }

    fn parse_url(&self, url: &str) -> UrlInfo {
        UrlInfo::parse(url)
    }

    /// Called once the roots of a `load()` are known
    fn load_started(&self, _roots: &[NodeId]) {}

    /// Called when a `load()` with at least one root settles
    fn load_finished(&self, _success: bool, _elapsed: Duration) {}

    async fn import_module(&self, url: &str) -> Result<Arc<Module>> {
        self.importer().import(url).await.map_err(|source| {
            error!(url, error = %source, "Reject module");
            LoadError::ModuleImport {
                url: url.to_string(),
                source,
            }
        })
    }

    /// Turn a resolved class into a running control and wait for its pipeline
    async fn create_control(
        self: Arc<Self>,
        module: Arc<Module>,
        class: ControlClass,
        node: NodeId,
        options: ControlOptions,
        url: String,
    ) -> Result<Arc<Control>>;

    /// Resolve `url` (or the node's load attribute) and construct its control
    #[instrument(skip(self, node, options), fields(node = %node))]
    async fn load_control(
        self: Arc<Self>,
        node: NodeId,
        options: ControlOptions,
        url: Option<String>,
    ) -> Result<Arc<Control>> {
        let url = match url.filter(|u| !u.is_empty()) {
            Some(url) => url,
            None => self
                .document()
                .attribute(node, self.attribute_name())
                .ok_or_else(|| LoadError::MissingLoadAttribute {
                    tag: tag_of(self.document().as_ref(), node),
                    attribute: self.attribute_name().to_string(),
                })?,
        };

        let info = self.parse_url(&url);
        let module = self.import_module(&self.resolve(&info.resource)).await?;
        let class = module
            .export(info.export_name.as_deref())
            .cloned()
            .ok_or_else(|| LoadError::ExportNotFound {
                resource: info.resource.clone(),
                export: info
                    .export_name
                    .clone()
                    .unwrap_or_else(|| "default".to_string()),
            })?;

        debug!(url = %url, class = class.name(), "Creating control");
        self.create_control(module, class, node, options, info.resource)
            .await
    }

    /// Descendants of `root` matching `selector`, then `root` itself if it matches
    fn query_and_self(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        let doc = self.document().as_ref();
        let mut nodes = dom::query_selector_all(doc, root, selector);
        if selector.matches(doc, root) {
            nodes.push(root);
        }
        nodes
    }

    /// Load every unclaimed load-attribute node under `root` concurrently
    async fn load_element_controls(
        self: Arc<Self>,
        root: NodeId,
        visited: VisitedSet,
    ) -> Result<()> {
        let selector = self.selector();
        let nodes: Vec<NodeId> = self
            .query_and_self(root, &selector)
            .into_iter()
            .filter(|&node| visited.claim(node))
            .collect();

        let mut join_set = JoinSet::new();
        for node in nodes {
            let loader = Arc::clone(&self);
            join_set.spawn(async move {
                loader
                    .load_control(node, ControlOptions::default(), None)
                    .await
                    .map(|_| ())
            });
        }

        let mut errors = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => errors.push(err),
                Err(join_err) => errors.push(LoadError::from_join(join_err)),
            }
        }
        LoadError::collect(errors)
    }

    /// Load all controls under the given root node or selector
    #[instrument(skip(self))]
    async fn load(self: Arc<Self>, root: LoadRoot) -> Result<()> {
        let roots = match &root {
            LoadRoot::Node(node) => vec![*node],
            LoadRoot::Selector(source) => {
                let selector = Selector::parse(source)?;
                self.query_and_self(self.document().body(), &selector)
            }
        };
        if roots.is_empty() {
            return Err(LoadError::RootNotFound {
                selector: match root {
                    LoadRoot::Selector(s) => s,
                    LoadRoot::Node(n) => n.to_string(),
                },
            });
        }

        self.load_started(&roots);
        let started = Instant::now();
        let visited = VisitedSet::new();
        let results = join_all(
            roots
                .iter()
                .map(|&r| Arc::clone(&self).load_element_controls(r, visited.clone())),
        )
        .await;
        let outcome = LoadError::collect(results.into_iter().filter_map(|r| r.err()).collect());
        self.load_finished(outcome.is_ok(), started.elapsed());
        outcome
    }
}
