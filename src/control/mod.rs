//! Control - behavioral unit bound to one tree node
//!
//! A control is constructed synchronously (options merged, scope fixed,
//! registry binding taken) and then runs its pipeline as a spawned task:
//!
//! ```text
//! initialize ──► render ──► create_child_controls ──► on ──► Ready
//!      └───────────┴──────────────┴──────────────────┴────► Failed
//! ```
//!
//! Child controls are discovered by scanning the control's own region of the
//! tree (see [`traverse`]) and loaded concurrently.

mod behavior;
mod state;
pub mod traverse;

pub use behavior::{Behavior, PlainControl};
pub use state::LifecycleState;

use std::any::Any;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, instrument};

use crate::dom::{tag_of, Document, NodeId};
use crate::error::{LoadError, Result};
use crate::event::{EventKind, EventLog};
use crate::index::{IndexDefinitions, IndexTable, NAMES_INDEX};
use crate::loader::{ControlLoader, Loader};
use crate::options::{ControlOptions, OptionMap};
use traverse::{collect_anchors, Boundaries};

pub struct Control {
    loader: Weak<ControlLoader>,
    document: Arc<dyn Document>,
    event_log: EventLog,
    node: RwLock<NodeId>,
    url: Arc<str>,
    options: OptionMap,
    parent: Option<Weak<Control>>,
    scope: Option<NodeId>,
    index_definitions: IndexDefinitions,
    indexes: Mutex<IndexTable>,
    behavior: Box<dyn Behavior>,
    state: watch::Sender<LifecycleState>,
}

impl Control {
    /// Construct, bind to `node`, and spawn the pipeline.
    ///
    /// Returns immediately; the handle resolves once the pipeline finishes.
    pub fn start(
        loader: Arc<ControlLoader>,
        node: NodeId,
        options: ControlOptions,
        behavior: Box<dyn Behavior>,
    ) -> Result<(Arc<Control>, JoinHandle<Result<Arc<Control>>>)> {
        let merged = options.merge_over(loader.element_options(node));
        let parent = options.parent;
        let scope = parent.as_ref().map(|p| match p.top() {
            Some(top) => top.node(),
            None => p.scope(),
        });

        let name_attribute = behavior
            .name_attribute()
            .unwrap_or(loader.name_attribute())
            .to_string();
        let index_definitions = behavior.index_definitions(&name_attribute);
        let indexes = IndexTable::for_definitions(&index_definitions);
        let url: Arc<str> = loader.get_control_url(node).unwrap_or_default().into();
        let (state, _) = watch::channel(LifecycleState::Constructing);

        let control = Arc::new(Control {
            loader: Arc::downgrade(&loader),
            document: Arc::clone(loader.document()),
            event_log: loader.event_log().clone(),
            node: RwLock::new(node),
            url,
            options: merged,
            parent: parent.as_ref().map(Arc::downgrade),
            scope,
            index_definitions,
            indexes: Mutex::new(indexes),
            behavior,
            state,
        });
        loader.attach_control(&control, node)?;
        debug!(url = %control.url, node = %node, "Create control");

        let pipeline = tokio::spawn(Arc::clone(&control).do_init());
        Ok((control, pipeline))
    }

    async fn do_init(self: Arc<Self>) -> Result<Arc<Self>> {
        match self.run_stages().await {
            Ok(()) => {
                self.transition(LifecycleState::Ready);
                Ok(self)
            }
            Err(err) => {
                self.transition(LifecycleState::Failed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run_stages(self: &Arc<Self>) -> Result<()> {
        self.transition(LifecycleState::Initializing);
        self.behavior.initialize(self).await.map_err(LoadError::Hook)?;

        self.transition(LifecycleState::Rendering);
        self.behavior.render(self).await.map_err(LoadError::Hook)?;

        self.transition(LifecycleState::LoadingChildren);
        self.create_child_controls().await?;

        self.transition(LifecycleState::Binding);
        self.behavior.on(self).await.map_err(LoadError::Hook)?;
        Ok(())
    }

    fn transition(&self, state: LifecycleState) {
        debug!(url = %self.url, state = %state, "Control state");
        self.event_log.emit(EventKind::StateChanged {
            node: self.node(),
            url: Arc::clone(&self.url),
            state: state.clone(),
        });
        self.state.send_replace(state);
    }

    // ═══════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════

    pub fn loader(&self) -> Option<Arc<ControlLoader>> {
        self.loader.upgrade()
    }

    fn require_loader(&self) -> Result<Arc<ControlLoader>> {
        self.loader().ok_or(LoadError::LoaderDropped)
    }

    pub fn document(&self) -> &Arc<dyn Document> {
        &self.document
    }

    /// Node this control is currently bound to
    pub fn node(&self) -> NodeId {
        *self.node.read()
    }

    /// Resource URL the control was loaded from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Merged options (attribute defaults overridden by explicit values)
    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    pub fn parent(&self) -> Option<Arc<Control>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Scope node fixed at construction; own node when there is no parent
    pub fn scope(&self) -> NodeId {
        self.scope.unwrap_or_else(|| self.node())
    }

    /// Current owner of the scope node (this control when it is its own scope)
    pub fn top(self: &Arc<Self>) -> Option<Arc<Control>> {
        match self.scope {
            Some(scope) if scope != self.node() => self.loader()?.get_control(scope),
            _ => Some(Arc::clone(self)),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Wait until the pipeline reaches `Ready` or `Failed`
    pub async fn wait_terminal(&self) -> LifecycleState {
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(LifecycleState::is_terminal).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    /// Concrete behavior, if it is a `B`
    pub fn behavior<B: Behavior>(&self) -> Option<&B> {
        let any: &dyn Any = self.behavior.as_ref();
        any.downcast_ref::<B>()
    }

    pub fn index_definitions(&self) -> &IndexDefinitions {
        &self.index_definitions
    }

    /// Node registered under `name` in the `names` index
    pub fn named(&self, name: &str) -> Option<NodeId> {
        self.indexes.lock().get(NAMES_INDEX, name)
    }

    pub fn lookup(&self, index: &str, key: &str) -> Option<NodeId> {
        self.indexes.lock().get(index, key)
    }

    /// Snapshot of the index table
    pub fn indexes(&self) -> IndexTable {
        self.indexes.lock().clone()
    }

    /// `{parent: self}` plus the behavior's values for the child at `anchor`
    pub fn child_options(self: &Arc<Self>, anchor: NodeId) -> ControlOptions {
        let mut options = ControlOptions::with_parent(Arc::clone(self));
        options.values = self.behavior.child_options(self, anchor);
        options
    }

    // ═══════════════════════════════════════════
    // CHILD DISCOVERY
    // ═══════════════════════════════════════════

    /// Scan this control's region, updating indexes; returns the child anchors
    pub fn get_control_elements(&self) -> Result<Vec<NodeId>> {
        let loader = self.require_loader()?;
        let bounds = Boundaries {
            control_attribute: loader.control_attribute_name(),
            load_attribute: loader.attribute_name(),
        };
        collect_anchors(
            self.document.as_ref(),
            self.node(),
            bounds,
            |item| self.behavior.should_visit_element(self, item),
            |item| {
                self.indexes
                    .lock()
                    .update(&self.index_definitions, self.document.as_ref(), item)
            },
        )
    }

    /// Load every child anchor concurrently with this control as parent
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn create_child_controls(self: &Arc<Self>) -> Result<()> {
        if !self.behavior.can_have_children() {
            return Ok(());
        }
        let anchors = self.get_control_elements()?;
        if anchors.is_empty() {
            return Ok(());
        }

        let loader = self.require_loader()?;
        let mut join_set = JoinSet::new();
        for node in anchors {
            let url = self
                .document
                .attribute(node, loader.control_attribute_name())
                .unwrap_or_default();
            let loader = Arc::clone(&loader);
            let options = self.child_options(node);
            join_set.spawn(async move {
                loader
                    .load_control(node, options, Some(url.clone()))
                    .await
                    .map(|_| ())
                    .map_err(|cause| LoadError::ChildLoad {
                        url,
                        cause: Box::new(cause),
                    })
            });
        }

        let mut first: Option<LoadError> = None;
        while let Some(joined) = join_set.join_next().await {
            let outcome = joined.unwrap_or_else(|e| Err(LoadError::from_join(e)));
            if let Err(err) = outcome {
                if first.is_none() {
                    first = Some(err);
                } else {
                    error!(parent = %self.url, error = %err, "Sibling child control also failed");
                }
            }
        }
        first.map_or(Ok(()), Err)
    }

    // ═══════════════════════════════════════════
    // REBINDING
    // ═══════════════════════════════════════════

    /// Rewrite every entry pointing at `old` to `new`; returns the rewrite count
    pub fn replace_element_index(&self, old: NodeId, new: NodeId) -> usize {
        self.indexes.lock().replace_node(old, new)
    }

    /// Rebind this control to `new_node`.
    ///
    /// Runs with the registry held, so no observer sees both or neither node bound.
    #[instrument(skip(self), fields(url = %self.url))]
    pub fn move_to(self: &Arc<Self>, new_node: NodeId) -> Result<()> {
        let loader = self.require_loader()?;
        let attribute = loader.control_attribute_name();
        let mut bindings = loader.registry().lock();

        let old = self.node();
        if old == new_node {
            return Ok(());
        }
        if let Some(existing) = bindings.get(&new_node) {
            if !Arc::ptr_eq(existing, self) {
                return Err(LoadError::BindingConflict {
                    tag: tag_of(self.document.as_ref(), new_node),
                    url: existing.url().to_string(),
                });
            }
        }

        if let Some(parent) = self.parent() {
            parent.replace_element_index(old, new_node);
        }
        let marker = self.document.attribute(old, attribute);
        self.document.remove_attribute(old, attribute);
        if let Some(url) = &marker {
            self.document.set_attribute(new_node, attribute, url);
        }

        *self.node.write() = new_node;
        bindings.remove(&old);
        bindings.insert(new_node, Arc::clone(self));
        drop(bindings);

        loader.event_log().emit(EventKind::ControlMoved {
            from: old,
            to: new_node,
            url: Arc::clone(&self.url),
        });
        Ok(())
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("url", &self.url)
            .field("node", &self.node())
            .field("scope", &self.scope)
            .field("state", &self.state())
            .finish()
    }
}
