//! ControlLoader - the concrete loader owning the binding registry

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{
    AliasResolver, BindingRegistry, ControlClass, IdentityResolver, Loader, Module,
    ModuleImporter, Resolve,
};
use crate::config::{LoaderConfig, DEFAULT_MAX_EVENTS};
use crate::control::Control;
use crate::dom::{tag_of, Document, NodeId};
use crate::error::{LoadError, Result};
use crate::event::{EventKind, EventLog};
use crate::options::{extract_element_options, ControlOptions, OptionMap};

/// Loader for controls: the load attribute bootstraps applications, the
/// control attribute marks nodes governed by a child control.
pub struct ControlLoader {
    config: LoaderConfig,
    document: Arc<dyn Document>,
    importer: Arc<dyn ModuleImporter>,
    resolver: Arc<dyn Resolve>,
    registry: BindingRegistry,
    event_log: EventLog,
}

/// Builder for [`ControlLoader`]
pub struct ControlLoaderBuilder {
    config: LoaderConfig,
    document: Arc<dyn Document>,
    importer: Arc<dyn ModuleImporter>,
    resolver: Option<Arc<dyn Resolve>>,
    event_log: Option<EventLog>,
}

impl ControlLoaderBuilder {
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Custom resolve hook (takes precedence over configured aliases)
    pub fn resolver(mut self, resolver: impl Resolve + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Shared event log (overrides the configured `max_events` bound)
    pub fn event_log(mut self, event_log: EventLog) -> Self {
        self.event_log = Some(event_log);
        self
    }

    pub fn build(self) -> Result<Arc<ControlLoader>> {
        self.config.validate()?;
        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None if !self.config.aliases.is_empty() => {
                Arc::new(AliasResolver::new(self.config.aliases.clone()))
            }
            None => Arc::new(IdentityResolver),
        };
        let event_log = self
            .event_log
            .unwrap_or_else(|| EventLog::bounded(self.config.max_events));
        Ok(Arc::new(ControlLoader {
            config: self.config,
            document: self.document,
            importer: self.importer,
            resolver,
            registry: BindingRegistry::new(),
            event_log,
        }))
    }
}

impl ControlLoader {
    pub fn builder(
        document: Arc<dyn Document>,
        importer: Arc<dyn ModuleImporter>,
    ) -> ControlLoaderBuilder {
        ControlLoaderBuilder {
            config: LoaderConfig::default(),
            document,
            importer,
            resolver: None,
            event_log: None,
        }
    }

    /// Loader with default conventions
    pub fn new(document: Arc<dyn Document>, importer: Arc<dyn ModuleImporter>) -> Arc<Self> {
        Arc::new(Self {
            config: LoaderConfig::default(),
            document,
            importer,
            resolver: Arc::new(IdentityResolver),
            registry: BindingRegistry::new(),
            event_log: EventLog::bounded(DEFAULT_MAX_EVENTS),
        })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn control_attribute_name(&self) -> &str {
        &self.config.control_attribute
    }

    pub fn name_attribute(&self) -> &str {
        &self.config.name_attribute
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Control bound to `node`, if the node is still live
    pub fn get_control(&self, node: NodeId) -> Option<Arc<Control>> {
        if !self.document.is_live(node) {
            self.detach_control(node);
            return None;
        }
        self.registry.get(node)
    }

    /// Control attribute value, else the load attribute value
    pub fn get_control_url(&self, node: NodeId) -> Option<String> {
        self.document
            .attribute(node, self.control_attribute_name())
            .or_else(|| self.document.attribute(node, self.attribute_name()))
    }

    /// Bind `control` to `node`; fails if the node already hosts a control
    pub fn attach_control(&self, control: &Arc<Control>, node: NodeId) -> Result<()> {
        self.registry
            .attach(node, Arc::clone(control))
            .map_err(|_| LoadError::BindingConflict {
                tag: tag_of(self.document.as_ref(), node),
                url: self.get_control_url(node).unwrap_or_default(),
            })?;
        self.event_log.emit(EventKind::ControlAttached {
            node,
            url: control.url().into(),
        });
        Ok(())
    }

    /// Unbind `node`; no-op if nothing is bound
    pub fn detach_control(&self, node: NodeId) {
        if self.registry.detach(node).is_some() {
            self.event_log.emit(EventKind::ControlDetached { node });
        }
    }

    /// Drop bindings of destroyed nodes
    pub fn prune_detached(&self) -> usize {
        let pruned = self.registry.retain_live(self.document.as_ref());
        if pruned > 0 {
            debug!(pruned, "Pruned bindings of destroyed nodes");
        }
        pruned
    }

    /// Removal signal from the host tree
    pub fn forget_nodes(&self, nodes: &[NodeId]) {
        for &node in nodes {
            self.detach_control(node);
        }
    }

    /// Attribute-derived options of `node` (control attribute excluded)
    pub fn element_options(&self, node: NodeId) -> OptionMap {
        let control_attribute = self.control_attribute_name();
        extract_element_options(
            self.document.as_ref(),
            node,
            &self.config.option_prefix,
            |name| name != control_attribute,
        )
    }
}

#[async_trait]
impl Loader for ControlLoader {
    fn attribute_name(&self) -> &str {
        &self.config.app_attribute
    }

    fn document(&self) -> &Arc<dyn Document> {
        &self.document
    }

    fn importer(&self) -> &Arc<dyn ModuleImporter> {
        &self.importer
    }

    fn resolve(&self, url: &str) -> String {
        self.resolver.resolve(url)
    }

    fn load_started(&self, roots: &[NodeId]) {
        self.event_log.emit(EventKind::LoadStarted {
            roots: roots.to_vec(),
        });
    }

    fn load_finished(&self, success: bool, elapsed: Duration) {
        self.event_log.emit(EventKind::LoadFinished {
            success,
            duration_ms: elapsed.as_millis() as u64,
        });
    }

    async fn create_control(
        self: Arc<Self>,
        _module: Arc<Module>,
        class: ControlClass,
        node: NodeId,
        options: ControlOptions,
        _url: String,
    ) -> Result<Arc<Control>> {
        let (_control, pipeline) = Control::start(self, node, options, class.instantiate())?;
        pipeline.await.map_err(LoadError::from_join)?
    }
}

impl std::fmt::Debug for ControlLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoader")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}
