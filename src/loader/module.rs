//! Code modules, control classes and the import primitive

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::control::Behavior;

type BehaviorFactory = dyn Fn() -> Box<dyn Behavior> + Send + Sync;

/// Named factory producing a fresh behavior per control
#[derive(Clone)]
pub struct ControlClass {
    name: Arc<str>,
    factory: Arc<BehaviorFactory>,
}

impl ControlClass {
    pub fn new<B, F>(name: &str, factory: F) -> Self
    where
        B: Behavior,
        F: Fn() -> B + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(move || Box::new(factory()) as Box<dyn Behavior>),
        }
    }

    /// Class whose instances are `B::default()`
    pub fn of<B: Behavior + Default>(name: &str) -> Self {
        Self::new(name, B::default)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instantiate(&self) -> Box<dyn Behavior> {
        (self.factory)()
    }
}

impl std::fmt::Debug for ControlClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ControlClass").field(&self.name).finish()
    }
}

/// A loaded module: a default export plus named exports
#[derive(Debug, Clone, Default)]
pub struct Module {
    id: String,
    default: Option<ControlClass>,
    exports: BTreeMap<String, ControlClass>,
}

impl Module {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, class: ControlClass) -> Self {
        self.default = Some(class);
        self
    }

    pub fn with_export(mut self, name: impl Into<String>, class: ControlClass) -> Self {
        self.exports.insert(name.into(), class);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Named export, or the default export when `name` is `None`
    pub fn export(&self, name: Option<&str>) -> Option<&ControlClass> {
        match name {
            Some(name) => self.exports.get(name),
            None => self.default.as_ref(),
        }
    }
}

/// Environment primitive: import a code module by identifier
#[async_trait]
pub trait ModuleImporter: Send + Sync {
    async fn import(&self, id: &str) -> anyhow::Result<Arc<Module>>;
}

/// In-memory importer keyed by identifier
#[derive(Debug, Default)]
pub struct ModuleMap {
    modules: DashMap<String, Arc<Module>>,
}

impl ModuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` under its own id
    pub fn register(&self, module: Module) -> &Self {
        self.modules.insert(module.id().to_string(), Arc::new(module));
        self
    }

    pub fn with(self, module: Module) -> Self {
        self.register(module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[async_trait]
impl ModuleImporter for ModuleMap {
    async fn import(&self, id: &str) -> anyhow::Result<Arc<Module>> {
        self.modules
            .get(id)
            .map(|m| Arc::clone(m.value()))
            .ok_or_else(|| anyhow!("module '{}' is not registered", id))
    }
}
