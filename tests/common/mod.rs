//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nodebind::{
    Behavior, Control, ControlClass, ControlLoader, LoaderConfig, MemoryDocument, Module,
    ModuleMap, NodeId,
};
use parking_lot::Mutex;

/// Ordered record of hook calls: `"<name>:<hook>"`
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Occurrences of the exact entry `"<name>:<hook>"`
    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }

    /// Occurrences of `hook` across every recorder
    pub fn hook_count(&self, hook: &str) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|e| e.rsplit_once(':').map(|(_, h)| h) == Some(hook))
            .count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == entry)
    }
}

/// Behavior recording every hook it runs
pub struct Recorder {
    pub name: &'static str,
    pub trace: Trace,
    pub fail_at: Option<&'static str>,
    pub leaf: bool,
    pub delay: Option<Duration>,
}

impl Recorder {
    fn hook(&self, hook: &str) -> anyhow::Result<()> {
        self.trace.push(format!("{}:{}", self.name, hook));
        if self.fail_at == Some(hook) {
            anyhow::bail!("{} failed in {}", self.name, hook);
        }
        Ok(())
    }
}

#[async_trait]
impl Behavior for Recorder {
    async fn initialize(&self, _control: &Arc<Control>) -> anyhow::Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.hook("initialize")
    }

    async fn render(&self, _control: &Arc<Control>) -> anyhow::Result<()> {
        self.hook("render")
    }

    async fn on(&self, _control: &Arc<Control>) -> anyhow::Result<()> {
        self.hook("on")
    }

    fn can_have_children(&self) -> bool {
        !self.leaf
    }
}

/// Recorder settings, turned into a `ControlClass` by `build`
pub struct RecorderClass {
    pub name: &'static str,
    pub fail_at: Option<&'static str>,
    pub leaf: bool,
    pub delay: Option<Duration>,
}

impl RecorderClass {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fail_at: None,
            leaf: false,
            delay: None,
        }
    }

    pub fn failing_at(mut self, hook: &'static str) -> Self {
        self.fail_at = Some(hook);
        self
    }

    pub fn leaf(mut self) -> Self {
        self.leaf = true;
        self
    }

    pub fn delayed(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    pub fn build(self, trace: &Trace) -> ControlClass {
        let trace = trace.clone();
        ControlClass::new(self.name, move || Recorder {
            name: self.name,
            trace: trace.clone(),
            fail_at: self.fail_at,
            leaf: self.leaf,
            delay: self.delay,
        })
    }
}

/// Document + modules + trace wired to one loader
pub struct Harness {
    pub doc: Arc<MemoryDocument>,
    pub modules: ModuleMap,
    pub trace: Trace,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        Self {
            doc: Arc::new(MemoryDocument::new()),
            modules: ModuleMap::new(),
            trace: Trace::default(),
        }
    }

    pub fn body(&self) -> NodeId {
        use nodebind::Document;
        self.doc.body()
    }

    /// Register `spec` as the default export of module `id`
    pub fn module(self, id: &str, class: RecorderClass) -> Self {
        let class = class.build(&self.trace);
        self.modules.register(Module::new(id).with_default(class));
        self
    }

    pub fn raw_module(self, module: Module) -> Self {
        self.modules.register(module);
        self
    }

    pub fn loader(self) -> (Arc<ControlLoader>, Arc<MemoryDocument>, Trace) {
        self.loader_with(LoaderConfig::default())
    }

    pub fn loader_with(
        self,
        config: LoaderConfig,
    ) -> (Arc<ControlLoader>, Arc<MemoryDocument>, Trace) {
        let loader = ControlLoader::builder(self.doc.clone(), Arc::new(self.modules))
            .config(config)
            .build()
            .expect("valid config");
        (loader, self.doc, self.trace)
    }
}

pub fn init_tracing() {
    nodebind::logging::init_tracing(tracing::Level::WARN);
}
