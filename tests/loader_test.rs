//! Tests for Loader scanning, module resolution and ControlLoader bookkeeping
//!
//! Coverage targets:
//! - export / import / root failures
//! - dedup across overlapping roots
//! - failure aggregation
//! - resolve hook and configured aliases

mod common;

use std::sync::Arc;

use common::{Harness, RecorderClass};
use nodebind::{
    AliasResolver, ControlClass, ControlLoader, Document, EventKind, LoadError, Loader,
    LoaderConfig, Module, ModuleMap, PlainControl,
};

// =============================================================================
// Resolution failures
// =============================================================================

mod resolution {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_missing_named_export_fails_with_export_not_found() {
        let h = Harness::new().module("app", RecorderClass::new("app"));
        let root = h.doc.append(h.body(), "div", &[("data-app", "app#Main")]);
        let (loader, _doc, trace) = h.loader();

        let err = loader.clone().load(root.into()).await.unwrap_err();
        match err {
            LoadError::ExportNotFound { resource, export } => {
                assert_eq!(resource, "app");
                assert_eq!(export, "Main");
            }
            other => panic!("expected ExportNotFound, got {other}"),
        }
        assert!(trace.entries().is_empty());
        assert!(loader.registry().is_empty());
    }

    #[tokio::test]
    async fn test_missing_default_export_names_default() {
        let h = Harness::new().raw_module(Module::new("empty"));
        let root = h.doc.append(h.body(), "div", &[("data-app", "empty")]);
        let (loader, _doc, _trace) = h.loader();

        let err = loader.load(root.into()).await.unwrap_err();
        assert!(err.to_string().contains("Class not found: \"default\""));
    }

    #[tokio::test]
    async fn test_unknown_module_is_import_failure() {
        let h = Harness::new();
        let root = h.doc.append(h.body(), "div", &[("data-app", "nowhere")]);
        let (loader, _doc, _trace) = h.loader();

        let err = loader.load(root.into()).await.unwrap_err();
        match err {
            LoadError::ModuleImport { url, source } => {
                assert_eq!(url, "nowhere");
                assert!(source.to_string().contains("not registered"));
            }
            other => panic!("expected ModuleImport, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_named_export_is_selected() {
        let trace = common::Trace::default();
        let h = Harness::new().raw_module(
            Module::new("app")
                .with_default(ControlClass::of::<PlainControl>("Default"))
                .with_export("Main", RecorderClass::new("main").build(&trace)),
        );
        let root = h.doc.append(h.body(), "div", &[("data-app", "app#Main")]);
        let (loader, _doc, _) = h.loader();

        loader.clone().load(root.into()).await.unwrap();
        assert_eq!(trace.hook_count("on"), 1);
        assert_eq!(loader.get_control(root).unwrap().url(), "app#Main");
    }

    #[tokio::test]
    async fn test_load_control_without_attribute_or_url() {
        let h = Harness::new();
        let node = h.doc.append(h.body(), "div", &[]);
        let (loader, _doc, _) = h.loader();

        let err = loader
            .load_control(node, Default::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BIND-012");
    }
}

// =============================================================================
// Roots and selectors
// =============================================================================

mod roots {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_selector_matching_nothing_is_root_not_found() {
        let (loader, _doc, _) = Harness::new().loader();
        let err = loader.load("#absent".into()).await.unwrap_err();
        assert!(matches!(err, LoadError::RootNotFound { ref selector } if selector == "#absent"));
    }

    #[tokio::test]
    async fn test_invalid_selector_is_rejected() {
        let (loader, _doc, _) = Harness::new().loader();
        let err = loader.load("div > span".into()).await.unwrap_err();
        assert!(matches!(err, LoadError::InvalidSelector { .. }));
    }

    #[tokio::test]
    async fn test_selector_root_loads_descendants_and_itself() {
        let h = Harness::new()
            .module("a", RecorderClass::new("a"))
            .module("b", RecorderClass::new("b"));
        let root = h
            .doc
            .append(h.body(), "main", &[("id", "root"), ("data-app", "a")]);
        let nested = h.doc.append(root, "div", &[("data-app", "b")]);
        let (loader, _doc, trace) = h.loader();

        loader.clone().load("#root".into()).await.unwrap();

        assert!(loader.get_control(root).is_some());
        assert!(loader.get_control(nested).is_some());
        assert_eq!(trace.hook_count("on"), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_roots_load_shared_node_once() {
        let h = Harness::new().module("shared", RecorderClass::new("shared"));
        let outer = h.doc.append(h.body(), "section", &[("class", "root")]);
        let inner = h.doc.append(outer, "div", &[("class", "root")]);
        let target = h.doc.append(inner, "div", &[("data-app", "shared")]);
        let (loader, _doc, trace) = h.loader();

        loader.clone().load(".root".into()).await.unwrap();

        assert_eq!(trace.count("shared:initialize"), 1);
        assert_eq!(loader.event_log().count_attached(), 1);
        assert!(loader.get_control(target).is_some());
    }

    #[tokio::test]
    async fn test_second_load_of_bound_node_conflicts_and_keeps_original() {
        let h = Harness::new().module("app", RecorderClass::new("app"));
        let root = h.doc.append(h.body(), "div", &[("data-app", "app")]);
        let (loader, _doc, _) = h.loader();

        loader.clone().load(root.into()).await.unwrap();
        let original = loader.get_control(root).unwrap();

        let err = loader.clone().load(root.into()).await.unwrap_err();
        match err {
            LoadError::BindingConflict { tag, url } => {
                assert_eq!(tag, "DIV");
                assert_eq!(url, "app");
            }
            other => panic!("expected BindingConflict, got {other}"),
        }
        assert!(Arc::ptr_eq(&loader.get_control(root).unwrap(), &original));
        assert_eq!(loader.registry().len(), 1);
    }
}

// =============================================================================
// Aggregation
// =============================================================================

mod aggregation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_all_sibling_failures_surface() {
        let h = Harness::new()
            .module("ok", RecorderClass::new("ok").delayed(20))
            .module("bad1", RecorderClass::new("bad1").failing_at("render"))
            .module("bad2", RecorderClass::new("bad2").failing_at("initialize"));
        let root = h.doc.append(h.body(), "div", &[]);
        for url in ["ok", "bad1", "bad2"] {
            h.doc.append(root, "div", &[("data-app", url)]);
        }
        let (loader, _doc, trace) = h.loader();

        let err = loader.load(root.into()).await.unwrap_err();
        match err {
            LoadError::Aggregate { errors } => {
                let mut messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                messages.sort();
                assert_eq!(
                    messages,
                    vec!["bad1 failed in render", "bad2 failed in initialize"]
                );
            }
            other => panic!("expected Aggregate, got {other}"),
        }
        // the healthy sibling still ran to completion
        assert_eq!(trace.count("ok:on"), 1);
    }
}

// =============================================================================
// Resolve hook and bookkeeping
// =============================================================================

mod bookkeeping {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_configured_aliases_are_resolved() {
        let h = Harness::new().module("/demo/widgets/button", RecorderClass::new("button"));
        let root = h
            .doc
            .append(h.body(), "div", &[("data-app", "@widgets/button")]);
        let config = LoaderConfig::default().alias("widgets", "/demo/widgets");
        let (loader, _doc, trace) = h.loader_with(config);

        loader.clone().load(root.into()).await.unwrap();
        assert_eq!(trace.count("button:on"), 1);
        assert_eq!(loader.resolve("@widgets/x"), "/demo/widgets/x");
    }

    #[tokio::test]
    async fn test_custom_resolver_overrides_aliases() {
        let doc = Arc::new(nodebind::MemoryDocument::new());
        let modules = ModuleMap::new().with(
            Module::new("/lib/panel").with_default(ControlClass::of::<PlainControl>("Panel")),
        );
        let root = doc.append(doc.body(), "div", &[("data-app", "@lib/panel")]);
        let loader = ControlLoader::builder(doc.clone(), Arc::new(modules))
            .config(LoaderConfig::default().alias("lib", "/wrong"))
            .resolver(AliasResolver::default().with_alias("lib", "/lib"))
            .build()
            .unwrap();

        loader.clone().load(root.into()).await.unwrap();
        assert!(loader.get_control(root).is_some());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_by_builder() {
        let doc = Arc::new(nodebind::MemoryDocument::new());
        let config = LoaderConfig {
            control_attribute: "data-app".into(),
            ..LoaderConfig::default()
        };
        let result = ControlLoader::builder(doc, Arc::new(ModuleMap::new()))
            .config(config)
            .build();
        assert!(matches!(result, Err(LoadError::Config { .. })));
    }

    #[tokio::test]
    async fn test_event_log_stays_bounded_across_load_cycles() {
        let h = Harness::new().module("app", RecorderClass::new("app"));
        let config = LoaderConfig {
            max_events: 50,
            ..LoaderConfig::default()
        };
        let (loader, doc, _) = h.loader_with(config);

        for _ in 0..100 {
            let node = doc.append(doc.body(), "div", &[("data-app", "app")]);
            loader.clone().load(node.into()).await.unwrap();
            loader.forget_nodes(&doc.remove(node));
        }

        assert!(loader.registry().is_empty());
        assert_eq!(loader.event_log().len(), 50);
        assert_eq!(loader.event_log().max_events(), Some(50));

        let drained = loader.event_log().drain();
        assert_eq!(drained.len(), 50);
        assert!(matches!(
            drained.last().map(|e| &e.kind),
            Some(EventKind::ControlDetached { .. })
        ));
        assert!(loader.event_log().is_empty());
    }

    #[tokio::test]
    async fn test_destroyed_nodes_are_pruned() {
        let h = Harness::new().module("app", RecorderClass::new("app"));
        let first = h.doc.append(h.body(), "div", &[("data-app", "app")]);
        let second = h.doc.append(h.body(), "div", &[("data-app", "app")]);
        let (loader, doc, _) = h.loader();

        loader.clone().load(doc.body().into()).await.unwrap();
        assert_eq!(loader.registry().len(), 2);

        doc.remove(first);
        assert!(loader.get_control(first).is_none());
        assert_eq!(loader.prune_detached(), 0);

        let removed = doc.remove(second);
        loader.forget_nodes(&removed);
        assert!(loader.registry().is_empty());
    }

    #[tokio::test]
    async fn test_load_is_bracketed_by_start_and_finish_events() {
        let h = Harness::new().module("app", RecorderClass::new("app"));
        let root = h.doc.append(h.body(), "div", &[("data-app", "app")]);
        let (loader, _doc, _) = h.loader();

        loader.clone().load(root.into()).await.unwrap();

        let events = loader.event_log().events();
        assert_eq!(
            events.first().map(|e| e.kind.clone()),
            Some(EventKind::LoadStarted { roots: vec![root] })
        );
        assert!(matches!(
            events.last().map(|e| &e.kind),
            Some(EventKind::LoadFinished { success: true, .. })
        ));
    }

    #[tokio::test]
    async fn test_detach_is_noop_for_unbound_node() {
        let h = Harness::new();
        let node = h.doc.append(h.body(), "div", &[]);
        let (loader, _doc, _) = h.loader();
        loader.detach_control(node);
        assert!(loader.event_log().is_empty());
    }

    #[tokio::test]
    async fn test_control_url_prefers_control_attribute() {
        let h = Harness::new();
        let both = h
            .doc
            .append(h.body(), "div", &[("data-app", "a"), ("data-control", "c")]);
        let only_app = h.doc.append(h.body(), "div", &[("data-app", "a")]);
        let (loader, _doc, _) = h.loader();

        assert_eq!(loader.get_control_url(both).as_deref(), Some("c"));
        assert_eq!(loader.get_control_url(only_app).as_deref(), Some("a"));
    }
}
