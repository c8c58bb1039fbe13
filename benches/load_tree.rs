//! Benchmark: Tree Loading
//!
//! Measures a full `load()` over wide and deep control trees.
//! Run: cargo bench --bench load_tree

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nodebind::{
    ControlClass, ControlLoader, Document, Loader, MemoryDocument, Module, ModuleMap, NodeId,
    PlainControl,
};

fn modules() -> Arc<ModuleMap> {
    Arc::new(
        ModuleMap::new()
            .with(Module::new("app").with_default(ControlClass::of::<PlainControl>("App")))
            .with(Module::new("item").with_default(ControlClass::of::<PlainControl>("Item"))),
    )
}

/// Root with `width` direct child controls
fn wide_tree(width: usize) -> (Arc<MemoryDocument>, NodeId) {
    let doc = Arc::new(MemoryDocument::new());
    let root = doc.append(doc.body(), "div", &[("data-app", "app")]);
    for i in 0..width {
        let name = format!("item_{i}");
        doc.append(root, "li", &[("data-control", "item"), ("data-name", name.as_str())]);
    }
    (doc, root)
}

/// Chain of `depth` nested child controls
fn deep_tree(depth: usize) -> (Arc<MemoryDocument>, NodeId) {
    let doc = Arc::new(MemoryDocument::new());
    let root = doc.append(doc.body(), "div", &[("data-app", "app")]);
    let mut cursor = root;
    for _ in 0..depth {
        let wrapper = doc.append(cursor, "div", &[]);
        cursor = doc.append(wrapper, "section", &[("data-control", "item")]);
    }
    (doc, root)
}

fn bench_load(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let mut group = c.benchmark_group("load");

    for size in [10, 100, 500] {
        group.bench_with_input(BenchmarkId::new("wide", size), &size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let (doc, root) = wide_tree(size);
                let loader = ControlLoader::new(doc, modules());
                black_box(loader.load(root.into()).await.unwrap());
            })
        });
    }

    for depth in [5, 25, 50] {
        group.bench_with_input(BenchmarkId::new("deep", depth), &depth, |b, &depth| {
            b.to_async(&rt).iter(|| async move {
                let (doc, root) = deep_tree(depth);
                let loader = ControlLoader::new(doc, modules());
                black_box(loader.load(root.into()).await.unwrap());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_load);
criterion_main!(benches);
