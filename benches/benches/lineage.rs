// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_lineage` + `understory_route`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::rc::Rc;
use std::sync::Once;
use std::vec::Vec;

use understory_lineage::{
    ElementId, ElementTree, ErasedValue, InheritanceBehavior, Property, PropertyMetadataBuilder,
    PropertyRegistry, PropertyStore,
};
use understory_route::adapters::element_tree::route_for;

struct Props {
    registry: Rc<PropertyRegistry>,
    width: Property<f64>,
    font_size: Property<f64>,
}

fn props() -> Props {
    let mut registry = PropertyRegistry::new();
    let width = registry
        .register(
            "Control",
            "Width",
            PropertyMetadataBuilder::new(0.0_f64)
                .affects_layout(true)
                .build(),
        )
        .unwrap();
    let font_size = registry
        .register(
            "Control",
            "FontSize",
            PropertyMetadataBuilder::new(12.0_f64)
                .inherits(true)
                .affects_layout(true)
                .build(),
        )
        .unwrap();
    registry.seal();
    Props {
        registry: Rc::new(registry),
        width,
        font_size,
    }
}

/// A chain `0 <- 1 <- ... <- len-1`.
fn chain(registry: &Rc<PropertyRegistry>, len: u32) -> (ElementTree, Vec<ElementId>) {
    let mut tree = ElementTree::new(registry.clone());
    let ids: Vec<_> = (0..len).map(|_| tree.create_element()).collect();
    for pair in ids.windows(2) {
        tree.add_child(pair[0], pair[1]).unwrap();
    }
    (tree, ids)
}

/// A tree where every element has `fanout` children, `depth` levels deep.
fn wide(registry: &Rc<PropertyRegistry>, fanout: usize, depth: u32) -> (ElementTree, ElementId) {
    let mut tree = ElementTree::new(registry.clone());
    let root = tree.create_element();
    let mut level = vec![root];
    for _ in 0..depth {
        let mut next = Vec::with_capacity(level.len() * fanout);
        for parent in level {
            for _ in 0..fanout {
                let child = tree.create_element();
                tree.add_child(parent, child).unwrap();
                next.push(child);
            }
        }
        level = next;
    }
    (tree, root)
}

fn bench_lineage(c: &mut Criterion) {
    static PRINT_SIZES: Once = Once::new();
    PRINT_SIZES.call_once(|| {
        eprintln!(
            "sizes: PropertyStore={} ErasedValue={} ElementId={}",
            core::mem::size_of::<PropertyStore>(),
            core::mem::size_of::<ErasedValue>(),
            core::mem::size_of::<ElementId>(),
        );
    });

    let Props {
        registry,
        width,
        font_size,
    } = props();

    let mut group = c.benchmark_group("lineage/resolve");

    group.bench_function("local", |b| {
        let mut tree = ElementTree::new(registry.clone());
        let e = tree.create_element();
        tree.set_value(e, width, 100.0).unwrap();
        b.iter(|| black_box(tree.get(e, width)));
    });

    group.bench_function("default", |b| {
        let mut tree = ElementTree::new(registry.clone());
        let e = tree.create_element();
        b.iter(|| black_box(tree.get(e, width)));
    });

    let chain_len = 16;
    group.bench_function(BenchmarkId::new("inherited", chain_len), |b| {
        let (mut tree, ids) = chain(&registry, chain_len);
        tree.set_value(ids[0], font_size, 16.0).unwrap();
        let leaf = ids[ids.len() - 1];
        b.iter(|| black_box(tree.get(leaf, font_size)));
    });

    group.finish();

    let mut group = c.benchmark_group("lineage/propagate");

    for (fanout, depth) in [(2_usize, 8_u32), (8, 3)] {
        group.bench_function(BenchmarkId::new("set_root", format!("{fanout}x{depth}")), |b| {
            let (mut tree, root) = wide(&registry, fanout, depth);
            let mut value = 12.0;
            b.iter(|| {
                value += 1.0;
                tree.set_value(root, font_size, value).unwrap();
                black_box(tree.take_invalidations().len())
            });
        });
    }

    group.bench_function("set_root/behind_boundary", |b| {
        let (mut tree, root) = wide(&registry, 2, 1);
        let island = tree.create_element();
        tree.set_inheritance_behavior(island, InheritanceBehavior::SkipAllNext)
            .unwrap();
        tree.add_child(root, island).unwrap();
        let mut value = 12.0;
        b.iter(|| {
            value += 1.0;
            tree.set_value(root, font_size, value).unwrap();
        });
    });

    group.finish();

    let mut group = c.benchmark_group("lineage/reparent");

    group.bench_function("move_subtree/2x6", |b| {
        b.iter_batched(
            || {
                let (mut tree, subtree) = wide(&registry, 2, 6);
                let source = tree.create_element();
                let target = tree.create_element();
                tree.set_value(source, font_size, 14.0).unwrap();
                tree.set_value(target, font_size, 18.0).unwrap();
                tree.add_child(source, subtree).unwrap();
                (tree, subtree, target)
            },
            |(mut tree, subtree, target)| {
                tree.add_child(target, subtree).unwrap();
                black_box(tree)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();

    let mut group = c.benchmark_group("route/build");

    group.bench_function(BenchmarkId::new("logical_chain", chain_len), |b| {
        let (tree, ids) = chain(&registry, chain_len);
        let leaf = ids[ids.len() - 1];
        b.iter(|| black_box(route_for(&tree, leaf).len()));
    });

    group.bench_function("detour", |b| {
        let (mut tree, ids) = chain(&registry, chain_len);
        let host = tree.create_element();
        let host_child = tree.create_element();
        tree.add_child(host, host_child).unwrap();
        let leaf = ids[ids.len() - 1];
        tree.set_route_parent(leaf, Some(host)).unwrap();
        tree.set_route_parent(host, Some(ids[4])).unwrap();
        b.iter(|| black_box(route_for(&tree, leaf).len()));
    });

    group.finish();
}

criterion_group!(benches, bench_lineage);
criterion_main!(benches);
