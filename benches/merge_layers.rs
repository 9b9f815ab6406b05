//! Benchmarks for the layer merge engine.
//!
//! These benchmarks merge in-memory layers shaped like real stacks: wide
//! layers with many numbered step files in one directory, and deep layers
//! sharing a nested directory structure.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use layer_stack::layer::{Layer, MemoryLayer};
use layer_stack::merge::merge_layers;

/// Layers that each add `files` numbered scripts and as many plain files to
/// the root directory.
fn wide_layers(layers: usize, files: usize) -> Vec<MemoryLayer> {
    (0..layers)
        .map(|l| {
            let mut layer = MemoryLayer::new(format!("layer{}", l));
            for i in 0..files {
                let tag = match i % 3 {
                    0 => "pre_",
                    1 => "",
                    _ => "post_",
                };
                layer
                    .add_file_string(format!("{:03}_{}step{}_{}.ps1", i % 1000, tag, l, i), "")
                    .unwrap();
                layer
                    .add_file_string(format!("layer{}_file{}.txt", l, i), "")
                    .unwrap();
            }
            layer
        })
        .collect()
}

/// Layers sharing a tree of `depth` levels with three directories per level.
fn deep_layers(layers: usize, depth: usize) -> Vec<MemoryLayer> {
    fn add_level(layer: &mut MemoryLayer, prefix: &str, l: usize, depth: usize) {
        layer
            .add_file_string(format!("{}/layer{}.txt", prefix, l), "")
            .unwrap();
        layer
            .add_file_string(format!("{}/010_layer{}.ps1", prefix, l), "")
            .unwrap();
        if depth > 0 {
            for i in 0..3 {
                add_level(layer, &format!("{}/level{}", prefix, i), l, depth - 1);
            }
        }
    }

    (0..layers)
        .map(|l| {
            let mut layer = MemoryLayer::new(format!("layer{}", l));
            add_level(&mut layer, "root", l, depth);
            layer
        })
        .collect()
}

fn bench_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_wide");
    for files in [10, 100, 500] {
        let layers = wide_layers(4, files);
        let refs: Vec<&dyn Layer> = layers.iter().map(|l| l as &dyn Layer).collect();
        group.bench_with_input(BenchmarkId::from_parameter(files), &refs, |b, refs| {
            b.iter(|| merge_layers(black_box(refs), ".").unwrap())
        });
    }
    group.finish();
}

fn bench_deep(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_deep");
    for depth in [2, 4, 6] {
        let layers = deep_layers(3, depth);
        let refs: Vec<&dyn Layer> = layers.iter().map(|l| l as &dyn Layer).collect();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &refs, |b, refs| {
            b.iter(|| merge_layers(black_box(refs), ".").unwrap())
        });
    }
    group.finish();
}

fn bench_layer_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_layer_count");
    for count in [2, 8, 32] {
        let layers = wide_layers(count, 20);
        let refs: Vec<&dyn Layer> = layers.iter().map(|l| l as &dyn Layer).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &refs, |b, refs| {
            b.iter(|| merge_layers(black_box(refs), ".").unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_wide, bench_deep, bench_layer_count);
criterion_main!(benches);
