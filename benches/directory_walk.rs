//! Benchmarks for the path enumerator, modeled on the teacher's
//! `ignore::WalkBuilder`-based directory-walk benchmark but exercising
//! `codesync::enumerate::enumerate` directly so the exclusion-predicate
//! overhead is included.

use codesync::enumerate::{default_excludes, enumerate};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use tempfile::TempDir;

fn create_flat_directory(file_count: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    for i in 0..file_count {
        fs::write(dir.path().join(format!("file_{i:04}.txt")), format!("content {i}")).unwrap();
    }
    dir
}

fn create_nested_directory(depth: usize, files_per_level: usize) -> TempDir {
    let dir = TempDir::new().unwrap();

    fn fill(base: &std::path::Path, depth_left: usize, files: usize) {
        if depth_left == 0 {
            return;
        }
        for i in 0..files {
            fs::write(base.join(format!("file_{i}.txt")), "content").unwrap();
        }
        for i in 0..3 {
            let sub = base.join(format!("subdir_{i}"));
            fs::create_dir_all(&sub).unwrap();
            fill(&sub, depth_left - 1, files);
        }
    }

    fill(dir.path(), depth, files_per_level);
    dir
}

fn bench_flat_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate_flat");
    let excludes = default_excludes();

    for (name, count) in [("10_files", 10), ("100_files", 100), ("1000_files", 1000)] {
        let dir = create_flat_directory(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &dir, |b, dir| {
            b.iter(|| enumerate(dir.path(), &excludes).unwrap().count());
        });
    }

    group.finish();
}

fn bench_nested_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate_nested");
    let excludes = default_excludes();

    for (name, depth, files_per_level) in [("depth_3", 3, 5), ("depth_5", 5, 3)] {
        let dir = create_nested_directory(depth, files_per_level);
        let total = enumerate(dir.path(), &excludes).unwrap().count();
        group.throughput(Throughput::Elements(total as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &dir, |b, dir| {
            b.iter(|| enumerate(dir.path(), &excludes).unwrap().count());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_flat_walk, bench_nested_walk);
criterion_main!(benches);
