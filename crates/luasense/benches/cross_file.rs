// cross_file.rs - Benchmarks for require resolution and signature indexing
//
// Run with: cargo bench --bench cross_file --features test-support
// Compare baselines: cargo bench --bench cross_file --features test-support -- --baseline before

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use luasense::cross_file::indexer::{IndexSettings, SymbolIndexer};
use luasense::cross_file::require_detect::parse_requires;
use luasense::cross_file::signatures::extract_signatures;
use luasense::test_utils::fixture_workspace::{
    create_fixture_workspace, generate_lua_file_content, module_name, FixtureConfig,
};

fn indexer() -> SymbolIndexer {
    SymbolIndexer::new(IndexSettings {
        include_builtins: false,
        ..IndexSettings::default()
    })
}

// ---------------------------------------------------------------------------
// Benchmark: reachable file traversal with varying require chain depths
//
// Cached: the indexer already holds every file's parse, so only resolution
// and traversal are measured. Cold: a fresh indexer reads every file.
// ---------------------------------------------------------------------------

fn bench_reachable_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_file_reachable_files");
    group.sample_size(20);

    for &depth in &[1usize, 5, 15] {
        let config = FixtureConfig {
            file_count: (depth + 5).max(10),
            functions_per_file: 5,
            require_chain_depth: depth,
            methods_per_file: 2,
            extra_lines_per_file: 3,
        };
        let workspace = create_fixture_workspace(&config);
        let entry = workspace.path().join(format!("{}.lua", module_name(0)));

        let warm = indexer();
        warm.resolve_reachable_files(&entry);
        group.bench_with_input(BenchmarkId::new("cached", depth), &depth, |b, _| {
            b.iter(|| black_box(warm.resolve_reachable_files(black_box(&entry))))
        });

        group.bench_with_input(BenchmarkId::new("cold", depth), &depth, |b, _| {
            b.iter(|| {
                let cold = indexer();
                black_box(cold.signatures_visible_from(black_box(&entry)))
            })
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: line heuristics over a single generated file
// ---------------------------------------------------------------------------

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_file_extraction");

    let configs: &[(&str, FixtureConfig)] = &[
        ("small", FixtureConfig::small()),
        ("large", FixtureConfig::large()),
    ];

    for (label, config) in configs {
        let content = generate_lua_file_content(0, config);

        group.bench_with_input(
            BenchmarkId::new("extract_signatures", *label),
            &content,
            |b, content| b.iter(|| black_box(extract_signatures(black_box(content)))),
        );
        group.bench_with_input(
            BenchmarkId::new("parse_requires", *label),
            &content,
            |b, content| b.iter(|| black_box(parse_requires(black_box(content)))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_reachable_files, bench_extraction);
criterion_main!(benches);
