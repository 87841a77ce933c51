// completion.rs - Benchmarks for completion, signature hints and tokenizing
//
// Run with: cargo bench --bench completion --features test-support

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ropey::Rope;

use luasense::completion::{complete, CompletionRequest, CompletionSources, TriggerReason};
use luasense::cross_file::indexer::SymbolIndexer;
use luasense::documentation::{CallTable, MemberTable};
use luasense::scanner::highlight_document;
use luasense::scope::visible_scope;
use luasense::signature_hint::signature_hint;
use luasense::test_utils::fixture_workspace::{
    create_fixture_workspace, generate_lua_file_content, module_name, FixtureConfig,
};

/// Completion with the cursor at the end of `text`, an unsaved buffer of `path`.
fn bench_complete(
    b: &mut criterion::Bencher<'_>,
    indexer: &SymbolIndexer,
    path: &std::path::Path,
    text: &str,
) {
    let rope = Rope::from_str(text);
    let document = indexer.document_signatures(text);
    let visible = indexer.signatures_visible_from_buffer(path, text);
    let members = MemberTable::default();
    let calls = CallTable::default();
    let sources = CompletionSources {
        document: &document,
        visible: &visible,
        words: &[],
        members: &members,
        calls: &calls,
    };
    let request = CompletionRequest {
        doc: &rope,
        cursor: rope.len_chars(),
        reason: TriggerReason::Explicit,
        idle_completion: false,
    };
    b.iter(|| black_box(complete(black_box(&request), &sources)));
}

// ---------------------------------------------------------------------------
// Benchmark: completion in the three context kinds at the end of a large
// generated file that requires a chain of modules
// ---------------------------------------------------------------------------

fn bench_completion_contexts(c: &mut Criterion) {
    let mut group = c.benchmark_group("completion_contexts");
    group.sample_size(30);

    let config = FixtureConfig::medium();
    let workspace = create_fixture_workspace(&config);
    let path = workspace.path().join(format!("{}.lua", module_name(0)));
    let base = generate_lua_file_content(0, &config);
    let indexer = SymbolIndexer::default();

    let cases = [
        ("word", format!("{base}\nfun")),
        ("member", format!("{base}\nM.")),
        ("method", format!("{base}\nM:")),
        ("call_argument", format!("{base}\nprint(")),
    ];
    for (label, text) in &cases {
        group.bench_function(BenchmarkId::new("medium", *label), |b| {
            bench_complete(b, &indexer, &path, text)
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: scope resolution and tokenizing as documents grow
// ---------------------------------------------------------------------------

fn bench_document_scans(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_scans");

    let configs: &[(&str, FixtureConfig)] = &[
        ("small", FixtureConfig::small()),
        ("medium", FixtureConfig::medium()),
        ("large", FixtureConfig::large()),
    ];

    for (label, config) in configs {
        let text = generate_lua_file_content(0, config);
        let rope = Rope::from_str(&text);

        group.bench_with_input(BenchmarkId::new("visible_scope", *label), &rope, |b, rope| {
            b.iter(|| black_box(visible_scope(rope, rope.len_chars())))
        });
        group.bench_with_input(
            BenchmarkId::new("highlight_document", *label),
            &text,
            |b, text| b.iter(|| black_box(highlight_document(black_box(text)))),
        );

        let call = format!("{text}\nfunc_0_0(1, ");
        let call_rope = Rope::from_str(&call);
        let indexer = SymbolIndexer::default();
        let signatures = indexer.document_signatures(&call);
        let calls = CallTable::default();
        group.bench_with_input(
            BenchmarkId::new("signature_hint", *label),
            &call_rope,
            |b, rope| {
                b.iter(|| {
                    black_box(signature_hint(
                        rope,
                        rope.len_chars(),
                        &signatures,
                        &calls,
                    ))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_completion_contexts, bench_document_scans);
criterion_main!(benches);
