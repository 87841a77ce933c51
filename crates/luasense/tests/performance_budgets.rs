//! Time-budget regression tests for luasense.
//!
//! These tests assert that per-keystroke operations complete within
//! wall-clock thresholds. They are gated behind `#[cfg(not(debug_assertions))]`
//! because debug-mode timings are not meaningful.
//!
//! Run with: `cargo test --release -p luasense --features test-support --test performance_budgets`
//!
//! CI adaptation: when the `CI` environment variable is set, thresholds are
//! multiplied by a relaxation factor (default 3, configurable via
//! `LUASENSE_PERF_CI_FACTOR`).

// Only compile in release mode: debug timings are meaningless.
#![cfg(not(debug_assertions))]

use std::fmt::Write;
use std::time::{Duration, Instant};

use ropey::Rope;

use luasense::completion::{complete, CompletionRequest, CompletionSources, TriggerReason};
use luasense::cross_file::indexer::SymbolIndexer;
use luasense::documentation::{CallTable, MemberTable};
use luasense::scanner::highlight_document;
use luasense::scope::visible_scope;
use luasense::test_utils::fixture_workspace::{create_fixture_workspace, module_name, FixtureConfig};

// ---------------------------------------------------------------------------
// Timing helpers
// ---------------------------------------------------------------------------

/// Number of timed runs per budget. An odd count gives a well-defined median.
const RUNS: usize = 3;

/// Relaxation applied on CI when `LUASENSE_PERF_CI_FACTOR` is absent or
/// below 1.
const DEFAULT_CI_RELAXATION: f64 = 3.0;

/// Median wall-clock time of [`RUNS`] runs of `op`.
fn median_time<F: FnMut()>(mut op: F) -> Duration {
    let mut samples = [Duration::ZERO; RUNS];
    for sample in &mut samples {
        let started = Instant::now();
        op();
        *sample = started.elapsed();
    }
    samples.sort_unstable();
    samples[RUNS / 2]
}

/// Budget multiplier for the given `CI` and `LUASENSE_PERF_CI_FACTOR`
/// values.
///
/// Outside CI budgets apply as written. On CI the override is used when it
/// parses to at least 1, otherwise [`DEFAULT_CI_RELAXATION`].
fn ci_factor_from(ci: Option<&str>, factor: Option<&str>) -> f64 {
    if ci.map_or(true, str::is_empty) {
        return 1.0;
    }
    factor
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|&f| f >= 1.0)
        .unwrap_or(DEFAULT_CI_RELAXATION)
}

/// Budget multiplier read from the environment.
fn ci_factor() -> f64 {
    ci_factor_from(
        std::env::var("CI").ok().as_deref(),
        std::env::var("LUASENSE_PERF_CI_FACTOR").ok().as_deref(),
    )
}

/// Fail `label` when `measured` exceeds `budget_ms` scaled by
/// [`ci_factor`].
fn assert_within_budget(label: &str, measured: Duration, budget_ms: u64) {
    let factor = ci_factor();
    let threshold = Duration::from_secs_f64(budget_ms as f64 * factor / 1000.0);
    assert!(
        measured <= threshold,
        "Time budget exceeded for '{label}': measured {measured:.1?}, \
         allowed {threshold:.1?} ({budget_ms}ms x {factor:.1})",
    );
}

/// A synthetic Lua file of roughly `target_bytes`.
fn generate_lua_code_of_size(target_bytes: usize) -> String {
    let mut content = String::from("local M = {}\n\n");
    let mut func_idx = 0;
    while content.len() < target_bytes {
        writeln!(
            content,
            "function M.func_{func_idx}(x, y)\n    local result = x + y * {func_idx}\n    if result == nil then\n        return 0\n    end\n    return result\nend\n"
        )
        .unwrap();
        func_idx += 1;
    }
    content
}

// ---------------------------------------------------------------------------
// Helper checks
// ---------------------------------------------------------------------------

#[test]
fn test_median_runs_operation_once_per_sample() {
    let mut count = 0usize;
    let _ = median_time(|| {
        count += 1;
    });
    assert_eq!(count, RUNS);
}

#[test]
fn test_ci_factor_defaults() {
    assert!((ci_factor_from(None, None) - 1.0).abs() < f64::EPSILON);
    assert!((ci_factor_from(Some("true"), None) - 3.0).abs() < f64::EPSILON);
    assert!((ci_factor_from(Some("true"), Some("5.0")) - 5.0).abs() < f64::EPSILON);
    assert!((ci_factor_from(Some("true"), Some("0.5")) - 3.0).abs() < f64::EPSILON);
    assert!((ci_factor_from(Some(""), Some("5.0")) - 1.0).abs() < f64::EPSILON);
}

#[test]
#[should_panic(expected = "Time budget exceeded")]
fn test_budget_overrun_panics() {
    assert_within_budget("slow_op", Duration::from_secs(1), 5);
}

// ---------------------------------------------------------------------------
// Per-keystroke budgets
// ---------------------------------------------------------------------------

#[test]
fn test_budget_highlight_100kb() {
    let code = generate_lua_code_of_size(102_400);
    let elapsed = median_time(|| {
        let _ = highlight_document(&code);
    });
    assert_within_budget("highlight_100kb", elapsed, 100);
}

#[test]
fn test_budget_visible_scope_100kb() {
    let rope = Rope::from_str(&generate_lua_code_of_size(102_400));
    let elapsed = median_time(|| {
        let _ = visible_scope(&rope, rope.len_chars());
    });
    assert_within_budget("visible_scope_100kb", elapsed, 100);
}

#[test]
fn test_budget_word_completion_with_require_chain() {
    let workspace = create_fixture_workspace(&FixtureConfig::medium());
    let path = workspace.path().join(format!("{}.lua", module_name(0)));
    let text = format!("{}\nfun", std::fs::read_to_string(&path).unwrap());
    let rope = Rope::from_str(&text);
    let indexer = SymbolIndexer::default();
    let members = MemberTable::default();
    let calls = CallTable::default();

    // Warm the file caches like an editing session would.
    let _ = indexer.signatures_visible_from_buffer(&path, &text);

    let elapsed = median_time(|| {
        let document = indexer.document_signatures(&text);
        let visible = indexer.signatures_visible_from_buffer(&path, &text);
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
        let list = complete(&request, &sources).expect("explicit completion");
        assert!(!list.candidates.is_empty());
    });
    assert_within_budget("word_completion_medium_chain", elapsed, 50);
}
