//
// lib.rs
//
// Heuristic Lua analysis engine. The language server binary in main.rs,
// the benchmarks and the integration tests all build on these modules.
//

pub mod backend;
pub mod builtins;
pub mod completion;
pub mod cross_file;
pub mod document;
pub mod documentation;
pub mod function_filter;
pub mod handlers;
pub mod indentation;
pub mod reserved_words;
pub mod scanner;
pub mod scope;
pub mod signature_hint;
pub mod state;
// test_utils is available in test builds and when the `test-support` feature is enabled.
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
