//
// cross_file/mod.rs
//
// Cross-file awareness: signatures, require resolution and caches
//

pub mod config;
pub mod dependency;
pub mod file_cache;
pub mod indexer;
pub mod path_resolve;
pub mod require_detect;
pub mod signatures;

#[cfg(test)]
mod integration_tests;

pub use config::*;
pub use dependency::*;
pub use file_cache::*;
pub use indexer::*;
pub use path_resolve::*;
pub use require_detect::*;
pub use signatures::*;
