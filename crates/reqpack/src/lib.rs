//! reqpack: packs a `require()`-based JavaScript module graph into one self-contained file
//! that runs without a native module loader.

pub mod config;
pub mod dirs;
pub mod error;
pub mod file_index;
pub mod graph_builder;
pub mod module_graph;
pub mod normalizer;
pub mod orchestrator;
pub mod resolver;
pub mod rewriter;
pub mod runtime;
pub mod scanner;
pub mod serializer;

pub use error::BundleError;
pub use orchestrator::{BundleOrchestrator, BundleOutput};
