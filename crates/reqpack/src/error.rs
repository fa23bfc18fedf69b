//! Error taxonomy for bundling
//!
//! Builder failures abort the whole build. They travel as `anyhow::Error` through the
//! orchestration layer and can be recovered with `downcast_ref::<BundleError>()`.

use std::path::PathBuf;

use thiserror::Error;

use crate::{module_graph::ModuleId, normalizer::UnsupportedSyntax};

#[derive(Debug, Error)]
pub enum BundleError {
    /// The entry file is missing from the file index or lies outside the project root
    #[error("entry point {} does not exist. Please provide a path to a valid file in this scope", .path.display())]
    EntryNotFound { path: PathBuf },

    #[error("failed to read {}", .path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot resolve '{specifier}' from {}", .from.display())]
    UnresolvableDependency { from: PathBuf, specifier: String },

    /// A record reached serialization without rewritten code
    #[error("module {id} ({}) has not been rewritten", .path.display())]
    SerializationError { id: ModuleId, path: PathBuf },

    /// A dependency edge whose reference call could not be found in the module text.
    /// Edges are derived from that same text, so this is an internal fault.
    #[error("module {id} has a dependency on '{specifier}' but no require('{specifier}') call")]
    MissingReference { id: ModuleId, specifier: String },

    /// A dependency edge pointing at a path that never made it into the module graph
    #[error("module {id} depends on '{specifier}' ({}), which is not in the module graph", .target.display())]
    DanglingEdge {
        id: ModuleId,
        specifier: String,
        target: PathBuf,
    },

    /// Module syntax the ESM normalizer cannot rewrite
    #[error("cannot transform {}", .path.display())]
    TransformError {
        path: PathBuf,
        #[source]
        source: UnsupportedSyntax,
    },
}
