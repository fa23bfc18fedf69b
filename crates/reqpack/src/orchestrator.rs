//! Bundle orchestration: config -> file index -> graph -> rewrite -> serialize
//!
//! Nothing is written until the whole bundle text exists, so a failed build leaves no output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    config::Config,
    error::BundleError,
    file_index::{FileIndex, FsFileIndex},
    graph_builder::GraphBuilder,
    module_graph::{ModuleGraph, ModuleId},
    resolver::{NodeResolver, Resolver},
    rewriter,
    serializer::{self, Bundle},
};

/// Result of one bundling run
#[derive(Debug)]
pub struct BundleOutput {
    pub bundle: Bundle,
    /// Canonical entry path
    pub entry: PathBuf,
    /// Bundled module paths, indexed by id
    pub modules: Vec<PathBuf>,
    /// Circular dependency groups, by id
    pub cycles: Vec<Vec<ModuleId>>,
    /// Files found by the project crawl
    pub indexed_files: usize,
    /// Hash over the bundled sources, see [`ModuleGraph::fingerprint`]
    pub fingerprint: String,
}

impl BundleOutput {
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Write the bundle to `path`, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        std::fs::write(path, self.bundle.text())
            .with_context(|| format!("Failed to write bundle to {}", path.display()))?;
        info!("Wrote {} bytes to {}", self.bundle.byte_len(), path.display());
        Ok(())
    }
}

#[derive(Debug)]
pub struct BundleOrchestrator {
    config: Config,
}

impl BundleOrchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bundle the program rooted at `entry` (relative paths are taken from the working
    /// directory)
    pub fn bundle(&self, entry: &Path) -> Result<BundleOutput> {
        let entry_not_found = || BundleError::EntryNotFound {
            path: entry.to_path_buf(),
        };
        let entry = std::path::absolute(entry)
            .ok()
            .and_then(|path| path.canonicalize().ok())
            .ok_or_else(entry_not_found)?;

        let root = match &self.config.root {
            Some(root) => root.clone(),
            None => entry
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(entry_not_found)?,
        };
        info!("Building {}", entry.display());

        let file_index = FsFileIndex::build(&root, &self.config)?;
        if !entry.starts_with(file_index.root()) {
            debug!(
                "Entry {} is outside project root {}",
                entry.display(),
                file_index.root().display()
            );
            return Err(entry_not_found().into());
        }
        let resolver = NodeResolver::new(&self.config);

        let mut output = bundle_with(&file_index, &resolver, &entry)?;
        output.indexed_files = file_index.file_count();
        Ok(output)
    }
}

/// Run the core pipeline against any file index and resolver
pub fn bundle_with(
    file_index: &dyn FileIndex,
    resolver: &dyn Resolver,
    entry: &Path,
) -> Result<BundleOutput> {
    let mut graph = GraphBuilder::new(file_index, resolver).build(entry)?;
    info!("Found {} files", graph.len());

    let cycles = graph.find_cycles();
    for cycle in &cycles {
        info!("Circular dependency between modules {}", describe_cycle(&graph, cycle));
    }

    rewriter::rewrite_all(&mut graph)?;
    let bundle = serializer::serialize(&graph, ModuleId::ENTRY)?;
    info!("Bundle size: {} bytes", bundle.byte_len());

    Ok(BundleOutput {
        bundle,
        entry: entry.to_path_buf(),
        modules: graph.modules().map(|record| record.path.clone()).collect(),
        cycles,
        indexed_files: 0,
        fingerprint: graph.fingerprint(),
    })
}

fn describe_cycle(graph: &ModuleGraph, cycle: &[ModuleId]) -> String {
    cycle
        .iter()
        .map(|id| match graph.get_by_id(*id) {
            Some(record) => format!("{id} ({})", record.path.display()),
            None => id.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
