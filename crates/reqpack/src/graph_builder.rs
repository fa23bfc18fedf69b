//! Graph builder: breadth-first discovery of every module reachable from the entry
//!
//! Ids are handed out in dequeue order, so the entry is always 0 and the numbering only
//! depends on the order specifiers appear in source. A path that is already in the graph when
//! dequeued is skipped, which is what makes cyclic graphs terminate.

use std::{collections::VecDeque, path::Path};

use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, trace};

use crate::{
    error::BundleError,
    file_index::FileIndex,
    module_graph::ModuleGraph,
    resolver::Resolver,
};

pub struct GraphBuilder<'a> {
    file_index: &'a dyn FileIndex,
    resolver: &'a dyn Resolver,
}

impl std::fmt::Debug for GraphBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphBuilder").finish_non_exhaustive()
    }
}

impl<'a> GraphBuilder<'a> {
    pub fn new(file_index: &'a dyn FileIndex, resolver: &'a dyn Resolver) -> Self {
        Self {
            file_index,
            resolver,
        }
    }

    /// Build the module graph rooted at `entry_path` (an absolute, canonical path).
    /// Any failure aborts the whole build.
    pub fn build(&self, entry_path: &Path) -> Result<ModuleGraph> {
        if !self.file_index.exists(entry_path) {
            return Err(BundleError::EntryNotFound {
                path: entry_path.to_path_buf(),
            }
            .into());
        }

        let mut graph = ModuleGraph::new();
        let mut queue = VecDeque::from([entry_path.to_path_buf()]);

        while let Some(path) = queue.pop_front() {
            if graph.contains(&path) {
                trace!("Already visited {}", path.display());
                continue;
            }

            let source = self.file_index.read_source(&path)?;
            let specifiers = self.file_index.dependency_specifiers(&path)?;

            let mut dependency_edges = IndexMap::with_capacity(specifiers.len());
            for specifier in specifiers {
                let target = self.resolver.resolve(&path, &specifier)?;
                if !graph.contains(&target) {
                    queue.push_back(target.clone());
                }
                dependency_edges.insert(specifier, target);
            }

            let dependency_count = dependency_edges.len();
            let display_path = path.display().to_string();
            let id = graph.add_module(path, source.code, source.content_hash, dependency_edges);
            debug!("Module {id}: {display_path} ({dependency_count} dependencies)");
        }

        Ok(graph)
    }
}
