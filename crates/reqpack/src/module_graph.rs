//! Module record store
//!
//! One `ModuleRecord` per distinct resolved path. Records are kept in first-visit order, so a
//! record's position in the store is its id.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexMap;
use petgraph::{
    algo::{is_cyclic_directed, tarjan_scc},
    graph::{DiGraph, NodeIndex},
};
use sha2::{Digest, Sha256};

/// Graph-local module identifier, assigned in first-visit order starting at 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    pub const ENTRY: Self = Self(0);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub id: ModuleId,
    /// Canonical absolute path; the record's identity
    pub path: PathBuf,
    /// Text as discovered (after syntax normalization)
    pub raw_code: Arc<str>,
    /// SHA-256 of `raw_code`, hex encoded
    pub content_hash: String,
    /// Specifier as written in source -> resolved target path, in source order
    pub dependency_edges: IndexMap<String, PathBuf>,
    rewritten_code: Option<String>,
}

impl ModuleRecord {
    pub fn rewritten_code(&self) -> Option<&str> {
        self.rewritten_code.as_deref()
    }

    /// Store the result of reference rewriting. Happens once per build.
    pub fn set_rewritten_code(&mut self, code: String) {
        debug_assert!(
            self.rewritten_code.is_none(),
            "module {} rewritten twice",
            self.id
        );
        self.rewritten_code = Some(code);
    }
}

/// All records reachable from the entry, keyed by path
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: IndexMap<PathBuf, ModuleRecord>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next added module will receive
    pub fn next_id(&self) -> ModuleId {
        ModuleId::new(self.modules.len() as u32)
    }

    /// Add a record for a path not yet in the graph, returning its id.
    /// Adding an existing path returns the existing id and leaves the record untouched.
    pub fn add_module(
        &mut self,
        path: PathBuf,
        raw_code: Arc<str>,
        content_hash: String,
        dependency_edges: IndexMap<String, PathBuf>,
    ) -> ModuleId {
        if let Some(existing) = self.modules.get(&path) {
            return existing.id;
        }
        let id = self.next_id();
        let record = ModuleRecord {
            id,
            path: path.clone(),
            raw_code,
            content_hash,
            dependency_edges,
            rewritten_code: None,
        };
        self.modules.insert(path, record);
        id
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.modules.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&ModuleRecord> {
        self.modules.get(path)
    }

    pub fn get_by_id(&self, id: ModuleId) -> Option<&ModuleRecord> {
        self.modules.get_index(id.as_usize()).map(|(_, record)| record)
    }

    pub fn get_by_id_mut(&mut self, id: ModuleId) -> Option<&mut ModuleRecord> {
        self.modules
            .get_index_mut(id.as_usize())
            .map(|(_, record)| record)
    }

    pub fn id_of(&self, path: &Path) -> Option<ModuleId> {
        self.modules.get(path).map(|record| record.id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Records in ascending id order
    pub fn modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values()
    }

    /// SHA-256 over every record's content hash in id order. Two builds with the same
    /// fingerprint saw the same sources in the same order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for record in self.modules() {
            hasher.update(record.content_hash.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    /// Ids of the modules `id` depends on, in specifier order, without duplicates
    pub fn dependencies(&self, id: ModuleId) -> Vec<ModuleId> {
        let Some(record) = self.get_by_id(id) else {
            return Vec::new();
        };
        let mut deps: Vec<ModuleId> = Vec::new();
        for target in record.dependency_edges.values() {
            if let Some(dep) = self.id_of(target)
                && !deps.contains(&dep)
            {
                deps.push(dep);
            }
        }
        deps
    }

    fn to_petgraph(&self) -> DiGraph<ModuleId, ()> {
        let mut graph = DiGraph::with_capacity(self.len(), 0);
        for record in self.modules() {
            graph.add_node(record.id);
        }
        // Node indices line up with ids because nodes were added in id order
        for record in self.modules() {
            for dep in self.dependencies(record.id) {
                graph.add_edge(
                    NodeIndex::new(record.id.as_usize()),
                    NodeIndex::new(dep.as_usize()),
                    (),
                );
            }
        }
        graph
    }

    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.to_petgraph())
    }

    /// Strongly connected components that form a cycle, each sorted by id, ordered by their
    /// smallest member. A module requiring itself is a cycle of one.
    pub fn find_cycles(&self) -> Vec<Vec<ModuleId>> {
        let graph = self.to_petgraph();
        let mut cycles: Vec<Vec<ModuleId>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&node| graph.contains_edge(node, node))
            })
            .map(|component| {
                let mut ids: Vec<ModuleId> = component.into_iter().map(|n| graph[n]).collect();
                ids.sort_unstable();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }
}
