//! Project file index
//!
//! Crawls the project root once, then serves existence checks, file contents and dependency
//! specifiers from a per-path cache. Contents are syntax-normalized on first read when the
//! ESM transform is enabled.

use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use indexmap::IndexSet;
use log::{debug, trace};
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::{config::Config, error::BundleError, normalizer, scanner};

/// Contents of a file as the bundler sees it
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub code: Arc<str>,
    /// SHA-256 of `code`, hex encoded
    pub content_hash: String,
}

/// Read access to the project's files
pub trait FileIndex {
    fn exists(&self, path: &Path) -> bool;

    /// Specifiers of the file's reference calls, in source order without duplicates
    fn dependency_specifiers(&self, path: &Path) -> Result<Vec<String>>;

    fn read_source(&self, path: &Path) -> Result<SourceFile>;
}

#[derive(Debug)]
pub struct FsFileIndex {
    root: PathBuf,
    transform_esm: bool,
    /// Canonical paths of crawled files with a configured extension
    files: IndexSet<PathBuf>,
    cache: RefCell<FxHashMap<PathBuf, SourceFile>>,
}

impl FsFileIndex {
    /// Crawl `root`, skipping `config.ignore_dirs`
    pub fn build(root: &Path, config: &Config) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize project root {}", root.display()))?;

        let mut files = IndexSet::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| config.ignore_dirs.iter().any(|d| d == name))
            });

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to crawl {}", root.display()))?;
            if entry.file_type().is_file() && config.has_extension(entry.path()) {
                let path = entry
                    .path()
                    .canonicalize()
                    .unwrap_or_else(|_| entry.path().to_path_buf());
                files.insert(path);
            }
        }

        debug!("Indexed {} files under {}", files.len(), root.display());

        Ok(Self {
            root,
            transform_esm: config.transform_esm,
            files,
            cache: RefCell::new(FxHashMap::default()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of files found by the crawl
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }
}

impl FileIndex for FsFileIndex {
    fn exists(&self, path: &Path) -> bool {
        // Files skipped by the crawl (e.g. under node_modules) still count when inside the root
        self.files.contains(path) || (path.starts_with(&self.root) && path.is_file())
    }

    fn dependency_specifiers(&self, path: &Path) -> Result<Vec<String>> {
        let source = self.read_source(path)?;
        Ok(scanner::dependency_specifiers(&source.code))
    }

    fn read_source(&self, path: &Path) -> Result<SourceFile> {
        if let Some(cached) = self.cache.borrow().get(path) {
            trace!("File cache hit for {}", path.display());
            return Ok(cached.clone());
        }

        let mut text = std::fs::read_to_string(path).map_err(|source| BundleError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        neutralize_hashbang(&mut text);
        let code: Arc<str> = if self.transform_esm {
            let normalized =
                normalizer::normalize(&text).map_err(|source| BundleError::TransformError {
                    path: path.to_path_buf(),
                    source,
                })?;
            Arc::from(normalized.as_ref())
        } else {
            Arc::from(text)
        };
        let file = SourceFile {
            content_hash: content_hash(&code),
            code,
        };

        self.cache
            .borrow_mut()
            .insert(path.to_path_buf(), file.clone());
        Ok(file)
    }
}

/// Turn a leading `#!` line into a line comment. Offsets and line numbers stay the same, and
/// the line is legal inside a factory body.
fn neutralize_hashbang(text: &mut String) {
    if text.starts_with("#!") {
        text.replace_range(..2, "//");
    }
}

pub fn content_hash(code: &str) -> String {
    format!("{:x}", Sha256::digest(code.as_bytes()))
}
