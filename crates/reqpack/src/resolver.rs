use std::{
    cell::RefCell,
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::Deserialize;

use crate::{config::Config, error::BundleError};

/// Maps a specifier written in one file to the file it names
pub trait Resolver {
    /// Absolute path of the file `specifier` refers to when written in `from`.
    /// Fails with `BundleError::UnresolvableDependency`.
    fn resolve(&self, from: &Path, specifier: &str) -> Result<PathBuf>;
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Node-style resolution: relative and absolute paths with extension and `index` fallbacks,
/// and bare specifiers looked up in `node_modules` directories up the tree.
/// Core modules are not special-cased.
#[derive(Debug)]
pub struct NodeResolver {
    extensions: Vec<String>,
    /// (requesting directory, specifier) -> resolved path
    cache: RefCell<IndexMap<(PathBuf, String), PathBuf>>,
}

impl NodeResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            extensions: config.extensions.clone(),
            cache: RefCell::new(IndexMap::new()),
        }
    }

    fn is_path_specifier(specifier: &str) -> bool {
        specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier == "."
            || specifier == ".."
            || Path::new(specifier).is_absolute()
    }

    /// Try `path` as a file, then with each extension appended, then as a directory
    fn resolve_path(&self, path: &Path) -> Option<PathBuf> {
        self.resolve_as_file(path)
            .or_else(|| self.resolve_as_directory(path))
    }

    fn resolve_as_file(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        self.extensions.iter().find_map(|ext| {
            let mut candidate = OsString::from(path.as_os_str());
            candidate.push(".");
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            candidate.is_file().then_some(candidate)
        })
    }

    fn resolve_as_directory(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }
        if let Some(main) = read_package_main(dir) {
            let target = dir.join(&main);
            if let Some(found) = self
                .resolve_as_file(&target)
                .or_else(|| self.resolve_index(&target))
            {
                return Some(found);
            }
            warn!(
                "package.json in {} names missing main '{main}', falling back to index",
                dir.display()
            );
        }
        self.resolve_index(dir)
    }

    fn resolve_index(&self, dir: &Path) -> Option<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| dir.join(format!("index.{ext}")))
            .find(|candidate| candidate.is_file())
    }

    fn resolve_bare(&self, from_dir: &Path, specifier: &str) -> Option<PathBuf> {
        from_dir
            .ancestors()
            .map(|dir| dir.join("node_modules"))
            .filter(|modules| modules.is_dir())
            .find_map(|modules| self.resolve_path(&modules.join(specifier)))
    }
}

fn read_package_main(dir: &Path) -> Option<String> {
    let manifest_path = dir.join("package.json");
    let text = std::fs::read_to_string(&manifest_path).ok()?;
    match serde_json::from_str::<PackageManifest>(&text) {
        Ok(manifest) => manifest.main.filter(|main| !main.is_empty()),
        Err(e) => {
            warn!("Ignoring unreadable {}: {e}", manifest_path.display());
            None
        }
    }
}

impl Resolver for NodeResolver {
    fn resolve(&self, from: &Path, specifier: &str) -> Result<PathBuf> {
        let from_dir = from.parent().unwrap_or(from).to_path_buf();
        let key = (from_dir, specifier.to_owned());
        if let Some(cached) = self.cache.borrow().get(&key) {
            trace!("Resolver cache hit for '{specifier}' from {}", key.0.display());
            return Ok(cached.clone());
        }

        let found = if Self::is_path_specifier(specifier) {
            self.resolve_path(&key.0.join(specifier))
        } else {
            self.resolve_bare(&key.0, specifier)
        };

        let Some(found) = found else {
            return Err(BundleError::UnresolvableDependency {
                from: from.to_path_buf(),
                specifier: specifier.to_owned(),
            }
            .into());
        };
        let resolved = found.canonicalize().unwrap_or(found);
        debug!("Resolved '{specifier}' from {} to {}", from.display(), resolved.display());

        self.cache.borrow_mut().insert(key, resolved.clone());
        Ok(resolved)
    }
}
