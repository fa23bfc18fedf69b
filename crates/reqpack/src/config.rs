//! Bundler configuration
//!
//! Layers, later overriding earlier: defaults, user config file, project `reqpack.toml`
//! (or an explicit file), `REQPACK_*` environment variables, then CLI flags applied by the
//! caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use indexmap::IndexSet;
use log::debug;
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "reqpack.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Project root; defaults to the entry file's directory
    pub root: Option<PathBuf>,
    /// File extensions without the leading dot, in resolution order
    pub extensions: Vec<String>,
    /// Run the ESM syntax normalizer on every file before bundling
    pub transform_esm: bool,
    /// Directory names skipped while crawling the project
    pub ignore_dirs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            extensions: vec!["js".to_owned()],
            transform_esm: true,
            ignore_dirs: vec!["node_modules".to_owned(), ".git".to_owned()],
        }
    }
}

/// On-disk representation; every field is optional so files only override what they name
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigFile {
    root: Option<PathBuf>,
    extensions: Option<Vec<String>>,
    transform_esm: Option<bool>,
    ignore_dirs: Option<Vec<String>>,
}

impl Config {
    /// Load configuration for a project rooted at `project_dir`
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_file) = crate::dirs::user_config_file()
            && user_file.is_file()
        {
            config.merge_file(&user_file)?;
        }

        match explicit {
            Some(path) => config.merge_file(path)?,
            None => {
                let project_file = project_dir.join(CONFIG_FILE_NAME);
                if project_file.is_file() {
                    config.merge_file(&project_file)?;
                }
            }
        }

        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.normalize_extensions();
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());

        if let Some(root) = file.root {
            // Relative roots are relative to the file that names them
            self.root = Some(match path.parent() {
                Some(dir) if root.is_relative() => dir.join(root),
                _ => root,
            });
        }
        if let Some(extensions) = file.extensions {
            self.extensions = extensions;
        }
        if let Some(transform_esm) = file.transform_esm {
            self.transform_esm = transform_esm;
        }
        if let Some(ignore_dirs) = file.ignore_dirs {
            self.ignore_dirs = ignore_dirs;
        }
        Ok(())
    }

    /// Apply `REQPACK_*` overrides read through `lookup`
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(extensions) = lookup("REQPACK_EXTENSIONS") {
            self.extensions = extensions
                .split(',')
                .map(str::trim)
                .filter(|ext| !ext.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }
        if let Some(root) = lookup("REQPACK_ROOT")
            && !root.is_empty()
        {
            self.root = Some(PathBuf::from(root));
        }
        if let Some(value) = lookup("REQPACK_TRANSFORM_ESM") {
            self.transform_esm = match value.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                other => bail!("Invalid REQPACK_TRANSFORM_ESM value '{other}'"),
            };
        }
        Ok(())
    }

    /// Strip leading dots and drop duplicates, keeping first-seen order
    pub fn normalize_extensions(&mut self) {
        let unique: IndexSet<String> = self
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_owned())
            .filter(|ext| !ext.is_empty())
            .collect();
        self.extensions = unique.into_iter().collect();
    }

    /// Whether `path` carries one of the configured extensions
    pub fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}
