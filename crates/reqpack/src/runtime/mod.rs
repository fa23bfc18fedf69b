//! Runtime loader
//!
//! `PRELUDE` is the JavaScript loader emitted at the top of every bundle. `Loader` is the same
//! state machine in Rust (`Unregistered -> Registered -> Instantiating -> Cached`), used to pin
//! down the loader contract without a JavaScript engine.

use std::{cell::RefCell, fmt, rc::Rc};

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::module_graph::ModuleId;

/// Loader bootstrap placed before the module units; defines `define` and `requireModule`
pub const PRELUDE: &str = include_str!("prelude.js");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    #[error("Module {0} is already defined")]
    DuplicateDefinition(ModuleId),
    #[error("Module {0} does not exist")]
    UnknownModule(ModuleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unregistered,
    Registered,
    Instantiating,
    Cached,
}

/// Shared `module.exports` slot; replacing the value models `module.exports = ...`
pub type ExportsHolder<V> = Rc<RefCell<V>>;

type Factory<V> = Rc<dyn Fn(&ExportsHolder<V>, &mut Loader<V>) -> Result<(), LoaderError>>;

pub struct Loader<V> {
    definitions: FxHashMap<ModuleId, Factory<V>>,
    /// Keyed by id and filled before the factory runs
    instantiated: FxHashMap<ModuleId, ExportsHolder<V>>,
    instantiating: FxHashSet<ModuleId>,
}

impl<V> fmt::Debug for Loader<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("defined", &self.definitions.len())
            .field("instantiated", &self.instantiated.len())
            .field("instantiating", &self.instantiating)
            .finish()
    }
}

impl<V> Default for Loader<V> {
    fn default() -> Self {
        Self {
            definitions: FxHashMap::default(),
            instantiated: FxHashMap::default(),
            instantiating: FxHashSet::default(),
        }
    }
}

impl<V: Default + 'static> Loader<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory. A second definition for the same id is rejected.
    pub fn define<F>(&mut self, id: ModuleId, factory: F) -> Result<(), LoaderError>
    where
        F: Fn(&ExportsHolder<V>, &mut Self) -> Result<(), LoaderError> + 'static,
    {
        if self.definitions.contains_key(&id) {
            return Err(LoaderError::DuplicateDefinition(id));
        }
        self.definitions.insert(id, Rc::new(factory));
        Ok(())
    }

    /// Exports of module `id`, running its factory on first use.
    ///
    /// A require issued while `id` is still instantiating (a cycle) gets the partially filled
    /// holder instead of a second factory run. If the factory fails, the module returns to
    /// `Registered` and the error propagates.
    pub fn require_module(&mut self, id: ModuleId) -> Result<ExportsHolder<V>, LoaderError> {
        if let Some(exports) = self.instantiated.get(&id) {
            return Ok(Rc::clone(exports));
        }
        let factory = self
            .definitions
            .get(&id)
            .cloned()
            .ok_or(LoaderError::UnknownModule(id))?;

        let exports = Rc::new(RefCell::new(V::default()));
        self.instantiated.insert(id, Rc::clone(&exports));
        self.instantiating.insert(id);
        let result = factory(&exports, self);
        self.instantiating.remove(&id);

        if let Err(error) = result {
            self.instantiated.remove(&id);
            return Err(error);
        }
        Ok(exports)
    }

    pub fn state(&self, id: ModuleId) -> ModuleState {
        if self.instantiating.contains(&id) {
            ModuleState::Instantiating
        } else if self.instantiated.contains_key(&id) {
            ModuleState::Cached
        } else if self.definitions.contains_key(&id) {
            ModuleState::Registered
        } else {
            ModuleState::Unregistered
        }
    }
}
