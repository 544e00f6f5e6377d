//! Indexed view of a module catalog.
//!
//! The index keeps modules in registry order (path construction and the
//! "first satisfying" rules depend on it) and provides lookup by module name.
//! Loading from disk is strict about empty and duplicate names; building from
//! an in-memory registry keeps the first module of a given name.

use crate::catalog::model::{Capability, Module, ModuleCatalog};
use crate::schema_loader::{SchemaDefinition, read_validated};
use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
/// Module catalog plus a derived index keyed by module name.
pub struct ModuleIndex {
    modules: Vec<Arc<Module>>,
    by_name: BTreeMap<String, usize>,
}

impl ModuleIndex {
    /// Build an index from an in-memory registry, preserving its order.
    pub fn new(modules: impl IntoIterator<Item = Module>) -> Self {
        let mut index = ModuleIndex::default();
        for module in modules {
            if index.by_name.contains_key(&module.name) {
                tracing::warn!(module = %module.name, "duplicate module name; keeping first");
                continue;
            }
            index.by_name.insert(module.name.clone(), index.modules.len());
            index.modules.push(Arc::new(module));
        }
        index
    }

    /// Load and validate a module catalog from disk.
    ///
    /// The document is checked against the embedded schema, then module names
    /// must be non-empty and unique.
    pub fn load(path: &Path) -> Result<Self> {
        let value = read_validated(SchemaDefinition::ModuleCatalog, path)?;
        let catalog: ModuleCatalog = serde_json::from_value(value)
            .with_context(|| format!("decoding module catalog {}", path.display()))?;
        Self::from_catalog(catalog)
    }

    /// Strict construction used for catalogs read from disk.
    pub fn from_catalog(catalog: ModuleCatalog) -> Result<Self> {
        let mut index = ModuleIndex::default();
        for module in catalog.modules {
            if module.name.trim().is_empty() {
                bail!("encountered module with no name");
            }
            if index.by_name.contains_key(&module.name) {
                bail!("duplicate module name {}", module.name);
            }
            index.by_name.insert(module.name.clone(), index.modules.len());
            index.modules.push(Arc::new(module));
        }
        Ok(index)
    }

    /// Resolve a module by name.
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.by_name
            .get(name)
            .and_then(|&position| self.modules.get(position))
            .map(|module| module.as_ref())
    }

    /// Resolve a capability by module name and capability index.
    pub fn capability(&self, module: &str, index: usize) -> Option<&Capability> {
        self.module(module).and_then(|module| module.capability(index))
    }

    /// Modules in registry order.
    pub fn modules(&self) -> &[Arc<Module>] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
