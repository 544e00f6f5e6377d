//! Module catalog wiring.
//!
//! Types here mirror the module manifests published by the module registry;
//! callers use `ModuleIndex` for ordered, validated lookup.

pub mod identity;
pub mod index;
pub mod model;

pub use identity::{ActionName, CapabilityKind, CapabilityScope, Region};
pub use index::ModuleIndex;
pub use model::{Action, Capability, Interface, Module, ModuleApi, ModuleCatalog, ModuleInOut};

