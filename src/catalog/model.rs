//! Deserializable representation of the module catalog.
//!
//! The types mirror the module manifests published by the module registry so
//! the solver can reason about capabilities without ad-hoc JSON handling. Use
//! `ModuleIndex` for ordered lookup; use these structs when the full module
//! surface is required (interfaces, API, actions).

use crate::catalog::identity::{ActionName, CapabilityKind, CapabilityScope};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
/// Module catalog as stored on disk.
pub struct ModuleCatalog {
    #[serde(default)]
    pub modules: Vec<Module>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
/// How data is accessed: a protocol plus an optional data format.
///
/// An unset format matches any format on the other side.
pub struct Interface {
    pub protocol: String,
    #[serde(rename = "dataformat", default, skip_serializing_if = "Option::is_none")]
    pub data_format: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
/// One supported (source, sink) pair of a capability.
pub struct ModuleInOut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Interface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<Interface>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
/// Workload-facing API exposed when a capability terminates at a virtual endpoint.
pub struct ModuleApi {
    #[serde(flatten)]
    pub interface: Interface,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
/// Governance action, either required on a dataset or supported by a capability.
pub struct Action {
    pub name: ActionName,
    /// Action arguments, e.g. the columns to redact.
    #[serde(flatten)]
    pub arguments: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// A typed function a module can perform.
pub struct Capability {
    pub capability: CapabilityKind,
    #[serde(default)]
    pub scope: CapabilityScope,
    #[serde(default)]
    pub supported_interfaces: Vec<ModuleInOut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ModuleApi>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
/// A named, versioned deployable unit with an ordered list of capabilities.
pub struct Module {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Free-form module metadata reachable from module restrictions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub labels: Map<String, Value>,
}

impl Interface {
    pub fn new(protocol: impl Into<String>, data_format: Option<&str>) -> Self {
        Self {
            protocol: protocol.into(),
            data_format: data_format.map(str::to_string),
        }
    }

    /// Protocols must be equal; formats must be equal unless either is unset.
    pub fn matches(&self, other: &Interface) -> bool {
        if self.protocol != other.protocol {
            return false;
        }
        match (non_empty(&self.data_format), non_empty(&other.data_format)) {
            (Some(lhs), Some(rhs)) => lhs == rhs,
            _ => true,
        }
    }
}

fn non_empty(format: &Option<String>) -> Option<&str> {
    format.as_deref().filter(|f| !f.is_empty())
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match non_empty(&self.data_format) {
            Some(format) => write!(f, "{}/{}", self.protocol, format),
            None => f.write_str(&self.protocol),
        }
    }
}

impl Action {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: ActionName::new(name),
            arguments: Map::new(),
        }
    }
}

impl Capability {
    /// Whether the capability declares an action with the given name.
    pub fn supports_action(&self, name: &ActionName) -> bool {
        self.actions.iter().any(|action| &action.name == name)
    }

    /// Distinct source interfaces in declaration order.
    pub fn source_interfaces(&self) -> Vec<&Interface> {
        let mut sources: Vec<&Interface> = Vec::new();
        for inout in &self.supported_interfaces {
            if let Some(source) = &inout.source {
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
        }
        sources
    }
}

impl Module {
    pub fn capability(&self, index: usize) -> Option<&Capability> {
        self.capabilities.get(index)
    }
}
