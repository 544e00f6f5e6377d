//! Capability graph: the module capabilities eligible for one request and the
//! interface rules that connect them.

use crate::adminconfig::{DeploymentStatus, EvaluatorOutput};
use crate::catalog::model::{Capability, Interface, Module};
use crate::datapath::{Edge, Node};
use crate::environment::Environment;
use crate::restrictions::{ModuleCapabilityRef, satisfies};
use std::sync::Arc;

/// Whether `capability` can write to `node`.
///
/// Virtual nodes match the capability's API; physical nodes match a declared
/// sink interface.
pub fn supports_sink(capability: &Capability, node: &Node) -> bool {
    if node.is_virtual {
        return api_matches(capability, &node.interface);
    }
    capability
        .supported_interfaces
        .iter()
        .filter_map(|inout| inout.sink.as_ref())
        .any(|sink| sink.matches(&node.interface))
}

/// Whether `capability` can read from `node`.
pub fn supports_source(capability: &Capability, node: &Node) -> bool {
    if node.is_virtual {
        return api_matches(capability, &node.interface);
    }
    capability
        .supported_interfaces
        .iter()
        .filter_map(|inout| inout.source.as_ref())
        .any(|source| source.matches(&node.interface))
}

fn api_matches(capability: &Capability, interface: &Interface) -> bool {
    capability
        .api
        .as_ref()
        .is_some_and(|api| api.interface.matches(interface))
}

/// A physical node with no protocol stands for "any interface"; it is used
/// for new assets whose format is chosen by the writing module.
pub fn is_wildcard(node: &Node) -> bool {
    !node.is_virtual && node.interface.protocol.is_empty()
}

/// Concrete sink nodes through which `capability` can reach `node`.
pub(crate) fn sink_nodes(capability: &Capability, node: &Node) -> Vec<Node> {
    if !is_wildcard(node) {
        return if supports_sink(capability, node) {
            vec![node.clone()]
        } else {
            Vec::new()
        };
    }
    let mut sinks: Vec<Node> = Vec::new();
    for sink in capability
        .supported_interfaces
        .iter()
        .filter_map(|inout| inout.sink.as_ref())
    {
        let candidate = Node::physical(sink.clone());
        if !sinks.contains(&candidate) {
            sinks.push(candidate);
        }
    }
    sinks
}

#[derive(Clone, Debug)]
/// One eligible (module, capability) pair.
pub struct GraphEntry {
    pub(crate) module: Arc<Module>,
    pub(crate) capability_index: usize,
}

impl GraphEntry {
    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn capability(&self) -> &Capability {
        &self.module.capabilities[self.capability_index]
    }

    pub fn edge(&self, source: Node, sink: Node) -> Edge {
        Edge {
            source,
            sink,
            module: Arc::clone(&self.module),
            capability_index: self.capability_index,
        }
    }
}

#[derive(Clone, Debug, Default)]
/// Capabilities that path construction may use, in registry order.
pub struct CapabilityGraph {
    entries: Vec<GraphEntry>,
}

impl CapabilityGraph {
    /// Every capability of every module whose kind is not forbidden and
    /// which passes the module restrictions for its kind.
    pub fn build(env: &Environment, configuration: &EvaluatorOutput) -> Self {
        let mut entries = Vec::new();
        for module in env.modules.modules() {
            for (capability_index, capability) in module.capabilities.iter().enumerate() {
                let kind = &capability.capability;
                if configuration.deploy(kind) == DeploymentStatus::False {
                    continue;
                }
                let subject = ModuleCapabilityRef {
                    module,
                    capability,
                };
                if !satisfies(configuration.module_restrictions(kind), &subject, &env.attributes) {
                    tracing::debug!(
                        module = %module.name,
                        capability = %kind,
                        "capability excluded by module restrictions"
                    );
                    continue;
                }
                entries.push(GraphEntry {
                    module: Arc::clone(module),
                    capability_index,
                });
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[GraphEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adminconfig::Decision;
    use crate::catalog::identity::CapabilityKind;
    use crate::infrastructure::AttributeManager;
    use crate::restrictions::Restriction;
    use serde_json::json;

    fn capability(value: serde_json::Value) -> Capability {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn virtual_nodes_match_the_api_only() {
        let read = capability(json!({
            "capability": "read",
            "api": {"protocol": "fybrik-arrow-flight"},
            "supportedInterfaces": [{"source": {"protocol": "s3", "dataformat": "csv"}}]
        }));
        let flight = Interface::new("fybrik-arrow-flight", None);
        assert!(supports_sink(&read, &Node::api(flight.clone())));
        assert!(!supports_sink(&read, &Node::physical(flight)));
        let csv = Interface::new("s3", Some("csv"));
        assert!(supports_source(&read, &Node::physical(csv.clone())));
        assert!(!supports_source(&read, &Node::api(csv)));
        assert!(!supports_source(
            &read,
            &Node::physical(Interface::new("s3", Some("parquet")))
        ));
    }

    #[test]
    fn wildcard_sink_expands_to_declared_sinks() {
        let write = capability(json!({
            "capability": "write",
            "supportedInterfaces": [
                {"sink": {"protocol": "s3", "dataformat": "parquet"}},
                {"sink": {"protocol": "s3", "dataformat": "parquet"}},
                {"sink": {"protocol": "s3", "dataformat": "csv"}}
            ]
        }));
        let wildcard = Node::physical(Interface::default());
        assert!(is_wildcard(&wildcard));
        assert_eq!(sink_nodes(&write, &wildcard).len(), 2);
        let csv = Node::physical(Interface::new("s3", Some("csv")));
        assert_eq!(sink_nodes(&write, &csv), vec![csv.clone()]);
    }

    #[test]
    fn forbidden_kinds_and_restricted_modules_are_excluded() {
        let modules: Vec<Module> = serde_json::from_value(json!([
            {"name": "reader", "capabilities": [
                {"capability": "read", "scope": "asset"},
                {"capability": "copy"}
            ]},
            {"name": "workload-reader", "capabilities": [
                {"capability": "read", "scope": "workload"}
            ]}
        ]))
        .unwrap();
        let env = Environment::new(modules, Vec::new(), Vec::new(), AttributeManager::default());
        let mut read = Decision::deploy(DeploymentStatus::True);
        read.restrictions.modules = vec![Restriction::values("capabilities.scope", ["workload"])];
        let configuration = EvaluatorOutput::default()
            .with_decision(CapabilityKind::Read, read)
            .with_decision(CapabilityKind::Copy, Decision::deploy(DeploymentStatus::False));
        let graph = CapabilityGraph::build(&env, &configuration);
        let names: Vec<&str> = graph
            .entries()
            .iter()
            .map(|entry| entry.module.name.as_str())
            .collect();
        assert_eq!(names, vec!["workload-reader"]);
    }

    #[test]
    fn graph_edges_resolve_their_declared_capability() {
        let modules: Vec<Module> = serde_json::from_value(json!([
            {"name": "read-write", "capabilities": [
                {"capability": "read", "api": {"protocol": "fybrik-arrow-flight"}},
                {"capability": "write", "supportedInterfaces": [
                    {"sink": {"protocol": "s3", "dataformat": "csv"}}
                ]}
            ]},
            {"name": "idle", "capabilities": []}
        ]))
        .unwrap();
        let env = Environment::new(modules, Vec::new(), Vec::new(), AttributeManager::default());
        let graph = CapabilityGraph::build(&env, &EvaluatorOutput::default());
        assert_eq!(graph.entries().len(), 2);
        let node = Node::physical(Interface::new("s3", Some("csv")));
        for entry in graph.entries() {
            let edge = entry.edge(node.clone(), node.clone());
            assert_eq!(edge.module().name, "read-write");
            assert_eq!(edge.kind(), &entry.capability().capability);
        }
        let kinds: Vec<&CapabilityKind> = graph
            .entries()
            .iter()
            .map(|entry| &entry.capability().capability)
            .collect();
        assert_eq!(kinds, vec![&CapabilityKind::Read, &CapabilityKind::Write]);
    }
}
