//! Data path model: graph nodes and edges, resolved edges, solutions, and the
//! per-dataset request the solver works on.

use crate::adminconfig::EvaluatorOutput;
use crate::catalog::identity::{CapabilityKind, Region};
use crate::catalog::model::{Action, Capability, Interface, Module};
use crate::infrastructure::{Cluster, StorageAccount};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
/// A connection point in the capability graph.
pub struct Node {
    pub interface: Interface,
    /// Workload-facing API rather than a physical store.
    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
}

impl Node {
    pub fn physical(interface: Interface) -> Self {
        Self {
            interface,
            is_virtual: false,
        }
    }

    pub fn api(interface: Interface) -> Self {
        Self {
            interface,
            is_virtual: true,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_virtual {
            write!(f, "api:{}", self.interface)
        } else {
            write!(f, "{}", self.interface)
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
/// One traversal of a module capability.
pub struct Edge {
    pub source: Node,
    pub sink: Node,
    #[serde(serialize_with = "serialize_module_name")]
    pub(crate) module: Arc<Module>,
    pub(crate) capability_index: usize,
}

fn serialize_module_name<S>(module: &Arc<Module>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&module.name)
}

impl Edge {
    /// The capability this edge traverses.
    ///
    /// Edges are only built inside the crate, from capabilities that exist
    /// on their module.
    pub fn capability(&self) -> &Capability {
        &self.module.capabilities[self.capability_index]
    }

    pub fn kind(&self) -> &CapabilityKind {
        &self.capability().capability
    }

    pub fn module(&self) -> &Module {
        &self.module
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {} -> {}",
            self.module.name,
            self.kind(),
            self.source,
            self.sink
        )
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
/// An edge with its governance actions and placement.
pub struct ResolvedEdge {
    #[serde(flatten)]
    pub edge: Edge,
    pub actions: Vec<Action>,
    pub cluster: Cluster,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_account: Option<StorageAccount>,
}

impl ResolvedEdge {
    pub fn module_name(&self) -> &str {
        &self.edge.module.name
    }

    pub fn kind(&self) -> &CapabilityKind {
        self.edge.kind()
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|action| action.name.as_str()).collect()
    }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
/// A complete, validated data path from the data to its destination.
pub struct Solution {
    pub data_path: Vec<ResolvedEdge>,
}

impl Solution {
    pub fn len(&self) -> usize {
        self.data_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_path.is_empty()
    }

    pub fn edges(&self) -> impl Iterator<Item = &ResolvedEdge> {
        self.data_path.iter()
    }

    /// Clusters hosting each edge, in path order.
    pub fn clusters(&self) -> Vec<&str> {
        self.data_path
            .iter()
            .map(|edge| edge.cluster.name.as_str())
            .collect()
    }

    /// Storage accounts allocated along the path, in path order.
    pub fn storage_accounts(&self) -> Vec<&str> {
        self.data_path
            .iter()
            .filter_map(|edge| edge.storage_account.as_ref())
            .map(|account| account.name.as_str())
            .collect()
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, edge) in self.data_path.iter().enumerate() {
            if position > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}@{}", edge.edge, edge.cluster.name)?;
        }
        Ok(())
    }
}

/// Unvalidated chain of edges produced by path construction.
pub type RawPath = Vec<Edge>;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
/// What the workload does with the dataset.
pub enum DataFlow {
    /// Workload reads the asset through a module API.
    #[default]
    Read,
    /// Workload writes the asset through a module API.
    Write,
    /// Asset is copied to a new physical location.
    Copy,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// Where and how the dataset is stored.
pub struct DataDetails {
    pub interface: Interface,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<Region>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// Everything the solver needs to know about one dataset.
pub struct DataInfo {
    pub dataset_id: String,
    #[serde(default)]
    pub flow: DataFlow,
    pub details: DataDetails,
    /// Interface the workload uses (read/write) or the copy destination.
    pub requested_interface: Interface,
    /// Write flow into an asset that does not exist yet.
    #[serde(default)]
    pub new_asset: bool,
    /// Governance actions that must be applied exactly once on the path.
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub configuration: EvaluatorOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_cluster: Option<Cluster>,
    /// Regions where writing is permitted, with the actions required when
    /// data is written there.
    #[serde(default)]
    pub storage_requirements: BTreeMap<Region, Vec<Action>>,
}

impl DataInfo {
    /// Endpoints of the path for this dataset's flow.
    pub fn endpoints(&self) -> (Node, Node) {
        match self.flow {
            DataFlow::Read => (
                Node::physical(self.details.interface.clone()),
                Node::api(self.requested_interface.clone()),
            ),
            DataFlow::Copy => (
                Node::physical(self.details.interface.clone()),
                Node::physical(self.requested_interface.clone()),
            ),
            DataFlow::Write => (
                Node::api(self.requested_interface.clone()),
                Node::physical(self.details.interface.clone()),
            ),
        }
    }

    /// Whether the final sink of a path is the asset's existing location.
    ///
    /// Writing into an existing asset reuses its storage; every other
    /// physical sink needs an allocated account.
    pub fn final_sink_is_existing_asset(&self) -> bool {
        self.flow == DataFlow::Write && !self.new_asset
    }
}
