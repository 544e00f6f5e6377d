//! Data path construction and selection.
//!
//! Given a dataset's location and interface, the interface a workload (or a
//! copy destination) needs, the governance actions that must be applied, and a
//! snapshot of deployed modules, clusters and storage accounts, the solver
//! builds chains of module capabilities, validates them against admin-config
//! decisions and restrictions, and picks the best one according to weighted
//! infrastructure-attribute goals.
//!
//! Everything here is synchronous and side-effect free over the supplied
//! snapshot. Loading snapshots from disk is the only I/O and lives in the
//! `load` constructors.

pub mod adminconfig;
pub mod catalog;
pub mod config;
pub mod datapath;
pub mod environment;
pub mod error;
pub mod graph;
pub mod infrastructure;
pub mod optimizer;
pub mod paths;
pub mod restrictions;
pub mod solver;
pub mod validator;

mod schema_loader;

pub use adminconfig::{
    AttributeOptimization, Decision, DecisionPolicy, DeploymentStatus, EvaluatorOutput,
    OptimizationDirective, Restrictions,
};
pub use catalog::{
    Action, ActionName, Capability, CapabilityKind, CapabilityScope, Interface, Module,
    ModuleApi, ModuleCatalog, ModuleInOut, ModuleIndex, Region,
};
pub use config::SolverConfig;
pub use datapath::{DataDetails, DataFlow, DataInfo, Edge, Node, RawPath, ResolvedEdge, Solution};
pub use environment::Environment;
pub use error::{SolveError, SolveResult};
pub use graph::{CapabilityGraph, supports_sink, supports_source};
pub use infrastructure::{
    AttributeManager, Cluster, ClusterMetadata, Infrastructure, InfrastructureElement,
    InfrastructureMetric, InstanceType, MetricType, RangeType, StorageAccount,
};
pub use optimizer::Optimizer;
pub use paths::find_paths;
pub use restrictions::{Constraint, ModuleCapabilityRef, Restriction, RestrictionSubject, satisfies};
pub use solver::{DatasetOutcome, Solver};
pub use validator::{Rejection, Validator};
