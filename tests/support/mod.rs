#![allow(dead_code)]

use datapath::{
    Action, AttributeManager, AttributeOptimization, CapabilityKind, Cluster, DataDetails,
    DataFlow, DataInfo, Decision, DeploymentStatus, Environment, EvaluatorOutput, Infrastructure,
    InfrastructureElement, InfrastructureMetric, InstanceType, Interface, MetricType, Module,
    OptimizationDirective, RangeType, Region, SolveResult, Solution, Solver, SolverConfig,
    StorageAccount,
};
use serde_json::{Value, json};
use std::path::PathBuf;

pub const ARROW_FLIGHT: &str = "fybrik-arrow-flight";

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn module(name: &str, capabilities: Value) -> Module {
    serde_json::from_value(json!({
        "name": name,
        "version": "0.1.0",
        "capabilities": capabilities
    }))
    .expect("fixture module parses")
}

/// Reads s3/csv and serves it over arrow-flight; no governance actions.
pub fn read_csv_module() -> Module {
    module(
        "read-csv",
        json!([{
            "capability": "read",
            "scope": "workload",
            "api": {"protocol": ARROW_FLIGHT, "endpoint": "grpc://read-csv"},
            "supportedInterfaces": [{"source": {"protocol": "s3", "dataformat": "csv"}}]
        }]),
    )
}

/// Reads s3/parquet over arrow-flight and can redact.
pub fn read_parquet_module() -> Module {
    module(
        "read-parquet",
        json!([{
            "capability": "read",
            "scope": "workload",
            "api": {"protocol": ARROW_FLIGHT},
            "supportedInterfaces": [{"source": {"protocol": "s3", "dataformat": "parquet"}}],
            "actions": [{"name": "RedactAction"}]
        }]),
    )
}

/// Copies s3/csv (or db2) into s3/csv and can redact.
pub fn copy_csv_module() -> Module {
    module(
        "copy-csv",
        json!([{
            "capability": "copy",
            "supportedInterfaces": [
                {"source": {"protocol": "s3", "dataformat": "csv"},
                 "sink": {"protocol": "s3", "dataformat": "csv"}},
                {"source": {"protocol": "jdbc-db2"},
                 "sink": {"protocol": "s3", "dataformat": "csv"}}
            ],
            "actions": [{"name": "RedactAction"}, {"name": "RemoveAction"}]
        }]),
    )
}

/// Copies s3/csv into s3/parquet and can redact.
pub fn copy_csv_parquet_module() -> Module {
    module(
        "copy-csv-parquet",
        json!([{
            "capability": "copy",
            "supportedInterfaces": [
                {"source": {"protocol": "s3", "dataformat": "csv"},
                 "sink": {"protocol": "s3", "dataformat": "parquet"}}
            ],
            "actions": [{"name": "RedactAction"}]
        }]),
    )
}

/// Reads and writes s3/csv through arrow-flight.
pub fn read_write_module() -> Module {
    module(
        "read-write",
        json!([
            {
                "capability": "read",
                "scope": "workload",
                "api": {"protocol": ARROW_FLIGHT},
                "supportedInterfaces": [{"source": {"protocol": "s3", "dataformat": "csv"}}]
            },
            {
                "capability": "write",
                "scope": "workload",
                "api": {"protocol": ARROW_FLIGHT},
                "supportedInterfaces": [{"sink": {"protocol": "s3", "dataformat": "csv"}}]
            }
        ]),
    )
}

pub fn cluster(name: &str, region: &str) -> Cluster {
    Cluster::new(name, region)
}

pub fn account(name: &str, region: &str) -> StorageAccount {
    let mut account = StorageAccount::new(name, region);
    account.endpoint = Some(format!("http://s3.{region}.example"));
    account.secret_ref = Some(format!("{name}-credentials"));
    account
}

pub fn attribute(name: &str, object: InstanceType, instance: &str, value: impl ToString) -> InfrastructureElement {
    InfrastructureElement {
        name: name.to_string(),
        description: None,
        metric_name: None,
        value: value.to_string(),
        object,
        instance: Some(instance.to_string()),
        arguments: Vec::new(),
    }
}

/// Attribute measured in `metric`, whose scale is declared separately.
pub fn measured(
    name: &str,
    object: InstanceType,
    instance: &str,
    value: impl ToString,
    metric: &str,
) -> InfrastructureElement {
    InfrastructureElement {
        metric_name: Some(metric.to_string()),
        ..attribute(name, object, instance, value)
    }
}

pub fn distance(a: &str, b: &str, km: u32) -> InfrastructureElement {
    InfrastructureElement {
        name: "distance".to_string(),
        description: None,
        metric_name: None,
        value: km.to_string(),
        object: InstanceType::InterRegion,
        instance: None,
        arguments: vec![a.to_string(), b.to_string()],
    }
}

#[derive(Default)]
/// Mutable environment under construction; `build` freezes a snapshot.
pub struct EnvBuilder {
    pub modules: Vec<Module>,
    pub clusters: Vec<Cluster>,
    pub accounts: Vec<StorageAccount>,
    pub infrastructure: Infrastructure,
}

impl EnvBuilder {
    pub fn module(&mut self, module: Module) -> &mut Self {
        self.modules.push(module);
        self
    }

    pub fn cluster(&mut self, cluster: Cluster) -> &mut Self {
        self.clusters.push(cluster);
        self
    }

    pub fn account(&mut self, account: StorageAccount) -> &mut Self {
        self.accounts.push(account);
        self
    }

    pub fn attribute(&mut self, element: InfrastructureElement) -> &mut Self {
        self.infrastructure.attributes.push(element);
        self
    }

    pub fn metric(&mut self, name: &str, min: f64, max: f64) -> &mut Self {
        self.infrastructure.metrics.push(InfrastructureMetric {
            name: name.to_string(),
            metric_type: MetricType::Numeric,
            units: None,
            scale: Some(RangeType::new(Some(min), Some(max))),
        });
        self
    }

    pub fn build(&self) -> Environment {
        Environment::new(
            self.modules.clone(),
            self.clusters.clone(),
            self.accounts.clone(),
            AttributeManager::new(self.infrastructure.clone()),
        )
    }
}

fn decisions(pairs: &[(CapabilityKind, DeploymentStatus)]) -> EvaluatorOutput {
    pairs
        .iter()
        .cloned()
        .fold(EvaluatorOutput::default(), |output, (kind, status)| {
            output.with_decision(kind, Decision::deploy(status))
        })
}

/// s3/csv asset read by a workload over arrow-flight.
pub fn read_request() -> DataInfo {
    DataInfo {
        dataset_id: "s3/allow-dataset".to_string(),
        flow: DataFlow::Read,
        details: DataDetails {
            interface: Interface::new("s3", Some("csv")),
            geography: None,
        },
        requested_interface: Interface::new(ARROW_FLIGHT, None),
        configuration: decisions(&[
            (CapabilityKind::Read, DeploymentStatus::True),
            (CapabilityKind::Write, DeploymentStatus::False),
            (CapabilityKind::Delete, DeploymentStatus::False),
        ]),
        ..DataInfo::default()
    }
}

/// s3/csv asset ingested into new s3/csv storage.
pub fn copy_request() -> DataInfo {
    DataInfo {
        dataset_id: "ingest".to_string(),
        flow: DataFlow::Copy,
        details: DataDetails {
            interface: Interface::new("s3", Some("csv")),
            geography: None,
        },
        requested_interface: Interface::new("s3", Some("csv")),
        configuration: decisions(&[
            (CapabilityKind::Read, DeploymentStatus::False),
            (CapabilityKind::Write, DeploymentStatus::False),
            (CapabilityKind::Delete, DeploymentStatus::False),
            (CapabilityKind::Copy, DeploymentStatus::True),
        ]),
        ..DataInfo::default()
    }
}

/// Workload writing through arrow-flight; a new asset has no interface yet.
pub fn write_request(new_asset: bool) -> DataInfo {
    let interface = if new_asset {
        Interface::default()
    } else {
        Interface::new("s3", Some("csv"))
    };
    DataInfo {
        dataset_id: if new_asset { "new-asset" } else { "write" }.to_string(),
        flow: DataFlow::Write,
        details: DataDetails {
            interface,
            geography: None,
        },
        requested_interface: Interface::new(ARROW_FLIGHT, None),
        new_asset,
        configuration: decisions(&[
            (CapabilityKind::Read, DeploymentStatus::False),
            (CapabilityKind::Copy, DeploymentStatus::False),
            (CapabilityKind::Delete, DeploymentStatus::False),
            (CapabilityKind::Write, DeploymentStatus::True),
        ]),
        ..DataInfo::default()
    }
}

pub fn allow_region(request: &mut DataInfo, region: &str) {
    request
        .storage_requirements
        .insert(Region::new(region), Vec::new());
}

pub fn allow_region_with(request: &mut DataInfo, region: &str, actions: &[&str]) {
    request.storage_requirements.insert(
        Region::new(region),
        actions.iter().map(|name| Action::named(*name)).collect(),
    );
}

pub fn goal(attribute: &str, directive: OptimizationDirective, weight: f64) -> AttributeOptimization {
    AttributeOptimization::new(attribute, directive, weight)
}

pub fn solve(env: &Environment, request: &DataInfo) -> SolveResult<Solution> {
    Solver::new(env, SolverConfig::default()).solve(request)
}

pub fn module_names(solution: &Solution) -> Vec<&str> {
    solution.edges().map(|edge| edge.module_name()).collect()
}

/// Every required action appears on exactly one edge.
pub fn assert_actions_applied_once(solution: &Solution, request: &DataInfo) {
    for action in &request.actions {
        let count = solution
            .edges()
            .flat_map(|edge| edge.actions.iter())
            .filter(|applied| applied.name == action.name)
            .count();
        assert_eq!(count, 1, "{} applied {count} times in {solution}", action.name);
    }
}
