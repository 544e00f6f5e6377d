//! Output of the admin-config evaluator as consumed by the solver.
//!
//! The evaluator decides, per capability kind, whether the capability must,
//! must not, or may be deployed, and where; it also supplies the weighted
//! optimization goals. Evaluation itself happens elsewhere.

use crate::catalog::identity::CapabilityKind;
use crate::restrictions::Restriction;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
/// Tri-state deploy decision: True = require, False = forbid, Unknown = allow.
pub enum DeploymentStatus {
    True,
    False,
    #[default]
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
/// Placement restrictions on modules, clusters and storage accounts.
pub struct Restrictions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<Restriction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<Restriction>,
    #[serde(
        rename = "storageAccounts",
        alias = "storageaccounts",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub storage_accounts: Vec<Restriction>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
/// Justification for a decision.
pub struct DecisionPolicy {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "policySetID", default, skip_serializing_if = "Option::is_none")]
    pub policy_set_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Decision {
    #[serde(default)]
    pub deploy: DeploymentStatus,
    #[serde(default)]
    pub restrictions: Restrictions,
    #[serde(default)]
    pub policy: DecisionPolicy,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum OptimizationDirective {
    #[serde(rename = "min")]
    Minimize,
    #[serde(rename = "max")]
    Maximize,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
/// A weighted goal on one infrastructure attribute.
pub struct AttributeOptimization {
    pub attribute: String,
    pub directive: OptimizationDirective,
    /// In [0, 1]. Accepts a number or a numeric string; defaults to 1.0.
    #[serde(default = "default_weight", deserialize_with = "deserialize_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

fn deserialize_weight<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| D::Error::custom("weight is not a finite number")),
        Value::String(text) if text.trim().is_empty() => Ok(default_weight()),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|err| D::Error::custom(format!("invalid weight '{text}': {err}"))),
        other => Err(D::Error::custom(format!("invalid weight {other}"))),
    }
}

impl AttributeOptimization {
    pub fn new(attribute: impl Into<String>, directive: OptimizationDirective, weight: f64) -> Self {
        Self {
            attribute: attribute.into(),
            directive,
            weight,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
/// Decisions per capability kind plus the ordered optimization goals.
pub struct EvaluatorOutput {
    #[serde(default)]
    pub decisions: BTreeMap<CapabilityKind, Decision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optimization: Vec<AttributeOptimization>,
}

impl EvaluatorOutput {
    /// Decision for a kind; kinds without a decision are `Unknown` and unrestricted.
    pub fn decision(&self, kind: &CapabilityKind) -> Option<&Decision> {
        self.decisions.get(kind)
    }

    pub fn deploy(&self, kind: &CapabilityKind) -> DeploymentStatus {
        self.decision(kind)
            .map(|decision| decision.deploy)
            .unwrap_or_default()
    }

    pub fn restrictions(&self, kind: &CapabilityKind) -> Option<&Restrictions> {
        self.decision(kind).map(|decision| &decision.restrictions)
    }

    pub fn cluster_restrictions(&self, kind: &CapabilityKind) -> &[Restriction] {
        self.restrictions(kind)
            .map(|r| r.clusters.as_slice())
            .unwrap_or_default()
    }

    pub fn module_restrictions(&self, kind: &CapabilityKind) -> &[Restriction] {
        self.restrictions(kind)
            .map(|r| r.modules.as_slice())
            .unwrap_or_default()
    }

    pub fn storage_restrictions(&self, kind: &CapabilityKind) -> &[Restriction] {
        self.restrictions(kind)
            .map(|r| r.storage_accounts.as_slice())
            .unwrap_or_default()
    }

    /// Kinds that must appear in every solution.
    pub fn required_kinds(&self) -> impl Iterator<Item = &CapabilityKind> {
        self.decisions
            .iter()
            .filter(|(_, decision)| decision.deploy == DeploymentStatus::True)
            .map(|(kind, _)| kind)
    }

    /// Builder used by callers assembling decisions in code.
    pub fn with_decision(mut self, kind: CapabilityKind, decision: Decision) -> Self {
        self.decisions.insert(kind, decision);
        self
    }

    pub fn with_goal(mut self, goal: AttributeOptimization) -> Self {
        self.optimization.push(goal);
        self
    }
}

impl Decision {
    pub fn deploy(status: DeploymentStatus) -> Self {
        Self {
            deploy: status,
            ..Self::default()
        }
    }
}
