//! Placement restrictions and the predicate evaluator.
//!
//! A restriction names a property and constrains it to a numeric range or to a
//! set of allowed values. The property is resolved first as an infrastructure
//! attribute of the subject, then as a dotted path into the subject's own
//! fields. Each subject type exposes its fields through an explicit accessor.

use crate::catalog::model::{Capability, Module};
use crate::infrastructure::{AttributeManager, Cluster, InstanceType, RangeType, StorageAccount};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    Range(RangeType),
    /// Disjunction of allowed values; an empty list allows anything.
    Values(Vec<String>),
    /// The property only needs to resolve.
    Present,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(from = "RestrictionRepr", into = "RestrictionRepr")]
pub struct Restriction {
    pub property: String,
    pub constraint: Constraint,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct RestrictionRepr {
    property: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<RangeType>,
}

impl From<RestrictionRepr> for Restriction {
    fn from(repr: RestrictionRepr) -> Self {
        let constraint = match (repr.range, repr.values.is_empty()) {
            (Some(range), _) => Constraint::Range(range),
            (None, false) => Constraint::Values(repr.values),
            (None, true) => Constraint::Present,
        };
        Restriction {
            property: repr.property,
            constraint,
        }
    }
}

impl From<Restriction> for RestrictionRepr {
    fn from(restriction: Restriction) -> Self {
        let (values, range) = match restriction.constraint {
            Constraint::Range(range) => (Vec::new(), Some(range)),
            Constraint::Values(values) => (values, None),
            Constraint::Present => (Vec::new(), None),
        };
        RestrictionRepr {
            property: restriction.property,
            values,
            range,
        }
    }
}

/// An object restrictions can be evaluated against.
pub trait RestrictionSubject {
    /// Kind used to look up infrastructure attributes for this subject.
    const INSTANCE_TYPE: InstanceType;

    /// Instance name used to look up infrastructure attributes.
    fn instance_name(&self) -> &str;

    /// Resolve a dotted property path on the subject's own fields.
    fn property(&self, path: &str) -> Option<Value>;
}

/// A module capability as seen by module restrictions.
#[derive(Clone, Copy, Debug)]
pub struct ModuleCapabilityRef<'a> {
    pub module: &'a Module,
    pub capability: &'a Capability,
}

impl Restriction {
    pub fn range(property: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            property: property.into(),
            constraint: Constraint::Range(RangeType::new(min, max)),
        }
    }

    pub fn values<I, S>(property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            property: property.into(),
            constraint: Constraint::Values(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Evaluate the restriction; a missing or unparseable value fails.
    pub fn satisfied_by<S: RestrictionSubject>(&self, subject: &S, attrs: &AttributeManager) -> bool {
        let value = attrs
            .value(&self.property, S::INSTANCE_TYPE, subject.instance_name())
            .map(|raw| Value::String(raw.to_string()))
            .or_else(|| subject.property(&self.property))
            .filter(|value| !value.is_null());
        let Some(value) = value else {
            return false;
        };
        match &self.constraint {
            Constraint::Range(range) => numeric(&value).is_some_and(|number| range.contains(number)),
            Constraint::Values(allowed) => {
                allowed.is_empty()
                    || scalar_string(&value)
                        .is_some_and(|actual| allowed.iter().any(|candidate| *candidate == actual))
            }
            Constraint::Present => true,
        }
    }
}

/// Whether the subject satisfies every restriction in the list.
pub fn satisfies<S: RestrictionSubject>(
    restrictions: &[Restriction],
    subject: &S,
    attrs: &AttributeManager,
) -> bool {
    restrictions
        .iter()
        .all(|restriction| restriction.satisfied_by(subject, attrs))
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Follow a dotted path through objects; numeric segments index arrays.
pub(crate) fn lookup_path<'v>(root: &'v Map<String, Value>, path: &str) -> Option<&'v Value> {
    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn string(value: &str) -> Option<Value> {
    Some(Value::String(value.to_string()))
}

impl RestrictionSubject for Cluster {
    const INSTANCE_TYPE: InstanceType = InstanceType::Cluster;

    fn instance_name(&self) -> &str {
        &self.name
    }

    fn property(&self, path: &str) -> Option<Value> {
        match path {
            "name" => string(&self.name),
            "metadata.region" => string(self.metadata.region.as_str()),
            "metadata.zone" => self.metadata.zone.as_deref().and_then(string),
            _ => path
                .strip_prefix("metadata.")
                .and_then(|rest| lookup_path(&self.metadata.extra, rest))
                .cloned(),
        }
    }
}

impl RestrictionSubject for StorageAccount {
    const INSTANCE_TYPE: InstanceType = InstanceType::StorageAccount;

    fn instance_name(&self) -> &str {
        &self.name
    }

    fn property(&self, path: &str) -> Option<Value> {
        match path {
            "name" => string(&self.name),
            "id" => self.id.as_deref().and_then(string),
            "region" => string(self.region.as_str()),
            "endpoint" => self.endpoint.as_deref().and_then(string),
            "secretRef" => self.secret_ref.as_deref().and_then(string),
            _ => lookup_path(&self.extra, path).cloned(),
        }
    }
}

impl RestrictionSubject for ModuleCapabilityRef<'_> {
    const INSTANCE_TYPE: InstanceType = InstanceType::Module;

    fn instance_name(&self) -> &str {
        &self.module.name
    }

    fn property(&self, path: &str) -> Option<Value> {
        match path {
            "name" => string(&self.module.name),
            "version" => self.module.version.as_deref().and_then(string),
            "capabilities.capability" => string(self.capability.capability.as_str()),
            "capabilities.scope" => string(self.capability.scope.as_str()),
            _ => {
                let path = path.strip_prefix("labels.").unwrap_or(path);
                lookup_path(&self.module.labels, path).cloned()
            }
        }
    }
}
