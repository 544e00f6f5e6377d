//! Clusters, storage accounts and the infrastructure attributes attached to them.
//!
//! Infrastructure attributes are named metrics kept outside the objects they
//! describe (cost, bandwidth, distance between regions). They are consulted by
//! placement restrictions and by the optimizer.

use crate::catalog::identity::Region;
use crate::schema_loader::{SchemaDefinition, read_validated};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
/// Compute cluster that can host module instances.
pub struct Cluster {
    pub name: String,
    pub metadata: ClusterMetadata,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ClusterMetadata {
    pub region: Region,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Any other metadata published by the cluster registry.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// Storage that a copy or write step can allocate data in.
pub struct StorageAccount {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub region: Region,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cluster {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: ClusterMetadata {
                region: Region::new(region),
                zone: None,
                extra: Map::new(),
            },
        }
    }

    pub fn region(&self) -> &Region {
        &self.metadata.region
    }
}

impl StorageAccount {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            region: Region::new(region),
            endpoint: None,
            secret_ref: None,
            extra: Map::new(),
        }
    }
}

/// Kind of object an infrastructure attribute is attached to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum InstanceType {
    #[serde(rename = "fybrikmodule")]
    Module,
    #[serde(rename = "cluster")]
    Cluster,
    #[serde(rename = "fybrikstorageaccount")]
    StorageAccount,
    #[serde(rename = "inter-region")]
    InterRegion,
}

impl InstanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceType::Module => "fybrikmodule",
            InstanceType::Cluster => "cluster",
            InstanceType::StorageAccount => "fybrikstorageaccount",
            InstanceType::InterRegion => "inter-region",
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
/// Numeric interval; an unset bound is open.
pub struct RangeType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RangeType {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    /// Map `value` into [0, 1] relative to the closed interval.
    ///
    /// Returns `None` unless both bounds are set; a degenerate interval maps
    /// everything to 0.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        let (min, max) = (self.min?, self.max?);
        if max <= min {
            return Some(0.0);
        }
        Some(((value - min) / (max - min)).clamp(0.0, 1.0))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// One attribute value for one object (or one pair of regions).
pub struct InfrastructureElement {
    #[serde(rename = "attribute")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,
    pub value: String,
    pub object: InstanceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
}

impl InfrastructureElement {
    /// Finite numeric value; `NaN` and infinities count as missing.
    pub fn numeric(&self) -> Option<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Numeric,
    String,
    Bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
/// Declared unit and scale shared by attributes that reference it.
pub struct InfrastructureMetric {
    pub name: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<RangeType>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
/// Infrastructure attribute file as stored on disk.
pub struct Infrastructure {
    #[serde(default)]
    pub attributes: Vec<InfrastructureElement>,
    #[serde(default)]
    pub metrics: Vec<InfrastructureMetric>,
}

#[derive(Clone, Debug, Default)]
/// Read-only lookup over infrastructure attributes and metrics.
pub struct AttributeManager {
    attributes: Vec<InfrastructureElement>,
    metrics: BTreeMap<String, InfrastructureMetric>,
}

impl AttributeManager {
    pub fn new(infrastructure: Infrastructure) -> Self {
        let metrics = infrastructure
            .metrics
            .into_iter()
            .map(|metric| (metric.name.clone(), metric))
            .collect();
        Self {
            attributes: infrastructure.attributes,
            metrics,
        }
    }

    /// Read an infrastructure file.
    ///
    /// A missing file yields an empty manager; a present file must pass
    /// schema validation.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::metadata(path) {
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no infrastructure file; using empty attribute set");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
            Ok(_) => {}
        }
        let value = read_validated(SchemaDefinition::Infrastructure, path)?;
        let infrastructure: Infrastructure = serde_json::from_value(value)
            .with_context(|| format!("decoding infrastructure {}", path.display()))?;
        Ok(Self::new(infrastructure))
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attribute element for an object of the given kind and name.
    pub fn attribute(
        &self,
        name: &str,
        object: InstanceType,
        instance: &str,
    ) -> Option<&InfrastructureElement> {
        self.attributes.iter().find(|element| {
            element.name == name
                && element.object == object
                && element.instance.as_deref() == Some(instance)
        })
    }

    pub fn value(&self, name: &str, object: InstanceType, instance: &str) -> Option<&str> {
        self.attribute(name, object, instance)
            .map(|element| element.value.as_str())
    }

    /// Inter-region attribute for a pair of regions, matched in either order.
    pub fn between_regions(&self, name: &str, a: &Region, b: &Region) -> Option<&InfrastructureElement> {
        self.attributes.iter().find(|element| {
            element.name == name
                && element.object == InstanceType::InterRegion
                && matches!(element.arguments.as_slice(),
                    [first, second] if (first == a.as_str() && second == b.as_str())
                        || (first == b.as_str() && second == a.as_str()))
        })
    }

    /// Object kinds the attribute is defined for, in first-seen order.
    pub fn instance_types(&self, name: &str) -> Vec<InstanceType> {
        let mut types = Vec::new();
        for element in self.attributes.iter().filter(|element| element.name == name) {
            if !types.contains(&element.object) {
                types.push(element.object);
            }
        }
        types
    }

    /// Declared scale of the metric an element refers to, if both bounds are known.
    pub fn scale_of(&self, element: &InfrastructureElement) -> Option<RangeType> {
        let metric = self.metrics.get(element.metric_name.as_deref()?)?;
        metric
            .scale
            .filter(|scale| scale.min.is_some() && scale.max.is_some())
    }

    /// Element value mapped into [0, 1] by its metric's scale; `None` when
    /// the value is not numeric or no scale is declared.
    pub fn normalized(&self, element: &InfrastructureElement) -> Option<f64> {
        self.scale_of(element)?.normalize(element.numeric()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    fn manager() -> AttributeManager {
        let infrastructure: Infrastructure = serde_json::from_value(json!({
            "attributes": [
                {"attribute": "storage-cost", "value": "90", "object": "fybrikstorageaccount",
                 "instance": "account-neverland", "metricName": "cost"},
                {"attribute": "distance", "value": "1200", "object": "inter-region",
                 "arguments": ["neverland", "theshire"], "metricName": "distance"},
                {"attribute": "bandwidth", "value": "fast", "object": "cluster",
                 "instance": "cluster1"}
            ],
            "metrics": [
                {"name": "cost", "type": "numeric", "units": "US Dollar per TB per month",
                 "scale": {"min": 0, "max": 100}},
                {"name": "distance", "type": "numeric", "units": "km"}
            ]
        }))
        .unwrap();
        AttributeManager::new(infrastructure)
    }

    #[test]
    fn attribute_lookup_is_keyed_by_kind_and_instance() {
        let attrs = manager();
        assert_eq!(
            attrs.value("storage-cost", InstanceType::StorageAccount, "account-neverland"),
            Some("90")
        );
        assert_eq!(
            attrs.value("storage-cost", InstanceType::Cluster, "account-neverland"),
            None
        );
        assert_eq!(attrs.value("bandwidth", InstanceType::Cluster, "cluster2"), None);
    }

    #[test]
    fn region_pair_matches_in_either_order() {
        let attrs = manager();
        let a = Region::new("theshire");
        let b = Region::new("neverland");
        assert!(attrs.between_regions("distance", &a, &b).is_some());
        assert!(attrs.between_regions("distance", &b, &a).is_some());
        assert!(attrs.between_regions("distance", &a, &a).is_none());
    }

    #[test]
    fn scale_requires_declared_bounds() {
        let attrs = manager();
        let cost = attrs
            .attribute("storage-cost", InstanceType::StorageAccount, "account-neverland")
            .unwrap();
        let scale = attrs.scale_of(cost).unwrap();
        assert_eq!(scale.normalize(150.0), Some(1.0));
        assert_eq!(attrs.normalized(cost), Some(0.9));
        let distance = attrs
            .between_regions("distance", &Region::new("neverland"), &Region::new("theshire"))
            .unwrap();
        assert!(attrs.scale_of(distance).is_none());
        let bandwidth = attrs.attribute("bandwidth", InstanceType::Cluster, "cluster1").unwrap();
        assert!(attrs.normalized(bandwidth).is_none());
        assert_eq!(
            attrs.instance_types("distance"),
            vec![InstanceType::InterRegion]
        );
    }

    #[test]
    fn non_finite_values_are_missing() {
        let value = |raw: &str| InfrastructureElement {
            name: "cluster-cost".into(),
            description: None,
            metric_name: None,
            value: raw.into(),
            object: InstanceType::Cluster,
            instance: Some("cluster1".into()),
            arguments: Vec::new(),
        };
        assert_eq!(value(" 42.5 ").numeric(), Some(42.5));
        for raw in ["NaN", "inf", "-infinity", "fast"] {
            assert_eq!(value(raw).numeric(), None, "{raw}");
        }
    }

    #[test]
    fn missing_file_yields_empty_manager() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let attrs = AttributeManager::load(&dir.path().join("infrastructure.json"))?;
        assert!(attrs.is_empty());
        Ok(())
    }

    #[test]
    fn load_validates_present_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            "{}",
            json!({"attributes": [{"attribute": "cost", "object": "cluster"}]})
        )?;
        assert!(AttributeManager::load(file.path()).is_err());
        Ok(())
    }
}
