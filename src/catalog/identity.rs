use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Name of a governance action (e.g. `RedactAction`).
///
/// Actions are matched by name only; any additional action arguments travel
/// alongside in [`crate::catalog::Action`].
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionName(pub String);

/// Processing location of clusters, storage accounts and datasets.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(pub String);

impl ActionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a module capability does with data.
///
/// Known kinds are listed in [`CapabilityKind::REGISTERED`]; any other string
/// is preserved as `Other` so catalogs that introduce new module kinds still
/// load and match by value.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CapabilityKind {
    Read,
    Write,
    Copy,
    Transform,
    Delete,
    Other(String),
}

/// Level at which a capability is deployed.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CapabilityScope {
    // Capabilities that do not declare a scope are asset-level.
    #[default]
    Asset,
    Workload,
    Cluster,
    Other(String),
}

impl CapabilityKind {
    /// Registration table for kinds with a dedicated variant.
    pub const REGISTERED: &'static [CapabilityKind] = &[
        CapabilityKind::Read,
        CapabilityKind::Write,
        CapabilityKind::Copy,
        CapabilityKind::Transform,
        CapabilityKind::Delete,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            CapabilityKind::Read => "read",
            CapabilityKind::Write => "write",
            CapabilityKind::Copy => "copy",
            CapabilityKind::Transform => "transform",
            CapabilityKind::Delete => "delete",
            CapabilityKind::Other(value) => value.as_str(),
        }
    }

    fn from_str(value: &str) -> Self {
        Self::REGISTERED
            .iter()
            .find(|kind| kind.as_str() == value)
            .cloned()
            .unwrap_or_else(|| CapabilityKind::Other(value.to_string()))
    }
}

impl CapabilityScope {
    pub fn as_str(&self) -> &str {
        match self {
            CapabilityScope::Asset => "asset",
            CapabilityScope::Workload => "workload",
            CapabilityScope::Cluster => "cluster",
            CapabilityScope::Other(value) => value.as_str(),
        }
    }

    fn from_str(value: &str) -> Self {
        match value {
            "asset" => CapabilityScope::Asset,
            "workload" => CapabilityScope::Workload,
            "cluster" => CapabilityScope::Cluster,
            other => CapabilityScope::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CapabilityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CapabilityKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CapabilityKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_str(&value))
    }
}

impl Serialize for CapabilityScope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CapabilityScope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_str(&value))
    }
}
