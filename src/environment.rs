//! Read-only snapshot of everything deployed: modules, clusters, storage
//! accounts and infrastructure attributes.

use crate::catalog::index::ModuleIndex;
use crate::catalog::model::Module;
use crate::infrastructure::{AttributeManager, Cluster, Infrastructure, StorageAccount};
use crate::schema_loader::{SchemaDefinition, read_validated};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, Default)]
/// Registry snapshot for one solve pass.
///
/// Cluster and storage account order is the registry order; "first
/// satisfying" selection walks these lists front to back.
pub struct Environment {
    pub modules: ModuleIndex,
    pub clusters: Vec<Cluster>,
    pub storage_accounts: Vec<StorageAccount>,
    pub attributes: AttributeManager,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvironmentDocument {
    #[serde(default)]
    modules: Vec<Module>,
    #[serde(default)]
    clusters: Vec<Cluster>,
    #[serde(default)]
    storage_accounts: Vec<StorageAccount>,
    #[serde(default)]
    infrastructure: Infrastructure,
}

impl Environment {
    pub fn new(
        modules: impl IntoIterator<Item = Module>,
        clusters: Vec<Cluster>,
        storage_accounts: Vec<StorageAccount>,
        attributes: AttributeManager,
    ) -> Self {
        Self {
            modules: ModuleIndex::new(modules),
            clusters,
            storage_accounts,
            attributes,
        }
    }

    /// Load a snapshot document validated against the embedded schema.
    pub fn load(path: &Path) -> Result<Self> {
        let value = read_validated(SchemaDefinition::Environment, path)?;
        let document: EnvironmentDocument = serde_json::from_value(value)
            .with_context(|| format!("decoding environment {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            modules = document.modules.len(),
            clusters = document.clusters.len(),
            storage_accounts = document.storage_accounts.len(),
            "loaded environment snapshot"
        );
        Ok(Self::new(
            document.modules,
            document.clusters,
            document.storage_accounts,
            AttributeManager::new(document.infrastructure),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_snapshot() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        let doc = json!({
            "modules": [{"name": "copier", "capabilities": [{"capability": "copy"}]}],
            "clusters": [{"name": "cluster1", "metadata": {"region": "theshire"}}],
            "storageAccounts": [{"name": "account1", "region": "theshire", "secretRef": "creds"}],
            "infrastructure": {"attributes": [
                {"attribute": "cost", "value": "3", "object": "cluster", "instance": "cluster1"}
            ]}
        });
        write!(file, "{doc}")?;
        let env = Environment::load(file.path())?;
        assert_eq!(env.modules.len(), 1);
        assert_eq!(env.clusters[0].region().as_str(), "theshire");
        assert_eq!(env.storage_accounts[0].secret_ref.as_deref(), Some("creds"));
        assert!(!env.attributes.is_empty());
        Ok(())
    }

    #[test]
    fn cluster_without_region_is_rejected() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{}", json!({"clusters": [{"name": "c", "metadata": {}}]}))?;
        assert!(Environment::load(file.path()).is_err());
        Ok(())
    }
}
