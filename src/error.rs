//! Typed solve failures.
//!
//! Every failure is scoped to one dataset and is recoverable by the caller;
//! none of them aborts solving for other datasets.

use crate::catalog::identity::{ActionName, CapabilityKind};

/// The result type returned by the solver.
pub type SolveResult<T> = std::result::Result<T, SolveError>;

/// Reasons no data path could be chosen for a dataset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    /// No chain of capabilities connects the data to its destination.
    #[error("no data path could be constructed for {dataset_id}: no modules connect {origin} to {destination}")]
    NoPathFound {
        /// Dataset the request was for.
        dataset_id: String,
        /// Node the path must start at.
        origin: String,
        /// Node the path must end at.
        destination: String,
    },

    /// A required governance action could not be placed on any edge.
    #[error("no data path could be constructed for {dataset_id}: unsupported governance actions {actions:?}")]
    UnsupportedAction {
        /// Dataset the request was for.
        dataset_id: String,
        /// Actions left unassigned.
        actions: Vec<ActionName>,
    },

    /// A capability kind marked as required is missing from every candidate.
    #[error("no data path could be constructed for {dataset_id}: required capability {kind} is not deployed")]
    MissingMandatoryCapability {
        /// Dataset the request was for.
        dataset_id: String,
        /// The missing capability kind.
        kind: CapabilityKind,
    },

    /// A step that writes data found no permitted storage account.
    #[error("no data path could be constructed for {dataset_id}: no storage account satisfies {kind} restrictions")]
    NoStorageAccount {
        /// Dataset the request was for.
        dataset_id: String,
        /// Capability kind of the edge that needed storage.
        kind: CapabilityKind,
    },

    /// A step found no cluster satisfying its restrictions.
    #[error("no data path could be constructed for {dataset_id}: no cluster satisfies {kind} restrictions")]
    NoCluster {
        /// Dataset the request was for.
        dataset_id: String,
        /// Capability kind of the edge that needed a cluster.
        kind: CapabilityKind,
    },

    /// The caller's deadline passed before this dataset was solved.
    #[error("deadline exceeded before solving {dataset_id}")]
    DeadlineExceeded {
        /// Dataset that was skipped.
        dataset_id: String,
    },
}

impl SolveError {
    /// True for every variant that means "no data path could be constructed".
    pub fn is_no_path(&self) -> bool {
        !matches!(self, SolveError::DeadlineExceeded { .. })
    }

    pub fn dataset_id(&self) -> &str {
        match self {
            SolveError::NoPathFound { dataset_id, .. }
            | SolveError::UnsupportedAction { dataset_id, .. }
            | SolveError::MissingMandatoryCapability { dataset_id, .. }
            | SolveError::NoStorageAccount { dataset_id, .. }
            | SolveError::NoCluster { dataset_id, .. }
            | SolveError::DeadlineExceeded { dataset_id } => dataset_id,
        }
    }
}
