//! Governance and placement validation of candidate paths.
//!
//! Walking a raw path edge by edge, the validator allocates storage for every
//! physical sink, assigns each required action to the first edge able to apply
//! it, and places every edge on a cluster. Greedy validation keeps the first
//! satisfying storage account and cluster at each edge and never revisits
//! them; enumeration yields every satisfying combination instead.

use crate::catalog::identity::{ActionName, CapabilityKind};
use crate::catalog::model::Action;
use crate::datapath::{DataInfo, Edge, ResolvedEdge, Solution};
use crate::environment::Environment;
use crate::error::SolveError;
use crate::infrastructure::{Cluster, StorageAccount};
use crate::restrictions::satisfies;

#[derive(Clone, Debug, PartialEq)]
/// Why a candidate path was rejected.
pub enum Rejection {
    NoStorageAccount { kind: CapabilityKind },
    NoCluster { kind: CapabilityKind },
    UnsupportedActions { actions: Vec<ActionName> },
    MissingCapability { kind: CapabilityKind },
}

impl Rejection {
    pub fn into_error(self, dataset_id: &str) -> SolveError {
        let dataset_id = dataset_id.to_string();
        match self {
            Rejection::NoStorageAccount { kind } => SolveError::NoStorageAccount { dataset_id, kind },
            Rejection::NoCluster { kind } => SolveError::NoCluster { dataset_id, kind },
            Rejection::UnsupportedActions { actions } => {
                SolveError::UnsupportedAction { dataset_id, actions }
            }
            Rejection::MissingCapability { kind } => {
                SolveError::MissingMandatoryCapability { dataset_id, kind }
            }
        }
    }
}

pub struct Validator<'a> {
    env: &'a Environment,
    request: &'a DataInfo,
}

#[derive(Clone, Default)]
struct State {
    resolved: Vec<ResolvedEdge>,
    /// Required actions not yet assigned, in request order.
    pending: Vec<Action>,
    applied: Vec<ActionName>,
}

struct Walk<'p> {
    path: &'p [Edge],
    first_only: bool,
    limit: usize,
    solutions: Vec<Solution>,
    rejection: Option<Rejection>,
}

impl Walk<'_> {
    fn reject(&mut self, rejection: Rejection) {
        if self.rejection.is_none() {
            self.rejection = Some(rejection);
        }
    }

    fn options<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if self.first_only {
            items.truncate(1);
        }
        items
    }

    fn full(&self) -> bool {
        self.solutions.len() >= self.limit
    }

    fn into_result(self) -> Result<Vec<Solution>, Rejection> {
        if self.solutions.is_empty() {
            // a walk with no solutions has always recorded a rejection
            return Err(self.rejection.unwrap_or(Rejection::UnsupportedActions {
                actions: Vec::new(),
            }));
        }
        Ok(self.solutions)
    }
}

impl<'a> Validator<'a> {
    pub fn new(env: &'a Environment, request: &'a DataInfo) -> Self {
        Self { env, request }
    }

    /// Greedy validation: first satisfying storage account and cluster per edge.
    pub fn validate(&self, path: &[Edge]) -> Result<Solution, Rejection> {
        let mut solutions = self.run(path, true, 1)?;
        Ok(solutions.remove(0))
    }

    /// Every valid placement of `path`, at most `limit` of them, in registry order.
    pub fn placements(&self, path: &[Edge], limit: usize) -> Result<Vec<Solution>, Rejection> {
        self.run(path, false, limit)
    }

    fn run(&self, path: &[Edge], first_only: bool, limit: usize) -> Result<Vec<Solution>, Rejection> {
        let mut walk = Walk {
            path,
            first_only,
            limit: limit.max(1),
            solutions: Vec::new(),
            rejection: None,
        };
        let initial = State {
            pending: self.request.actions.clone(),
            ..State::default()
        };
        self.step(&mut walk, 0, initial);
        walk.into_result()
    }

    fn step(&self, walk: &mut Walk<'_>, position: usize, state: State) {
        if walk.full() {
            return;
        }
        let path = walk.path;
        let Some(edge) = path.get(position) else {
            self.finish(walk, state);
            return;
        };
        let kind = edge.kind();

        let storage_options: Vec<Option<&StorageAccount>> = if self.needs_storage(path, position) {
            let accounts = self.storage_candidates(path, position, &state);
            if accounts.is_empty() {
                walk.reject(Rejection::NoStorageAccount { kind: kind.clone() });
                return;
            }
            accounts.into_iter().map(Some).collect()
        } else {
            vec![None]
        };

        for account in walk.options(storage_options) {
            let mut pending = state.pending.clone();
            if let Some(account) = account {
                for action in self.write_actions(account) {
                    let known = state.applied.contains(&action.name)
                        || pending.iter().any(|p| p.name == action.name);
                    if !known {
                        pending.push(action.clone());
                    }
                }
            }
            let (assigned, forwarded): (Vec<Action>, Vec<Action>) = pending
                .into_iter()
                .partition(|action| edge.capability().supports_action(&action.name));

            let clusters = self.cluster_candidates(kind, !assigned.is_empty());
            if clusters.is_empty() {
                walk.reject(Rejection::NoCluster { kind: kind.clone() });
                continue;
            }
            for cluster in walk.options(clusters) {
                if walk.full() {
                    return;
                }
                let mut next = state.clone();
                next.applied.extend(assigned.iter().map(|action| action.name.clone()));
                next.pending = forwarded.clone();
                next.resolved.push(ResolvedEdge {
                    edge: edge.clone(),
                    actions: assigned.clone(),
                    cluster: cluster.clone(),
                    storage_account: account.cloned(),
                });
                self.step(walk, position + 1, next);
            }
        }
    }

    fn finish(&self, walk: &mut Walk<'_>, state: State) {
        if !state.pending.is_empty() {
            walk.reject(Rejection::UnsupportedActions {
                actions: state.pending.into_iter().map(|action| action.name).collect(),
            });
            return;
        }
        for kind in self.request.configuration.required_kinds() {
            if !state.resolved.iter().any(|edge| edge.kind() == kind) {
                walk.reject(Rejection::MissingCapability { kind: kind.clone() });
                return;
            }
        }
        walk.solutions.push(Solution {
            data_path: state.resolved,
        });
    }

    /// Physical sinks need an allocated account, except the existing asset a
    /// write flow ends at.
    fn needs_storage(&self, path: &[Edge], position: usize) -> bool {
        let Some(edge) = path.get(position) else {
            return false;
        };
        if edge.sink.is_virtual {
            return false;
        }
        let last = position + 1 == path.len();
        !(last && self.request.final_sink_is_existing_asset())
    }

    fn write_actions(&self, account: &StorageAccount) -> &[Action] {
        self.request
            .storage_requirements
            .get(&account.region)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn storage_candidates(&self, path: &[Edge], position: usize, state: &State) -> Vec<&'a StorageAccount> {
        let Some(edge) = path.get(position) else {
            return Vec::new();
        };
        let restrictions = self
            .request
            .configuration
            .storage_restrictions(edge.kind());
        let env = self.env;
        env.storage_accounts
            .iter()
            .filter(|account| {
                let Some(required) = self.request.storage_requirements.get(&account.region) else {
                    return false;
                };
                if !satisfies(restrictions, *account, &env.attributes) {
                    return false;
                }
                required
                    .iter()
                    .filter(|action| !state.applied.contains(&action.name))
                    .all(|action| {
                        path[position..]
                            .iter()
                            .any(|later| later.capability().supports_action(&action.name))
                    })
            })
            .collect()
    }

    fn cluster_candidates(&self, kind: &CapabilityKind, carries_actions: bool) -> Vec<&'a Cluster> {
        let configuration = &self.request.configuration;
        let env = self.env;
        env.clusters
            .iter()
            .filter(|cluster| {
                satisfies(configuration.cluster_restrictions(kind), *cluster, &env.attributes)
                    && (!carries_actions
                        || satisfies(
                            configuration.cluster_restrictions(&CapabilityKind::Transform),
                            *cluster,
                            &env.attributes,
                        ))
            })
            .collect()
    }
}
