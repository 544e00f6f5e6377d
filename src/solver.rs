//! Per-dataset solving: construct candidate paths, validate them, and choose one.

use crate::config::SolverConfig;
use crate::datapath::{DataInfo, Solution};
use crate::environment::Environment;
use crate::error::{SolveError, SolveResult};
use crate::graph::CapabilityGraph;
use crate::optimizer::Optimizer;
use crate::paths::find_paths;
use crate::validator::{Rejection, Validator};
use std::time::Instant;

/// Outcome of solving one dataset within a batch.
#[derive(Debug)]
pub struct DatasetOutcome {
    pub dataset_id: String,
    pub result: SolveResult<Solution>,
}

/// Chooses data paths over a read-only environment snapshot.
pub struct Solver<'a> {
    env: &'a Environment,
    config: SolverConfig,
}

impl<'a> Solver<'a> {
    pub fn new(env: &'a Environment, config: SolverConfig) -> Self {
        Self { env, config }
    }

    /// Choose a data path for one dataset.
    ///
    /// Shorter paths are tried first. Without optimization (disabled, or no
    /// goals configured) the first path that validates greedily wins;
    /// otherwise every valid placement of the shortest feasible length is
    /// scored and the best one is returned.
    #[tracing::instrument(skip_all, fields(dataset_id = %request.dataset_id, flow = ?request.flow))]
    pub fn solve(&self, request: &DataInfo) -> SolveResult<Solution> {
        let (source, destination) = request.endpoints();
        let no_path = || SolveError::NoPathFound {
            dataset_id: request.dataset_id.clone(),
            origin: source.to_string(),
            destination: destination.to_string(),
        };
        if self.env.modules.is_empty() {
            tracing::warn!("there are no deployed modules in the environment");
            return Err(no_path());
        }

        let graph = CapabilityGraph::build(self.env, &request.configuration);
        let mut paths = find_paths(&graph, &source, &destination, self.config.max_depth);
        paths.sort_by_key(Vec::len);
        tracing::debug!(
            capabilities = graph.entries().len(),
            paths = paths.len(),
            "constructed raw paths"
        );
        if paths.is_empty() {
            return Err(no_path());
        }

        let validator = Validator::new(self.env, request);
        let goals = &request.configuration.optimization;
        let mut first_rejection: Option<Rejection> = None;

        if !self.config.optimize || goals.is_empty() {
            for path in &paths {
                match validator.validate(path) {
                    Ok(solution) => {
                        tracing::info!(edges = solution.len(), path = %solution, "data path selected");
                        return Ok(solution);
                    }
                    Err(rejection) => {
                        tracing::debug!(?rejection, edges = path.len(), "candidate rejected");
                        first_rejection.get_or_insert(rejection);
                    }
                }
            }
            return Err(first_rejection
                .map(|rejection| rejection.into_error(&request.dataset_id))
                .unwrap_or_else(no_path));
        }

        let mut candidates: Vec<Solution> = Vec::new();
        for path in &paths {
            // only the shortest length with a valid placement is scored
            if candidates.last().is_some_and(|found| found.len() < path.len()) {
                break;
            }
            let remaining = self.config.max_candidates.saturating_sub(candidates.len());
            if remaining == 0 {
                tracing::warn!(
                    max_candidates = self.config.max_candidates,
                    "candidate bound reached; remaining paths not scored"
                );
                break;
            }
            match validator.placements(path, remaining) {
                Ok(mut placements) => candidates.append(&mut placements),
                Err(rejection) => {
                    tracing::debug!(?rejection, edges = path.len(), "candidate rejected");
                    first_rejection.get_or_insert(rejection);
                }
            }
        }
        if candidates.is_empty() {
            return Err(first_rejection
                .map(|rejection| rejection.into_error(&request.dataset_id))
                .unwrap_or_else(no_path));
        }

        let optimizer = Optimizer::new(&self.env.attributes, request);
        let best = optimizer.select_best(&candidates, goals).unwrap_or(0);
        let solution = candidates.swap_remove(best);
        tracing::info!(edges = solution.len(), path = %solution, "optimal data path selected");
        Ok(solution)
    }

    /// Solve datasets in order; each outcome is independent of the others.
    ///
    /// The deadline is checked between datasets; datasets not started before
    /// it passes fail with `DeadlineExceeded`.
    pub fn solve_all(&self, requests: &[DataInfo], deadline: Option<Instant>) -> Vec<DatasetOutcome> {
        requests
            .iter()
            .map(|request| {
                let expired = deadline.is_some_and(|deadline| Instant::now() >= deadline);
                let result = if expired {
                    tracing::warn!(dataset_id = %request.dataset_id, "deadline exceeded; dataset skipped");
                    Err(SolveError::DeadlineExceeded {
                        dataset_id: request.dataset_id.clone(),
                    })
                } else {
                    self.solve(request)
                };
                DatasetOutcome {
                    dataset_id: request.dataset_id.clone(),
                    result,
                }
            })
            .collect()
    }
}
