//! Weighted multi-attribute selection among valid solutions.

use crate::adminconfig::{AttributeOptimization, OptimizationDirective};
use crate::catalog::identity::Region;
use crate::datapath::{DataFlow, DataInfo, Solution};
use crate::infrastructure::{AttributeManager, InfrastructureElement, InstanceType};

/// Scores solutions against optimization goals.
///
/// For each goal every object a solution touches (clusters, storage accounts,
/// modules, and region-to-region hops) contributes one score: its value
/// normalized by the declared metric scale, or the raw value without one.
/// Minimize goals are inverted per object so that a higher score is always
/// better.
pub struct Optimizer<'a> {
    attrs: &'a AttributeManager,
    request: &'a DataInfo,
}

impl<'a> Optimizer<'a> {
    pub fn new(attrs: &'a AttributeManager, request: &'a DataInfo) -> Self {
        Self { attrs, request }
    }

    /// Index of the best-scoring candidate; the earliest wins ties.
    pub fn select_best(&self, candidates: &[Solution], goals: &[AttributeOptimization]) -> Option<usize> {
        let scores = self.scores(candidates, goals);
        let mut best: Option<(usize, f64)> = None;
        for (index, score) in scores.into_iter().enumerate() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((index, score)),
            }
        }
        if let Some((index, score)) = best {
            tracing::debug!(candidates = candidates.len(), chosen = index, score, "selected solution");
        }
        best.map(|(index, _)| index)
    }

    /// Total weighted score per candidate.
    pub fn scores(&self, candidates: &[Solution], goals: &[AttributeOptimization]) -> Vec<f64> {
        let mut totals = vec![0.0; candidates.len()];
        for goal in goals {
            if !(0.0..=1.0).contains(&goal.weight) {
                tracing::warn!(attribute = %goal.attribute, weight = goal.weight, "ignoring goal with weight outside [0, 1]");
                continue;
            }
            let types = self.attrs.instance_types(&goal.attribute);
            if types.is_empty() {
                tracing::warn!(attribute = %goal.attribute, "ignoring goal on attribute with no infrastructure data");
                continue;
            }
            let values: Vec<Option<f64>> = candidates
                .iter()
                .map(|solution| self.goal_value(solution, goal, &types))
                .collect();
            let Some(worst) = values.iter().flatten().copied().reduce(f64::min) else {
                tracing::warn!(attribute = %goal.attribute, "no candidate has a value for goal attribute");
                continue;
            };
            for (total, value) in totals.iter_mut().zip(values) {
                *total += goal.weight * value.unwrap_or(worst);
            }
        }
        totals
    }

    /// Sum of per-instance scores over everything the solution touches;
    /// `None` when a touched object has no numeric value for the attribute.
    fn goal_value(
        &self,
        solution: &Solution,
        goal: &AttributeOptimization,
        types: &[InstanceType],
    ) -> Option<f64> {
        let attribute = goal.attribute.as_str();
        let mut total = 0.0;
        for edge in solution.edges() {
            if types.contains(&InstanceType::Cluster) {
                let element = self
                    .attrs
                    .attribute(attribute, InstanceType::Cluster, &edge.cluster.name)?;
                total += self.term(element, goal.directive)?;
            }
            if types.contains(&InstanceType::Module) {
                let element = self
                    .attrs
                    .attribute(attribute, InstanceType::Module, edge.module_name())?;
                total += self.term(element, goal.directive)?;
            }
            if let Some(account) = &edge.storage_account {
                if types.contains(&InstanceType::StorageAccount) {
                    let element = self.attrs.attribute(
                        attribute,
                        InstanceType::StorageAccount,
                        &account.name,
                    )?;
                    total += self.term(element, goal.directive)?;
                }
            }
        }
        if types.contains(&InstanceType::InterRegion) {
            for (from, to) in self.hops(solution) {
                let element = self.attrs.between_regions(attribute, from, to)?;
                total += self.term(element, goal.directive)?;
            }
        }
        Some(total)
    }

    /// Score of one instance's value; higher is better for either directive.
    ///
    /// A value with a declared scale is normalized on its own before it is
    /// summed, so long paths cannot saturate the scale.
    fn term(&self, element: &InfrastructureElement, directive: OptimizationDirective) -> Option<f64> {
        let value = element.numeric()?;
        Some(match (self.attrs.normalized(element), directive) {
            (Some(normalized), OptimizationDirective::Minimize) => 1.0 - normalized,
            (Some(normalized), OptimizationDirective::Maximize) => normalized,
            (None, OptimizationDirective::Minimize) => -value,
            (None, OptimizationDirective::Maximize) => value,
        })
    }

    /// Consecutive pairs of distinct regions the data travels through.
    pub fn hops<'s>(&'s self, solution: &'s Solution) -> Vec<(&'s Region, &'s Region)> {
        let mut locations: Vec<&Region> = Vec::new();
        locations.extend(self.request.details.geography.as_ref());
        for edge in solution.edges() {
            locations.push(edge.cluster.region());
            if let Some(account) = &edge.storage_account {
                locations.push(&account.region);
            }
        }
        if self.request.flow == DataFlow::Read {
            if let Some(workload) = &self.request.workload_cluster {
                locations.push(workload.region());
            }
        }
        locations.dedup();
        locations
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }
}
