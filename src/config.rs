//! Solver tuning knobs.

use anyhow::{Context, Result, bail};
use std::env;

pub const MAX_DEPTH_ENV: &str = "DATAPATH_MAX_DEPTH";
pub const OPTIMIZE_ENV: &str = "DATAPATH_OPTIMIZE";
pub const MAX_CANDIDATES_ENV: &str = "DATAPATH_MAX_CANDIDATES";

/// Longest data path the path constructor will build.
pub const DEFAULT_MAX_DEPTH: usize = 4;
pub const DEFAULT_MAX_CANDIDATES: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum number of edges in a data path.
    pub max_depth: usize,
    /// Score valid candidates with the optimization goals; when false the
    /// first valid candidate in construction order wins.
    pub optimize: bool,
    /// Upper bound on placements enumerated while optimizing.
    pub max_candidates: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            optimize: true,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

impl SolverConfig {
    /// Defaults overridden by `DATAPATH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`SolverConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_DEPTH_ENV) {
            config.max_depth = raw
                .trim()
                .parse()
                .with_context(|| format!("{MAX_DEPTH_ENV} must be a positive integer, got '{raw}'"))?;
        }
        if let Some(raw) = lookup(OPTIMIZE_ENV) {
            config.optimize = !matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }
        if let Some(raw) = lookup(MAX_CANDIDATES_ENV) {
            config.max_candidates = raw.trim().parse().with_context(|| {
                format!("{MAX_CANDIDATES_ENV} must be a positive integer, got '{raw}'")
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            bail!("max_depth must be at least 1");
        }
        if self.max_candidates == 0 {
            bail!("max_candidates must be at least 1");
        }
        Ok(())
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = SolverConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SolverConfig::default());
        assert_eq!(config.max_depth, 4);
        assert!(config.optimize);
    }

    #[test]
    fn overrides_apply() {
        let config = SolverConfig::from_lookup(lookup(&[
            (MAX_DEPTH_ENV, "2"),
            (OPTIMIZE_ENV, "Off"),
            (MAX_CANDIDATES_ENV, " 50 "),
        ]))
        .unwrap();
        assert_eq!(config.max_depth, 2);
        assert!(!config.optimize);
        assert_eq!(config.max_candidates, 50);
    }

    #[test]
    fn zero_and_garbage_are_rejected() {
        assert!(SolverConfig::from_lookup(lookup(&[(MAX_DEPTH_ENV, "0")])).is_err());
        assert!(SolverConfig::from_lookup(lookup(&[(MAX_DEPTH_ENV, "deep")])).is_err());
        assert!(SolverConfig::from_lookup(lookup(&[(MAX_CANDIDATES_ENV, "0")])).is_err());
    }
}
