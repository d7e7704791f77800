//! Engine policy constants
//!
//! Tolerances, iteration caps, trial counts and sweep resolution are
//! configuration rather than physics. Every field has a serde default so a
//! partial YAML file only needs to name what it overrides.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Fixed-point solver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Convergence threshold on the maximum relative change between iterations
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Iteration cap; on exhaustion the last iterate is returned with a warning
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_tolerance() -> f64 {
    1e-9
}

fn default_max_iterations() -> usize {
    100
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

/// Shape of the relative coefficient perturbation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationDistribution {
    /// Triangular on [-spread, +spread] peaking at zero
    #[default]
    Triangular,
    /// Uniform on [-spread, +spread]
    Uniform,
}

/// Monte Carlo settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,

    /// Maximum relative deviation applied to each coefficient (0.1 = ±10%)
    #[serde(default = "default_spread")]
    pub spread: f64,

    #[serde(default)]
    pub distribution: PerturbationDistribution,
}

fn default_trials() -> usize {
    100
}

fn default_spread() -> f64 {
    0.1
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            spread: default_spread(),
            distribution: PerturbationDistribution::default(),
        }
    }
}

/// One-at-a-time sweep settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityConfig {
    /// Evenly spaced points across each parameter's domain, endpoints included
    #[serde(default = "default_points")]
    pub points: usize,
}

fn default_points() -> usize {
    11
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
        }
    }
}

/// Thresholds used when describing changes between scenarios (percent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplainerConfig {
    /// Changes below this are negligible
    #[serde(default = "default_moderate_percent")]
    pub moderate_percent: f64,

    /// Changes above this are major
    #[serde(default = "default_major_percent")]
    pub major_percent: f64,

    /// Outcome changes smaller than this never form a trade-off
    #[serde(default = "default_trade_off_min_percent")]
    pub trade_off_min_percent: f64,
}

fn default_moderate_percent() -> f64 {
    5.0
}

fn default_major_percent() -> f64 {
    25.0
}

fn default_trade_off_min_percent() -> f64 {
    5.0
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            moderate_percent: default_moderate_percent(),
            major_percent: default_major_percent(),
            trade_off_min_percent: default_trade_off_min_percent(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub uncertainty: UncertaintyConfig,
    #[serde(default)]
    pub sensitivity: SensitivityConfig,
    #[serde(default)]
    pub explainer: ExplainerConfig,
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigurationError {
    ConfigurationError::InvalidEngineConfig { field, reason }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(invalid("solver.tolerance", "must be a positive number"));
        }
        if self.max_iterations == 0 {
            return Err(invalid("solver.max_iterations", "must be at least 1"));
        }
        Ok(())
    }
}

impl UncertaintyConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.trials == 0 {
            return Err(invalid("uncertainty.trials", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.spread) {
            return Err(invalid("uncertainty.spread", "must be in [0, 1)"));
        }
        Ok(())
    }
}

impl SensitivityConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.points < 2 {
            return Err(invalid("sensitivity.points", "must be at least 2"));
        }
        Ok(())
    }
}

impl ExplainerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let finite_non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !finite_non_negative(self.moderate_percent) || !finite_non_negative(self.major_percent)
        {
            return Err(invalid(
                "explainer.moderate_percent",
                "thresholds must be non-negative",
            ));
        }
        if self.moderate_percent > self.major_percent {
            return Err(invalid(
                "explainer.major_percent",
                "must not be below moderate_percent",
            ));
        }
        if !finite_non_negative(self.trade_off_min_percent) {
            return Err(invalid(
                "explainer.trade_off_min_percent",
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.solver.validate()?;
        self.uncertainty.validate()?;
        self.sensitivity.validate()?;
        self.explainer.validate()
    }
}
