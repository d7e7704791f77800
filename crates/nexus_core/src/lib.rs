//! Food-energy-water nexus computation engine
//!
//! This crate models the coupling between food production, energy generation
//! and water supply for a set of normalized policy levers. It supports:
//! - Deterministic evaluation with feedback-loop resolution (fixed-point iteration)
//! - Monte Carlo uncertainty bands over the physical coefficients
//! - One-at-a-time parameter sensitivity sweeps
//! - Multi-year projection under compounding population growth
//! - Cross-scenario comparison statistics
//! - Human-readable explanations of the difference between two scenarios
//!
//! All coefficients come from an explicit [`model::AssumptionSet`] snapshot and
//! all policy constants from [`config::EngineConfig`]; nothing is read from
//! global state.
//!
//! ```ignore
//! use nexus_core::{Engine, model::{AssumptionSet, ParameterSet}};
//!
//! let engine = Engine::default();
//! let assumptions = AssumptionSet::default();
//! let results = engine.model().compute(&ParameterSet::green_transition(), &assumptions)?;
//! let bands = engine.uncertainty().quantify(&ParameterSet::default(), &assumptions, 500, Some(42))?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod comparison;
pub mod error;
pub mod explain;
pub mod nexus;
pub mod percentiles;
pub mod projection;
pub mod sensitivity;
pub mod uncertainty;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use comparison::{ComparisonReport, MetricComparison, compare};
pub use config::EngineConfig;
pub use error::{NexusError, Result};
pub use explain::{ChangeExplainer, ChangeExplanation};
pub use nexus::{NexusModel, Solution};
pub use projection::{ProjectionEngine, ProjectionPoint};
pub use sensitivity::{SensitivityAnalyzer, SensitivityReport};
pub use uncertainty::{UncertaintyEngine, UncertaintyReport};

/// Every analysis wired to one validated [`EngineConfig`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model(&self) -> NexusModel {
        NexusModel::new(self.config.solver)
    }

    pub fn uncertainty(&self) -> UncertaintyEngine {
        UncertaintyEngine::new(self.model(), self.config.uncertainty)
    }

    pub fn sensitivity(&self) -> SensitivityAnalyzer {
        SensitivityAnalyzer::new(self.model(), self.config.sensitivity)
    }

    pub fn projection(&self) -> ProjectionEngine {
        ProjectionEngine::new(self.model())
    }

    pub fn explainer(&self) -> ChangeExplainer {
        ChangeExplainer::new(self.config.explainer)
    }
}
