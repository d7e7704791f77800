use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Parameter;

/// Input rejected before any computation ran
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{parameter} must be between {min} and {max}, got {value}")]
    ParameterOutOfDomain {
        parameter: Parameter,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{parameter} must be a finite number, got {value}")]
    NonFiniteParameter { parameter: Parameter, value: f64 },
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("projection horizon must be between {min} and {max} years, got {years}")]
    HorizonOutOfRange { years: u32, min: u32, max: u32 },
    #[error("uncertainty quantification needs at least one trial")]
    NoTrials,
    #[error("comparison needs at least one scenario")]
    EmptyComparison,
    #[error("{} invalid parameters: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Assumption snapshot or engine configuration cannot be used
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("missing assumption: {name}")]
    MissingAssumption { name: String },
    #[error("invalid assumption {name} = {value}: {reason}")]
    InvalidAssumption {
        name: String,
        value: f64,
        reason: &'static str,
    },
    #[error("sustainability weights must sum to 1, got {sum}")]
    WeightsDoNotSumToOne { sum: f64 },
    #[error("invalid engine config `{field}`: {reason}")]
    InvalidEngineConfig {
        field: &'static str,
        reason: &'static str,
    },
}

/// Numeric failure inside the solver. Never substituted with a fallback value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("{quantity} became non-finite at iteration {iteration}")]
    NonFinite {
        quantity: &'static str,
        iteration: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NexusError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("computation error: {0}")]
    Computation(#[from] ComputationError),
}

pub type Result<T> = std::result::Result<T, NexusError>;

/// The fixed-point solver hit its iteration cap. The last iterate is still
/// returned; this travels with the results instead of failing the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceWarning {
    pub iterations: usize,
    pub max_relative_change: f64,
    pub tolerance: f64,
}

impl std::fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "feedback loop did not converge after {} iterations (max relative change {:.3e}, tolerance {:.3e})",
            self.iterations, self.max_relative_change, self.tolerance
        )
    }
}
