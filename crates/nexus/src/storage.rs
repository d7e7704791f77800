//! YAML input files
//!
//! Scenario file:
//! ```yaml
//! name: Green Transition
//! description: Aggressive renewables    # optional
//! parameters:                           # missing parameters take defaults
//!   renewable_energy_share: 0.8
//!   water_conservation_level: 0.7
//! ```
//!
//! Assumptions file (both keys optional):
//! ```yaml
//! assumptions:                          # replaces the seeded set
//!   - { name: base_food_production, category: food, value: 1200, unit: tonnes }
//! overrides:                            # applied on top
//!   co2_emission_factor: 0.45
//! ```
//!
//! Engine config file: any subset of `EngineConfig`, e.g. `solver: { max_iterations: 200 }`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use nexus_core::EngineConfig;
use nexus_core::error::{ConfigurationError, ValidationError};
use nexus_core::model::{Assumption, AssumptionSet, ParameterSet, preset};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("unknown assumption in overrides: {0}")]
    UnknownAssumption(String),
    #[error("scenario `{name}` is invalid: {source}")]
    InvalidScenario {
        name: String,
        source: ValidationError,
    },
    #[error("engine config is invalid: {0}")]
    InvalidConfig(#[from] ConfigurationError),
}

/// A scenario as written on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

/// A scenario with validated parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: ParameterSet,
}

impl ScenarioFile {
    pub fn into_scenario(self) -> Result<Scenario, StorageError> {
        match ParameterSet::from_map(&self.parameters) {
            Ok(parameters) => Ok(Scenario {
                name: self.name,
                description: self.description,
                parameters,
            }),
            Err(source) => Err(StorageError::InvalidScenario {
                name: self.name,
                source,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssumptionsFile {
    #[serde(default)]
    pub assumptions: Option<Vec<Assumption>>,
    #[serde(default)]
    pub overrides: BTreeMap<String, f64>,
}

impl AssumptionsFile {
    /// Build the snapshot: the listed set (or the seeded one) plus overrides
    pub fn into_set(self) -> Result<AssumptionSet, StorageError> {
        let mut set = self
            .assumptions
            .map(AssumptionSet::from)
            .unwrap_or_default();
        for (name, value) in self.overrides {
            if !set.set_value(&name, value) {
                return Err(StorageError::UnknownAssumption(name));
            }
        }
        Ok(set)
    }
}

fn read(path: &Path) -> Result<String, StorageError> {
    fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: for<'de> Deserialize<'de>>(path: &Path, content: &str) -> Result<T, StorageError> {
    serde_saphyr::from_str(content).map_err(|e| StorageError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub fn load_scenario(path: &Path) -> Result<Scenario, StorageError> {
    let file: ScenarioFile = parse(path, &read(path)?)?;
    file.into_scenario()
}

/// Resolve a preset key, falling back to a scenario file path
pub fn resolve_scenario(reference: &str) -> Result<Scenario, StorageError> {
    match preset(reference) {
        Some(p) => Ok(Scenario {
            name: p.name.to_string(),
            description: Some(p.description.to_string()),
            parameters: p.parameters,
        }),
        None => load_scenario(Path::new(reference)),
    }
}

pub fn load_assumptions(path: &Path) -> Result<AssumptionSet, StorageError> {
    let file: AssumptionsFile = parse(path, &read(path)?)?;
    let set = file.into_set()?;
    tracing::debug!(path = %path.display(), entries = set.len(), "loaded assumptions");
    Ok(set)
}

pub fn load_engine_config(path: &Path) -> Result<EngineConfig, StorageError> {
    let config: EngineConfig = parse(path, &read(path)?)?;
    config.validate()?;
    Ok(config)
}
