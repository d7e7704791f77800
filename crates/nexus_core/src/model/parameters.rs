//! Policy parameters: the four normalized levers a scenario sets.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::Subsystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    FoodProductionIntensity,
    RenewableEnergyShare,
    WaterConservationLevel,
    PopulationGrowth,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::FoodProductionIntensity,
        Parameter::RenewableEnergyShare,
        Parameter::WaterConservationLevel,
        Parameter::PopulationGrowth,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Parameter::FoodProductionIntensity => "food_production_intensity",
            Parameter::RenewableEnergyShare => "renewable_energy_share",
            Parameter::WaterConservationLevel => "water_conservation_level",
            Parameter::PopulationGrowth => "population_growth",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Closed valid domain (min, max)
    pub fn domain(self) -> (f64, f64) {
        match self {
            Parameter::PopulationGrowth => (0.95, 1.10),
            _ => (0.0, 1.0),
        }
    }

    pub fn default_value(self) -> f64 {
        match self {
            Parameter::FoodProductionIntensity => 0.5,
            Parameter::RenewableEnergyShare => 0.3,
            Parameter::WaterConservationLevel => 0.5,
            Parameter::PopulationGrowth => 1.01,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Parameter::FoodProductionIntensity => "Food Production Intensity",
            Parameter::RenewableEnergyShare => "Renewable Energy Share",
            Parameter::WaterConservationLevel => "Water Conservation Level",
            Parameter::PopulationGrowth => "Population Growth",
        }
    }

    pub fn info(self) -> ParameterInfo {
        let (min, max) = self.domain();
        let (description, unit, category, impact) = match self {
            Parameter::FoodProductionIntensity => (
                "Level of agricultural intensification",
                "normalized",
                Subsystem::Food,
                "Higher values increase food output but also water and energy demands",
            ),
            Parameter::RenewableEnergyShare => (
                "Fraction of energy from renewable sources",
                "fraction",
                Subsystem::Energy,
                "Higher values reduce CO2 emissions and water stress from energy production",
            ),
            Parameter::WaterConservationLevel => (
                "Effectiveness of water conservation measures",
                "normalized",
                Subsystem::Water,
                "Higher values reduce water demand across all sectors",
            ),
            Parameter::PopulationGrowth => (
                "Annual population growth multiplier",
                "annual rate",
                Subsystem::Overall,
                "Higher values increase demand for food, energy and water",
            ),
        };
        ParameterInfo {
            parameter: self,
            name: self.display_name(),
            description,
            unit,
            category,
            min,
            max,
            default: self.default_value(),
            impact,
        }
    }

    /// Reject non-finite and out-of-domain values. Never clamps.
    pub fn check(self, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteParameter {
                parameter: self,
                value,
            });
        }
        let (min, max) = self.domain();
        if value < min || value > max {
            return Err(ValidationError::ParameterOutOfDomain {
                parameter: self,
                value,
                min,
                max,
            });
        }
        Ok(value)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Descriptive metadata for a parameter
#[derive(Debug, Clone, Serialize)]
pub struct ParameterInfo {
    pub parameter: Parameter,
    pub name: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    pub category: Subsystem,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub impact: &'static str,
}

/// A complete set of policy parameters.
///
/// Fields are public so callers can build sets directly; every engine entry
/// point calls [`ParameterSet::validate`] before using one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSet {
    pub food_production_intensity: f64,
    pub renewable_energy_share: f64,
    pub water_conservation_level: f64,
    pub population_growth: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            food_production_intensity: Parameter::FoodProductionIntensity.default_value(),
            renewable_energy_share: Parameter::RenewableEnergyShare.default_value(),
            water_conservation_level: Parameter::WaterConservationLevel.default_value(),
            population_growth: Parameter::PopulationGrowth.default_value(),
        }
    }
}

impl ParameterSet {
    /// Create a validated parameter set
    pub fn new(
        food_production_intensity: f64,
        renewable_energy_share: f64,
        water_conservation_level: f64,
        population_growth: f64,
    ) -> Result<Self, ValidationError> {
        let params = Self {
            food_production_intensity,
            renewable_energy_share,
            water_conservation_level,
            population_growth,
        };
        params.validate()?;
        Ok(params)
    }

    /// Build from a loose name -> value map. Missing parameters take their
    /// defaults; unknown names and out-of-domain values are rejected.
    ///
    /// Every bad entry is reported: a single problem comes back as-is,
    /// several as [`ValidationError::Multiple`] in key order.
    pub fn from_map(values: &BTreeMap<String, f64>) -> Result<Self, ValidationError> {
        let mut params = Self::default();
        let mut errors = Vec::new();
        for (key, &value) in values {
            let Some(parameter) = Parameter::from_key(key) else {
                errors.push(ValidationError::UnknownParameter(key.clone()));
                continue;
            };
            match parameter.check(value) {
                Ok(value) => params.set(parameter, value),
                Err(e) => errors.push(e),
            }
        }
        match errors.len() {
            0 => Ok(params),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        Parameter::ALL
            .into_iter()
            .map(|p| (p.key().to_string(), self.get(p)))
            .collect()
    }

    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::FoodProductionIntensity => self.food_production_intensity,
            Parameter::RenewableEnergyShare => self.renewable_energy_share,
            Parameter::WaterConservationLevel => self.water_conservation_level,
            Parameter::PopulationGrowth => self.population_growth,
        }
    }

    fn set(&mut self, parameter: Parameter, value: f64) {
        match parameter {
            Parameter::FoodProductionIntensity => self.food_production_intensity = value,
            Parameter::RenewableEnergyShare => self.renewable_energy_share = value,
            Parameter::WaterConservationLevel => self.water_conservation_level = value,
            Parameter::PopulationGrowth => self.population_growth = value,
        }
    }

    /// Copy with one parameter replaced, validating the new value
    pub fn with(&self, parameter: Parameter, value: f64) -> Result<Self, ValidationError> {
        let mut params = *self;
        params.set(parameter, parameter.check(value)?);
        Ok(params)
    }

    /// Check every parameter against its domain, reporting the first violation
    pub fn validate(&self) -> Result<(), ValidationError> {
        for parameter in Parameter::ALL {
            parameter.check(self.get(parameter))?;
        }
        Ok(())
    }

    /// Baseline with current policies and trends
    pub fn business_as_usual() -> Self {
        Self {
            food_production_intensity: 0.5,
            renewable_energy_share: 0.3,
            water_conservation_level: 0.3,
            population_growth: 1.02,
        }
    }

    /// Aggressive renewable energy adoption and water conservation
    pub fn green_transition() -> Self {
        Self {
            food_production_intensity: 0.6,
            renewable_energy_share: 0.8,
            water_conservation_level: 0.7,
            population_growth: 1.01,
        }
    }

    /// Maximize food production while managing resources
    pub fn food_security_focus() -> Self {
        Self {
            food_production_intensity: 0.9,
            renewable_energy_share: 0.5,
            water_conservation_level: 0.6,
            population_growth: 1.02,
        }
    }
}

/// A named example scenario
#[derive(Debug, Clone, Serialize)]
pub struct Preset {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: ParameterSet,
}

pub fn presets() -> Vec<Preset> {
    vec![
        Preset {
            key: "business_as_usual",
            name: "Business as Usual",
            description: "Baseline scenario with current policies and trends",
            parameters: ParameterSet::business_as_usual(),
        },
        Preset {
            key: "green_transition",
            name: "Green Transition",
            description: "Aggressive renewable energy adoption and water conservation",
            parameters: ParameterSet::green_transition(),
        },
        Preset {
            key: "food_security_focus",
            name: "Food Security Focus",
            description: "Maximize food production while managing resources",
            parameters: ParameterSet::food_security_focus(),
        },
    ]
}

pub fn preset(key: &str) -> Option<Preset> {
    presets().into_iter().find(|p| p.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = ParameterSet::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.renewable_energy_share, 0.3);
        assert_eq!(params.population_growth, 1.01);
    }

    #[test]
    fn test_out_of_domain_is_rejected_not_clamped() {
        let err = ParameterSet::new(0.5, 1.5, 0.5, 1.01).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ParameterOutOfDomain {
                parameter: Parameter::RenewableEnergyShare,
                value: 1.5,
                min: 0.0,
                max: 1.0,
            }
        );

        let err = ParameterSet::new(0.5, 0.5, 0.5, 1.2).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ParameterOutOfDomain {
                parameter: Parameter::PopulationGrowth,
                ..
            }
        ));
    }

    #[test]
    fn test_nan_is_rejected() {
        let params = ParameterSet {
            water_conservation_level: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ValidationError::NonFiniteParameter {
                parameter: Parameter::WaterConservationLevel,
                ..
            })
        ));
    }

    #[test]
    fn test_domain_boundaries_are_inclusive() {
        assert!(ParameterSet::new(0.0, 0.0, 0.0, 0.95).is_ok());
        assert!(ParameterSet::new(1.0, 1.0, 1.0, 1.10).is_ok());
    }

    #[test]
    fn test_from_map_fills_defaults() {
        let values = BTreeMap::from([("renewable_energy_share".to_string(), 0.9)]);
        let params = ParameterSet::from_map(&values).unwrap();

        assert_eq!(params.renewable_energy_share, 0.9);
        assert_eq!(params.food_production_intensity, 0.5);
        assert_eq!(params.population_growth, 1.01);
    }

    #[test]
    fn test_from_map_rejects_unknown_parameter() {
        let values = BTreeMap::from([("solar_panels".to_string(), 0.9)]);
        assert_eq!(
            ParameterSet::from_map(&values).unwrap_err(),
            ValidationError::UnknownParameter("solar_panels".to_string())
        );
    }

    #[test]
    fn test_from_map_reports_every_bad_entry() {
        let values = BTreeMap::from([
            ("population_growth".to_string(), 1.5),
            ("renewable_energy_share".to_string(), -0.1),
            ("solar_panels".to_string(), 0.9),
            ("water_conservation_level".to_string(), 0.4),
        ]);
        let err = ParameterSet::from_map(&values).unwrap_err();
        let ValidationError::Multiple(errors) = &err else {
            panic!("expected several errors, got {err:?}");
        };
        assert_eq!(errors.len(), 3);
        assert!(matches!(
            errors[0],
            ValidationError::ParameterOutOfDomain {
                parameter: Parameter::PopulationGrowth,
                ..
            }
        ));
        assert!(matches!(
            errors[1],
            ValidationError::ParameterOutOfDomain {
                parameter: Parameter::RenewableEnergyShare,
                ..
            }
        ));
        assert_eq!(
            errors[2],
            ValidationError::UnknownParameter("solar_panels".to_string())
        );

        let message = err.to_string();
        assert!(message.starts_with("3 invalid parameters"));
        assert!(message.contains("population_growth must be between 0.95 and 1.1, got 1.5"));
        assert!(message.contains("unknown parameter: solar_panels"));
    }

    #[test]
    fn test_with_validates_replacement() {
        let params = ParameterSet::default();
        assert_eq!(
            params
                .with(Parameter::FoodProductionIntensity, 0.9)
                .unwrap()
                .food_production_intensity,
            0.9
        );
        assert!(params.with(Parameter::PopulationGrowth, 0.5).is_err());
    }

    #[test]
    fn test_presets_are_valid() {
        let all = presets();
        assert_eq!(all.len(), 3);
        for p in all {
            assert!(p.parameters.validate().is_ok(), "{} invalid", p.key);
        }
        assert!(preset("green_transition").is_some());
        assert!(preset("nope").is_none());
    }

    #[test]
    fn test_key_round_trip() {
        for p in Parameter::ALL {
            assert_eq!(Parameter::from_key(p.key()), Some(p));
        }
    }
}
