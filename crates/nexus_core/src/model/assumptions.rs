//! Model assumptions and their resolution into solver coefficients.
//!
//! An [`AssumptionSet`] is the point-in-time snapshot a caller reads from its
//! assumption store. The engine never holds on to it: each call resolves the
//! snapshot into a plain [`Coefficients`] value and works on that copy.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Assumption names understood by the model
pub mod keys {
    pub const BASE_FOOD_PRODUCTION: &str = "base_food_production";
    pub const FOOD_WATER_COEFFICIENT: &str = "food_water_coefficient";
    pub const FOOD_ENERGY_COEFFICIENT: &str = "food_energy_coefficient";
    pub const IRRIGATION_EFFICIENCY_GAIN: &str = "irrigation_efficiency_gain";
    pub const WATER_STRESS_FOOD_PENALTY: &str = "water_stress_food_penalty";
    pub const BASE_ENERGY_DEMAND: &str = "base_energy_demand";
    pub const FOSSIL_ENERGY_WATER_COEFFICIENT: &str = "fossil_energy_water_coefficient";
    pub const RENEWABLE_ENERGY_WATER_COEFFICIENT: &str = "renewable_energy_water_coefficient";
    pub const CO2_EMISSION_FACTOR: &str = "co2_emission_factor";
    pub const ENERGY_SECURITY_FLOOR: &str = "energy_security_floor";
    pub const BASE_WATER_AVAILABILITY: &str = "base_water_availability";
    pub const WATER_CONSERVATION_EFFECTIVENESS: &str = "water_conservation_effectiveness";
    pub const DOMESTIC_WATER_BASE_DEMAND: &str = "domestic_water_base_demand";
    pub const WATER_PUMPING_ENERGY_COEFFICIENT: &str = "water_pumping_energy_coefficient";
    pub const REFERENCE_EMISSIONS: &str = "reference_emissions";
    pub const WEIGHT_EMISSIONS: &str = "weight_emissions";
    pub const WEIGHT_WATER: &str = "weight_water";
    pub const WEIGHT_FOOD: &str = "weight_food";
    pub const WEIGHT_ENERGY: &str = "weight_energy";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionCategory {
    Food,
    Energy,
    Water,
    Scoring,
}

/// A named model coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    pub name: String,
    pub category: AssumptionCategory,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

impl Assumption {
    pub fn new(
        name: &str,
        category: AssumptionCategory,
        value: f64,
        unit: &str,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            category,
            value,
            unit: unit.to_string(),
            description: description.to_string(),
        }
    }
}

/// Snapshot of assumptions keyed by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Assumption>", into = "Vec<Assumption>")]
pub struct AssumptionSet {
    entries: FxHashMap<String, Assumption>,
}

impl AssumptionSet {
    /// Empty set; useful for tests that exercise missing-coefficient handling
    pub fn empty() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Assumption> {
        self.entries.get(name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.entries.get(name).map(|a| a.value)
    }

    /// Insert or replace an assumption, returning the previous one
    pub fn upsert(&mut self, assumption: Assumption) -> Option<Assumption> {
        self.entries.insert(assumption.name.clone(), assumption)
    }

    /// Replace the value of an existing assumption. Returns false if absent.
    pub fn set_value(&mut self, name: &str, value: f64) -> bool {
        match self.entries.get_mut(name) {
            Some(a) => {
                a.value = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Assumption> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All assumptions sorted by category then name
    pub fn sorted(&self) -> Vec<&Assumption> {
        let mut all: Vec<&Assumption> = self.entries.values().collect();
        all.sort_by(|a, b| {
            (a.category as u8, &a.name).cmp(&(b.category as u8, &b.name))
        });
        all
    }

    pub fn by_category(&self, category: AssumptionCategory) -> Vec<&Assumption> {
        self.sorted()
            .into_iter()
            .filter(|a| a.category == category)
            .collect()
    }
}

impl From<Vec<Assumption>> for AssumptionSet {
    fn from(list: Vec<Assumption>) -> Self {
        let mut set = Self::empty();
        for assumption in list {
            set.upsert(assumption);
        }
        set
    }
}

impl From<AssumptionSet> for Vec<Assumption> {
    fn from(set: AssumptionSet) -> Self {
        set.sorted().into_iter().cloned().collect()
    }
}

impl FromIterator<Assumption> for AssumptionSet {
    fn from_iter<I: IntoIterator<Item = Assumption>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl Default for AssumptionSet {
    /// The seeded coefficient set
    fn default() -> Self {
        use AssumptionCategory::*;
        use keys::*;

        vec![
            Assumption::new(BASE_FOOD_PRODUCTION, Food, 1000.0, "tonnes", "Food output at full intensity for the reference population"),
            Assumption::new(FOOD_WATER_COEFFICIENT, Food, 2.5, "liters/kg", "Water required per kg of food produced"),
            Assumption::new(FOOD_ENERGY_COEFFICIENT, Food, 0.8, "kWh/kg", "Energy required per kg of food produced"),
            Assumption::new(IRRIGATION_EFFICIENCY_GAIN, Food, 0.3, "fraction", "Maximum reduction in irrigation water from conservation"),
            Assumption::new(WATER_STRESS_FOOD_PENALTY, Food, 0.2, "fraction", "Food output lost at full water stress"),
            Assumption::new(BASE_ENERGY_DEMAND, Energy, 5000.0, "GWh", "Non-agricultural energy demand for the reference population"),
            Assumption::new(FOSSIL_ENERGY_WATER_COEFFICIENT, Energy, 1.2, "liters/kWh", "Water required per kWh of fossil energy"),
            Assumption::new(RENEWABLE_ENERGY_WATER_COEFFICIENT, Energy, 0.3, "liters/kWh", "Water required per kWh of renewable energy"),
            Assumption::new(CO2_EMISSION_FACTOR, Energy, 0.5, "kg CO2/kWh", "CO2 emissions per kWh of fossil energy"),
            Assumption::new(ENERGY_SECURITY_FLOOR, Energy, 0.4, "index", "Energy security with no renewable supply"),
            Assumption::new(BASE_WATER_AVAILABILITY, Water, 10000.0, "million liters", "Maximum sustainable water withdrawal"),
            Assumption::new(WATER_CONSERVATION_EFFECTIVENESS, Water, 0.15, "fraction", "Maximum reduction in water demand from conservation"),
            Assumption::new(DOMESTIC_WATER_BASE_DEMAND, Water, 1500.0, "million liters", "Base water demand for domestic use"),
            Assumption::new(WATER_PUMPING_ENERGY_COEFFICIENT, Water, 0.05, "kWh/liter", "Energy required to pump and treat water"),
            Assumption::new(REFERENCE_EMISSIONS, Scoring, 3000.0, "kt CO2", "Emissions level that scores zero"),
            Assumption::new(WEIGHT_EMISSIONS, Scoring, 0.3, "weight", "Sustainability weight of the emissions term"),
            Assumption::new(WEIGHT_WATER, Scoring, 0.3, "weight", "Sustainability weight of water stress"),
            Assumption::new(WEIGHT_FOOD, Scoring, 0.2, "weight", "Sustainability weight of food security"),
            Assumption::new(WEIGHT_ENERGY, Scoring, 0.2, "weight", "Sustainability weight of energy security"),
        ]
        .into()
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Typed view of every coefficient the solver reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub base_food_production: f64,
    pub food_water: f64,
    pub food_energy: f64,
    pub irrigation_efficiency_gain: f64,
    pub water_stress_food_penalty: f64,
    pub base_energy_demand: f64,
    pub fossil_water: f64,
    pub renewable_water: f64,
    pub co2_emission_factor: f64,
    pub energy_security_floor: f64,
    pub base_water_availability: f64,
    pub conservation_effectiveness: f64,
    pub domestic_water_demand: f64,
    pub pumping_energy: f64,
    pub reference_emissions: f64,
    pub weights: ScoreWeights,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub emissions: f64,
    pub water: f64,
    pub food: f64,
    pub energy: f64,
}

enum Bound {
    NonNegative,
    Positive,
    Fraction,
}

fn require(
    set: &AssumptionSet,
    name: &str,
    bound: Bound,
) -> Result<f64, ConfigurationError> {
    let value = set
        .value(name)
        .ok_or_else(|| ConfigurationError::MissingAssumption {
            name: name.to_string(),
        })?;
    let invalid = |reason| ConfigurationError::InvalidAssumption {
        name: name.to_string(),
        value,
        reason,
    };
    if !value.is_finite() {
        return Err(invalid("must be finite"));
    }
    match bound {
        Bound::NonNegative if value < 0.0 => Err(invalid("must be non-negative")),
        Bound::Positive if value <= 0.0 => Err(invalid("must be positive")),
        Bound::Fraction if !(0.0..=1.0).contains(&value) => {
            Err(invalid("must be between 0 and 1"))
        }
        _ => Ok(value),
    }
}

impl Coefficients {
    /// Resolve every required coefficient from a snapshot
    pub fn resolve(set: &AssumptionSet) -> Result<Self, ConfigurationError> {
        use keys::*;

        let weights = ScoreWeights {
            emissions: require(set, WEIGHT_EMISSIONS, Bound::NonNegative)?,
            water: require(set, WEIGHT_WATER, Bound::NonNegative)?,
            food: require(set, WEIGHT_FOOD, Bound::NonNegative)?,
            energy: require(set, WEIGHT_ENERGY, Bound::NonNegative)?,
        };
        let sum = weights.emissions + weights.water + weights.food + weights.energy;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigurationError::WeightsDoNotSumToOne { sum });
        }

        Ok(Self {
            base_food_production: require(set, BASE_FOOD_PRODUCTION, Bound::Positive)?,
            food_water: require(set, FOOD_WATER_COEFFICIENT, Bound::NonNegative)?,
            food_energy: require(set, FOOD_ENERGY_COEFFICIENT, Bound::NonNegative)?,
            irrigation_efficiency_gain: require(set, IRRIGATION_EFFICIENCY_GAIN, Bound::Fraction)?,
            water_stress_food_penalty: require(set, WATER_STRESS_FOOD_PENALTY, Bound::Fraction)?,
            base_energy_demand: require(set, BASE_ENERGY_DEMAND, Bound::NonNegative)?,
            fossil_water: require(set, FOSSIL_ENERGY_WATER_COEFFICIENT, Bound::NonNegative)?,
            renewable_water: require(set, RENEWABLE_ENERGY_WATER_COEFFICIENT, Bound::NonNegative)?,
            co2_emission_factor: require(set, CO2_EMISSION_FACTOR, Bound::NonNegative)?,
            energy_security_floor: require(set, ENERGY_SECURITY_FLOOR, Bound::Fraction)?,
            base_water_availability: require(set, BASE_WATER_AVAILABILITY, Bound::Positive)?,
            conservation_effectiveness: require(
                set,
                WATER_CONSERVATION_EFFECTIVENESS,
                Bound::Fraction,
            )?,
            domestic_water_demand: require(set, DOMESTIC_WATER_BASE_DEMAND, Bound::NonNegative)?,
            pumping_energy: require(set, WATER_PUMPING_ENERGY_COEFFICIENT, Bound::NonNegative)?,
            reference_emissions: require(set, REFERENCE_EMISSIONS, Bound::Positive)?,
            weights,
        })
    }

    /// Apply `scale` to each physical coefficient in a fixed order.
    ///
    /// Scoring weights, the emissions normalizer and the energy security floor
    /// are policy choices rather than measured quantities and are left alone.
    /// Fractions are kept inside [0, 1] after scaling.
    pub fn perturbed(&self, mut scale: impl FnMut() -> f64) -> Self {
        let mut c = *self;
        c.base_food_production *= scale();
        c.food_water *= scale();
        c.food_energy *= scale();
        c.irrigation_efficiency_gain = (c.irrigation_efficiency_gain * scale()).min(1.0);
        c.water_stress_food_penalty = (c.water_stress_food_penalty * scale()).min(1.0);
        c.base_energy_demand *= scale();
        c.fossil_water *= scale();
        c.renewable_water *= scale();
        c.co2_emission_factor *= scale();
        c.base_water_availability *= scale();
        c.conservation_effectiveness = (c.conservation_effectiveness * scale()).min(1.0);
        c.domestic_water_demand *= scale();
        c.pumping_energy *= scale();
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_resolves() {
        let set = AssumptionSet::default();
        assert_eq!(set.len(), 19);

        let c = Coefficients::resolve(&set).unwrap();
        assert_eq!(c.food_water, 2.5);
        assert_eq!(c.base_water_availability, 10000.0);
        assert_eq!(c.weights.emissions, 0.3);
    }

    #[test]
    fn test_missing_assumption_is_configuration_error() {
        let mut set = AssumptionSet::default();
        set.remove(keys::CO2_EMISSION_FACTOR);

        assert_eq!(
            Coefficients::resolve(&set).unwrap_err(),
            ConfigurationError::MissingAssumption {
                name: "co2_emission_factor".to_string()
            }
        );
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut set = AssumptionSet::default();
        set.set_value(keys::WEIGHT_FOOD, 0.5);

        assert!(matches!(
            Coefficients::resolve(&set),
            Err(ConfigurationError::WeightsDoNotSumToOne { .. })
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut set = AssumptionSet::default();
        set.set_value(keys::BASE_WATER_AVAILABILITY, 0.0);
        assert!(matches!(
            Coefficients::resolve(&set),
            Err(ConfigurationError::InvalidAssumption { reason: "must be positive", .. })
        ));

        let mut set = AssumptionSet::default();
        set.set_value(keys::WATER_CONSERVATION_EFFECTIVENESS, 1.5);
        assert!(matches!(
            Coefficients::resolve(&set),
            Err(ConfigurationError::InvalidAssumption { .. })
        ));

        let mut set = AssumptionSet::default();
        set.set_value(keys::FOOD_WATER_COEFFICIENT, f64::INFINITY);
        assert!(Coefficients::resolve(&set).is_err());
    }

    #[test]
    fn test_by_category_is_sorted() {
        let set = AssumptionSet::default();
        let water = set.by_category(AssumptionCategory::Water);
        let names: Vec<&str> = water.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "base_water_availability",
                "domestic_water_base_demand",
                "water_conservation_effectiveness",
                "water_pumping_energy_coefficient",
            ]
        );
    }

    #[test]
    fn test_identity_perturbation() {
        let c = Coefficients::resolve(&AssumptionSet::default()).unwrap();
        assert_eq!(c.perturbed(|| 1.0), c);
    }

    #[test]
    fn test_upsert_replaces() {
        let mut set = AssumptionSet::default();
        let previous = set.upsert(Assumption::new(
            keys::FOOD_WATER_COEFFICIENT,
            AssumptionCategory::Food,
            3.0,
            "liters/kg",
            "",
        ));
        assert_eq!(previous.map(|a| a.value), Some(2.5));
        assert_eq!(set.value(keys::FOOD_WATER_COEFFICIENT), Some(3.0));
    }
}
