//! Outcome metrics and the result types the engine hands back to callers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConvergenceWarning;

/// Nexus subsystem a quantity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    Food,
    Energy,
    Water,
    Overall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    FoodProduction,
    Co2Emissions,
    WaterDemand,
    WaterStressIndex,
    FoodSecurityIndex,
    EnergySecurityIndex,
    SustainabilityScore,
}

/// Metric polarity: `true` when a lower value is the better outcome
pub const LOWER_IS_BETTER: [(Metric, bool); 7] = [
    (Metric::FoodProduction, false),
    (Metric::Co2Emissions, true),
    (Metric::WaterDemand, true),
    (Metric::WaterStressIndex, true),
    (Metric::FoodSecurityIndex, false),
    (Metric::EnergySecurityIndex, false),
    (Metric::SustainabilityScore, false),
];

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::FoodProduction,
        Metric::Co2Emissions,
        Metric::WaterDemand,
        Metric::WaterStressIndex,
        Metric::FoodSecurityIndex,
        Metric::EnergySecurityIndex,
        Metric::SustainabilityScore,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Metric::FoodProduction => "food_production",
            Metric::Co2Emissions => "co2_emissions",
            Metric::WaterDemand => "water_demand",
            Metric::WaterStressIndex => "water_stress_index",
            Metric::FoodSecurityIndex => "food_security_index",
            Metric::EnergySecurityIndex => "energy_security_index",
            Metric::SustainabilityScore => "sustainability_score",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Metric::FoodProduction => "Food Production",
            Metric::Co2Emissions => "CO2 Emissions",
            Metric::WaterDemand => "Water Demand",
            Metric::WaterStressIndex => "Water Stress Index",
            Metric::FoodSecurityIndex => "Food Security Index",
            Metric::EnergySecurityIndex => "Energy Security Index",
            Metric::SustainabilityScore => "Sustainability Score",
        }
    }

    /// Bounded to [0, 1] (as opposed to an absolute quantity)
    pub fn is_index(self) -> bool {
        !matches!(
            self,
            Metric::FoodProduction | Metric::Co2Emissions | Metric::WaterDemand
        )
    }

    pub fn lower_is_better(self) -> bool {
        LOWER_IS_BETTER
            .iter()
            .find(|(m, _)| *m == self)
            .is_some_and(|(_, lower)| *lower)
    }

    /// Whether moving by `delta` is an improvement
    pub fn is_improvement(self, delta: f64) -> bool {
        if self.lower_is_better() {
            delta < 0.0
        } else {
            delta > 0.0
        }
    }

    pub fn subsystem(self) -> Subsystem {
        match self {
            Metric::FoodProduction | Metric::FoodSecurityIndex => Subsystem::Food,
            Metric::Co2Emissions | Metric::EnergySecurityIndex => Subsystem::Energy,
            Metric::WaterDemand | Metric::WaterStressIndex => Subsystem::Water,
            Metric::SustainabilityScore => Subsystem::Overall,
        }
    }

    /// Decimal places in reported values: 3 for indices, 1 for absolutes
    pub fn decimals(self) -> i32 {
        if self.is_index() { 3 } else { 1 }
    }

    pub fn round(self, value: f64) -> f64 {
        round_to(value, self.decimals())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// p10/p50/p90 summary of a metric's Monte Carlo distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

/// Reported outcome metrics for one scenario, rounded to the export contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub food_production: f64,
    pub co2_emissions: f64,
    pub water_demand: f64,
    pub water_stress_index: f64,
    pub food_security_index: f64,
    pub energy_security_index: f64,
    pub sustainability_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainties: Option<BTreeMap<Metric, PercentileBand>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ConvergenceWarning>,
}

impl ResultSet {
    /// Build from unrounded metric values, applying each metric's rounding
    pub fn from_raw(raw: &MetricValues) -> Self {
        Self {
            food_production: Metric::FoodProduction.round(raw.get(Metric::FoodProduction)),
            co2_emissions: Metric::Co2Emissions.round(raw.get(Metric::Co2Emissions)),
            water_demand: Metric::WaterDemand.round(raw.get(Metric::WaterDemand)),
            water_stress_index: Metric::WaterStressIndex.round(raw.get(Metric::WaterStressIndex)),
            food_security_index: Metric::FoodSecurityIndex
                .round(raw.get(Metric::FoodSecurityIndex)),
            energy_security_index: Metric::EnergySecurityIndex
                .round(raw.get(Metric::EnergySecurityIndex)),
            sustainability_score: Metric::SustainabilityScore
                .round(raw.get(Metric::SustainabilityScore)),
            uncertainties: None,
            warnings: Vec::new(),
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::FoodProduction => self.food_production,
            Metric::Co2Emissions => self.co2_emissions,
            Metric::WaterDemand => self.water_demand,
            Metric::WaterStressIndex => self.water_stress_index,
            Metric::FoodSecurityIndex => self.food_security_index,
            Metric::EnergySecurityIndex => self.energy_security_index,
            Metric::SustainabilityScore => self.sustainability_score,
        }
    }

    /// True if the solver hit its iteration cap for this result
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn with_uncertainties(mut self, bands: BTreeMap<Metric, PercentileBand>) -> Self {
        self.uncertainties = Some(bands);
        self
    }
}

/// Unrounded metric values indexed by [`Metric`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricValues([f64; 7]);

impl MetricValues {
    pub fn get(&self, metric: Metric) -> f64 {
        self.0[metric as usize]
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.0[metric as usize] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.into_iter().map(|m| (m, self.get(m)))
    }
}

/// Intermediate subsystem quantities from a solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubsystemBreakdown {
    /// Food output before the water stress penalty
    pub potential_food_production: f64,
    pub food_water_demand: f64,
    pub food_energy_demand: f64,
    pub total_energy: f64,
    pub renewable_energy: f64,
    pub fossil_energy: f64,
    pub energy_water_demand: f64,
    pub domestic_water_demand: f64,
    pub water_pumping_energy: f64,
}

/// Fixed-point iteration diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    pub iterations: usize,
    pub max_relative_change: f64,
    pub converged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_table_covers_every_metric() {
        for metric in Metric::ALL {
            assert!(LOWER_IS_BETTER.iter().any(|(m, _)| *m == metric));
        }
        assert!(Metric::Co2Emissions.lower_is_better());
        assert!(Metric::WaterDemand.lower_is_better());
        assert!(Metric::WaterStressIndex.lower_is_better());
        assert!(!Metric::SustainabilityScore.lower_is_better());
        assert!(!Metric::FoodSecurityIndex.lower_is_better());
    }

    #[test]
    fn test_is_improvement_respects_polarity() {
        assert!(Metric::Co2Emissions.is_improvement(-10.0));
        assert!(!Metric::Co2Emissions.is_improvement(10.0));
        assert!(Metric::EnergySecurityIndex.is_improvement(0.1));
        assert!(!Metric::EnergySecurityIndex.is_improvement(0.0));
    }

    #[test]
    fn test_rounding_contract() {
        assert_eq!(Metric::WaterDemand.round(7196.2549), 7196.3);
        assert_eq!(Metric::WaterStressIndex.round(0.71962), 0.72);
        assert_eq!(Metric::SustainabilityScore.round(0.38449), 0.384);
        assert_eq!(round_to(12.345, 1), 12.3);
    }

    #[test]
    fn test_metric_values_index_by_metric() {
        let mut values = MetricValues::default();
        values.set(Metric::SustainabilityScore, 0.5);
        assert_eq!(values.get(Metric::SustainabilityScore), 0.5);
        assert_eq!(values.get(Metric::FoodProduction), 0.0);
        assert_eq!(values.iter().count(), 7);
    }

    #[test]
    fn test_result_set_serializes_without_optional_fields() {
        let results = ResultSet::from_raw(&MetricValues::default());
        let json = serde_json::to_value(&results).unwrap();
        assert!(json.get("uncertainties").is_none());
        assert!(json.get("warnings").is_none());
        assert_eq!(json["sustainability_score"], 0.0);
    }
}
