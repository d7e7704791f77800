//! Deterministic food-energy-water model
//!
//! The three subsystems feed each other: food production draws water and
//! energy, energy generation draws water, water supply draws pumping energy,
//! and water stress caps food output. Rather than solving the coupled system in
//! closed form, [`NexusModel`] runs a Jacobi fixed-point iteration over three
//! scalar states until the largest relative change drops below the configured
//! tolerance or the iteration cap is hit.

use serde::Serialize;

use crate::config::SolverConfig;
use crate::error::{ComputationError, ConvergenceWarning, Result};
use crate::model::{
    AssumptionSet, Coefficients, ConvergenceInfo, Metric, MetricValues, ParameterSet, ResultSet,
    SubsystemBreakdown,
};

/// Full output of one solve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub results: ResultSet,
    pub breakdown: SubsystemBreakdown,
    pub convergence: ConvergenceInfo,
    /// Unrounded metrics, used by the analyses that aggregate many solves
    #[serde(skip)]
    pub raw: MetricValues,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NexusModel {
    config: SolverConfig,
}

/// Policy levers after validation, with the population factor split out so
/// projections can compound it beyond the single-year domain
#[derive(Debug, Clone, Copy)]
struct Levers {
    intensity: f64,
    renewable: f64,
    conservation: f64,
    population: f64,
}

/// Food output, total energy and total water demand for one iterate
#[derive(Debug, Clone, Copy, PartialEq)]
struct NexusState {
    food: f64,
    energy: f64,
    water: f64,
}

impl NexusState {
    fn initial(levers: &Levers, c: &Coefficients) -> Self {
        Self {
            food: c.base_food_production * levers.intensity * levers.population,
            energy: c.base_energy_demand * levers.population,
            water: c.domestic_water_demand
                * levers.population
                * (1.0 - levers.conservation * c.conservation_effectiveness),
        }
    }

    /// One Jacobi round: every subsystem reads only the previous iterate
    fn step(&self, levers: &Levers, c: &Coefficients) -> Self {
        let potential_food = c.base_food_production * levers.intensity * levers.population;
        let food = potential_food * (1.0 - c.water_stress_food_penalty * water_stress(self.water, c));

        let energy = c.base_energy_demand * levers.population
            + c.food_energy * self.food
            + c.pumping_energy * self.water;

        let water = (irrigation_demand(self.food, levers, c)
            + self.energy * energy_water_intensity(levers, c)
            + c.domestic_water_demand * levers.population)
            * (1.0 - levers.conservation * c.conservation_effectiveness);

        Self {
            food,
            energy,
            water,
        }
    }

    fn max_relative_change(&self, next: &Self) -> f64 {
        [
            (self.food, next.food),
            (self.energy, next.energy),
            (self.water, next.water),
        ]
        .into_iter()
        .map(|(old, new)| {
            let scale = old.abs().max(new.abs());
            if scale == 0.0 {
                0.0
            } else {
                (new - old).abs() / scale
            }
        })
        .fold(0.0, f64::max)
    }

    fn ensure_finite(&self, iteration: usize) -> std::result::Result<(), ComputationError> {
        for (quantity, value) in [
            ("food production", self.food),
            ("energy demand", self.energy),
            ("water demand", self.water),
        ] {
            if !value.is_finite() {
                return Err(ComputationError::NonFinite {
                    quantity,
                    iteration,
                });
            }
        }
        Ok(())
    }
}

fn water_stress(water: f64, c: &Coefficients) -> f64 {
    (water / c.base_water_availability).clamp(0.0, 1.0)
}

fn irrigation_demand(food: f64, levers: &Levers, c: &Coefficients) -> f64 {
    food * c.food_water * (1.0 - levers.conservation * c.irrigation_efficiency_gain)
}

/// Water drawn per unit of energy for the current generation mix
fn energy_water_intensity(levers: &Levers, c: &Coefficients) -> f64 {
    (1.0 - levers.renewable) * c.fossil_water + levers.renewable * c.renewable_water
}

impl NexusModel {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Compute the reported metrics for a scenario
    pub fn compute(&self, params: &ParameterSet, assumptions: &AssumptionSet) -> Result<ResultSet> {
        self.solve(params, assumptions).map(|s| s.results)
    }

    /// Compute the metrics together with the subsystem breakdown and solver
    /// diagnostics
    pub fn solve(&self, params: &ParameterSet, assumptions: &AssumptionSet) -> Result<Solution> {
        params.validate()?;
        let coefficients = Coefficients::resolve(assumptions)?;
        self.solve_resolved(params, params.population_growth, &coefficients)
    }

    /// Solve with already-resolved coefficients and an explicit population
    /// factor. `params` must have been validated by the caller.
    pub(crate) fn solve_resolved(
        &self,
        params: &ParameterSet,
        population_factor: f64,
        c: &Coefficients,
    ) -> Result<Solution> {
        self.config.validate()?;

        let levers = Levers {
            intensity: params.food_production_intensity,
            renewable: params.renewable_energy_share,
            conservation: params.water_conservation_level,
            population: population_factor,
        };

        let mut state = NexusState::initial(&levers, c);
        state.ensure_finite(0)?;

        let mut iterations = 0;
        let mut max_relative_change = f64::INFINITY;
        while iterations < self.config.max_iterations {
            let next = state.step(&levers, c);
            iterations += 1;
            next.ensure_finite(iterations)?;
            max_relative_change = state.max_relative_change(&next);
            state = next;
            if max_relative_change < self.config.tolerance {
                break;
            }
        }

        let convergence = ConvergenceInfo {
            iterations,
            max_relative_change,
            converged: max_relative_change < self.config.tolerance,
        };
        let (raw, breakdown) = derive_metrics(&state, &levers, c);

        if let Some((metric, _)) = raw.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ComputationError::NonFinite {
                quantity: metric.key(),
                iteration: iterations,
            }
            .into());
        }

        let mut results = ResultSet::from_raw(&raw);
        if convergence.converged {
            tracing::debug!(iterations, "nexus feedback loop converged");
        } else {
            let warning = ConvergenceWarning {
                iterations,
                max_relative_change,
                tolerance: self.config.tolerance,
            };
            tracing::warn!("{warning}");
            results.warnings.push(warning);
        }

        Ok(Solution {
            results,
            breakdown,
            convergence,
            raw,
        })
    }
}

fn derive_metrics(
    state: &NexusState,
    levers: &Levers,
    c: &Coefficients,
) -> (MetricValues, SubsystemBreakdown) {
    let renewable_energy = state.energy * levers.renewable;
    let fossil_energy = state.energy * (1.0 - levers.renewable);
    let co2_emissions = fossil_energy * c.co2_emission_factor;

    let breakdown = SubsystemBreakdown {
        potential_food_production: c.base_food_production * levers.intensity * levers.population,
        food_water_demand: irrigation_demand(state.food, levers, c),
        food_energy_demand: c.food_energy * state.food,
        total_energy: state.energy,
        renewable_energy,
        fossil_energy,
        energy_water_demand: state.energy * energy_water_intensity(levers, c),
        domestic_water_demand: c.domestic_water_demand * levers.population,
        water_pumping_energy: c.pumping_energy * state.water,
    };

    let water_stress_index = water_stress(state.water, c);
    let food_security_index =
        (state.food / (c.base_food_production * levers.population)).clamp(0.0, 1.0);
    let energy_security_index = (c.energy_security_floor
        + (1.0 - c.energy_security_floor) * levers.renewable)
        .clamp(0.0, 1.0);
    let emissions_term = (1.0 - co2_emissions / c.reference_emissions).clamp(0.0, 1.0);

    let w = &c.weights;
    let sustainability_score = (w.emissions * emissions_term
        + w.water * (1.0 - water_stress_index)
        + w.food * food_security_index
        + w.energy * energy_security_index)
        .clamp(0.0, 1.0);

    let mut raw = MetricValues::default();
    raw.set(Metric::FoodProduction, state.food);
    raw.set(Metric::Co2Emissions, co2_emissions);
    raw.set(Metric::WaterDemand, state.water);
    raw.set(Metric::WaterStressIndex, water_stress_index);
    raw.set(Metric::FoodSecurityIndex, food_security_index);
    raw.set(Metric::EnergySecurityIndex, energy_security_index);
    raw.set(Metric::SustainabilityScore, sustainability_score);

    (raw, breakdown)
}
