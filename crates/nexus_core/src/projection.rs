//! Multi-year projection under compounding population growth

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::model::{AssumptionSet, Coefficients, ParameterSet, ResultSet, round_to};
use crate::nexus::NexusModel;

/// Accepted projection horizon in years
pub const MIN_YEARS: u32 = 1;
pub const MAX_YEARS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub year: u32,
    /// `population_growth ^ year`
    pub population_factor: f64,
    pub results: ResultSet,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionEngine {
    model: NexusModel,
}

impl ProjectionEngine {
    pub fn new(model: NexusModel) -> Self {
        Self { model }
    }

    /// Results for years `0..=years`, year 0 being the baseline
    pub fn project(
        &self,
        params: &ParameterSet,
        assumptions: &AssumptionSet,
        years: u32,
    ) -> Result<Vec<ProjectionPoint>> {
        let _span = tracing::debug_span!("project", years).entered();
        self.iter(params, assumptions, years)?.collect()
    }

    /// Lazily computed projection points. Each year is solved from scratch
    /// with the compounded population factor.
    pub fn iter<'a>(
        &'a self,
        params: &'a ParameterSet,
        assumptions: &AssumptionSet,
        years: u32,
    ) -> Result<impl Iterator<Item = Result<ProjectionPoint>> + 'a> {
        if !(MIN_YEARS..=MAX_YEARS).contains(&years) {
            return Err(ValidationError::HorizonOutOfRange {
                years,
                min: MIN_YEARS,
                max: MAX_YEARS,
            }
            .into());
        }
        params.validate()?;
        let coefficients = Coefficients::resolve(assumptions)?;

        Ok((0..=years).map(move |year| {
            let population_factor = params.population_growth.powi(year as i32);
            let solution = self
                .model
                .solve_resolved(params, population_factor, &coefficients)?;
            Ok(ProjectionPoint {
                year,
                population_factor: round_to(population_factor, 6),
                results: solution.results,
            })
        }))
    }
}
