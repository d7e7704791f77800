//! Tests for multi-year projection

use crate::error::{NexusError, ValidationError};
use crate::model::{AssumptionSet, Parameter, ParameterSet};
use crate::nexus::NexusModel;
use crate::projection::{MAX_YEARS, ProjectionEngine};

#[test]
fn test_ten_year_projection_has_eleven_points() {
    let engine = ProjectionEngine::default();
    let params = ParameterSet::business_as_usual();
    let points = engine
        .project(&params, &AssumptionSet::default(), 10)
        .unwrap();

    assert_eq!(points.len(), 11);
    for (i, point) in points.iter().enumerate() {
        assert_eq!(point.year, i as u32);
    }
    assert_eq!(points[0].population_factor, 1.0);
}

#[test]
fn test_demand_grows_with_population() {
    let engine = ProjectionEngine::default();
    let params = ParameterSet::default()
        .with(Parameter::PopulationGrowth, 1.02)
        .unwrap();
    let points = engine
        .project(&params, &AssumptionSet::default(), 10)
        .unwrap();

    for pair in points.windows(2) {
        let (prev, next) = (&pair[0].results, &pair[1].results);
        assert!(next.food_production >= prev.food_production);
        assert!(next.water_demand >= prev.water_demand);
        assert!(next.co2_emissions >= prev.co2_emissions);
        assert!(pair[1].population_factor > pair[0].population_factor);
    }
    assert!(points[10].results.water_demand > points[0].results.water_demand);
}

#[test]
fn test_year_one_matches_single_year_compute() {
    let engine = ProjectionEngine::default();
    let params = ParameterSet::green_transition();
    let assumptions = AssumptionSet::default();

    let points = engine.project(&params, &assumptions, 1).unwrap();
    let direct = NexusModel::default().compute(&params, &assumptions).unwrap();
    assert_eq!(points[1].results, direct);
}

#[test]
fn test_shrinking_population_reduces_demand() {
    let engine = ProjectionEngine::default();
    let params = ParameterSet::default()
        .with(Parameter::PopulationGrowth, 0.95)
        .unwrap();
    let points = engine
        .project(&params, &AssumptionSet::default(), 5)
        .unwrap();
    assert!(points[5].results.water_demand < points[0].results.water_demand);
}

#[test]
fn test_horizon_outside_range_is_rejected() {
    let engine = ProjectionEngine::default();
    let params = ParameterSet::default();
    let assumptions = AssumptionSet::default();

    for years in [0, MAX_YEARS + 1] {
        let err = engine.project(&params, &assumptions, years).unwrap_err();
        assert_eq!(
            err,
            NexusError::Validation(ValidationError::HorizonOutOfRange {
                years,
                min: 1,
                max: 50,
            })
        );
    }
    assert_eq!(
        engine
            .project(&params, &assumptions, MAX_YEARS)
            .unwrap()
            .len(),
        51
    );
}

#[test]
fn test_iter_is_lazy_and_matches_project() {
    let engine = ProjectionEngine::default();
    let params = ParameterSet::default();
    let assumptions = AssumptionSet::default();

    let first_three: Vec<_> = engine
        .iter(&params, &assumptions, 50)
        .unwrap()
        .take(3)
        .collect::<Result<_, _>>()
        .unwrap();
    let all = engine.project(&params, &assumptions, 50).unwrap();
    assert_eq!(first_three.as_slice(), &all[..3]);
}
