//! Tests for one-at-a-time sensitivity sweeps

use crate::config::SensitivityConfig;
use crate::error::{ConfigurationError, NexusError};
use crate::model::{AssumptionSet, Metric, Parameter, ParameterSet};
use crate::nexus::NexusModel;
use crate::sensitivity::SensitivityAnalyzer;

#[test]
fn test_report_is_reproducible() {
    let analyzer = SensitivityAnalyzer::default();
    let baseline = ParameterSet::default();
    let assumptions = AssumptionSet::default();

    let a = analyzer.analyze(&baseline, &assumptions, None).unwrap();
    let b = analyzer.analyze(&baseline, &assumptions, None).unwrap();
    assert_eq!(a, b);
    for parameter in Parameter::ALL {
        assert_eq!(
            a.analysis[&parameter].sensitivity_scores,
            b.analysis[&parameter].sensitivity_scores
        );
    }
}

#[test]
fn test_sweep_covers_the_whole_domain() {
    let analyzer = SensitivityAnalyzer::default();
    let report = analyzer
        .analyze(
            &ParameterSet::default(),
            &AssumptionSet::default(),
            Some(Parameter::PopulationGrowth),
        )
        .unwrap();

    assert_eq!(report.analysis.len(), 1);
    let variations = &report.analysis[&Parameter::PopulationGrowth].variations;
    assert_eq!(variations.len(), 11);
    assert_eq!(variations[0].parameter_value, 0.95);
    assert_eq!(variations[10].parameter_value, 1.1);
    assert!(
        variations
            .windows(2)
            .all(|w| w[0].parameter_value < w[1].parameter_value)
    );
}

#[test]
fn test_all_parameters_when_no_target() {
    let analyzer = SensitivityAnalyzer::default();
    let report = analyzer
        .analyze(&ParameterSet::default(), &AssumptionSet::default(), None)
        .unwrap();
    assert_eq!(report.analysis.len(), 4);
    for sensitivity in report.analysis.values() {
        assert_eq!(sensitivity.sensitivity_scores.len(), Metric::ALL.len());
    }
}

#[test]
fn test_renewable_share_drives_energy_security() {
    let analyzer = SensitivityAnalyzer::default();
    let report = analyzer
        .analyze(&ParameterSet::default(), &AssumptionSet::default(), None)
        .unwrap();

    // floor 0.4 to 1.0 across the sweep, and no other lever moves it
    let renewable = &report.analysis[&Parameter::RenewableEnergyShare];
    let score = renewable.sensitivity_scores[&Metric::EnergySecurityIndex];
    assert_eq!(score.min, 0.4);
    assert_eq!(score.max, 1.0);
    assert_eq!(score.sensitivity, 0.6);

    let ranking = report.ranking(Metric::EnergySecurityIndex);
    assert_eq!(ranking[0].0, Parameter::RenewableEnergyShare);
    for (_, sensitivity) in &ranking[1..] {
        assert_eq!(*sensitivity, 0.0);
    }
}

#[test]
fn test_absolute_metrics_are_normalized_by_baseline() {
    let analyzer = SensitivityAnalyzer::default();
    let report = analyzer
        .analyze(
            &ParameterSet::default(),
            &AssumptionSet::default(),
            Some(Parameter::RenewableEnergyShare),
        )
        .unwrap();

    // CO2 runs from its zero-renewable peak down to zero at full renewables
    let score = report.analysis[&Parameter::RenewableEnergyShare].sensitivity_scores
        [&Metric::Co2Emissions];
    assert_eq!(score.min, 0.0);
    let baseline = report.baseline.results.co2_emissions;
    assert!((score.sensitivity - score.range / baseline).abs() < 1e-3);
    assert!(score.sensitivity > 1.0);
}

#[test]
fn test_zero_baseline_falls_back_to_range() {
    let analyzer = SensitivityAnalyzer::default();
    let baseline = ParameterSet::default()
        .with(Parameter::RenewableEnergyShare, 1.0)
        .unwrap();
    let report = analyzer
        .analyze(
            &baseline,
            &AssumptionSet::default(),
            Some(Parameter::RenewableEnergyShare),
        )
        .unwrap();

    assert_eq!(report.baseline.results.co2_emissions, 0.0);
    let score = report.analysis[&Parameter::RenewableEnergyShare].sensitivity_scores
        [&Metric::Co2Emissions];
    // raw range, reported to more decimals than the range itself
    assert!(score.sensitivity > 1000.0);
    assert!((score.sensitivity - score.range).abs() < 0.1);
}

#[test]
fn test_baseline_matches_compute() {
    let analyzer = SensitivityAnalyzer::default();
    let params = ParameterSet::business_as_usual();
    let assumptions = AssumptionSet::default();
    let report = analyzer
        .analyze(&params, &assumptions, Some(Parameter::WaterConservationLevel))
        .unwrap();

    let direct = NexusModel::default().compute(&params, &assumptions).unwrap();
    assert_eq!(report.baseline.results, direct);
    assert_eq!(report.baseline.parameters, params);
}

#[test]
fn test_single_point_sweep_is_configuration_error() {
    let analyzer =
        SensitivityAnalyzer::new(NexusModel::default(), SensitivityConfig { points: 1 });
    let err = analyzer
        .analyze(&ParameterSet::default(), &AssumptionSet::default(), None)
        .unwrap_err();
    assert!(matches!(
        err,
        NexusError::Configuration(ConfigurationError::InvalidEngineConfig {
            field: "sensitivity.points",
            ..
        })
    ));
}
