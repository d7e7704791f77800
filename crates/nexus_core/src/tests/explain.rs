//! Tests for scenario diff explanations

use crate::explain::{ChangeExplainer, Magnitude};
use crate::model::{AssumptionSet, Metric, Parameter, ParameterSet, keys};
use crate::nexus::NexusModel;

#[test]
fn test_self_comparison_has_no_changes() {
    let model = NexusModel::default();
    let params = ParameterSet::default();
    let results = model.compute(&params, &AssumptionSet::default()).unwrap();

    let explanation = ChangeExplainer::default()
        .explain(&params, &results, &params, &results)
        .unwrap();
    assert!(explanation.parameter_changes.is_empty());
    assert!(explanation.outcome_changes.is_empty());
    assert!(explanation.trade_offs.is_empty());
    assert!(explanation.key_insights.is_empty());
}

#[test]
fn test_green_transition_against_baseline() {
    let model = NexusModel::default();
    let assumptions = AssumptionSet::default();
    let p1 = ParameterSet::default();
    let p2 = ParameterSet::green_transition();
    let r1 = model.compute(&p1, &assumptions).unwrap();
    let r2 = model.compute(&p2, &assumptions).unwrap();

    let explanation = ChangeExplainer::default().explain(&p1, &r1, &p2, &r2).unwrap();

    // renewable share 0.3 -> 0.8 is the largest relative lever move
    let lead = &explanation.parameter_changes[0];
    assert_eq!(lead.parameter, Parameter::RenewableEnergyShare);
    assert_eq!(lead.magnitude, Magnitude::Major);
    assert_eq!(lead.change, 0.5);

    let co2 = explanation
        .outcome_changes
        .iter()
        .find(|o| o.metric == Metric::Co2Emissions)
        .unwrap();
    assert!(co2.is_improvement);
    assert!(co2.change < 0.0);

    assert!(explanation.key_insights[0].starts_with("Changing Renewable Energy Share"));
    assert!(
        explanation
            .key_insights
            .iter()
            .any(|i| i.starts_with("Sustainability score rose"))
    );
    assert!(
        explanation
            .key_insights
            .iter()
            .any(|i| i.contains("net positive"))
    );
}

#[test]
fn test_lever_insights_name_their_outcome() {
    let model = NexusModel::default();
    let assumptions = AssumptionSet::default();
    let p1 = ParameterSet::default();
    let p2 = ParameterSet::green_transition();
    let r1 = model.compute(&p1, &assumptions).unwrap();
    let r2 = model.compute(&p2, &assumptions).unwrap();

    let explanation = ChangeExplainer::default().explain(&p1, &r1, &p2, &r2).unwrap();
    let insights = &explanation.key_insights;
    assert!(insights.iter().any(|i| i.starts_with(
        "Increasing renewable energy share by 50 percentage points reduced CO2 emissions by"
    )));
    assert!(
        insights
            .iter()
            .any(|i| i.starts_with("Water conservation measures led to")
                && i.ends_with("in water demand"))
    );
}

#[test]
fn test_small_lever_moves_get_no_lever_insight() {
    let model = NexusModel::default();
    let assumptions = AssumptionSet::default();
    let p1 = ParameterSet::default();
    let p2 = p1
        .with(Parameter::RenewableEnergyShare, 0.4)
        .unwrap()
        .with(Parameter::WaterConservationLevel, 0.55)
        .unwrap();
    let r1 = model.compute(&p1, &assumptions).unwrap();
    let r2 = model.compute(&p2, &assumptions).unwrap();

    let explanation = ChangeExplainer::default().explain(&p1, &r1, &p2, &r2).unwrap();
    assert!(!explanation.key_insights.is_empty());
    assert!(
        explanation
            .key_insights
            .iter()
            .all(|i| !i.starts_with("Increasing renewable") && !i.starts_with("Water conservation"))
    );
}

#[test]
fn test_outcomes_ranked_by_percent_change() {
    let model = NexusModel::default();
    let assumptions = AssumptionSet::default();
    let p1 = ParameterSet::business_as_usual();
    let p2 = ParameterSet::food_security_focus();
    let r1 = model.compute(&p1, &assumptions).unwrap();
    let r2 = model.compute(&p2, &assumptions).unwrap();

    let explanation = ChangeExplainer::default().explain(&p1, &r1, &p2, &r2).unwrap();
    let impacts: Vec<f64> = explanation
        .outcome_changes
        .iter()
        .map(|o| o.percent_change.unwrap().abs())
        .collect();
    assert!(impacts.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_trade_offs_span_different_subsystems() {
    let model = NexusModel::default();
    let assumptions = AssumptionSet::default();
    let p1 = ParameterSet::default();
    // more food at the cost of water
    let p2 = p1.with(Parameter::FoodProductionIntensity, 1.0).unwrap();
    let r1 = model.compute(&p1, &assumptions).unwrap();
    let r2 = model.compute(&p2, &assumptions).unwrap();

    let explanation = ChangeExplainer::default().explain(&p1, &r1, &p2, &r2).unwrap();
    assert!(!explanation.trade_offs.is_empty());
    for trade_off in &explanation.trade_offs {
        assert_ne!(trade_off.improved_category, trade_off.worsened_category);
        assert!(trade_off.description.starts_with("Improving "));
    }
    assert!(
        explanation
            .trade_offs
            .iter()
            .any(|t| t.improved == Metric::FoodProduction && t.worsened == Metric::WaterDemand)
    );
}

#[test]
fn test_assumption_change_is_attributed() {
    let model = NexusModel::default();
    let params = ParameterSet::default();
    let mut assumptions = AssumptionSet::default();
    let r1 = model.compute(&params, &assumptions).unwrap();
    assumptions.set_value(keys::CO2_EMISSION_FACTOR, 0.25);
    let r2 = model.compute(&params, &assumptions).unwrap();

    let explanation = ChangeExplainer::default()
        .explain(&params, &r1, &params, &r2)
        .unwrap();
    assert!(explanation.parameter_changes.is_empty());
    assert!(!explanation.outcome_changes.is_empty());
    assert!(explanation.key_insights[0].contains("assumptions"));
}
