//! Human-readable diff between two scenarios
//!
//! Parameter and outcome deltas are classified and ranked, then turned into a
//! handful of sentences and trade-off statements. Outcome polarity comes from
//! [`crate::model::LOWER_IS_BETTER`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ExplainerConfig;
use crate::error::Result;
use crate::model::{Metric, Parameter, ParameterSet, ResultSet, Subsystem, round_to};

/// Impact assigned to a change whose percent is undefined (old value zero)
const UNDEFINED_PERCENT_IMPACT: f64 = 100.0;

/// Renewable share increase (absolute) that earns its own emissions insight
const RENEWABLE_SHIFT: f64 = 0.2;
/// Water conservation change (absolute) that earns its own demand insight
const CONSERVATION_SHIFT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    Negligible,
    Moderate,
    Major,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterChange {
    pub parameter: Parameter,
    pub name: String,
    pub old_value: f64,
    pub new_value: f64,
    pub change: f64,
    /// Omitted when the old value is zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<f64>,
    pub magnitude: Magnitude,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeChange {
    pub metric: Metric,
    pub name: String,
    pub old_value: f64,
    pub new_value: f64,
    pub change: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<f64>,
    pub is_improvement: bool,
    pub description: String,
}

impl OutcomeChange {
    fn impact(&self) -> f64 {
        self.percent_change.map_or(UNDEFINED_PERCENT_IMPACT, f64::abs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOff {
    pub improved: Metric,
    pub worsened: Metric,
    pub improved_category: Subsystem,
    pub worsened_category: Subsystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improved_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worsened_percent: Option<f64>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeExplanation {
    pub parameter_changes: Vec<ParameterChange>,
    pub outcome_changes: Vec<OutcomeChange>,
    pub key_insights: Vec<String>,
    pub trade_offs: Vec<TradeOff>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeExplainer {
    config: ExplainerConfig,
}

fn percent_change(old: f64, new: f64) -> Option<f64> {
    (old != 0.0).then(|| round_to((new - old) / old * 100.0, 1))
}

fn direction(change: f64) -> &'static str {
    if change > 0.0 { "increased" } else { "decreased" }
}

fn describe(name: &str, change: f64, percent: Option<f64>, decimals: i32) -> String {
    match percent {
        Some(p) => format!("{name} {} by {}%", direction(change), p.abs()),
        None => format!(
            "{name} {} by {} from zero",
            direction(change),
            round_to(change.abs(), decimals)
        ),
    }
}

impl ChangeExplainer {
    pub fn new(config: ExplainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExplainerConfig {
        &self.config
    }

    /// Explain how scenario 2 differs from scenario 1
    pub fn explain(
        &self,
        params1: &ParameterSet,
        results1: &ResultSet,
        params2: &ParameterSet,
        results2: &ResultSet,
    ) -> Result<ChangeExplanation> {
        self.config.validate()?;
        params1.validate()?;
        params2.validate()?;

        let parameter_changes = self.parameter_changes(params1, params2);
        let outcome_changes = outcome_changes(results1, results2);
        let key_insights = key_insights(&parameter_changes, &outcome_changes, results1, results2);
        let trade_offs = self.trade_offs(&outcome_changes);

        tracing::debug!(
            parameter_changes = parameter_changes.len(),
            outcome_changes = outcome_changes.len(),
            trade_offs = trade_offs.len(),
            "scenario diff explained"
        );

        Ok(ChangeExplanation {
            parameter_changes,
            outcome_changes,
            key_insights,
            trade_offs,
        })
    }

    /// Tier a change by percent, or by share of the domain width when the
    /// percent is undefined
    fn magnitude(&self, parameter: Parameter, change: f64, percent: Option<f64>) -> (Magnitude, f64) {
        let impact = percent.map(f64::abs).unwrap_or_else(|| {
            let (min, max) = parameter.domain();
            change.abs() / (max - min) * 100.0
        });
        let magnitude = if impact > self.config.major_percent {
            Magnitude::Major
        } else if impact >= self.config.moderate_percent {
            Magnitude::Moderate
        } else {
            Magnitude::Negligible
        };
        (magnitude, impact)
    }

    fn parameter_changes(&self, p1: &ParameterSet, p2: &ParameterSet) -> Vec<ParameterChange> {
        let mut ranked: Vec<(f64, ParameterChange)> = Parameter::ALL
            .into_iter()
            .filter_map(|parameter| {
                let (old, new) = (p1.get(parameter), p2.get(parameter));
                if old == new {
                    return None;
                }
                let change = new - old;
                let percent = percent_change(old, new);
                let (magnitude, impact) = self.magnitude(parameter, change, percent);
                let entry = ParameterChange {
                    parameter,
                    name: parameter.display_name().to_string(),
                    old_value: round_to(old, 3),
                    new_value: round_to(new, 3),
                    change: round_to(change, 3),
                    percent_change: percent,
                    magnitude,
                    description: describe(parameter.display_name(), change, percent, 3),
                };
                Some((impact, entry))
            })
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked.into_iter().map(|(_, entry)| entry).collect()
    }

    fn trade_offs(&self, outcomes: &[OutcomeChange]) -> Vec<TradeOff> {
        // strongest significant change per subsystem, split by direction
        let mut improved: BTreeMap<Subsystem, &OutcomeChange> = BTreeMap::new();
        let mut worsened: BTreeMap<Subsystem, &OutcomeChange> = BTreeMap::new();
        for outcome in outcomes {
            let subsystem = outcome.metric.subsystem();
            if outcome.impact() < self.config.trade_off_min_percent {
                continue;
            }
            let side = if outcome.is_improvement {
                &mut improved
            } else {
                &mut worsened
            };
            let slot = side.entry(subsystem).or_insert(outcome);
            if outcome.impact() > slot.impact() {
                *slot = outcome;
            }
        }

        let mut trade_offs = Vec::new();
        for (gain_subsystem, gain) in &improved {
            for (loss_subsystem, loss) in &worsened {
                if gain_subsystem == loss_subsystem {
                    continue;
                }
                trade_offs.push(TradeOff {
                    improved: gain.metric,
                    worsened: loss.metric,
                    improved_category: *gain_subsystem,
                    worsened_category: *loss_subsystem,
                    improved_percent: gain.percent_change,
                    worsened_percent: loss.percent_change,
                    description: format!(
                        "Improving {} came at the cost of {}",
                        gain.name.to_lowercase(),
                        loss.name.to_lowercase()
                    ),
                });
            }
        }
        trade_offs
    }
}

fn outcome_changes(r1: &ResultSet, r2: &ResultSet) -> Vec<OutcomeChange> {
    let mut changes: Vec<OutcomeChange> = Metric::ALL
        .into_iter()
        .filter_map(|metric| {
            let (old, new) = (r1.get(metric), r2.get(metric));
            if old == new {
                return None;
            }
            let change = new - old;
            let percent = percent_change(old, new);
            Some(OutcomeChange {
                metric,
                name: metric.display_name().to_string(),
                old_value: metric.round(old),
                new_value: metric.round(new),
                change: metric.round(change),
                percent_change: percent,
                is_improvement: metric.is_improvement(change),
                description: describe(metric.display_name(), change, percent, metric.decimals()),
            })
        })
        .collect();
    changes.sort_by(|a, b| b.impact().total_cmp(&a.impact()));
    changes
}

fn strongest(outcomes: &[OutcomeChange], improvement: bool) -> Option<&OutcomeChange> {
    // outcomes are already ranked by impact
    outcomes.iter().find(|o| o.is_improvement == improvement)
}

fn percent_phrase(percent: Option<f64>) -> String {
    match percent {
        Some(p) => format!("{}%", p.abs()),
        None => "from zero".to_string(),
    }
}

/// Percent move of `metric`, zero when it did not move, `None` when undefined
fn outcome_percent(outcomes: &[OutcomeChange], metric: Metric) -> Option<f64> {
    match outcomes.iter().find(|o| o.metric == metric) {
        Some(outcome) => outcome.percent_change,
        None => Some(0.0),
    }
}

/// Sentences tying the renewable and conservation levers to the outcome each
/// one drives directly
fn lever_insights(parameters: &[ParameterChange], outcomes: &[OutcomeChange]) -> Vec<String> {
    let lever = |parameter: Parameter| {
        parameters
            .iter()
            .find(|p| p.parameter == parameter)
            .map_or(0.0, |p| p.change)
    };
    let mut insights = Vec::new();

    let renewable = lever(Parameter::RenewableEnergyShare);
    if renewable > RENEWABLE_SHIFT
        && let Some(co2) = outcome_percent(outcomes, Metric::Co2Emissions)
    {
        let verb = if co2 > 0.0 { "raised" } else { "reduced" };
        insights.push(format!(
            "Increasing renewable energy share by {:.0} percentage points {verb} CO2 emissions by {:.1}%",
            renewable * 100.0,
            co2.abs()
        ));
    }

    let conservation = lever(Parameter::WaterConservationLevel);
    if conservation.abs() > CONSERVATION_SHIFT
        && let Some(water) = outcome_percent(outcomes, Metric::WaterDemand)
    {
        let effect = if water > 0.0 { "increase" } else { "reduction" };
        insights.push(format!(
            "Water conservation measures led to {:.1}% {effect} in water demand",
            water.abs()
        ));
    }

    insights
}

fn key_insights(
    parameters: &[ParameterChange],
    outcomes: &[OutcomeChange],
    r1: &ResultSet,
    r2: &ResultSet,
) -> Vec<String> {
    let mut insights = Vec::new();

    if let Some(lead) = parameters.first() {
        let mut effects = Vec::new();
        if let Some(best) = strongest(outcomes, true) {
            effects.push(format!(
                "improved {} by {}",
                best.name,
                percent_phrase(best.percent_change)
            ));
        }
        if let Some(worst) = strongest(outcomes, false) {
            effects.push(format!(
                "worsened {} by {}",
                worst.name,
                percent_phrase(worst.percent_change)
            ));
        }
        let cause = format!("{} from {} to {}", lead.name, lead.old_value, lead.new_value);
        if effects.is_empty() {
            insights.push(format!("Changing {cause} left the outcome metrics unchanged"));
        } else {
            insights.push(format!("Changing {cause} {}", effects.join(" and ")));
        }
    } else if !outcomes.is_empty() {
        insights.push(
            "Outcomes changed while every policy parameter stayed the same, so the difference comes from the model assumptions"
                .to_string(),
        );
    }

    insights.extend(lever_insights(parameters, outcomes));

    let (s1, s2) = (r1.sustainability_score, r2.sustainability_score);
    if s1 != s2 {
        let verb = if s2 > s1 { "rose" } else { "fell" };
        insights.push(format!("Sustainability score {verb} from {s1} to {s2}"));
    }

    let (improvements, setbacks) = outcomes
        .iter()
        .filter(|o| o.metric != Metric::SustainabilityScore)
        .fold((0, 0), |(up, down), o| {
            if o.is_improvement {
                (up + 1, down)
            } else {
                (up, down + 1)
            }
        });
    if improvements >= 2 && improvements > setbacks {
        insights.push(
            "This scenario shows net positive outcomes across multiple sustainability metrics"
                .to_string(),
        );
    } else if improvements == 0 && setbacks > 0 {
        insights.push(
            "This scenario may require optimization to improve sustainability outcomes".to_string(),
        );
    }

    insights
}
