//! One-at-a-time parameter sensitivity
//!
//! Each parameter is swept across its whole domain while the others stay at
//! the baseline. A metric's score is the swept range, normalized by the
//! baseline magnitude for absolute metrics so scores are comparable across
//! units.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::config::SensitivityConfig;
use crate::error::Result;
use crate::model::{
    AssumptionSet, Coefficients, Metric, MetricValues, Parameter, ParameterSet, ResultSet,
    round_to,
};
use crate::nexus::{NexusModel, Solution};

/// Decimal places for sweep values and scores
const DECIMALS: i32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub parameters: ParameterSet,
    pub results: ResultSet,
}

/// One sweep point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub parameter_value: f64,
    pub results: ResultSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityScore {
    pub sensitivity: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSensitivity {
    pub variations: Vec<Variation>,
    pub sensitivity_scores: BTreeMap<Metric, SensitivityScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub baseline: Baseline,
    pub analysis: BTreeMap<Parameter, ParameterSensitivity>,
}

impl SensitivityReport {
    /// Parameters ordered by their score for `metric`, most influential first
    pub fn ranking(&self, metric: Metric) -> Vec<(Parameter, f64)> {
        let mut ranked: Vec<(Parameter, f64)> = self
            .analysis
            .iter()
            .filter_map(|(parameter, s)| {
                s.sensitivity_scores
                    .get(&metric)
                    .map(|score| (*parameter, score.sensitivity))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

/// `points` evenly spaced values over [min, max], both endpoints exact
pub fn sweep_values(min: f64, max: f64, points: usize) -> Vec<f64> {
    if points <= 1 {
        return vec![min];
    }
    let step_size = (max - min) / (points - 1) as f64;
    (0..points)
        .map(|i| {
            if i == points - 1 {
                max
            } else {
                (min + step_size * i as f64).min(max)
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SensitivityAnalyzer {
    model: NexusModel,
    config: SensitivityConfig,
}

impl SensitivityAnalyzer {
    pub fn new(model: NexusModel, config: SensitivityConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &SensitivityConfig {
        &self.config
    }

    /// Sweep `target` (or every parameter when `None`) around `baseline`
    pub fn analyze(
        &self,
        baseline: &ParameterSet,
        assumptions: &AssumptionSet,
        target: Option<Parameter>,
    ) -> Result<SensitivityReport> {
        baseline.validate()?;
        self.config.validate()?;
        let coefficients = Coefficients::resolve(assumptions)?;

        let _span = tracing::debug_span!("analyze", points = self.config.points).entered();

        let base = self.solve(baseline, &coefficients)?;
        let targets: Vec<Parameter> = match target {
            Some(parameter) => vec![parameter],
            None => Parameter::ALL.to_vec(),
        };

        let mut analysis = BTreeMap::new();
        for parameter in targets {
            let sweep = self.sweep(baseline, parameter, &coefficients)?;
            tracing::debug!(%parameter, points = sweep.len(), "sensitivity sweep complete");
            analysis.insert(parameter, summarize(&base.raw, sweep));
        }

        Ok(SensitivityReport {
            baseline: Baseline {
                parameters: *baseline,
                results: base.results,
            },
            analysis,
        })
    }

    fn solve(&self, params: &ParameterSet, c: &Coefficients) -> Result<Solution> {
        self.model.solve_resolved(params, params.population_growth, c)
    }

    fn sweep(
        &self,
        baseline: &ParameterSet,
        parameter: Parameter,
        c: &Coefficients,
    ) -> Result<Vec<(f64, Solution)>> {
        let (min, max) = parameter.domain();
        let values = sweep_values(min, max, self.config.points);

        let run_point = |value: f64| -> Result<(f64, Solution)> {
            let params = baseline.with(parameter, value)?;
            Ok((value, self.solve(&params, c)?))
        };

        #[cfg(feature = "parallel")]
        let sweep = values.into_par_iter().map(run_point).collect();
        #[cfg(not(feature = "parallel"))]
        let sweep = values.into_iter().map(run_point).collect();
        sweep
    }
}

fn summarize(baseline: &MetricValues, sweep: Vec<(f64, Solution)>) -> ParameterSensitivity {
    let sensitivity_scores = Metric::ALL
        .into_iter()
        .map(|metric| {
            let (min, max) = sweep
                .iter()
                .map(|(_, s)| s.raw.get(metric))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            let range = max - min;
            let reference = baseline.get(metric).abs();
            let sensitivity = if metric.is_index() || reference == 0.0 {
                range
            } else {
                range / reference
            };
            let score = SensitivityScore {
                sensitivity: round_to(sensitivity, DECIMALS),
                min: metric.round(min),
                max: metric.round(max),
                range: metric.round(range),
            };
            (metric, score)
        })
        .collect();

    let variations = sweep
        .into_iter()
        .map(|(value, solution)| Variation {
            parameter_value: round_to(value, DECIMALS),
            results: solution.results,
        })
        .collect();

    ParameterSensitivity {
        variations,
        sensitivity_scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_values_endpoints_exact() {
        let values = sweep_values(0.95, 1.10, 11);
        assert_eq!(values.len(), 11);
        assert_eq!(values[0], 0.95);
        assert_eq!(values[10], 1.10);
        assert!(values.iter().all(|v| (0.95..=1.10).contains(v)));
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sweep_values_two_points() {
        assert_eq!(sweep_values(0.0, 1.0, 2), vec![0.0, 1.0]);
    }

    #[test]
    fn test_sweep_values_single_point() {
        assert_eq!(sweep_values(0.0, 1.0, 1), vec![0.0]);
    }
}
