//! Side-by-side statistics over several computed scenarios

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::model::{Metric, ResultSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// One value per scenario, in input order
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub scenarios: usize,
    pub metrics: BTreeMap<Metric, MetricComparison>,
}

impl ComparisonReport {
    pub fn get(&self, metric: Metric) -> Option<&MetricComparison> {
        self.metrics.get(&metric)
    }

    /// Index of the best scenario for `metric`, honoring its polarity.
    /// Ties resolve to the earliest scenario.
    pub fn best(&self, metric: Metric) -> Option<usize> {
        let values = &self.metrics.get(&metric)?.values;
        let better = |a: f64, b: f64| {
            if metric.lower_is_better() { a < b } else { a > b }
        };
        values
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                Some((_, b)) if !better(v, b) => best,
                _ => Some((i, v)),
            })
            .map(|(i, _)| i)
    }
}

/// Compare already computed result sets
pub fn compare(results: &[ResultSet]) -> Result<ComparisonReport> {
    if results.is_empty() {
        return Err(ValidationError::EmptyComparison.into());
    }

    let metrics = Metric::ALL
        .into_iter()
        .map(|metric| {
            let values: Vec<f64> = results.iter().map(|r| r.get(metric)).collect();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let comparison = MetricComparison {
                min,
                max,
                mean: metric.round(mean),
                values,
            };
            (metric, comparison)
        })
        .collect();

    Ok(ComparisonReport {
        scenarios: results.len(),
        metrics,
    })
}
