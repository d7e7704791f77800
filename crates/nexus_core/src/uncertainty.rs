//! Monte Carlo uncertainty quantification
//!
//! Each trial scales every physical coefficient by an independent draw from a
//! bounded symmetric distribution around 1, re-solves the model and records
//! the unrounded metrics. Trial seeds are drawn up front from a master RNG so
//! the result depends only on the master seed, not on how trials are
//! scheduled across threads.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use rand::distr::Uniform;
use rand_distr::{Distribution, Triangular};
#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::config::{PerturbationDistribution, UncertaintyConfig};
use crate::error::{ConfigurationError, Result, ValidationError};
use crate::model::{
    AssumptionSet, Coefficients, Metric, MetricValues, ParameterSet, PercentileBand, ResultSet,
};
use crate::nexus::{NexusModel, Solution};
use crate::percentiles::{percentiles, standard};

/// Percentile bands per metric and how they were produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyReport {
    pub bands: BTreeMap<Metric, PercentileBand>,
    pub trials: usize,
    pub seed: u64,
    /// Trials whose feedback loop hit the iteration cap
    pub non_converged_trials: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UncertaintyEngine {
    model: NexusModel,
    config: UncertaintyConfig,
}

/// Relative perturbation sampler
enum Perturbation {
    None,
    Triangular(Triangular<f64>),
    Uniform(Uniform<f64>),
}

impl Perturbation {
    fn new(config: &UncertaintyConfig) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        let spread = config.spread;
        if spread == 0.0 {
            return Ok(Perturbation::None);
        }
        let unusable = ConfigurationError::InvalidEngineConfig {
            field: "uncertainty.spread",
            reason: "cannot build perturbation distribution",
        };
        match config.distribution {
            PerturbationDistribution::Triangular => Triangular::new(-spread, spread, 0.0)
                .map(Perturbation::Triangular)
                .map_err(|_| unusable),
            PerturbationDistribution::Uniform => Uniform::new_inclusive(-spread, spread)
                .map(Perturbation::Uniform)
                .map_err(|_| unusable),
        }
    }

    /// Multiplicative factor in [1 - spread, 1 + spread]
    fn factor<R: RngCore>(&self, rng: &mut R) -> f64 {
        match self {
            Perturbation::None => 1.0,
            Perturbation::Triangular(d) => 1.0 + d.sample(rng),
            Perturbation::Uniform(d) => 1.0 + d.sample(rng),
        }
    }
}

impl UncertaintyEngine {
    pub fn new(model: NexusModel, config: UncertaintyConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &UncertaintyConfig {
        &self.config
    }

    /// Quantify uncertainty using the configured trial count
    pub fn quantify_default(
        &self,
        params: &ParameterSet,
        assumptions: &AssumptionSet,
        seed: Option<u64>,
    ) -> Result<UncertaintyReport> {
        self.quantify(params, assumptions, self.config.trials, seed)
    }

    /// Run `trials` perturbed solves and report p10/p50/p90 per metric.
    ///
    /// With `seed = None` a seed is drawn from the thread RNG and recorded in
    /// the report so the run can be replayed.
    pub fn quantify(
        &self,
        params: &ParameterSet,
        assumptions: &AssumptionSet,
        trials: usize,
        seed: Option<u64>,
    ) -> Result<UncertaintyReport> {
        params.validate()?;
        if trials == 0 {
            return Err(ValidationError::NoTrials.into());
        }
        let nominal = Coefficients::resolve(assumptions)?;
        let perturbation = Perturbation::new(&self.config)?;

        let seed = seed.unwrap_or_else(|| rand::rng().next_u64());
        let mut master = SmallRng::seed_from_u64(seed);
        let trial_seeds: Vec<u64> = (0..trials).map(|_| master.next_u64()).collect();

        let _span = tracing::debug_span!("quantify", trials, seed).entered();

        let run_trial = |trial_seed: u64| -> Result<Solution> {
            let mut rng = SmallRng::seed_from_u64(trial_seed);
            let coefficients = nominal.perturbed(|| perturbation.factor(&mut rng));
            self.model
                .solve_resolved(params, params.population_growth, &coefficients)
        };

        #[cfg(feature = "parallel")]
        let solutions: Result<Vec<Solution>> = trial_seeds.into_par_iter().map(run_trial).collect();
        #[cfg(not(feature = "parallel"))]
        let solutions: Result<Vec<Solution>> = trial_seeds.into_iter().map(run_trial).collect();
        let solutions = solutions?;

        let non_converged_trials = solutions
            .iter()
            .filter(|s| !s.convergence.converged)
            .count();
        if non_converged_trials > 0 {
            tracing::warn!(
                non_converged_trials,
                trials,
                "some Monte Carlo trials hit the iteration cap"
            );
        }

        let samples: Vec<MetricValues> = solutions.into_iter().map(|s| s.raw).collect();
        Ok(UncertaintyReport {
            bands: bands(&samples),
            trials,
            seed,
            non_converged_trials,
        })
    }

    /// Compute the deterministic result and attach uncertainty bands to it
    pub fn compute_with_uncertainty(
        &self,
        params: &ParameterSet,
        assumptions: &AssumptionSet,
        seed: Option<u64>,
    ) -> Result<ResultSet> {
        let results = self.model.compute(params, assumptions)?;
        let report = self.quantify_default(params, assumptions, seed)?;
        Ok(annotate(results, &report))
    }
}

/// Attach a report's bands to a result set
pub fn annotate(results: ResultSet, report: &UncertaintyReport) -> ResultSet {
    results.with_uncertainties(report.bands.clone())
}

fn bands(samples: &[MetricValues]) -> BTreeMap<Metric, PercentileBand> {
    let qs = [standard::P10, standard::P50, standard::P90];
    Metric::ALL
        .into_iter()
        .filter_map(|metric| {
            let mut values: Vec<f64> = samples.iter().map(|s| s.get(metric)).collect();
            let p = percentiles(&mut values, &qs)?;
            Some((
                metric,
                PercentileBand {
                    p10: metric.round(p[0]),
                    p50: metric.round(p[1]),
                    p90: metric.round(p[2]),
                },
            ))
        })
        .collect()
}
