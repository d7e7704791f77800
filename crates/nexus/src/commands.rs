//! Command execution and output rendering
//!
//! Every command returns its payload wrapped in an [`Envelope`] so scripted
//! callers can tell outputs apart and know when they were produced.

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, eyre};
use jiff::Timestamp;
use nexus_core::model::{
    AssumptionSet, ConvergenceInfo, Parameter, ParameterInfo, ParameterSet, ResultSet,
    SubsystemBreakdown, presets,
};
use nexus_core::{
    ChangeExplanation, ComparisonReport, Engine, EngineConfig, ProjectionPoint, SensitivityAnalyzer,
    SensitivityReport, UncertaintyReport, compare, config::SensitivityConfig,
};
use serde::Serialize;

use crate::cli::{Command, OutputFormat, ScenarioArgs};
use crate::storage::{self, Scenario};

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub command: &'static str,
    pub generated_at: Timestamp,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(command: &'static str, data: T) -> Self {
        Self {
            command,
            generated_at: Timestamp::now(),
            data,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(self).wrap_err("failed to render JSON output")
            }
            OutputFormat::Yaml => {
                serde_saphyr::to_string(self).map_err(|e| eyre!("failed to render YAML output: {e}"))
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComputeOutput {
    pub scenario: Scenario,
    pub results: ResultSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<SubsystemBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<ConvergenceInfo>,
}

#[derive(Debug, Serialize)]
pub struct UncertaintyOutput {
    pub scenario: Scenario,
    pub report: UncertaintyReport,
}

#[derive(Debug, Serialize)]
pub struct SensitivityOutput {
    pub scenario: Scenario,
    pub report: SensitivityReport,
}

#[derive(Debug, Serialize)]
pub struct ProjectionOutput {
    pub scenario: Scenario,
    pub projection: Vec<ProjectionPoint>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonOutput {
    pub scenarios: Vec<Scenario>,
    pub report: ComparisonReport,
}

#[derive(Debug, Serialize)]
pub struct ExplainOutput {
    pub from: Scenario,
    pub to: Scenario,
    pub explanation: ChangeExplanation,
}

/// Engine and assumption snapshot shared by every command in one run
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub engine: Engine,
    pub assumptions: AssumptionSet,
}

impl Context {
    pub fn load(config: Option<&Path>, assumptions: Option<&Path>) -> Result<Self> {
        let config = match config {
            Some(path) => storage::load_engine_config(path)
                .wrap_err_with(|| format!("failed to load engine config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        let assumptions = match assumptions {
            Some(path) => storage::load_assumptions(path)
                .wrap_err_with(|| format!("failed to load assumptions {}", path.display()))?,
            None => AssumptionSet::default(),
        };
        Ok(Self {
            engine: Engine::new(config)?,
            assumptions,
        })
    }
}

fn scenario_from(reference: &str) -> Result<Scenario> {
    storage::resolve_scenario(reference)
        .wrap_err_with(|| format!("failed to load scenario `{reference}`"))
}

fn select_scenario(args: &ScenarioArgs) -> Result<Scenario> {
    let mut scenario = match &args.scenario {
        Some(reference) => scenario_from(reference)?,
        None => Scenario {
            name: "Default".to_string(),
            description: None,
            parameters: ParameterSet::default(),
        },
    };
    for &(parameter, value) in &args.overrides {
        scenario.parameters = scenario
            .parameters
            .with(parameter, value)
            .wrap_err_with(|| format!("invalid --set {parameter}={value}"))?;
    }
    Ok(scenario)
}

/// Run one command and render its envelope
pub fn execute(ctx: &Context, command: &Command, format: OutputFormat) -> Result<String> {
    let engine = &ctx.engine;
    let assumptions = &ctx.assumptions;

    match command {
        Command::Compute {
            scenario,
            breakdown,
            uncertainty,
            seed,
        } => {
            let scenario = select_scenario(scenario)?;
            tracing::info!(scenario = %scenario.name, "computing scenario");
            let solution = engine
                .model()
                .solve(&scenario.parameters, assumptions)
                .wrap_err_with(|| format!("failed to compute `{}`", scenario.name))?;
            let mut results = solution.results;
            if *uncertainty {
                let report = engine
                    .uncertainty()
                    .quantify_default(&scenario.parameters, assumptions, *seed)
                    .wrap_err("uncertainty quantification failed")?;
                results = nexus_core::uncertainty::annotate(results, &report);
            }
            let output = ComputeOutput {
                scenario,
                results,
                breakdown: breakdown.then_some(solution.breakdown),
                convergence: breakdown.then_some(solution.convergence),
            };
            Envelope::new("compute", output).render(format)
        }

        Command::Uncertainty {
            scenario,
            trials,
            seed,
        } => {
            let scenario = select_scenario(scenario)?;
            let uncertainty = engine.uncertainty();
            let trials = trials.unwrap_or(uncertainty.config().trials);
            tracing::info!(scenario = %scenario.name, trials, "quantifying uncertainty");
            let report = uncertainty
                .quantify(&scenario.parameters, assumptions, trials, *seed)
                .wrap_err_with(|| format!("uncertainty quantification failed for `{}`", scenario.name))?;
            Envelope::new("uncertainty", UncertaintyOutput { scenario, report }).render(format)
        }

        Command::Sensitivity {
            scenario,
            parameter,
            points,
        } => {
            let scenario = select_scenario(scenario)?;
            let analyzer = match points {
                Some(points) => {
                    SensitivityAnalyzer::new(engine.model(), SensitivityConfig { points: *points })
                }
                None => engine.sensitivity(),
            };
            tracing::info!(
                scenario = %scenario.name,
                points = analyzer.config().points,
                "running sensitivity sweep"
            );
            let report = analyzer
                .analyze(&scenario.parameters, assumptions, *parameter)
                .wrap_err_with(|| format!("sensitivity analysis failed for `{}`", scenario.name))?;
            Envelope::new("sensitivity", SensitivityOutput { scenario, report }).render(format)
        }

        Command::Project { scenario, years } => {
            let scenario = select_scenario(scenario)?;
            tracing::info!(scenario = %scenario.name, years, "projecting scenario");
            let projection = engine
                .projection()
                .project(&scenario.parameters, assumptions, *years)
                .wrap_err_with(|| format!("projection failed for `{}`", scenario.name))?;
            Envelope::new("project", ProjectionOutput {
                scenario,
                projection,
            })
            .render(format)
        }

        Command::Compare { scenarios } => {
            let scenarios = scenarios
                .iter()
                .map(|reference| scenario_from(reference))
                .collect::<Result<Vec<_>>>()?;
            let model = engine.model();
            let results = scenarios
                .iter()
                .map(|s| {
                    model
                        .compute(&s.parameters, assumptions)
                        .wrap_err_with(|| format!("failed to compute `{}`", s.name))
                })
                .collect::<Result<Vec<_>>>()?;
            let report = compare(&results)?;
            Envelope::new("compare", ComparisonOutput { scenarios, report }).render(format)
        }

        Command::Explain { from, to } => {
            let from = scenario_from(from)?;
            let to = scenario_from(to)?;
            let model = engine.model();
            let r1 = model
                .compute(&from.parameters, assumptions)
                .wrap_err_with(|| format!("failed to compute `{}`", from.name))?;
            let r2 = model
                .compute(&to.parameters, assumptions)
                .wrap_err_with(|| format!("failed to compute `{}`", to.name))?;
            let explanation =
                engine
                    .explainer()
                    .explain(&from.parameters, &r1, &to.parameters, &r2)?;
            Envelope::new("explain", ExplainOutput {
                from,
                to,
                explanation,
            })
            .render(format)
        }

        Command::Presets => Envelope::new("presets", presets()).render(format),

        Command::Parameters => {
            let info: Vec<ParameterInfo> = Parameter::ALL.into_iter().map(Parameter::info).collect();
            Envelope::new("parameters", info).render(format)
        }

        Command::Assumptions => Envelope::new("assumptions", assumptions).render(format),
    }
}
