use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use nexus_core::model::Parameter;

#[derive(Parser, Debug)]
#[command(name = "nexus")]
#[command(about = "Food-energy-water nexus scenario engine", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Engine configuration YAML (tolerances, trials, sweep points)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Assumptions YAML (replacement set and/or overrides)
    #[arg(short, long, global = true)]
    pub assumptions: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Which scenario to run: a preset or file, plus per-parameter overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ScenarioArgs {
    /// Preset key or path to a scenario YAML file (defaults when omitted)
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// Override one parameter, e.g. --set renewable_energy_share=0.6
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(Parameter, f64)>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute outcome metrics for one scenario
    Compute {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Include the subsystem breakdown and solver diagnostics
        #[arg(long)]
        breakdown: bool,

        /// Attach Monte Carlo percentile bands to the results
        #[arg(long)]
        uncertainty: bool,

        /// Seed for the uncertainty bands
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Monte Carlo p10/p50/p90 bands over the model coefficients
    Uncertainty {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Number of trials (engine config default when omitted)
        #[arg(short, long)]
        trials: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// One-at-a-time sensitivity sweep
    Sensitivity {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Sweep only this parameter
        #[arg(short, long, value_parser = parse_parameter)]
        parameter: Option<Parameter>,

        /// Sweep points per parameter (engine config default when omitted)
        #[arg(long)]
        points: Option<usize>,
    },

    /// Project a scenario forward under compounding population growth
    Project {
        #[command(flatten)]
        scenario: ScenarioArgs,

        #[arg(short, long, default_value_t = 10)]
        years: u32,
    },

    /// Compare several scenarios side by side
    Compare {
        /// Preset keys or scenario files
        #[arg(required = true, num_args = 1..)]
        scenarios: Vec<String>,
    },

    /// Explain what changed between two scenarios
    Explain {
        /// Preset key or scenario file for the starting point
        from: String,
        /// Preset key or scenario file to compare against
        to: String,
    },

    /// List the example scenarios
    Presets,

    /// List the policy parameters and their domains
    Parameters,

    /// Show the assumption set in effect
    Assumptions,
}

pub fn parse_parameter(s: &str) -> Result<Parameter, String> {
    Parameter::from_key(s).ok_or_else(|| {
        let known: Vec<&str> = Parameter::ALL.iter().map(|p| p.key()).collect();
        format!("unknown parameter `{s}` (expected one of: {})", known.join(", "))
    })
}

pub fn parse_override(s: &str) -> Result<(Parameter, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    let parameter = parse_parameter(key.trim())?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {parameter}: {e}"))?;
    Ok((parameter, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("renewable_energy_share=0.6"),
            Ok((Parameter::RenewableEnergyShare, 0.6))
        );
        assert!(parse_override("renewable_energy_share").is_err());
        assert!(parse_override("solar=0.6").is_err());
        assert!(parse_override("population_growth=fast").is_err());
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nexus",
            "project",
            "--scenario",
            "business_as_usual",
            "--years",
            "5",
            "--format",
            "yaml",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Yaml);
        match cli.command {
            Command::Project { scenario, years } => {
                assert_eq!(scenario.scenario.as_deref(), Some("business_as_usual"));
                assert_eq!(years, 5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_compare_requires_scenarios() {
        assert!(Cli::try_parse_from(["nexus", "compare"]).is_err());
    }
}
