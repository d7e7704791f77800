mod assumptions;
mod parameters;
mod results;

pub use assumptions::{
    Assumption, AssumptionCategory, AssumptionSet, Coefficients, ScoreWeights, keys,
};
pub use parameters::{Parameter, ParameterInfo, ParameterSet, Preset, preset, presets};
pub use results::{
    ConvergenceInfo, LOWER_IS_BETTER, Metric, MetricValues, PercentileBand, ResultSet,
    Subsystem, SubsystemBreakdown, round_to,
};
