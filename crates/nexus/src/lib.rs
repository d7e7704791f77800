//! Command-line front end for the nexus engine
//!
//! Loads scenarios, assumption snapshots and engine configuration from YAML,
//! runs one analysis and prints the result as JSON or YAML.

#![warn(clippy::all)]

pub mod cli;
pub mod commands;
pub mod logging;
pub mod storage;

pub use cli::{Cli, Command, OutputFormat};
pub use commands::{Context, Envelope, execute};
pub use logging::init_logging;
