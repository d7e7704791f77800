//! Integration tests for the nexus engine
//!
//! Tests are organized by topic:
//! - `nexus_model` - Deterministic solve, bounds and convergence
//! - `uncertainty` - Monte Carlo bands and seeding
//! - `sensitivity` - Parameter sweeps and scores
//! - `projection` - Multi-year projection
//! - `comparison` - Cross-scenario statistics
//! - `explain` - Scenario diff explanations

mod explain;
mod projection;
mod sensitivity;
