//! Analysis service layer for DTA experiments.
//!
//! Joins the parsed experiment log with the parameter file into one
//! read-only [`DataModel`] and provides the queries reporting code is built
//! on. Both the CLI and external report generators go through this crate.

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod query;

// Re-export key types for convenience
pub use config::{AnalysisConfig, PhaseNames, normalize_algorithm};
pub use error::{AppError, AppResult};
pub use export::{read_json, to_json_string, write_json};
pub use model::{DataModel, LoadReport, build_model, load_experiments, load_parameters};
pub use query::{
    ExperimentSummary, average_phase_times, avg_phase_times_per_step,
    experiments_by_instance, experiments_by_instance_and_algorithm, median_relative_gaps,
    phase_times_by_name, phase_times_for_experiment, relative_deviations, relative_gaps,
    routing_times, simulation_times, simulation_times_by_prefix_and_aggregation,
    summarize_experiment,
};
