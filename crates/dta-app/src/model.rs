//! The joined, read-only data model.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use dta_log::{Experiment, LogParser, ParseStats, ParsedLog};
use dta_params::{Instance, LoadedInstances, RejectedRow, load_instances};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AnalysisConfig;
use crate::error::AppResult;

/// Experiments joined with the instances they ran on.
///
/// Keys are not cross-checked: an experiment whose instance index has no
/// instance is kept, and [`DataModel::instance_for`] returns `None` for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataModel {
    pub experiments: Vec<Experiment>,
    pub instances: BTreeMap<i64, Instance>,
    /// Sorted, distinct algorithm names over `experiments`.
    pub algorithms: Vec<String>,
}

impl DataModel {
    pub fn assemble(experiments: Vec<Experiment>, instances: BTreeMap<i64, Instance>) -> Self {
        let algorithms = distinct_algorithms(&experiments);
        Self {
            experiments,
            instances,
            algorithms,
        }
    }

    /// New model holding the experiments `keep` accepts; `self` is untouched.
    pub fn filter<F>(&self, keep: F) -> Self
    where
        F: Fn(&Experiment) -> bool,
    {
        let experiments = self
            .experiments
            .iter()
            .filter(|exp| keep(exp))
            .cloned()
            .collect();
        Self::assemble(experiments, self.instances.clone())
    }

    pub fn instance_for(&self, experiment: &Experiment) -> Option<&Instance> {
        self.instances.get(&experiment.instance_index)
    }
}

fn distinct_algorithms(experiments: &[Experiment]) -> Vec<String> {
    experiments
        .iter()
        .map(|exp| exp.algorithm.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Diagnostics gathered while building a model.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub parse_stats: ParseStats,
    pub rejected_rows: Vec<RejectedRow>,
}

/// Parse a log with the algorithm families from `config`.
pub fn load_experiments(log_path: &Path, config: &AnalysisConfig) -> AppResult<ParsedLog> {
    let parser = LogParser::with_resolver(config.path_resolver()?)?;
    Ok(parser.parse_file(log_path)?)
}

pub fn load_parameters(csv_path: &Path) -> AppResult<LoadedInstances> {
    Ok(load_instances(csv_path)?)
}

/// Load both input files and join them.
pub fn build_model(
    log_path: &Path,
    csv_path: &Path,
    config: &AnalysisConfig,
) -> AppResult<(DataModel, LoadReport)> {
    let parsed = load_experiments(log_path, config)?;
    let loaded = load_parameters(csv_path)?;

    let model = DataModel::assemble(parsed.experiments, loaded.instances);
    info!(
        experiments = model.experiments.len(),
        instances = model.instances.len(),
        algorithms = model.algorithms.len(),
        "assembled data model"
    );

    let report = LoadReport {
        parse_stats: parsed.stats,
        rejected_rows: loaded.rejected,
    };
    Ok((model, report))
}
