//! Query helpers over an assembled [`DataModel`].
//!
//! Nothing here mutates the model. Groups borrow experiments from the model
//! and keep its experiment order.

use std::collections::BTreeMap;

use dta_core::{mean, median};
use dta_log::{Experiment, Step};

use crate::model::DataModel;

fn skipped(step: &Step, skip_first: bool) -> bool {
    skip_first && step.iteration == 0
}

fn phase_key(phase_name: &str) -> String {
    phase_name.trim().to_lowercase()
}

fn is_ignored(phase_name: &str, ignored: &[String]) -> bool {
    ignored.iter().any(|p| p.eq_ignore_ascii_case(phase_name.trim()))
}

/// Group experiments by instance index.
pub fn experiments_by_instance(model: &DataModel) -> BTreeMap<i64, Vec<&Experiment>> {
    let mut groups: BTreeMap<i64, Vec<&Experiment>> = BTreeMap::new();
    for exp in &model.experiments {
        groups.entry(exp.instance_index).or_default().push(exp);
    }
    groups
}

/// Group experiments by `(instance index, algorithm)`.
pub fn experiments_by_instance_and_algorithm(
    model: &DataModel,
) -> BTreeMap<(i64, String), Vec<&Experiment>> {
    let mut groups: BTreeMap<(i64, String), Vec<&Experiment>> = BTreeMap::new();
    for exp in &model.experiments {
        groups
            .entry((exp.instance_index, exp.algorithm.clone()))
            .or_default()
            .push(exp);
    }
    groups
}

/// Router durations in seconds, in step order. Steps without a parsed duration are left out.
pub fn routing_times(exp: &Experiment, skip_first: bool) -> Vec<f64> {
    exp.steps
        .iter()
        .filter(|step| !skipped(step, skip_first))
        .filter_map(|step| step.router.as_ref()?.duration_seconds)
        .collect()
}

/// Simulation durations in seconds, in step order.
pub fn simulation_times(exp: &Experiment, skip_first: bool) -> Vec<f64> {
    exp.steps
        .iter()
        .filter(|step| !skipped(step, skip_first))
        .filter_map(|step| step.simulation.as_ref()?.duration_seconds)
        .collect()
}

pub fn relative_gaps(exp: &Experiment) -> BTreeMap<i64, f64> {
    exp.steps
        .iter()
        .filter_map(|step| Some((step.iteration, step.relative_gap?)))
        .collect()
}

pub fn relative_deviations(exp: &Experiment) -> BTreeMap<i64, f64> {
    exp.steps
        .iter()
        .filter_map(|step| Some((step.iteration, step.relative_travel_time_deviation?)))
        .collect()
}

/// Durations of every phase record whose name is one of `names` (case-insensitive).
pub fn phase_times_by_name(exp: &Experiment, names: &[&str], skip_first: bool) -> Vec<f64> {
    exp.steps
        .iter()
        .filter(|step| !skipped(step, skip_first))
        .flat_map(|step| &step.phase_details)
        .filter(|pd| names.iter().any(|n| n.eq_ignore_ascii_case(&pd.phase_name)))
        .filter_map(|pd| pd.duration_seconds)
        .collect()
}

/// Mean duration of `phase_name` per iteration; iterations without the phase are absent.
pub fn avg_phase_times_per_step(
    exp: &Experiment,
    phase_name: &str,
    skip_first: bool,
) -> BTreeMap<i64, f64> {
    let mut averages = BTreeMap::new();
    for step in exp.steps.iter().filter(|step| !skipped(step, skip_first)) {
        let times: Vec<f64> = step
            .phase_details
            .iter()
            .filter(|pd| pd.phase_name.eq_ignore_ascii_case(phase_name))
            .filter_map(|pd| pd.duration_seconds)
            .collect();
        if let Some(avg) = mean(&times) {
            averages.insert(step.iteration, avg);
        }
    }
    averages
}

/// All phase durations of one experiment keyed by lowercase phase name.
pub fn phase_times_for_experiment(
    exp: &Experiment,
    skip_first: bool,
    ignored: &[String],
) -> BTreeMap<String, Vec<f64>> {
    let mut times: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for step in exp.steps.iter().filter(|step| !skipped(step, skip_first)) {
        for pd in &step.phase_details {
            if is_ignored(&pd.phase_name, ignored) {
                continue;
            }
            if let Some(seconds) = pd.duration_seconds {
                times.entry(phase_key(&pd.phase_name)).or_default().push(seconds);
            }
        }
    }
    times
}

/// Average per-step time of each phase across `experiments`.
///
/// Records sharing a phase name within one step are summed first, so a
/// phase that runs twice per iteration counts once with its total. Iteration
/// 0 is skipped unless the experiment has a single step.
pub fn average_phase_times(experiments: &[&Experiment], ignored: &[String]) -> BTreeMap<String, f64> {
    let mut step_sums: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for exp in experiments {
        let single_step = exp.steps.len() == 1;
        for step in exp.steps.iter().filter(|step| !skipped(step, !single_step)) {
            let mut sums: BTreeMap<String, f64> = BTreeMap::new();
            for pd in &step.phase_details {
                if is_ignored(&pd.phase_name, ignored) {
                    continue;
                }
                if let Some(seconds) = pd.duration_seconds {
                    *sums.entry(phase_key(&pd.phase_name)).or_default() += seconds;
                }
            }
            for (name, sum) in sums {
                step_sums.entry(name).or_default().push(sum);
            }
        }
    }

    step_sums
        .into_iter()
        .filter_map(|(name, sums)| Some((name, mean(&sums)?)))
        .collect()
}

/// Median relative gap per iteration across `experiments`, sorted by iteration.
pub fn median_relative_gaps(experiments: &[&Experiment]) -> Vec<(i64, f64)> {
    let mut by_iteration: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for exp in experiments {
        for (iteration, gap) in relative_gaps(exp) {
            by_iteration.entry(iteration).or_default().push(gap);
        }
    }
    by_iteration
        .into_iter()
        .filter_map(|(iteration, gaps)| Some((iteration, median(&gaps)?)))
        .collect()
}

/// Every simulation duration keyed by `(instance prefix, aggregation)`.
///
/// Experiments without a matching instance are left out. Aggregation is
/// truncated to whole seconds. Iteration 0 is included.
pub fn simulation_times_by_prefix_and_aggregation(
    model: &DataModel,
) -> BTreeMap<(String, i64), Vec<f64>> {
    let mut result: BTreeMap<(String, i64), Vec<f64>> = BTreeMap::new();
    for exp in &model.experiments {
        let Some(instance) = model.instance_for(exp) else {
            continue;
        };
        let times = simulation_times(exp, false);
        if times.is_empty() {
            continue;
        }
        result
            .entry((instance.prefix.clone(), instance.aggregation as i64))
            .or_default()
            .extend(times);
    }
    result
}

/// Per-experiment overview.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentSummary {
    pub algorithm: String,
    pub instance_index: i64,
    pub repetition: i64,
    pub step_count: usize,
    pub mean_routing_s: Option<f64>,
    pub mean_simulation_s: Option<f64>,
    /// Relative gap of the last iteration that reported one.
    pub final_relative_gap: Option<f64>,
    pub total_duration_s: Option<f64>,
}

pub fn summarize_experiment(exp: &Experiment, skip_first: bool) -> ExperimentSummary {
    ExperimentSummary {
        algorithm: exp.algorithm.clone(),
        instance_index: exp.instance_index,
        repetition: exp.repetition,
        step_count: exp.steps.len(),
        mean_routing_s: mean(&routing_times(exp, skip_first)),
        mean_simulation_s: mean(&simulation_times(exp, skip_first)),
        final_relative_gap: relative_gaps(exp).values().next_back().copied(),
        total_duration_s: exp.total_duration.as_ref().and_then(|t| t.duration_seconds),
    }
}
