//! Parsed log data types.

use dta_core::{PathMetadataResolver, parse_duration_seconds};
use serde::{Deserialize, Serialize};

/// Iteration number the routers print for work done before the first step.
pub const PREPROCESSING_ITERATION: i64 = -1;

/// Timing of a router/simulation block, or a bare duration for steps and experiments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub begin_time: Option<String>,
    pub end_time: Option<String>,
    /// Raw duration text: nanoseconds or `H:MM:SS.micro`.
    pub duration: Option<String>,
    pub duration_seconds: Option<f64>,
}

impl PhaseTiming {
    pub fn from_duration(text: &str) -> Self {
        Self {
            begin_time: None,
            end_time: None,
            duration: Some(text.to_string()),
            duration_seconds: parse_duration_seconds(text),
        }
    }

    pub fn set_duration(&mut self, text: &str) {
        self.duration = Some(text.to_string());
        self.duration_seconds = parse_duration_seconds(text);
    }
}

/// One `<executable>; <path>; <iteration>; <phase>; <nanos>` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDetail {
    pub executable: String,
    pub output_dir: String,
    pub iteration: i64,
    /// e.g. "preprocessing", "cch customization", "cch routing"
    pub phase_name: String,
    pub duration_nanos: Option<u64>,
    pub duration_seconds: Option<f64>,
}

impl PhaseDetail {
    pub fn is_preprocessing(&self) -> bool {
        self.iteration == PREPROCESSING_ITERATION
    }
}

/// A single iteration of the assignment loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub iteration: i64,
    pub router: Option<PhaseTiming>,
    pub simulation: Option<PhaseTiming>,
    /// Whole-step duration from the step-end marker.
    pub duration: Option<PhaseTiming>,
    pub relative_travel_time_deviation: Option<f64>,
    pub relative_gap: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phase_details: Vec<PhaseDetail>,
}

impl Step {
    pub fn new(iteration: i64) -> Self {
        Self {
            iteration,
            ..Default::default()
        }
    }
}

/// One run of an algorithm on an instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    /// e.g. "cch", "fastdta_1_1_1", "sumo-sample_1_2_3"
    pub algorithm: String,
    /// e.g. "cch", "fastdta", "sumo-sample"
    pub algorithm_base: String,
    pub samples: Option<String>,
    pub instance_index: i64,
    pub repetition: i64,
    pub output_dir: String,
    /// Argument text of the start marker; absent when built from a phase record.
    pub arguments: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preprocessing_phases: Vec<PhaseDetail>,
    pub total_duration: Option<PhaseTiming>,
}

impl Experiment {
    /// Identity is taken from the output directory and never changes afterwards.
    pub fn from_output_dir(
        resolver: &PathMetadataResolver,
        output_dir: &str,
        arguments: Option<String>,
    ) -> Self {
        let meta = resolver.resolve(output_dir);
        Self {
            algorithm: meta.algorithm.full,
            algorithm_base: meta.algorithm.base,
            samples: meta.algorithm.samples,
            instance_index: meta.instance_index,
            repetition: meta.repetition,
            output_dir: output_dir.to_string(),
            arguments,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_keeps_raw_text_for_unparsable_durations() {
        let timing = PhaseTiming::from_duration("soon");
        assert_eq!(timing.duration.as_deref(), Some("soon"));
        assert_eq!(timing.duration_seconds, None);
    }

    #[test]
    fn experiment_identity_from_path() {
        let exp = Experiment::from_output_dir(
            &PathMetadataResolver::default(),
            "/out/3/sumo-sample_2_2/4",
            Some("--routing-algorithm sumo-sample".to_string()),
        );
        assert_eq!(exp.algorithm, "sumo-sample_2_2");
        assert_eq!(exp.algorithm_base, "sumo-sample");
        assert_eq!(exp.samples.as_deref(), Some("2 2"));
        assert_eq!(exp.instance_index, 3);
        assert_eq!(exp.repetition, 4);
        assert!(exp.steps.is_empty());
    }
}
