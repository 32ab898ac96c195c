//! Experiment reconstruction state machine.
//!
//! A log is consumed in one pass. The parser keeps at most one open
//! experiment, one open step and one open router/simulation block; closed
//! experiments are appended to the result in encounter order.

use std::path::Path;

use dta_core::{PathMetadataResolver, parse_duration_seconds, parse_float};
use tracing::{debug, info, warn};

use crate::matchers::{LineEvent, LineRecognizer, Metric, PhaseKind, RecognizerContext, TimingField};
use crate::types::{Experiment, PhaseDetail, PhaseTiming, Step};
use crate::{LogError, LogResult};

/// Counters describing one parse, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub matched: usize,
    pub ignored: usize,
    /// Experiments created from a phase record because no start marker was seen.
    pub synthesized_experiments: usize,
    /// Phase records outside any step (iteration != -1).
    pub orphan_phase_details: usize,
    /// Steps closed while no experiment was open.
    pub orphan_steps: usize,
    /// Matched lines whose duration, number or iteration did not convert.
    pub malformed_tokens: usize,
}

/// Result of parsing one log.
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    pub experiments: Vec<Experiment>,
    pub stats: ParseStats,
}

/// Log parser; reusable across files, each parse starts from a fresh state.
#[derive(Debug, Clone)]
pub struct LogParser {
    recognizer: LineRecognizer,
    resolver: PathMetadataResolver,
}

impl LogParser {
    pub fn new() -> LogResult<Self> {
        Self::with_resolver(PathMetadataResolver::default())
    }

    pub fn with_resolver(resolver: PathMetadataResolver) -> LogResult<Self> {
        Ok(Self {
            recognizer: LineRecognizer::new()?,
            resolver,
        })
    }

    /// Read the whole file (invalid UTF-8 is replaced) and parse it.
    pub fn parse_file(&self, path: &Path) -> LogResult<ParsedLog> {
        let bytes = std::fs::read(path).map_err(|e| LogError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let parsed = self.parse_str(&text);

        info!(
            path = %path.display(),
            lines = parsed.stats.lines,
            experiments = parsed.experiments.len(),
            "parsed experiment log"
        );
        Ok(parsed)
    }

    pub fn parse_str(&self, text: &str) -> ParsedLog {
        self.parse_lines(text.lines())
    }

    pub fn parse_lines<'a, I>(&self, lines: I) -> ParsedLog
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut state = ParserState::default();
        for line in lines {
            state.stats.lines += 1;
            match self.recognizer.recognize(line, state.context()) {
                Some(event) => {
                    state.stats.matched += 1;
                    state.apply(event, &self.resolver);
                }
                None => state.stats.ignored += 1,
            }
        }
        state.finish()
    }
}

#[derive(Debug, Default)]
struct ParserState {
    experiments: Vec<Experiment>,
    experiment: Option<Experiment>,
    step: Option<Step>,
    phase: Option<PhaseKind>,
    router_scratch: PhaseTiming,
    simulation_scratch: PhaseTiming,
    stats: ParseStats,
}

impl ParserState {
    fn context(&self) -> RecognizerContext {
        RecognizerContext {
            phase_open: self.phase.is_some(),
            step_open: self.step.is_some(),
        }
    }

    fn apply(&mut self, event: LineEvent<'_>, resolver: &PathMetadataResolver) {
        match event {
            LineEvent::ExperimentStart {
                output_dir,
                arguments,
            } => {
                self.flush_experiment();
                self.close_step();
                self.experiment = Some(Experiment::from_output_dir(
                    resolver,
                    output_dir,
                    Some(arguments.to_string()),
                ));
                self.reset_phase_scratch();
            }
            LineEvent::PhaseDetail {
                executable,
                output_dir,
                iteration,
                phase_name,
                duration_nanos,
            } => self.on_phase_detail(
                resolver,
                executable,
                output_dir,
                iteration,
                phase_name,
                duration_nanos,
            ),
            LineEvent::StepStart { iteration } => {
                let Ok(iteration) = iteration.parse::<i64>() else {
                    self.malformed("step iteration", iteration);
                    return;
                };
                self.close_step();
                self.step = Some(Step::new(iteration));
                self.reset_phase_scratch();
            }
            LineEvent::PhaseEnter(kind) => {
                self.phase = Some(kind);
                *self.scratch(kind) = PhaseTiming::default();
            }
            LineEvent::Timing { field, value } => {
                let Some(kind) = self.phase else {
                    return;
                };
                let scratch = self.scratch(kind);
                match field {
                    TimingField::Begin => scratch.begin_time = Some(value.to_string()),
                    TimingField::End => scratch.end_time = Some(value.to_string()),
                    TimingField::Duration => {
                        scratch.set_duration(value);
                        if scratch.duration_seconds.is_none() {
                            self.malformed("phase duration", value);
                        }
                    }
                }
            }
            LineEvent::BlockClose => {
                if let (Some(kind), Some(step)) = (self.phase, self.step.as_mut()) {
                    let (slot, scratch) = match kind {
                        PhaseKind::Router => (&mut step.router, &self.router_scratch),
                        PhaseKind::Simulation => (&mut step.simulation, &self.simulation_scratch),
                    };
                    // a later block in the same step never overwrites the first
                    if slot.is_none() {
                        *slot = Some(scratch.clone());
                    }
                }
                self.phase = None;
            }
            LineEvent::Metric { metric, value } => {
                let parsed = parse_float(value);
                if parsed.is_none() {
                    self.malformed("metric", value);
                }
                if let Some(step) = self.step.as_mut() {
                    match metric {
                        Metric::RelativeDeviation => step.relative_travel_time_deviation = parsed,
                        Metric::RelativeGap => step.relative_gap = parsed,
                    }
                }
            }
            LineEvent::StepEnd { duration, .. } => {
                if let Some(step) = self.step.as_mut() {
                    step.duration = Some(PhaseTiming::from_duration(duration));
                }
                if parse_duration_seconds(duration).is_none() {
                    self.malformed("step duration", duration);
                }
                self.close_step();
                self.reset_phase_scratch();
            }
            LineEvent::ExperimentEnd { duration } => {
                match self.experiment.as_mut() {
                    Some(exp) => exp.total_duration = Some(PhaseTiming::from_duration(duration)),
                    None => debug!(duration, "experiment end without an open experiment"),
                }
                if parse_duration_seconds(duration).is_none() {
                    self.malformed("experiment duration", duration);
                }
                self.flush_experiment();
                self.close_step();
                self.reset_phase_scratch();
            }
        }
    }

    fn on_phase_detail(
        &mut self,
        resolver: &PathMetadataResolver,
        executable: &str,
        output_dir: &str,
        iteration: &str,
        phase_name: &str,
        duration_nanos: &str,
    ) {
        // logs without a start marker: identity comes from the record's own path
        if self.experiment.is_none() {
            self.stats.synthesized_experiments += 1;
            debug!(output_dir, "opening experiment from phase record");
            self.experiment = Some(Experiment::from_output_dir(resolver, output_dir, None));
        }

        let Ok(iteration) = iteration.parse::<i64>() else {
            self.malformed("phase iteration", iteration);
            return;
        };
        let nanos = duration_nanos.parse::<u64>().ok();
        if nanos.is_none() {
            self.malformed("phase nanoseconds", duration_nanos);
        }
        let detail = PhaseDetail {
            executable: executable.to_string(),
            output_dir: output_dir.to_string(),
            iteration,
            phase_name: phase_name.to_string(),
            duration_nanos: nanos,
            duration_seconds: nanos.map(|n| n as f64 / 1e9),
        };

        if detail.is_preprocessing() {
            if let Some(exp) = self.experiment.as_mut() {
                exp.preprocessing_phases.push(detail);
            }
        } else if let Some(step) = self.step.as_mut() {
            step.phase_details.push(detail);
        } else {
            self.stats.orphan_phase_details += 1;
            debug!(
                phase = %detail.phase_name,
                iteration = detail.iteration,
                "phase record outside any step"
            );
        }
    }

    fn scratch(&mut self, kind: PhaseKind) -> &mut PhaseTiming {
        match kind {
            PhaseKind::Router => &mut self.router_scratch,
            PhaseKind::Simulation => &mut self.simulation_scratch,
        }
    }

    fn reset_phase_scratch(&mut self) {
        self.phase = None;
        self.router_scratch = PhaseTiming::default();
        self.simulation_scratch = PhaseTiming::default();
    }

    /// Move the open step into the open experiment; without one the step is dropped.
    fn close_step(&mut self) {
        let Some(step) = self.step.take() else {
            return;
        };
        match self.experiment.as_mut() {
            Some(exp) => exp.steps.push(step),
            None => {
                self.stats.orphan_steps += 1;
                debug!(iteration = step.iteration, "step closed outside any experiment");
            }
        }
    }

    /// Close the open step into the open experiment and append the experiment.
    fn flush_experiment(&mut self) {
        if self.experiment.is_some() {
            self.close_step();
        }
        if let Some(exp) = self.experiment.take() {
            self.experiments.push(exp);
        }
    }

    fn malformed(&mut self, what: &'static str, token: &str) {
        self.stats.malformed_tokens += 1;
        warn!(what, token, "unparsable token, value left empty");
    }

    fn finish(mut self) -> ParsedLog {
        self.flush_experiment();
        self.close_step();
        ParsedLog {
            experiments: self.experiments,
            stats: self.stats,
        }
    }
}
