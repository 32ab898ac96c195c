//! Line recognizer for dua-iterate logs.
//!
//! Every line is tested against an ordered list of patterns and the first
//! match wins. Two pattern groups only apply while the parser is inside the
//! matching structure (timing lines inside a phase block, metric lines inside
//! a step); otherwise they are skipped and the line falls through.

use regex::{Captures, Regex};

use crate::LogResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Router,
    Simulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingField {
    Begin,
    End,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    RelativeDeviation,
    RelativeGap,
}

/// A recognized line. Numeric fields are left as text; the parser decides how
/// to degrade when they do not convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent<'a> {
    ExperimentStart {
        output_dir: &'a str,
        arguments: &'a str,
    },
    PhaseDetail {
        executable: &'a str,
        output_dir: &'a str,
        iteration: &'a str,
        phase_name: &'a str,
        duration_nanos: &'a str,
    },
    StepStart {
        iteration: &'a str,
    },
    PhaseEnter(PhaseKind),
    Timing {
        field: TimingField,
        value: &'a str,
    },
    BlockClose,
    Metric {
        metric: Metric,
        value: &'a str,
    },
    StepEnd {
        iteration: &'a str,
        duration: &'a str,
    },
    ExperimentEnd {
        duration: &'a str,
    },
}

/// Parser state the gated patterns depend on.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecognizerContext {
    pub phase_open: bool,
    pub step_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    ExperimentStart,
    PhaseDetail,
    StepStart,
    RouterEnter,
    SimulationEnter,
    BeginTime,
    EndTime,
    Duration,
    BlockClose,
    RelativeDeviation,
    RelativeGap,
    StepEnd,
    ExperimentEnd,
}

/// Priority order; do not reorder.
const PATTERNS: [(LineKind, &str); 13] = [
    (
        LineKind::ExperimentStart,
        r"Calling duaIterate\.py with output directory:\s*(\S+)\s+and arguments:\s*(.+)$",
    ),
    (
        LineKind::PhaseDetail,
        r"^\s*([^;]+);\s*([^;]+);\s*(-?[0-9]+);\s*([^;]+);\s*([0-9]+)\s*$",
    ),
    (LineKind::StepStart, r"^\s*>\s*Executing step\s+([0-9]+)\s*$"),
    (LineKind::RouterEnter, r"^\s*>>\s*Running router\b"),
    (LineKind::SimulationEnter, r"^\s*>>\s*Running simulation\b"),
    (LineKind::BeginTime, r"^\s*>>>\s*Begin time:\s*(.+?)\s*$"),
    (LineKind::EndTime, r"^\s*>>>\s*End time:\s*(.+?)\s*$"),
    (LineKind::Duration, r"^\s*>>>\s*Duration:\s*(.+?)\s*$"),
    (LineKind::BlockClose, r"^\s*<<\s*$"),
    (
        LineKind::RelativeDeviation,
        r"^\s*<\s*relative travel time deviation in the last.*?steps:\s*(.+?)\s*$",
    ),
    (
        LineKind::RelativeGap,
        r"^\s*<\s*relative gap in iteration.*?:\s*(.+?)\s*$",
    ),
    (
        LineKind::StepEnd,
        r"^\s*<\s*Step\s+([0-9]+)\s*ended\s*\(duration:\s*(.+?)\)\s*$",
    ),
    (
        LineKind::ExperimentEnd,
        r"^\s*dua-iterate ended\s*\(duration:\s*(.+?)\)\s*$",
    ),
];

impl LineKind {
    fn applies(self, ctx: RecognizerContext) -> bool {
        match self {
            LineKind::BeginTime | LineKind::EndTime | LineKind::Duration => ctx.phase_open,
            LineKind::RelativeDeviation | LineKind::RelativeGap => ctx.step_open,
            _ => true,
        }
    }

    fn event<'a>(self, caps: &Captures<'a>) -> LineEvent<'a> {
        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str().trim());
        match self {
            LineKind::ExperimentStart => LineEvent::ExperimentStart {
                output_dir: group(1),
                arguments: group(2),
            },
            LineKind::PhaseDetail => LineEvent::PhaseDetail {
                executable: group(1),
                output_dir: group(2),
                iteration: group(3),
                phase_name: group(4),
                duration_nanos: group(5),
            },
            LineKind::StepStart => LineEvent::StepStart {
                iteration: group(1),
            },
            LineKind::RouterEnter => LineEvent::PhaseEnter(PhaseKind::Router),
            LineKind::SimulationEnter => LineEvent::PhaseEnter(PhaseKind::Simulation),
            LineKind::BeginTime => LineEvent::Timing {
                field: TimingField::Begin,
                value: group(1),
            },
            LineKind::EndTime => LineEvent::Timing {
                field: TimingField::End,
                value: group(1),
            },
            LineKind::Duration => LineEvent::Timing {
                field: TimingField::Duration,
                value: group(1),
            },
            LineKind::BlockClose => LineEvent::BlockClose,
            LineKind::RelativeDeviation => LineEvent::Metric {
                metric: Metric::RelativeDeviation,
                value: group(1),
            },
            LineKind::RelativeGap => LineEvent::Metric {
                metric: Metric::RelativeGap,
                value: group(1),
            },
            LineKind::StepEnd => LineEvent::StepEnd {
                iteration: group(1),
                duration: group(2),
            },
            LineKind::ExperimentEnd => LineEvent::ExperimentEnd {
                duration: group(1),
            },
        }
    }
}

/// Compiled, ordered line patterns.
#[derive(Debug, Clone)]
pub struct LineRecognizer {
    matchers: Vec<(LineKind, Regex)>,
}

impl LineRecognizer {
    pub fn new() -> LogResult<Self> {
        let mut matchers = Vec::with_capacity(PATTERNS.len());
        for (kind, pattern) in PATTERNS {
            matchers.push((kind, Regex::new(pattern)?));
        }
        Ok(Self { matchers })
    }

    /// First applicable pattern that matches, or `None` for unrelated output.
    pub fn recognize<'a>(&self, line: &'a str, ctx: RecognizerContext) -> Option<LineEvent<'a>> {
        self.matchers
            .iter()
            .filter(|(kind, _)| kind.applies(ctx))
            .find_map(|(kind, regex)| regex.captures(line).map(|caps| kind.event(&caps)))
    }
}
