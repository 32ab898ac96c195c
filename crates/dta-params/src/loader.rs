//! Parameter file loading.
//!
//! Format, one instance per row, `;`-separated:
//! `in_dir;prefix;trip_file_name;begin;end;aggregation;convergence_deviation;convergence_relgap;last_iter`
//!
//! Blank and `#` lines are skipped. Every other row consumes a line index,
//! even when it is rejected, so instance indices stay aligned with the order
//! in which the batch runner read the file.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Terminator, Trim};
use tracing::{info, warn};

use crate::instance::Instance;
use crate::{ParamsError, ParamsResult};

const FIELD_COUNT: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    TooFewFields { found: usize },
    InvalidNumber { column: &'static str, value: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooFewFields { found } => {
                write!(f, "expected {FIELD_COUNT} fields, found {found}")
            }
            RejectReason::InvalidNumber { column, value } => {
                write!(f, "invalid {column}: {value:?}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub line_index: i64,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedInstances {
    pub instances: BTreeMap<i64, Instance>,
    pub rejected: Vec<RejectedRow>,
}

/// Load a parameter file. Only an unreadable file is an error.
pub fn load_instances(path: &Path) -> ParamsResult<LoadedInstances> {
    let bytes = std::fs::read(path).map_err(|e| ParamsError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let loaded = parse_instances(&String::from_utf8_lossy(&bytes))?;

    info!(
        path = %path.display(),
        instances = loaded.instances.len(),
        rejected = loaded.rejected.len(),
        "loaded parameter file"
    );
    Ok(loaded)
}

pub fn parse_instances(text: &str) -> ParamsResult<LoadedInstances> {
    let candidates: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    let body = candidates.join("\n");

    // one record per candidate row: no quoting, '\n' is the only terminator
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .terminator(Terminator::Any(b'\n'))
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let mut loaded = LoadedInstances::default();
    for (index, record) in reader.records().enumerate() {
        let line_index = index as i64;
        match instance_from_record(line_index, &record?) {
            Ok(instance) => {
                loaded.instances.insert(line_index, instance);
            }
            Err(reason) => {
                warn!(line_index, %reason, "skipping parameter row");
                loaded.rejected.push(RejectedRow { line_index, reason });
            }
        }
    }
    Ok(loaded)
}

fn instance_from_record(line_index: i64, record: &StringRecord) -> Result<Instance, RejectReason> {
    if record.len() < FIELD_COUNT {
        return Err(RejectReason::TooFewFields {
            found: record.len(),
        });
    }
    let text = |i: usize| record.get(i).unwrap_or_default();
    let number = |i: usize, column: &'static str| -> Result<f64, RejectReason> {
        text(i).parse().map_err(|_| RejectReason::InvalidNumber {
            column,
            value: text(i).to_string(),
        })
    };

    Ok(Instance {
        line_index,
        input_dir: text(0).to_string(),
        prefix: text(1).to_string(),
        trip_file_name: text(2).to_string(),
        begin: number(3, "begin")?,
        end: number(4, "end")?,
        aggregation: number(5, "aggregation")?,
        convergence_deviation: number(6, "convergence_deviation")?,
        convergence_relgap: number(7, "convergence_relgap")?,
        last_iter: text(8)
            .parse()
            .map_err(|_| RejectReason::InvalidNumber {
                column: "last_iter",
                value: text(8).to_string(),
            })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = "/data/berlin;berlin;trips.xml;0;3600;300;0.01;0.005;50";

    #[test]
    fn parses_a_row() {
        let loaded = parse_instances(ROW).unwrap();
        let instance = &loaded.instances[&0];
        assert_eq!(instance.input_dir, "/data/berlin");
        assert_eq!(instance.prefix, "berlin");
        assert_eq!(instance.trip_file_name, "trips.xml");
        assert_eq!(instance.end, 3600.0);
        assert_eq!(instance.aggregation, 300.0);
        assert_eq!(instance.convergence_relgap, 0.005);
        assert_eq!(instance.last_iter, 50);
        assert!(loaded.rejected.is_empty());
    }

    #[test]
    fn blank_and_comment_lines_do_not_consume_indices() {
        let text = format!("# header\n\n   \n{ROW}\n  # indented comment\n{ROW}\n");
        let loaded = parse_instances(&text).unwrap();
        assert_eq!(loaded.instances.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn short_row_consumes_its_index() {
        let short = "/data/x;x;trips.xml;0;3600;300;0.01;0.005";
        let text = format!("{ROW}\n{short}\n{ROW}\n");
        let loaded = parse_instances(&text).unwrap();
        assert_eq!(loaded.instances.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(loaded.instances[&2].line_index, 2);
        assert_eq!(
            loaded.rejected,
            vec![RejectedRow {
                line_index: 1,
                reason: RejectReason::TooFewFields { found: 8 },
            }]
        );
    }

    #[test]
    fn non_numeric_row_consumes_its_index() {
        let bad = "/data/x;x;trips.xml;0;3600;coarse;0.01;0.005;50";
        let float_iter = "/data/x;x;trips.xml;0;3600;300;0.01;0.005;50.0";
        let text = format!("{bad}\n{float_iter}\n{ROW}");
        let loaded = parse_instances(&text).unwrap();
        assert_eq!(loaded.instances.keys().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(loaded.rejected.len(), 2);
        assert_eq!(
            loaded.rejected[0].reason.to_string(),
            "invalid aggregation: \"coarse\""
        );
    }

    #[test]
    fn extra_fields_and_whitespace_are_tolerated() {
        let text = " /d ; p ; t.xml ; 0 ; 10 ; 5 ; 0.1 ; 0.2 ; 3 ; trailing note ";
        let loaded = parse_instances(text).unwrap();
        let instance = &loaded.instances[&0];
        assert_eq!(instance.prefix, "p");
        assert_eq!(instance.last_iter, 3);
    }

    #[test]
    fn quotes_are_literal() {
        let text = "\"/d;p;t.xml;0;10;5;0.1;0.2;3\n/d;p;t.xml;0;10;5;0.1;0.2;4";
        let loaded = parse_instances(text).unwrap();
        assert_eq!(loaded.instances.len(), 2);
        assert_eq!(loaded.instances[&0].input_dir, "\"/d");
        assert_eq!(loaded.instances[&1].last_iter, 4);
    }
}
