//! Instance records.

use serde::{Deserialize, Serialize};

/// One network-and-demand scenario with its convergence thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Position among the candidate rows of the parameter file (0-based).
    pub line_index: i64,
    pub input_dir: String,
    pub prefix: String,
    pub trip_file_name: String,
    pub begin: f64,
    pub end: f64,
    pub aggregation: f64,
    pub convergence_deviation: f64,
    pub convergence_relgap: f64,
    pub last_iter: i64,
}

impl Instance {
    /// `<prefix>-<trip file>-<aggregation>-<relative gap>`, safe to use in file names.
    pub fn filename_base(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            sanitize_for_filename(&self.prefix),
            sanitize_for_filename(&self.trip_file_name),
            sanitize_for_filename(&self.aggregation.to_string()),
            sanitize_for_filename(&self.convergence_relgap.to_string()),
        )
    }
}

/// Basename of `name` with every run of characters outside `[A-Za-z0-9_.-]` replaced by `_`.
pub fn sanitize_for_filename(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    let mut out = String::with_capacity(base.len());
    let mut in_run = false;
    for c in base.chars() {
        if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_basename_and_collapses_runs() {
        assert_eq!(sanitize_for_filename("/data/nets/karlsruhe"), "karlsruhe");
        assert_eq!(sanitize_for_filename("trips (1 h).xml"), "trips_1_h_.xml");
        assert_eq!(sanitize_for_filename("a  b::c"), "a_b_c");
        assert_eq!(sanitize_for_filename("dir/"), "");
    }

    #[test]
    fn filename_base() {
        let instance = Instance {
            line_index: 0,
            input_dir: "/data/in".to_string(),
            prefix: "berlin city".to_string(),
            trip_file_name: "trips.xml".to_string(),
            begin: 0.0,
            end: 3600.0,
            aggregation: 300.0,
            convergence_deviation: 0.01,
            convergence_relgap: 0.005,
            last_iter: 50,
        };
        assert_eq!(instance.filename_base(), "berlin_city-trips.xml-300-0.005");
    }
}
