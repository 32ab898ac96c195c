//! Analysis configuration (YAML).
//!
//! ```yaml
//! sampled_algorithms: [fastdta, sumo-sample]
//! skip_first_iteration: true
//! phase_names:
//!   customization: { cch: cch customization, fastdta: calibration }
//!   routing: { cch: cch routing }
//! ignored_phases: [read queries]
//! ```
//!
//! Every field is optional; missing fields take the defaults below.

use std::collections::BTreeMap;
use std::path::Path;

use dta_core::{DEFAULT_SAMPLED_FAMILIES, PathMetadataResolver};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_CUSTOMIZATION_PHASE: &str = "customization";
pub const DEFAULT_ROUTING_PHASE: &str = "routing";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Algorithm families whose directory names carry a sample configuration.
    pub sampled_algorithms: Vec<String>,
    pub skip_first_iteration: bool,
    pub phase_names: PhaseNames,
    /// Phase names left out of phase breakdowns (case-insensitive).
    pub ignored_phases: Vec<String>,
}

/// Phase names per algorithm base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseNames {
    pub customization: BTreeMap<String, String>,
    pub routing: BTreeMap<String, String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sampled_algorithms: DEFAULT_SAMPLED_FAMILIES
                .iter()
                .map(|f| f.to_string())
                .collect(),
            skip_first_iteration: true,
            phase_names: PhaseNames::default(),
            ignored_phases: Vec::new(),
        }
    }
}

impl Default for PhaseNames {
    fn default() -> Self {
        let map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self {
            customization: map(&[("cch", "cch customization"), ("fastdta", "calibration")]),
            routing: map(&[
                ("cch", "cch routing"),
                ("fastdta", "fastdta routing"),
                ("sumo-sample", "sumo-based routing"),
                ("dijkstra-rust", "dijkstra routing"),
            ]),
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigFileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        // an empty file means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))
    }

    pub fn path_resolver(&self) -> AppResult<PathMetadataResolver> {
        Ok(PathMetadataResolver::new(
            self.sampled_algorithms.iter().cloned(),
        )?)
    }

    pub fn customization_phase(&self, algorithm_base: &str) -> &str {
        self.phase_names
            .customization
            .get(algorithm_base)
            .map_or(DEFAULT_CUSTOMIZATION_PHASE, String::as_str)
    }

    pub fn routing_phase(&self, algorithm_base: &str) -> &str {
        self.phase_names
            .routing
            .get(algorithm_base)
            .map_or(DEFAULT_ROUTING_PHASE, String::as_str)
    }

}

/// Trimmed, lowercase algorithm name for comparisons.
pub fn normalize_algorithm(algorithm: &str) -> String {
    algorithm.trim().to_lowercase()
}
