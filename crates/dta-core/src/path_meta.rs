//! Experiment metadata encoded in output directory paths.
//!
//! The batch runner writes every experiment to
//! `.../<instance_index>/<algorithm>[_<samples>]/<repetition>`, so the path is
//! the only place where a run's identity is recorded when the log lacks an
//! explicit start marker.

use crate::{CoreError, CoreResult};

/// Returned for paths too short to carry an algorithm segment.
pub const UNKNOWN_ALGORITHM: &str = "unknown";

/// Algorithm families whose directory name carries a sample configuration.
pub const DEFAULT_SAMPLED_FAMILIES: [&str; 2] = ["fastdta", "sumo-sample"];

const DEFAULT_REPETITION: i64 = 1;
const DEFAULT_INSTANCE_INDEX: i64 = 0;

/// Algorithm identity split from a directory segment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlgorithmName {
    /// Full segment, e.g. `fastdta_1_2`.
    pub full: String,
    /// Family without samples, e.g. `fastdta`.
    pub base: String,
    /// Sample configuration with separators turned into spaces, e.g. `1 2`.
    pub samples: Option<String>,
}

impl AlgorithmName {
    fn unknown() -> Self {
        Self {
            full: UNKNOWN_ALGORITHM.to_string(),
            base: UNKNOWN_ALGORITHM.to_string(),
            samples: None,
        }
    }

    fn plain(segment: &str) -> Self {
        Self {
            full: segment.to_string(),
            base: segment.to_string(),
            samples: None,
        }
    }
}

/// Everything recoverable from one output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathMetadata {
    pub algorithm: AlgorithmName,
    pub instance_index: i64,
    pub repetition: i64,
}

/// Resolves [`PathMetadata`] using a configurable set of sampled families.
#[derive(Debug, Clone)]
pub struct PathMetadataResolver {
    sampled_families: Vec<String>,
}

impl Default for PathMetadataResolver {
    fn default() -> Self {
        Self {
            sampled_families: DEFAULT_SAMPLED_FAMILIES
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

impl PathMetadataResolver {
    pub fn new<I, S>(sampled_families: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut families = Vec::new();
        for family in sampled_families {
            let family: String = family.into();
            if family.trim().is_empty() || family.contains('/') {
                return Err(CoreError::InvalidFamily { what: family });
            }
            families.push(family);
        }
        Ok(Self {
            sampled_families: families,
        })
    }

    /// Resolve algorithm, instance index and repetition in one go.
    pub fn resolve(&self, path: &str) -> PathMetadata {
        let (instance_index, repetition) = resolve_instance_and_repetition(path);
        PathMetadata {
            algorithm: self.resolve_algorithm(path),
            instance_index,
            repetition,
        }
    }

    /// Algorithm from the second-to-last segment.
    pub fn resolve_algorithm(&self, path: &str) -> AlgorithmName {
        let parts = segments(path);
        if parts.len() < 2 {
            return AlgorithmName::unknown();
        }
        let segment = parts[parts.len() - 2];

        for family in &self.sampled_families {
            if let Some(samples) = segment
                .strip_prefix(family.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
            {
                return AlgorithmName {
                    full: segment.to_string(),
                    base: family.clone(),
                    samples: Some(samples.replace('_', " ")),
                };
            }
        }
        AlgorithmName::plain(segment)
    }

    /// True if the algorithm name belongs to one of the sampled families.
    pub fn is_sampled(&self, algorithm: &str) -> bool {
        self.sampled_families
            .iter()
            .any(|family| algorithm.starts_with(family.as_str()))
    }
}

/// `(instance_index, repetition)` from the trailing path segments.
///
/// The repetition is the last segment when numeric (default 1). The instance
/// index is the third-from-last segment, or the nearest numeric segment before
/// it (default 0).
pub fn resolve_instance_and_repetition(path: &str) -> (i64, i64) {
    let parts = segments(path);

    let repetition = parts
        .last()
        .filter(|p| is_digits(p))
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_REPETITION);

    let mut instance_index = DEFAULT_INSTANCE_INDEX;
    if parts.len() >= 3 {
        let candidate = parts[parts.len() - 3];
        instance_index = match candidate.parse::<i64>() {
            Ok(v) => v,
            Err(_) => parts[..parts.len() - 2]
                .iter()
                .rev()
                .filter(|p| is_digits(p))
                .find_map(|p| p.parse().ok())
                .unwrap_or(DEFAULT_INSTANCE_INDEX),
        };
    }

    (instance_index, repetition)
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|p| !p.is_empty()).collect()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampled_algorithm_with_instance_and_repetition() {
        let meta = PathMetadataResolver::default().resolve("/data/out/7/fastdta_1_2/3");
        assert_eq!(meta.algorithm.full, "fastdta_1_2");
        assert_eq!(meta.algorithm.base, "fastdta");
        assert_eq!(meta.algorithm.samples.as_deref(), Some("1 2"));
        assert_eq!(meta.instance_index, 7);
        assert_eq!(meta.repetition, 3);
    }

    #[test]
    fn plain_algorithm() {
        let meta = PathMetadataResolver::default().resolve("out/0/cch/1/");
        assert_eq!(meta.algorithm, AlgorithmName::plain("cch"));
        assert_eq!(meta.instance_index, 0);
        assert_eq!(meta.repetition, 1);
    }

    #[test]
    fn sumo_sample_family() {
        let algo = PathMetadataResolver::default().resolve_algorithm("x/2/sumo-sample_1_2_3/1");
        assert_eq!(algo.base, "sumo-sample");
        assert_eq!(algo.samples.as_deref(), Some("1 2 3"));
    }

    #[test]
    fn family_without_samples_is_plain() {
        let algo = PathMetadataResolver::default().resolve_algorithm("x/2/fastdta/1");
        assert_eq!(algo, AlgorithmName::plain("fastdta"));
    }

    #[test]
    fn short_paths_are_unknown() {
        let resolver = PathMetadataResolver::default();
        let meta = resolver.resolve("5");
        assert_eq!(meta.algorithm, AlgorithmName::unknown());
        assert_eq!(meta.instance_index, 0);
        assert_eq!(meta.repetition, 5);

        let meta = resolver.resolve("");
        assert_eq!(meta.algorithm.full, UNKNOWN_ALGORITHM);
        assert_eq!(meta.repetition, 1);
    }

    #[test]
    fn non_numeric_repetition_defaults_to_one() {
        let (_, repetition) = resolve_instance_and_repetition("a/4/cch/latest");
        assert_eq!(repetition, 1);
    }

    #[test]
    fn instance_falls_back_to_nearest_numeric_segment() {
        let (instance, repetition) =
            resolve_instance_and_repetition("/runs/12/2024-run/extra/cch/2");
        assert_eq!(instance, 12);
        assert_eq!(repetition, 2);

        let (instance, _) = resolve_instance_and_repetition("/runs/none/cch/2");
        assert_eq!(instance, 0);
    }

    #[test]
    fn negative_instance_passes_through() {
        let (instance, _) = resolve_instance_and_repetition("out/-3/cch/1");
        assert_eq!(instance, -3);
    }

    #[test]
    fn custom_families() {
        let resolver = PathMetadataResolver::new(["dijkstra-rust"]).unwrap();
        let algo = resolver.resolve_algorithm("o/1/dijkstra-rust_4/1");
        assert_eq!(algo.base, "dijkstra-rust");
        assert_eq!(algo.samples.as_deref(), Some("4"));
        assert!(resolver.is_sampled("dijkstra-rust_4"));
        assert!(!resolver.is_sampled("fastdta_1"));
    }

    #[test]
    fn empty_family_is_rejected() {
        let err = PathMetadataResolver::new(["fastdta", " "]).unwrap_err();
        assert!(format!("{err}").contains("Invalid sampled algorithm family"));
    }
}
