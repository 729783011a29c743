// config.rs - Simulation parameters and seed selection
//
// Loaded from a TOML file when one is given, then overridden by CLI flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::Aggregation;
use crate::error::{ConfigError, Result};
use crate::grid::GlobalGrid;
use crate::partition::Partition;
use crate::patterns;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Side length of the square, toroidal grid.
    pub dimension: usize,

    /// Number of ranks in the ring; must divide `dimension`.
    pub processes: usize,

    /// Generations to simulate.
    pub iterations: u64,

    pub aggregation: Aggregation,

    /// Named pattern used when neither `seed_file` nor `random_seed` is set.
    pub pattern: String,

    /// Top-left corner of the pattern, as (row, col).
    pub origin: (usize, usize),

    /// A D x D matrix in the report format.
    pub seed_file: Option<PathBuf>,

    /// Fill the grid pseudo-randomly from this seed.
    pub random_seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dimension: 16,
            processes: 4,
            iterations: 64,
            aggregation: Aggregation::EveryGeneration,
            pattern: "glider".to_string(),
            origin: (0, 0),
            seed_file: None,
            random_seed: None,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&text)
    }

    /// Everything that can be checked before a seed is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Partition::new(self.dimension, self.processes, 0)?;
        if self.seed_file.is_none()
            && self.random_seed.is_none()
            && patterns::find(&self.pattern).is_none()
        {
            return Err(ConfigError::UnknownPattern(self.pattern.clone()));
        }
        Ok(())
    }

    /// Seed file first, then a random fill, then the named pattern.
    pub fn build_seed(&self) -> Result<GlobalGrid> {
        let seed = if let Some(path) = &self.seed_file {
            let text = fs::read_to_string(path)?;
            patterns::parse_seed(&text)?
        } else if let Some(value) = self.random_seed {
            patterns::apply_random_pattern(self.dimension, value)
        } else {
            let pattern = patterns::find(&self.pattern)
                .ok_or_else(|| ConfigError::UnknownPattern(self.pattern.clone()))?;
            patterns::apply_pattern(self.dimension, pattern, self.origin)
        };

        if seed.dimension() != self.dimension {
            return Err(ConfigError::SeedDimension {
                expected: self.dimension,
                found: seed.dimension(),
            }
            .into());
        }
        Ok(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn defaults_match_the_classic_run() {
        let config = SimConfig::default();
        assert_eq!((config.dimension, config.processes, config.iterations), (16, 4, 64));
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.build_seed().unwrap().live_count(), 5);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SimConfig::from_toml_str(
            r#"
            dimension = 24
            processes = 6
            aggregation = "final-only"
            origin = [4, 5]
            "#,
        )
        .unwrap();
        assert_eq!(config.dimension, 24);
        assert_eq!(config.processes, 6);
        assert_eq!(config.iterations, 64);
        assert_eq!(config.aggregation, Aggregation::FinalOnly);
        assert_eq!(config.origin, (4, 5));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = SimConfig::from_toml_str("dimensions = 8").unwrap_err();
        assert!(matches!(error, SimError::ConfigFile(_)));
    }

    #[test]
    fn indivisible_dimension_fails_validation() {
        let config = SimConfig {
            dimension: 10,
            processes: 4,
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::IndivisibleDimension {
                dimension: 10,
                processes: 4
            })
        );
    }

    #[test]
    fn unknown_pattern_fails_validation() {
        let config = SimConfig {
            pattern: "spaceship".to_string(),
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownPattern("spaceship".to_string()))
        );
    }

    #[test]
    fn seed_file_must_match_dimension() {
        let path = std::env::temp_dir()
            .join(format!("conway_ring_seed_{}.csv", std::process::id()));
        fs::write(&path, "0, 1\n1, 0\n").unwrap();
        let config = SimConfig {
            dimension: 4,
            processes: 2,
            seed_file: Some(path.clone()),
            ..SimConfig::default()
        };
        let error = config.build_seed().unwrap_err();
        fs::remove_file(&path).unwrap();

        assert!(matches!(
            error,
            SimError::Configuration(ConfigError::SeedDimension {
                expected: 4,
                found: 2
            })
        ));
    }
}
