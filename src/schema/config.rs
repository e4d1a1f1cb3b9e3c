//! Run configuration for grid evolution.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Accepted grid heights.
pub const HEIGHT_RANGE: RangeInclusive<usize> = 3..=5;
/// Accepted grid widths.
pub const WIDTH_RANGE: RangeInclusive<usize> = 5..=10;
/// Accepted number of evaluation workers.
pub const PROCESSES_RANGE: RangeInclusive<usize> = 1..=10;
/// Accepted population sizes.
pub const CREATURES_RANGE: RangeInclusive<usize> = 100..=1000;
/// Accepted deletion percentages.
pub const DELETION_RANGE: RangeInclusive<u32> = 20..=80;
/// Accepted per-gene mutation rates, in percent.
pub const MUTATION_RANGE: RangeInclusive<u32> = 1..=10;
/// Accepted move sequence lengths.
pub const MOVES_RANGE: RangeInclusive<usize> = 5..=20;
/// Accepted generation counts for a single multi-generation request.
pub const GENERATIONS_RANGE: RangeInclusive<usize> = 1..=100;

/// Names of the positional command-line parameters, in order.
pub const POSITIONAL_NAMES: [&str; 7] = [
    "height",
    "width",
    "nb_processes",
    "nb_creatures",
    "deletion_percentage",
    "mutation_rate",
    "nb_moves",
];

/// Top-level run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Grid height in cells.
    pub height: usize,
    /// Grid width in cells.
    pub width: usize,
    /// Number of parallel evaluation workers.
    pub nb_processes: usize,
    /// Population size, constant across generations.
    pub nb_creatures: usize,
    /// Percentage of the population replaced each generation.
    pub deletion_percentage: u32,
    /// Per-gene mutation probability, in percent.
    pub mutation_rate: u32,
    /// Number of moves per creature.
    pub nb_moves: usize,
    /// How survivors are picked as templates for replacements.
    #[serde(default)]
    pub parent_selection: ParentSelection,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            height: 5,
            width: 10,
            nb_processes: 4,
            nb_creatures: 100,
            deletion_percentage: 50,
            mutation_rate: 5,
            nb_moves: 15,
            parent_selection: ParentSelection::default(),
            random_seed: None,
        }
    }
}

/// Policy for choosing which survivor a replacement is cloned from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ParentSelection {
    /// Every survivor is equally likely.
    #[default]
    Uniform,
    /// Probability proportional to fitness.
    FitnessWeighted,
}

impl RunConfig {
    /// Build a configuration from the seven positional arguments
    /// `Height Width NbProcesses NbCreatures DeletionPercentage MutationRate NbMoves`.
    ///
    /// The result is validated before it is returned.
    pub fn from_positional<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        if args.len() != POSITIONAL_NAMES.len() {
            return Err(ConfigError::ArgumentCount {
                expected: POSITIONAL_NAMES.len(),
                found: args.len(),
            });
        }

        let mut values = [0u64; 7];
        for (slot, (name, raw)) in values
            .iter_mut()
            .zip(POSITIONAL_NAMES.iter().zip(args.iter()))
        {
            *slot = parse_number(name, raw.as_ref())?;
        }

        let config = Self {
            height: values[0] as usize,
            width: values[1] as usize,
            nb_processes: values[2] as usize,
            nb_creatures: values[3] as usize,
            deletion_percentage: clamp_u32(values[4]),
            mutation_rate: clamp_u32(values[5]),
            nb_moves: values[6] as usize,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Number of creatures removed and replaced each generation.
    #[inline]
    pub fn deletion_count(&self) -> usize {
        self.nb_creatures * self.deletion_percentage as usize / 100
    }

    /// Number of creatures kept unmodified each generation.
    #[inline]
    pub fn survivor_count(&self) -> usize {
        self.nb_creatures - self.deletion_count()
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("height", self.height, &HEIGHT_RANGE)?;
        check_range("width", self.width, &WIDTH_RANGE)?;
        check_range("nb_processes", self.nb_processes, &PROCESSES_RANGE)?;
        check_range("nb_creatures", self.nb_creatures, &CREATURES_RANGE)?;
        check_range(
            "deletion_percentage",
            self.deletion_percentage,
            &DELETION_RANGE,
        )?;
        check_range("mutation_rate", self.mutation_rate, &MUTATION_RANGE)?;
        check_range("nb_moves", self.nb_moves, &MOVES_RANGE)?;
        Ok(())
    }
}

/// Check a generation count requested for a multi-generation run.
pub fn validate_generation_count(n: usize) -> Result<(), ConfigError> {
    check_range("generations", n, &GENERATIONS_RANGE)
}

/// Check that `value` lies in `range`, reporting `name` otherwise.
pub fn check_range<T>(
    name: &'static str,
    value: T,
    range: &RangeInclusive<T>,
) -> Result<(), ConfigError>
where
    T: PartialOrd + Copy + TryInto<u64>,
{
    if range.contains(&value) {
        return Ok(());
    }
    let widen = |v: T| v.try_into().unwrap_or(u64::MAX);
    Err(ConfigError::OutOfRange {
        name,
        value: widen(value),
        min: widen(*range.start()),
        max: widen(*range.end()),
    })
}

fn parse_number(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        })
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not in [{min},{max}]: {value}")]
    OutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("{name} is not a non-negative integer: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("Expected {expected} positional arguments, found {found}")]
    ArgumentCount { expected: usize, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_positional() {
        let config = RunConfig::from_positional(&["3", "5", "4", "100", "80", "2", "5"]).unwrap();
        assert_eq!(config.height, 3);
        assert_eq!(config.width, 5);
        assert_eq!(config.nb_processes, 4);
        assert_eq!(config.nb_creatures, 100);
        assert_eq!(config.deletion_percentage, 80);
        assert_eq!(config.mutation_rate, 2);
        assert_eq!(config.nb_moves, 5);
        assert_eq!(config.deletion_count(), 80);
        assert_eq!(config.survivor_count(), 20);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = RunConfig::from_positional(&["3", "5", "11", "100", "50", "2", "5"]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfRange {
                name: "nb_processes",
                value: 11,
                min: 1,
                max: 10
            }
        );

        let err = RunConfig::from_positional(&["3", "5", "1", "100", "81", "2", "5"]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                name: "deletion_percentage",
                ..
            }
        ));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let err = RunConfig::from_positional(&["3", "five", "1", "100", "50", "2", "5"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "width", .. }));

        let err = RunConfig::from_positional(&["-3", "5", "1", "100", "50", "2", "5"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "height", .. }));
    }

    #[test]
    fn test_argument_count() {
        let err = RunConfig::from_positional(&["3", "5"]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ArgumentCount {
                expected: 7,
                found: 2
            }
        );
    }

    #[test]
    fn test_deletion_count_floors() {
        let config = RunConfig {
            nb_creatures: 333,
            deletion_percentage: 33,
            ..Default::default()
        };
        assert_eq!(config.deletion_count(), 109);
        assert_eq!(config.survivor_count(), 224);
    }

    #[test]
    fn test_generation_count() {
        assert!(validate_generation_count(1).is_ok());
        assert!(validate_generation_count(100).is_ok());
        assert!(validate_generation_count(0).is_err());
        assert!(validate_generation_count(101).is_err());
    }

    #[test]
    fn test_serialization() {
        let config = RunConfig {
            parent_selection: ParentSelection::FitnessWeighted,
            random_seed: Some(7),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{
            "height": 4, "width": 6, "nb_processes": 2, "nb_creatures": 200,
            "deletion_percentage": 30, "mutation_rate": 3, "nb_moves": 10
        }"#;
        let parsed: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.parent_selection, ParentSelection::Uniform);
        assert_eq!(parsed.random_seed, None);
        assert!(parsed.validate().is_ok());
    }
}
