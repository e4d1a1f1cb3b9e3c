//! Command-line parsing.

use std::fs;
use std::path::PathBuf;

use crate::schema::{ConfigError, RunConfig};

/// Usage line printed on invalid invocations.
pub const USAGE: &str = "Height Width NbProcesses NbCreatures DeletionPercentage MutationRate NbMoves [Area.file] [--seed N]\n       --config run.json [Area.file] [--seed N]\n       --example";

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Print an example JSON configuration.
    Example,
    /// Run the evolution.
    Run(CliArgs),
}

/// Parsed run arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub config: RunConfig,
    /// Optional environment file.
    pub area: Option<PathBuf>,
}

impl Command {
    /// Parse arguments, excluding the program name.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, ArgsError> {
        let mut rest: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();

        if rest.iter().any(|a| a == "--example") {
            return Ok(Self::Example);
        }

        let seed = take_flag(&mut rest, "--seed")?
            .map(|raw| {
                raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                    name: "seed",
                    value: raw.clone(),
                })
            })
            .transpose()?;
        let config_path = take_flag(&mut rest, "--config")?;

        let (mut config, remaining) = match config_path {
            Some(path) => {
                let text = fs::read_to_string(&path).map_err(|source| ArgsError::Io {
                    path: path.clone().into(),
                    source,
                })?;
                let config: RunConfig = serde_json::from_str(&text)?;
                config.validate()?;
                (config, rest)
            }
            None => {
                if rest.len() < 7 {
                    return Err(ConfigError::ArgumentCount {
                        expected: 7,
                        found: rest.len(),
                    }
                    .into());
                }
                let remaining = rest.split_off(7);
                (RunConfig::from_positional(&rest)?, remaining)
            }
        };

        if remaining.len() > 1 {
            return Err(ArgsError::Unexpected(remaining[1].clone()));
        }
        if seed.is_some() {
            config.random_seed = seed;
        }

        Ok(Self::Run(CliArgs {
            config,
            area: remaining.into_iter().next().map(PathBuf::from),
        }))
    }
}

/// Remove `--flag value` from `args` and return the value.
fn take_flag(args: &mut Vec<String>, flag: &'static str) -> Result<Option<String>, ArgsError> {
    let Some(pos) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        return Err(ArgsError::MissingValue(flag));
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

/// Command-line errors.
#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0} expects a value")]
    MissingValue(&'static str),
    #[error("Unexpected argument {0:?}")]
    Unexpected(String),
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),
}
