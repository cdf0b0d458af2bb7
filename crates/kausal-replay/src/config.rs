use std::path::PathBuf;

use kausal_core::ProducerId;

/// How the recovering consumer leaves sourcing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchMode {
    Auto,
    Manual,
}

/// Replay configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub owner: ProducerId,
    pub journal_path: PathBuf,
    pub output_path: PathBuf,
    pub switch_mode: SwitchMode,
    pub channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let owner = lookup("KAUSAL_OWNER_ID")
            .ok_or(ConfigError::Missing("KAUSAL_OWNER_ID"))?
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid("KAUSAL_OWNER_ID", "must be a valid u64"))?;

        let journal_path = lookup("KAUSAL_JOURNAL_PATH")
            .unwrap_or_else(|| "./journal.json".to_string())
            .into();

        let output_path = lookup("KAUSAL_OUTPUT_PATH")
            .unwrap_or_else(|| "./replay-report.json".to_string())
            .into();

        let switch_mode = match lookup("KAUSAL_MODE").as_deref() {
            None | Some("auto") => SwitchMode::Auto,
            Some("manual") => SwitchMode::Manual,
            Some(_) => {
                return Err(ConfigError::Invalid(
                    "KAUSAL_MODE",
                    "expected \"auto\" or \"manual\"",
                ))
            }
        };

        let channel_capacity = match lookup("KAUSAL_CHANNEL_CAPACITY") {
            Some(s) => s
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or(ConfigError::Invalid(
                    "KAUSAL_CHANNEL_CAPACITY",
                    "must be a positive integer",
                ))?,
            None => 64,
        };

        Ok(Config {
            owner: ProducerId(owner),
            journal_path,
            output_path,
            switch_mode,
            channel_capacity,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => {
                write!(f, "Missing required environment variable: {}", var)
            }
            ConfigError::Invalid(var, msg) => write!(f, "Invalid value for {}: {}", var, msg),
        }
    }
}

impl std::error::Error for ConfigError {}
