//! Seating configuration management.
//!
//! Consolidates the environment variables the seating manager reads.

use crate::db::{config::parse_var, timeouts::DEFAULT_OPERATION_TIMEOUT};
use crate::seating::{SeatingError, SeatingResult, balance::DEFAULT_MAX_BALANCE_PASSES};
use std::time::Duration;

/// Seating manager configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatingConfig {
    /// Fixed seed for shuffles and equalize picks; OS entropy when `None`
    pub shuffle_seed: Option<u64>,
    /// Upper bound on balance steps per run
    pub max_balance_passes: usize,
    /// Timeout for each repository load or save
    pub operation_timeout: Duration,
}

impl SeatingConfig {
    /// Load configuration from environment variables
    ///
    /// - `SEATING_SHUFFLE_SEED`: optional u64 seed
    /// - `SEATING_MAX_BALANCE_PASSES`: balance step bound (default: 64)
    /// - `SEATING_OPERATION_TIMEOUT_SECS`: storage timeout (default: 10)
    ///
    /// # Errors
    ///
    /// * `SeatingError::InvalidConfiguration` - A value is unparsable or zero
    pub fn from_env() -> SeatingResult<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> SeatingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let shuffle_seed = match lookup("SEATING_SHUFFLE_SEED") {
            None => None,
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                SeatingError::InvalidConfiguration(format!(
                    "SEATING_SHUFFLE_SEED has invalid value '{raw}'"
                ))
            })?),
        };

        let max_balance_passes = parse_var(
            &lookup,
            "SEATING_MAX_BALANCE_PASSES",
            DEFAULT_MAX_BALANCE_PASSES,
        )?;
        if max_balance_passes == 0 {
            return Err(SeatingError::InvalidConfiguration(
                "SEATING_MAX_BALANCE_PASSES must be at least 1".to_string(),
            ));
        }

        let timeout_secs: u64 = parse_var(
            &lookup,
            "SEATING_OPERATION_TIMEOUT_SECS",
            DEFAULT_OPERATION_TIMEOUT.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(SeatingError::InvalidConfiguration(
                "SEATING_OPERATION_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            shuffle_seed,
            max_balance_passes,
            operation_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Deterministic configuration for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            shuffle_seed: Some(seed),
            ..Self::default()
        }
    }
}

impl Default for SeatingConfig {
    fn default() -> Self {
        Self {
            shuffle_seed: None,
            max_balance_passes: DEFAULT_MAX_BALANCE_PASSES,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = SeatingConfig::from_vars(|_| None).unwrap();
        assert_eq!(config, SeatingConfig::default());
        assert_eq!(config.max_balance_passes, 64);
        assert_eq!(config.operation_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_reads_seed_and_limits() {
        let config = SeatingConfig::from_vars(|name| match name {
            "SEATING_SHUFFLE_SEED" => Some("1234".to_string()),
            "SEATING_MAX_BALANCE_PASSES" => Some("8".to_string()),
            "SEATING_OPERATION_TIMEOUT_SECS" => Some("3".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.shuffle_seed, Some(1234));
        assert_eq!(config.max_balance_passes, 8);
        assert_eq!(config.operation_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_seed = SeatingConfig::from_vars(|name| {
            (name == "SEATING_SHUFFLE_SEED").then(|| "-1".to_string())
        });
        let zero_passes = SeatingConfig::from_vars(|name| {
            (name == "SEATING_MAX_BALANCE_PASSES").then(|| "0".to_string())
        });
        assert!(matches!(bad_seed, Err(SeatingError::InvalidConfiguration(_))));
        assert!(matches!(zero_passes, Err(SeatingError::InvalidConfiguration(_))));
    }
}
