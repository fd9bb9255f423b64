//! Core configuration.
//!
//! # Invariants
//! - Seed ranges are inclusive, non-empty and start above zero, so seeded
//!   options never render as empty.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

/// Default lowest seeded count.
pub const DEFAULT_SEED_MIN: u32 = 1;
/// Default highest seeded count.
pub const DEFAULT_SEED_MAX: u32 = 5;

/// Inclusive range of fabricated starting counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedRange {
    min: u32,
    max: u32,
}

impl SeedRange {
    /// Builds a validated range.
    ///
    /// # Errors
    /// - `ConfigError::ZeroSeedMinimum` when `min == 0`.
    /// - `ConfigError::InvertedSeedRange` when `min > max`.
    pub fn new(min: u32, max: u32) -> Result<Self, ConfigError> {
        if min == 0 {
            return Err(ConfigError::ZeroSeedMinimum);
        }
        if min > max {
            return Err(ConfigError::InvertedSeedRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(self) -> u32 {
        self.min
    }

    pub fn max(self) -> u32 {
        self.max
    }

    pub fn as_range(self) -> RangeInclusive<u32> {
        self.min..=self.max
    }
}

impl Default for SeedRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_SEED_MIN,
            max: DEFAULT_SEED_MAX,
        }
    }
}

/// Tunables for the vote engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollConfig {
    pub seed_range: SeedRange,
}

impl PollConfig {
    /// Builds a config from raw seed bounds, validating them.
    pub fn with_seed_bounds(min: u32, max: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            seed_range: SeedRange::new(min, max)?,
        })
    }
}

/// Rejected configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ZeroSeedMinimum,
    InvertedSeedRange { min: u32, max: u32 },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroSeedMinimum => write!(f, "seed minimum must be at least 1"),
            Self::InvertedSeedRange { min, max } => {
                write!(f, "seed minimum {min} is greater than maximum {max}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_seed_range_is_one_to_five() {
        assert_eq!(PollConfig::default().seed_range.as_range(), 1..=5);
    }

    #[test]
    fn seed_range_rejects_zero_and_inverted_bounds() {
        assert_eq!(SeedRange::new(0, 3), Err(ConfigError::ZeroSeedMinimum));
        assert_eq!(
            SeedRange::new(4, 2),
            Err(ConfigError::InvertedSeedRange { min: 4, max: 2 })
        );
        assert!(SeedRange::new(2, 2).is_ok());
    }
}
