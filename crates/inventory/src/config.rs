//! Store configuration.

use core::str::FromStr;
use std::ops::RangeInclusive;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::single_lock::SingleLockStore;
use crate::store::Inventory;
use crate::two_level::TwoLevelLockingStore;

pub const LOCK_STRATEGY_ENV: &str = "STOCKROOM_LOCK_STRATEGY";
pub const SAMPLE_SEED_ENV: &str = "STOCKROOM_SAMPLE_SEED";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown lock strategy '{0}' (expected 'single' or 'two_level')")]
    UnknownLockStrategy(String),

    #[error("invalid sample seed '{0}'")]
    InvalidSeed(String),

    #[error("empty rating range {min}..={max}")]
    EmptyRatingRange { min: u64, max: u64 },
}

/// How the store coordinates concurrent callers.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStrategy {
    /// One reader/writer lock around the whole store.
    Single,
    /// Global coordination lock plus one reader/writer lock per key.
    #[default]
    TwoLevel,
}

impl FromStr for LockStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "single_lock" => Ok(Self::Single),
            "two_level" | "two-level" | "twolevel" => Ok(Self::TwoLevel),
            other => Err(ConfigError::UnknownLockStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub lock_strategy: LockStrategy,
    pub min_rating: u64,
    pub max_rating: u64,
    /// Seed for the editor-pick sampler; `None` seeds from OS entropy.
    pub sample_seed: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_strategy: LockStrategy::default(),
            min_rating: 0,
            max_rating: 5,
            sample_seed: None,
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `STOCKROOM_*` environment variables.
    ///
    /// Malformed values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(LOCK_STRATEGY_ENV) {
            match raw.parse() {
                Ok(strategy) => config.lock_strategy = strategy,
                Err(err) => tracing::warn!("{LOCK_STRATEGY_ENV}: {err}; using {:?}", config.lock_strategy),
            }
        }

        if let Some(raw) = lookup(SAMPLE_SEED_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => config.sample_seed = Some(seed),
                Err(_) => tracing::warn!("{SAMPLE_SEED_ENV}: {}; using entropy", ConfigError::InvalidSeed(raw)),
            }
        }

        config
    }

    pub fn with_lock_strategy(mut self, lock_strategy: LockStrategy) -> Self {
        self.lock_strategy = lock_strategy;
        self
    }

    pub fn with_sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_rating > self.max_rating {
            return Err(ConfigError::EmptyRatingRange {
                min: self.min_rating,
                max: self.max_rating,
            });
        }
        Ok(())
    }

    pub fn rating_range(&self) -> RangeInclusive<u64> {
        self.min_rating..=self.max_rating
    }

    pub fn sampler(&self) -> StdRng {
        match self.sample_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Builds the store selected by `config`.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn Inventory>, ConfigError> {
    config.validate()?;
    tracing::info!(lock_strategy = ?config.lock_strategy, "building inventory store");
    Ok(match config.lock_strategy {
        LockStrategy::Single => Arc::new(SingleLockStore::with_config(config)),
        LockStrategy::TwoLevel => Arc::new(TwoLevelLockingStore::with_config(config)),
    })
}
