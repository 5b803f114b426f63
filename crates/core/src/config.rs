// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue and processor configuration
//!
//! The serialisable halves ([`QueueSettings`], [`ProcessorConfig`]) load
//! from TOML with humantime durations:
//!
//! ```toml
//! max_concurrency = 4
//! timeout = "90s"
//!
//! [retry]
//! attempts = 2
//! backoff = "250ms"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Scores a payload; lower values are dequeued first
pub type PriorityFn<T> = Arc<dyn Fn(&T) -> f64 + Send + Sync>;

/// Renders the identity used for duplicate suppression
pub type KeyFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Numeric limits of a priority queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Items scoring below this are rejected by `put`
    pub min_priority_threshold: f64,
    /// Upper bound on `get_batch`
    pub max_batch_size: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            min_priority_threshold: 0.0,
            max_batch_size: 10,
        }
    }
}

impl QueueSettings {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_priority_threshold.is_finite() {
            return Err(ConfigError::invalid(
                "min_priority_threshold",
                "must be a finite number",
            ));
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::invalid("max_batch_size", "must be at least 1"));
        }
        Ok(())
    }
}

/// Full queue configuration: limits plus the payload callbacks
pub struct QueueConfig<T> {
    pub settings: QueueSettings,
    priority_fn: PriorityFn<T>,
    duplicate_key: Option<KeyFn<T>>,
}

impl<T: 'static> QueueConfig<T> {
    /// FIFO ordering (every payload scores 0.0), duplicates allowed
    pub fn new() -> Self {
        Self {
            settings: QueueSettings::default(),
            priority_fn: Arc::new(|_| 0.0),
            duplicate_key: None,
        }
    }

    pub fn with_settings(mut self, settings: QueueSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_priority_fn(mut self, f: impl Fn(&T) -> f64 + Send + Sync + 'static) -> Self {
        self.priority_fn = Arc::new(f);
        self
    }

    pub fn with_min_priority_threshold(mut self, threshold: f64) -> Self {
        self.settings.min_priority_threshold = threshold;
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.settings.max_batch_size = size;
        self
    }

    /// Suppress duplicates: a payload whose key equals that of a pending
    /// item resolves to the pending item's id instead of being inserted.
    pub fn with_duplicate_key(mut self, f: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.duplicate_key = Some(Arc::new(f));
        self
    }

    pub fn allow_duplicates(mut self) -> Self {
        self.duplicate_key = None;
        self
    }
}

impl<T: fmt::Display + 'static> QueueConfig<T> {
    /// Suppress duplicates by comparing the payloads' display form
    pub fn deny_duplicates(self) -> Self {
        self.with_duplicate_key(|item: &T| item.to_string())
    }
}

impl<T> QueueConfig<T> {
    pub(crate) fn priority_of(&self, item: &T) -> f64 {
        (self.priority_fn)(item)
    }

    pub(crate) fn duplicate_key_of(&self, item: &T) -> Option<String> {
        self.duplicate_key.as_ref().map(|key| key(item))
    }

    pub fn allows_duplicates(&self) -> bool {
        self.duplicate_key.is_none()
    }
}

impl<T: 'static> Default for QueueConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for QueueConfig<T> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            priority_fn: Arc::clone(&self.priority_fn),
            duplicate_key: self.duplicate_key.clone(),
        }
    }
}

impl<T> fmt::Debug for QueueConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueConfig")
            .field("settings", &self.settings)
            .field("allow_duplicates", &self.allows_duplicates())
            .finish_non_exhaustive()
    }
}

/// How failed attempts are retried
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub attempts: u32,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
    /// Growth of the delay between consecutive retries
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Duration, factor: f64) -> Self {
        self.backoff = backoff;
        self.backoff_factor = factor;
        self
    }

    /// First attempt plus retries
    pub fn total_attempts(&self) -> u32 {
        self.attempts.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_before(&self, retry: u32) -> Duration {
        if self.backoff.is_zero() || retry == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let secs = self.backoff.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Tuning of an [`crate::AsyncProcessor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Attempts allowed in flight at once
    pub max_concurrency: usize,
    /// Limit on a single attempt
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// How often a paused drain loop re-checks its flags
    #[serde(with = "humantime_serde")]
    pub pause_poll_interval: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            pause_poll_interval: Duration::from_millis(50),
        }
    }
}

impl ProcessorConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry.attempts = attempts;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pause_poll_interval(mut self, interval: Duration) -> Self {
        self.pause_poll_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::invalid("max_concurrency", "must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("timeout", "must be non-zero"));
        }
        if self.pause_poll_interval.is_zero() {
            return Err(ConfigError::invalid("pause_poll_interval", "must be non-zero"));
        }
        let factor = self.retry.backoff_factor;
        if factor.is_nan() || factor < 1.0 {
            return Err(ConfigError::invalid(
                "retry.backoff_factor",
                format!("must be >= 1.0, got {factor}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
