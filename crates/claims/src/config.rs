// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claim queue and claim processor configuration
//!
//! ```toml
//! max_concurrency = 3
//! timeout = "2m"
//!
//! [retry]
//! attempts = 1
//!
//! [queue]
//! min_check_worthiness = 0.6
//! max_batch_size = 5
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vf_core::{ConfigError, ProcessorConfig, RetryPolicy};

/// Limits of a claim queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimQueueSettings {
    /// Claims scoring below this are refused by `put_claim`
    pub min_check_worthiness: f64,
    pub max_batch_size: usize,
    /// Keep claims whose text equals that of a pending claim
    pub allow_duplicate_claims: bool,
    /// Similarity above which two claims are related
    pub relation_threshold: f64,
}

impl Default for ClaimQueueSettings {
    fn default() -> Self {
        Self {
            min_check_worthiness: 0.5,
            max_batch_size: 5,
            allow_duplicate_claims: false,
            relation_threshold: 0.7,
        }
    }
}

impl ClaimQueueSettings {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_check_worthiness.is_finite() {
            return Err(invalid("min_check_worthiness", "must be a finite number"));
        }
        if self.max_batch_size == 0 {
            return Err(invalid("max_batch_size", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.relation_threshold) {
            return Err(invalid(
                "relation_threshold",
                format!("must be within 0.0..=1.0, got {}", self.relation_threshold),
            ));
        }
        Ok(())
    }
}

/// Tuning of an [`crate::AsyncClaimProcessor`]
///
/// Same knobs as [`ProcessorConfig`] with claim defaults: three concurrent
/// attempts, two minutes per attempt, one retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimProcessorConfig {
    pub max_concurrency: usize,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub retry: RetryPolicy,
    #[serde(with = "humantime_serde")]
    pub pause_poll_interval: Duration,
    pub queue: ClaimQueueSettings,
}

impl Default for ClaimProcessorConfig {
    fn default() -> Self {
        let base = ProcessorConfig::default();
        Self {
            max_concurrency: 3,
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::new(1),
            pause_poll_interval: base.pause_poll_interval,
            queue: ClaimQueueSettings::default(),
        }
    }
}

impl ClaimProcessorConfig {
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

    pub fn with_pause_poll_interval(mut self, interval: Duration) -> Self {
        self.pause_poll_interval = interval;
        self
    }

    pub fn with_queue(mut self, queue: ClaimQueueSettings) -> Self {
        self.queue = queue;
        self
    }

    /// The generic processor half
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            max_concurrency: self.max_concurrency,
            timeout: self.timeout,
            retry: self.retry.clone(),
            pause_poll_interval: self.pause_poll_interval,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.processor_config().validate()?;
        self.queue.validate()
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
