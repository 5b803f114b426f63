// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the queue and processor

use std::time::Duration;
use thiserror::Error;

/// Errors raised when inserting into a [`crate::PriorityQueue`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueueError {
    #[error("item priority {priority} is below the minimum threshold {threshold}")]
    BelowThreshold { priority: f64, threshold: f64 },
    #[error("item priority {0} is not a number")]
    InvalidPriority(f64),
}

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised by [`crate::AsyncProcessor`] itself
///
/// Failures of individual items are never reported here; they are recorded
/// as failed [`crate::ProcessingResult`]s.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("a processing run is already in progress")]
    AlreadyRunning,
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("concurrency limiter closed")]
    LimiterClosed(#[from] tokio::sync::AcquireError),
    #[error("processing task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Why a single processing attempt did not produce a value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("processing timed out after {0:?}")]
    TimedOut(Duration),
    #[error("processing failed: {0}")]
    Failed(String),
    #[error("processing panicked")]
    Panicked,
    #[error("processing canceled")]
    Canceled,
}

impl AttemptError {
    /// Whether another attempt may follow this one
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AttemptError::Canceled)
    }
}
