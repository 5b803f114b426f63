// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;
use vf_core::{ConfigError, ProcessorError, QueueError};

/// Errors raised by the claim queue and claim processor
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("claim check-worthiness {score} is below the minimum threshold {threshold}")]
    BelowCheckWorthiness { score: f64, threshold: f64 },
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
