// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status, progress snapshots and per-item results

use crate::queue::{Metadata, QueueStatistics};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Message recorded for items a run never reached
pub const NOT_COMPLETED: &str = "Processing not completed";

/// State of a processing job as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Idle,
    Starting,
    Processing,
    Paused,
    Completed,
    Failed,
    Canceled,
}

impl ProcessingStatus {
    /// Completed, failed or canceled
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            ProcessingStatus::Completed | ProcessingStatus::Failed | ProcessingStatus::Canceled
        )
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProcessingStatus::Idle => "idle",
            ProcessingStatus::Starting => "starting",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Paused => "paused",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of a run, rebuilt after every batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingProgress {
    pub total_items: usize,
    /// Completed plus failed
    pub processed_items: usize,
    pub pending_items: usize,
    pub failed_items: usize,
    pub success_rate: f64,
    #[serde(with = "humantime_serde")]
    pub estimated_time_remaining: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub avg_processing_time: Option<Duration>,
    pub start_time: Option<DateTime<Utc>>,
    pub last_update_time: DateTime<Utc>,
}

impl ProcessingProgress {
    /// Nothing submitted yet, as of `now`
    pub fn idle(now: DateTime<Utc>) -> Self {
        Self {
            start_time: None,
            ..Self::starting(0, now)
        }
    }

    /// Everything submitted at `now`, nothing processed
    pub fn starting(total_items: usize, now: DateTime<Utc>) -> Self {
        Self {
            total_items,
            processed_items: 0,
            pending_items: total_items,
            failed_items: 0,
            success_rate: 1.0,
            estimated_time_remaining: None,
            avg_processing_time: None,
            start_time: Some(now),
            last_update_time: now,
        }
    }

    /// Derive progress from live queue counters and recorded durations
    ///
    /// The success rate divides by at least one, so it reads 0.0 until
    /// something has been processed. The estimate is the mean duration times
    /// the pending count, absent without timing data or pending work.
    pub fn from_statistics(
        stats: &QueueStatistics,
        durations: &[Duration],
        start_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let processed = stats.completed_items + stats.failed_items;
        let success_rate = stats.completed_items as f64 / processed.max(1) as f64;

        let avg_processing_time = u32::try_from(durations.len())
            .ok()
            .filter(|count| *count > 0)
            .map(|count| durations.iter().sum::<Duration>() / count);

        let estimated_time_remaining = avg_processing_time
            .filter(|avg| !avg.is_zero() && stats.pending_items > 0)
            .and_then(|avg| avg.checked_mul(u32::try_from(stats.pending_items).ok()?));

        Self {
            total_items: stats.total_items,
            processed_items: processed,
            pending_items: stats.pending_items,
            failed_items: stats.failed_items,
            success_rate,
            estimated_time_remaining,
            avg_processing_time,
            start_time,
            last_update_time: now,
        }
    }
}

/// Outcome of processing one item, after any retries
///
/// `success == false` implies `error` is set and `result` is `None`.
#[derive(Debug, Clone)]
pub struct ProcessingResult<T, R> {
    pub item: T,
    pub result: Option<R>,
    pub success: bool,
    pub error: Option<String>,
    pub processing_time: Duration,
    pub item_id: String,
    pub attempts: u32,
    pub timestamp: DateTime<Utc>,
    pub metadata: Metadata,
}

impl<T, R> ProcessingResult<T, R> {
    pub fn succeeded(
        item_id: impl Into<String>,
        item: T,
        result: R,
        processing_time: Duration,
        attempts: u32,
    ) -> Self {
        Self {
            item,
            result: Some(result),
            success: true,
            error: None,
            processing_time,
            item_id: item_id.into(),
            attempts,
            timestamp: Utc::now(),
            metadata: Metadata::new(),
        }
    }

    pub fn failed(
        item_id: impl Into<String>,
        item: T,
        error: impl Into<String>,
        processing_time: Duration,
        attempts: u32,
    ) -> Self {
        Self {
            item,
            result: None,
            success: false,
            error: Some(error.into()),
            processing_time,
            item_id: item_id.into(),
            attempts,
            timestamp: Utc::now(),
            metadata: Metadata::new(),
        }
    }

    /// Placeholder for an item a run never reached
    pub fn not_completed(item_id: impl Into<String>, item: T) -> Self {
        Self::failed(item_id, item, NOT_COMPLETED, Duration::ZERO, 0)
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The value on success, the error message otherwise
    pub fn outcome(&self) -> Result<&R, &str> {
        match (&self.result, &self.error) {
            (Some(result), _) if self.success => Ok(result),
            (_, Some(error)) => Err(error.as_str()),
            _ => Err(NOT_COMPLETED),
        }
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
