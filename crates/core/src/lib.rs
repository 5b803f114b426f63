// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vf-core: priority queue and bounded-concurrency processor
//!
//! This crate provides:
//! - A thread-safe [`PriorityQueue`] with per-item lifecycle tracking
//! - An [`AsyncProcessor`] that drains a queue with a concurrency limit,
//!   per-attempt timeouts, retries, pause/resume and cancellation
//! - Injectable [`Clock`] and [`IdGen`] for deterministic tests

pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod process;
pub mod processor;
pub mod progress;
pub mod queue;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{KeyFn, PriorityFn, ProcessorConfig, QueueConfig, QueueSettings, RetryPolicy};
pub use error::{AttemptError, ConfigError, ProcessorError, QueueError};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use process::{blocking, BoxError, BoxFuture, ProcessFn};
pub use processor::{AsyncProcessor, ProgressCallback};
pub use progress::{ProcessingProgress, ProcessingResult, ProcessingStatus, NOT_COMPLETED};
pub use queue::{ItemStatus, Metadata, PriorityQueue, QueueItem, QueueStatistics};
