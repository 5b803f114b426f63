// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency processor draining a [`PriorityQueue`]
//!
//! A run enqueues its items, then a background drain task repeatedly pulls a
//! batch (at most `max_concurrency` items, most urgent first), runs every
//! item under the concurrency semaphore with a per-attempt timeout and a
//! fixed retry budget, and republishes progress once the batch settles.
//!
//! Job lifecycle:
//!
//! ```text
//! Idle -> Starting -> Processing <-> Paused
//!                        |
//!                        +-> Completed | Canceled | Failed
//! ```
//!
//! Item failures are recorded per item and never fail the job. Only a fault
//! in the drain loop itself ends in `Failed`. Cancellation is cooperative:
//! it is observed between batches and while dispatching one, and attempts
//! already running are left to finish or time out.

use crate::clock::{Clock, SystemClock};
use crate::config::{ProcessorConfig, QueueConfig};
use crate::error::{AttemptError, ProcessorError};
use crate::id::{IdGen, UuidIdGen};
use crate::process::ProcessFn;
use crate::progress::{ProcessingProgress, ProcessingResult, ProcessingStatus};
use crate::queue::{PriorityQueue, QueueItem};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;

/// Receives a progress snapshot after every batch
pub type ProgressCallback = Arc<dyn Fn(&ProcessingProgress) + Send + Sync>;

/// Drives a priority queue to completion
///
/// Cloning yields another handle onto the same processor, which is how a
/// caller pauses or cancels a run that another task is awaiting.
pub struct AsyncProcessor<T, R, C = SystemClock, I = UuidIdGen> {
    shared: Arc<Shared<T, R, C, I>>,
}

impl<T, R, C, I> Clone for AsyncProcessor<T, R, C, I> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<T, R, C, I> {
    func: Arc<dyn ProcessFn<T, R>>,
    config: ProcessorConfig,
    queue: Arc<PriorityQueue<T, R, C, I>>,
    limiter: Semaphore,
    paused: AtomicBool,
    cancel_requested: AtomicBool,
    run: Mutex<RunState<T, R>>,
    drain: Mutex<Option<JoinHandle<()>>>,
}

struct RunState<T, R> {
    status: ProcessingStatus,
    progress: ProcessingProgress,
    start_time: Option<DateTime<Utc>>,
    processing_times: Vec<Duration>,
    results: HashMap<String, ProcessingResult<T, R>>,
    callback: Option<ProgressCallback>,
}

impl<T, R> AsyncProcessor<T, R, SystemClock, UuidIdGen>
where
    T: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Processor over a fresh FIFO queue
    pub fn new(
        func: impl ProcessFn<T, R> + 'static,
        config: ProcessorConfig,
    ) -> Result<Self, ProcessorError> {
        Self::with_queue(func, config, Arc::new(PriorityQueue::new(QueueConfig::new())))
    }
}

impl<T, R, C, I> AsyncProcessor<T, R, C, I>
where
    T: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    C: Clock + 'static,
    I: IdGen + 'static,
{
    /// Processor over a caller-supplied queue
    pub fn with_queue(
        func: impl ProcessFn<T, R> + 'static,
        config: ProcessorConfig,
        queue: Arc<PriorityQueue<T, R, C, I>>,
    ) -> Result<Self, ProcessorError> {
        config.validate()?;
        queue.config().settings.validate()?;
        let limiter = Semaphore::new(config.max_concurrency);
        let created = queue.clock().utc_now();
        Ok(Self {
            shared: Arc::new(Shared {
                func: Arc::new(func),
                config,
                queue,
                limiter,
                paused: AtomicBool::new(false),
                cancel_requested: AtomicBool::new(false),
                run: Mutex::new(RunState {
                    status: ProcessingStatus::Idle,
                    progress: ProcessingProgress::idle(created),
                    start_time: None,
                    processing_times: Vec::new(),
                    results: HashMap::new(),
                    callback: None,
                }),
                drain: Mutex::new(None),
            }),
        })
    }

    pub fn queue(&self) -> &Arc<PriorityQueue<T, R, C, I>> {
        &self.shared.queue
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.shared.config
    }

    /// Process `items` and return one result per item, in submission order
    ///
    /// Items the run never reached (for example after [`Self::cancel`])
    /// come back as failed "not completed" results. Only insertion
    /// rejections and run-level faults surface as `Err`.
    pub async fn process_items(
        &self,
        items: Vec<T>,
        callback: Option<ProgressCallback>,
    ) -> Result<Vec<ProcessingResult<T, R>>, ProcessorError> {
        let submitted = items.clone();
        let ids = self.start(items, callback)?;
        self.wait().await;

        let now = self.shared.queue.clock().utc_now();
        let run = self.shared.lock_run();
        Ok(ids
            .into_iter()
            .zip(submitted)
            .map(|(id, item)| match run.results.get(&id) {
                Some(result) => result.clone(),
                None => ProcessingResult::not_completed(id, item).with_timestamp(now),
            })
            .collect())
    }

    /// Enqueue `items` and start draining in the background
    ///
    /// Returns the queue ids in submission order. Every item is scored
    /// before any is inserted, so a rejected item leaves the queue untouched.
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        items: Vec<T>,
        callback: Option<ProgressCallback>,
    ) -> Result<Vec<String>, ProcessorError> {
        let runtime = tokio::runtime::Handle::try_current()?;
        let shared = &self.shared;
        let priorities = items
            .iter()
            .map(|item| shared.queue.score(item))
            .collect::<Result<Vec<_>, _>>()?;

        {
            let mut run = shared.lock_run();
            if matches!(
                run.status,
                ProcessingStatus::Starting | ProcessingStatus::Processing | ProcessingStatus::Paused
            ) {
                return Err(ProcessorError::AlreadyRunning);
            }
            let now = shared.queue.clock().utc_now();
            run.status = ProcessingStatus::Starting;
            run.callback = callback;
            run.start_time = Some(now);
            run.progress = ProcessingProgress::starting(items.len(), now);
        }
        shared.paused.store(false, Ordering::SeqCst);
        shared.cancel_requested.store(false, Ordering::SeqCst);

        let inserted = items
            .into_iter()
            .zip(priorities)
            .map(|(item, priority)| shared.queue.put_with(item, Some(priority), Default::default()))
            .collect::<Result<Vec<_>, _>>();
        let ids = match inserted {
            Ok(ids) => ids,
            Err(e) => {
                shared.lock_run().status = ProcessingStatus::Idle;
                return Err(e.into());
            }
        };

        let task = Arc::clone(shared);
        *shared.lock_drain() = Some(runtime.spawn(async move { task.drain().await }));
        Ok(ids)
    }

    /// Wait for the current run to finish and report how it ended
    ///
    /// The first waiter joins the drain task; concurrent waiters poll the
    /// job status.
    pub async fn wait(&self) -> ProcessingStatus {
        let handle = self.shared.lock_drain().take();
        match handle {
            Some(handle) => {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "drain task aborted");
                    self.shared.lock_run().status = ProcessingStatus::Failed;
                }
            }
            None => {
                while self.is_running() {
                    tokio::time::sleep(self.shared.config.pause_poll_interval).await;
                }
            }
        }
        self.status()
    }

    /// Whether a run has started and not yet finished
    pub fn is_running(&self) -> bool {
        matches!(
            self.status(),
            ProcessingStatus::Starting | ProcessingStatus::Processing | ProcessingStatus::Paused
        )
    }

    /// Stop dispatching batches until [`Self::resume`]; only while processing
    pub fn pause(&self) {
        let mut run = self.shared.lock_run();
        if run.status == ProcessingStatus::Processing {
            self.shared.paused.store(true, Ordering::SeqCst);
            run.status = ProcessingStatus::Paused;
            tracing::info!("processing paused");
        }
    }

    /// Continue a paused run
    pub fn resume(&self) {
        let mut run = self.shared.lock_run();
        if run.status == ProcessingStatus::Paused {
            self.shared.paused.store(false, Ordering::SeqCst);
            run.status = ProcessingStatus::Processing;
            tracing::info!("processing resumed");
        }
    }

    /// Ask the current run to stop at the next batch boundary
    pub fn cancel(&self) {
        self.shared.cancel_requested.store(true, Ordering::SeqCst);
        tracing::info!("processing cancellation requested");
    }

    pub fn status(&self) -> ProcessingStatus {
        self.shared.lock_run().status
    }

    pub fn progress(&self) -> ProcessingProgress {
        self.shared.lock_run().progress.clone()
    }

    /// Results recorded so far, keyed by item id
    pub fn get_results(&self) -> HashMap<String, ProcessingResult<T, R>> {
        self.shared.lock_run().results.clone()
    }

    pub fn get_result(&self, id: &str) -> Option<ProcessingResult<T, R>> {
        self.shared.lock_run().results.get(id).cloned()
    }

    /// Drop recorded results and timing statistics
    pub fn clear_results(&self) {
        let mut run = self.shared.lock_run();
        run.results.clear();
        run.processing_times.clear();
    }
}

impl<T, R, C, I> Shared<T, R, C, I>
where
    T: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    C: Clock + 'static,
    I: IdGen + 'static,
{
    fn lock_run(&self) -> MutexGuard<'_, RunState<T, R>> {
        self.run.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_drain(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.drain.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    async fn drain(self: Arc<Self>) {
        let total = self.lock_run().progress.total_items;
        tracing::info!(
            total,
            max_concurrency = self.config.max_concurrency,
            "starting processing"
        );

        let outcome = self.drain_queue().await;
        let status = match outcome {
            Ok(()) if self.cancel_requested() => {
                tracing::info!("processing canceled");
                ProcessingStatus::Canceled
            }
            Ok(()) => ProcessingStatus::Completed,
            Err(e) => {
                tracing::error!(error = %e, "processing failed");
                ProcessingStatus::Failed
            }
        };
        self.lock_run().status = status;

        let progress = self.update_progress();
        if status == ProcessingStatus::Completed {
            tracing::info!(
                processed = progress.processed_items,
                failed = progress.failed_items,
                "processing completed"
            );
        }
    }

    async fn drain_queue(self: &Arc<Self>) -> Result<(), ProcessorError> {
        while !self.queue.is_empty() && !self.cancel_requested() {
            if self.hold_if_paused() {
                tokio::time::sleep(self.config.pause_poll_interval).await;
                continue;
            }

            let batch = self.queue.get_batch(Some(self.config.max_concurrency));
            if batch.is_empty() {
                break;
            }

            let mut tasks = JoinSet::new();
            let mut batch = batch.into_iter();
            for item in batch.by_ref() {
                if self.cancel_requested() {
                    self.queue.requeue(&item.id, None);
                    break;
                }
                let shared = Arc::clone(self);
                tasks.spawn(async move { shared.process_with_permit(item).await });
            }
            // Dequeued but never dispatched: back to pending
            for item in batch {
                self.queue.requeue(&item.id, None);
            }

            while let Some(joined) = tasks.join_next().await {
                joined??;
            }
            self.update_progress();
        }
        Ok(())
    }

    /// Settle the job status against the pause flag; true while paused
    fn hold_if_paused(&self) -> bool {
        let mut run = self.lock_run();
        if self.paused.load(Ordering::SeqCst) {
            run.status = ProcessingStatus::Paused;
            true
        } else {
            run.status = ProcessingStatus::Processing;
            false
        }
    }

    async fn process_with_permit(&self, item: QueueItem<T, R>) -> Result<(), ProcessorError> {
        let _permit = self.limiter.acquire().await?;
        self.process_item(item).await;
        Ok(())
    }

    async fn process_item(&self, item: QueueItem<T, R>) {
        let QueueItem {
            id,
            payload,
            metadata,
            ..
        } = item;
        let retry = &self.config.retry;
        let total_attempts = retry.total_attempts();
        let started = Instant::now();

        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            if attempt > 1 {
                let delay = retry.delay_before(attempt - 1);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            match self.attempt(payload.clone()).await {
                Ok(value) => break Ok(value),
                Err(e) if e.is_retryable() && attempt < total_attempts => {
                    tracing::info!(
                        item_id = %id,
                        attempt,
                        total_attempts,
                        error = %e,
                        "attempt failed, retrying"
                    );
                }
                Err(e) => break Err(e),
            }
        };
        let elapsed = started.elapsed();

        let result = match outcome {
            Ok(value) => {
                self.queue.complete(&id, value.clone());
                tracing::debug!(item_id = %id, attempt, ?elapsed, "item processed");
                self.lock_run().processing_times.push(elapsed);
                ProcessingResult::succeeded(id.clone(), payload, value, elapsed, attempt)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(item_id = %id, attempt, error = %message, "item failed, no retries left");
                self.queue.fail(&id, message.clone());
                ProcessingResult::failed(id.clone(), payload, message, elapsed, attempt)
            }
        };
        let result = result
            .with_metadata(metadata)
            .with_timestamp(self.queue.clock().utc_now());
        self.lock_run().results.insert(id, result);
    }

    /// One bounded attempt, run in its own task so it can be abandoned
    async fn attempt(&self, payload: T) -> Result<R, AttemptError> {
        let func = Arc::clone(&self.func);
        let mut handle = tokio::spawn(async move { func.process(payload).await });
        match tokio::time::timeout(self.config.timeout, &mut handle).await {
            Err(_) => {
                handle.abort();
                Err(AttemptError::TimedOut(self.config.timeout))
            }
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => Err(AttemptError::Failed(e.to_string())),
            Ok(Err(e)) if e.is_panic() => Err(AttemptError::Panicked),
            Ok(Err(_)) => Err(AttemptError::Canceled),
        }
    }

    /// Rebuild progress from the queue and hand it to the callback
    ///
    /// The callback runs outside the run lock; a panicking callback is
    /// logged and otherwise ignored.
    fn update_progress(&self) -> ProcessingProgress {
        let stats = self.queue.get_queue_statistics();
        let now = self.queue.clock().utc_now();
        let (progress, callback) = {
            let mut run = self.lock_run();
            run.progress = ProcessingProgress::from_statistics(
                &stats,
                &run.processing_times,
                run.start_time,
                now,
            );
            (run.progress.clone(), run.callback.clone())
        };

        if let Some(callback) = callback {
            if std::panic::catch_unwind(AssertUnwindSafe(|| callback(&progress))).is_err() {
                tracing::error!("progress callback panicked");
            }
        }
        progress
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
