// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority queue with per-item lifecycle tracking
//!
//! Pending items live in a min-heap ordered by `(priority, sequence)`: lower
//! priority values come out first and equal priorities come out in insertion
//! order. Every item ever inserted stays addressable by id, whatever its
//! status, until [`PriorityQueue::clear`].
//!
//! One mutex guards the heap, the id map and the counters together. All
//! operations hold it briefly and never across an await point.

use crate::clock::{Clock, SystemClock};
use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::id::{IdGen, UuidIdGen};
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Opaque caller annotations carried alongside an item
pub type Metadata = HashMap<String, serde_json::Value>;

/// Lifecycle of a queued item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Canceled,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 5] = [
        ItemStatus::Pending,
        ItemStatus::Processing,
        ItemStatus::Completed,
        ItemStatus::Failed,
        ItemStatus::Canceled,
    ];

    /// Completed, failed or canceled
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemStatus::Completed | ItemStatus::Failed | ItemStatus::Canceled
        )
    }
}

/// A payload plus its ordering and lifecycle state
#[derive(Debug, Clone)]
pub struct QueueItem<T, R = ()> {
    pub id: String,
    pub payload: T,
    pub priority: f64,
    /// Insertion order; breaks priority ties
    pub sequence: u64,
    pub enqueued_at: Instant,
    pub status: ItemStatus,
    pub result: Option<R>,
    pub error: Option<String>,
    pub started_at: Option<Instant>,
    pub completed_at: Option<Instant>,
    pub metadata: Metadata,
    duplicate_key: Option<String>,
}

impl<T, R> QueueItem<T, R> {
    /// Time between dequeue and the terminal transition
    pub fn processing_time(&self) -> Option<Duration> {
        let started = self.started_at?;
        Some(self.completed_at?.saturating_duration_since(started))
    }

    fn order(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// Aggregate view of a queue at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStatistics {
    pub total_items: usize,
    pub pending_items: usize,
    pub processing_items: usize,
    pub completed_items: usize,
    pub failed_items: usize,
    pub status_counts: BTreeMap<ItemStatus, usize>,
    /// Mean time pending items have been waiting
    #[serde(with = "humantime_serde")]
    pub avg_pending_time: Duration,
    /// Mean dequeue-to-terminal time of completed and failed items
    #[serde(with = "humantime_serde")]
    pub avg_processing_time: Duration,
    pub min_priority_threshold: f64,
    pub max_batch_size: usize,
}

#[derive(Debug)]
struct HeapEntry {
    priority: f64,
    sequence: u64,
    id: String,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

struct QueueState<T, R> {
    heap: BinaryHeap<Reverse<HeapEntry>>,
    items: HashMap<String, QueueItem<T, R>>,
    /// Duplicate key -> id of the pending item holding it
    pending_keys: HashMap<String, String>,
    next_sequence: u64,
    in_flight: usize,
    completed: usize,
    failed: usize,
}

impl<T, R> QueueState<T, R> {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            items: HashMap::new(),
            pending_keys: HashMap::new(),
            next_sequence: 0,
            in_flight: 0,
            completed: 0,
            failed: 0,
        }
    }

    fn release_key(&mut self, key: Option<&String>, id: &str) {
        if let Some(key) = key {
            if self.pending_keys.get(key).is_some_and(|holder| holder == id) {
                self.pending_keys.remove(key);
            }
        }
    }
}

/// Thread-safe min-priority queue of `T` payloads producing `R` results
pub struct PriorityQueue<T, R = (), C = SystemClock, I = UuidIdGen> {
    config: QueueConfig<T>,
    state: Mutex<QueueState<T, R>>,
    available: Notify,
    clock: C,
    id_gen: I,
}

impl<T, R> PriorityQueue<T, R, SystemClock, UuidIdGen>
where
    T: Clone,
    R: Clone,
{
    pub fn new(config: QueueConfig<T>) -> Self {
        Self::with_deps(config, SystemClock, UuidIdGen)
    }
}

impl<T, R, C, I> PriorityQueue<T, R, C, I>
where
    T: Clone,
    R: Clone,
    C: Clock,
    I: IdGen,
{
    /// Create a queue with an explicit clock and id generator
    pub fn with_deps(config: QueueConfig<T>, clock: C, id_gen: I) -> Self {
        Self {
            config,
            state: Mutex::new(QueueState::new()),
            available: Notify::new(),
            clock,
            id_gen,
        }
    }

    pub fn config(&self) -> &QueueConfig<T> {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T, R>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Compute and validate the priority `put` would assign to `payload`
    pub fn score(&self, payload: &T) -> Result<f64, QueueError> {
        self.admit(self.config.priority_of(payload))
    }

    fn admit(&self, priority: f64) -> Result<f64, QueueError> {
        if priority.is_nan() {
            return Err(QueueError::InvalidPriority(priority));
        }
        let threshold = self.config.settings.min_priority_threshold;
        if priority < threshold {
            return Err(QueueError::BelowThreshold {
                priority,
                threshold,
            });
        }
        Ok(priority)
    }

    /// Insert a payload scored by the configured priority function
    pub fn put(&self, payload: T) -> Result<String, QueueError> {
        self.put_with(payload, None, Metadata::new())
    }

    /// Insert a payload, optionally overriding its priority
    ///
    /// When duplicates are suppressed and an equal payload is pending, the
    /// pending item's id is returned and nothing is inserted.
    pub fn put_with(
        &self,
        payload: T,
        priority: Option<f64>,
        metadata: Metadata,
    ) -> Result<String, QueueError> {
        let priority = self.admit(priority.unwrap_or_else(|| self.config.priority_of(&payload)))?;
        let duplicate_key = self.config.duplicate_key_of(&payload);

        let mut guard = self.lock();
        let state = &mut *guard;
        if let Some(existing) = duplicate_key
            .as_ref()
            .and_then(|key| state.pending_keys.get(key))
        {
            tracing::debug!(item_id = %existing, "duplicate payload, reusing pending item");
            return Ok(existing.clone());
        }

        let id = self.id_gen.next();
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        if let Some(key) = &duplicate_key {
            state.pending_keys.insert(key.clone(), id.clone());
        }
        state.heap.push(Reverse(HeapEntry {
            priority,
            sequence,
            id: id.clone(),
        }));
        state.items.insert(
            id.clone(),
            QueueItem {
                id: id.clone(),
                payload,
                priority,
                sequence,
                enqueued_at: self.clock.now(),
                status: ItemStatus::Pending,
                result: None,
                error: None,
                started_at: None,
                completed_at: None,
                metadata,
                duplicate_key,
            },
        );
        drop(guard);

        self.available.notify_one();
        Ok(id)
    }

    fn pop_locked(&self, state: &mut QueueState<T, R>) -> Option<QueueItem<T, R>> {
        while let Some(Reverse(entry)) = state.heap.pop() {
            let Some(item) = state.items.get_mut(&entry.id) else {
                continue;
            };
            item.status = ItemStatus::Processing;
            item.started_at = Some(self.clock.now());
            let snapshot = item.clone();
            state.in_flight += 1;
            state.release_key(snapshot.duplicate_key.as_ref(), &snapshot.id);
            return Some(snapshot);
        }
        None
    }

    /// Dequeue the most urgent pending item without waiting
    ///
    /// The item is marked processing and counted as in flight.
    pub fn try_get(&self) -> Option<QueueItem<T, R>> {
        let mut state = self.lock();
        self.pop_locked(&mut state)
    }

    /// Dequeue the most urgent pending item, waiting until one is put
    pub async fn get(&self) -> QueueItem<T, R> {
        loop {
            let notified = self.available.notified();
            if let Some(item) = self.try_get() {
                return item;
            }
            notified.await;
        }
    }

    /// Dequeue up to `max` items (capped at the configured batch size)
    pub fn get_batch(&self, max: Option<usize>) -> Vec<QueueItem<T, R>> {
        let cap = self.config.settings.max_batch_size;
        let limit = max.map_or(cap, |max| max.min(cap));

        let mut state = self.lock();
        let mut batch = Vec::with_capacity(limit.min(state.heap.len()));
        while batch.len() < limit {
            match self.pop_locked(&mut state) {
                Some(item) => batch.push(item),
                None => break,
            }
        }
        batch
    }

    /// Record a successful result for an in-flight item
    pub fn complete(&self, id: &str, result: R) -> bool {
        self.finish(id, Ok(result))
    }

    /// Record a failure for an in-flight item
    pub fn fail(&self, id: &str, error: impl Into<String>) -> bool {
        self.finish(id, Err(error.into()))
    }

    fn finish(&self, id: &str, outcome: Result<R, String>) -> bool {
        let now = self.clock.now();
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(item) = state.items.get_mut(id) else {
            tracing::warn!(item_id = id, "cannot finish unknown item");
            return false;
        };
        if item.status != ItemStatus::Processing {
            tracing::warn!(item_id = id, status = ?item.status, "cannot finish item that is not in flight");
            return false;
        }

        item.completed_at = Some(now);
        state.in_flight = state.in_flight.saturating_sub(1);
        match outcome {
            Ok(result) => {
                item.status = ItemStatus::Completed;
                item.result = Some(result);
                state.completed += 1;
            }
            Err(error) => {
                item.status = ItemStatus::Failed;
                item.error = Some(error);
                state.failed += 1;
            }
        }
        true
    }

    /// Put a non-pending item back on the heap
    ///
    /// Clears result, error and timestamps. Keeps the original insertion
    /// sequence, so among equal priorities it goes back to its old place.
    pub fn requeue(&self, id: &str, new_priority: Option<f64>) -> bool {
        if new_priority.is_some_and(f64::is_nan) {
            tracing::warn!(item_id = id, "refusing to requeue with NaN priority");
            return false;
        }

        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(item) = state.items.get_mut(id) else {
            return false;
        };
        match item.status {
            ItemStatus::Pending => return true,
            ItemStatus::Processing => state.in_flight = state.in_flight.saturating_sub(1),
            ItemStatus::Completed => state.completed = state.completed.saturating_sub(1),
            ItemStatus::Failed => state.failed = state.failed.saturating_sub(1),
            ItemStatus::Canceled => {}
        }

        if let Some(priority) = new_priority {
            item.priority = priority;
        }
        item.status = ItemStatus::Pending;
        item.result = None;
        item.error = None;
        item.started_at = None;
        item.completed_at = None;

        state.heap.push(Reverse(HeapEntry {
            priority: item.priority,
            sequence: item.sequence,
            id: item.id.clone(),
        }));
        if let Some(key) = &item.duplicate_key {
            state
                .pending_keys
                .entry(key.clone())
                .or_insert_with(|| item.id.clone());
        }
        drop(guard);

        self.available.notify_one();
        true
    }

    /// Cancel a pending or in-flight item
    ///
    /// Returns false for unknown ids and for items that already completed
    /// or failed. Canceling a canceled item is a no-op that returns true.
    pub fn cancel(&self, id: &str) -> bool {
        let now = self.clock.now();
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(item) = state.items.get_mut(id) else {
            return false;
        };
        match item.status {
            ItemStatus::Canceled => return true,
            status if status.is_terminal() => return false,
            ItemStatus::Pending => {
                let key = item.duplicate_key.clone();
                item.status = ItemStatus::Canceled;
                item.completed_at = Some(now);
                state.heap.retain(|Reverse(entry)| entry.id != id);
                state.release_key(key.as_ref(), id);
            }
            // processing
            _ => {
                item.status = ItemStatus::Canceled;
                item.completed_at = Some(now);
                state.in_flight = state.in_flight.saturating_sub(1);
            }
        }
        true
    }

    pub fn get_item(&self, id: &str) -> Option<QueueItem<T, R>> {
        self.lock().items.get(id).cloned()
    }

    /// Every known item, ordered by priority then insertion
    pub fn get_all_items(&self) -> Vec<QueueItem<T, R>> {
        self.filter_items(|_| true)
    }

    /// Known items matching `predicate`, ordered like [`Self::get_all_items`]
    ///
    /// The predicate runs on a snapshot after the lock is released, so it
    /// may call back into the queue.
    pub fn filter_items(&self, predicate: impl Fn(&QueueItem<T, R>) -> bool) -> Vec<QueueItem<T, R>> {
        let snapshot: Vec<_> = self.lock().items.values().cloned().collect();
        let mut items: Vec<_> = snapshot.into_iter().filter(|item| predicate(item)).collect();
        items.sort_by(|a, b| a.order(b));
        items
    }

    pub fn get_status_counts(&self) -> BTreeMap<ItemStatus, usize> {
        count_statuses(&self.lock())
    }

    pub fn get_queue_statistics(&self) -> QueueStatistics {
        let now = self.clock.now();
        let state = self.lock();

        let avg_pending_time = mean(
            state
                .items
                .values()
                .filter(|item| item.status == ItemStatus::Pending)
                .map(|item| now.saturating_duration_since(item.enqueued_at)),
        );
        let avg_processing_time = mean(
            state
                .items
                .values()
                .filter(|item| matches!(item.status, ItemStatus::Completed | ItemStatus::Failed))
                .filter_map(QueueItem::processing_time),
        );

        QueueStatistics {
            total_items: state.items.len(),
            pending_items: state.heap.len(),
            processing_items: state.in_flight,
            completed_items: state.completed,
            failed_items: state.failed,
            status_counts: count_statuses(&state),
            avg_pending_time,
            avg_processing_time,
            min_priority_threshold: self.config.settings.min_priority_threshold,
            max_batch_size: self.config.settings.max_batch_size,
        }
    }

    /// Forget every item and reset counters; returns how many were known
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let count = state.items.len();
        let next_sequence = state.next_sequence;
        *state = QueueState::new();
        state.next_sequence = next_sequence;
        count
    }

    /// Number of pending items
    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }

    /// Number of known items in any status
    pub fn total_items(&self) -> usize {
        self.lock().items.len()
    }
}

fn count_statuses<T, R>(state: &QueueState<T, R>) -> BTreeMap<ItemStatus, usize> {
    let mut counts: BTreeMap<_, _> = ItemStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for item in state.items.values() {
        *counts.entry(item.status).or_insert(0) += 1;
    }
    counts
}

fn mean(durations: impl Iterator<Item = Duration>) -> Duration {
    let (total, count) = durations.fold((Duration::ZERO, 0u32), |(total, count), d| {
        (total.saturating_add(d), count.saturating_add(1))
    });
    if count == 0 {
        Duration::ZERO
    } else {
        total / count
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
