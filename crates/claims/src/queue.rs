// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority queue specialised for claims
//!
//! Claims are ordered by [`claim_priority`], refused below a
//! check-worthiness floor, and deduplicated by text unless the settings
//! allow duplicates.

use crate::claim::{claim_priority, ClaimLike};
use crate::config::ClaimQueueSettings;
use crate::error::ClaimError;
use crate::similarity::{is_related, jaccard, SimilarityFn};
use std::fmt;
use std::sync::Arc;
use vf_core::{
    Clock, IdGen, Metadata, PriorityQueue, QueueConfig, QueueSettings, SystemClock, UuidIdGen,
};

pub struct ClaimPriorityQueue<T, R = (), C = SystemClock, I = UuidIdGen> {
    queue: Arc<PriorityQueue<T, R, C, I>>,
    settings: ClaimQueueSettings,
    similarity: SimilarityFn,
}

impl<T, R> ClaimPriorityQueue<T, R, SystemClock, UuidIdGen>
where
    T: ClaimLike + Clone + 'static,
    R: Clone,
{
    pub fn new(settings: ClaimQueueSettings) -> Result<Self, ClaimError> {
        Self::with_deps(settings, SystemClock, UuidIdGen)
    }
}

impl<T, R, C, I> ClaimPriorityQueue<T, R, C, I>
where
    T: ClaimLike + Clone + 'static,
    R: Clone,
    C: Clock,
    I: IdGen,
{
    pub fn with_deps(settings: ClaimQueueSettings, clock: C, id_gen: I) -> Result<Self, ClaimError> {
        settings.validate()?;
        let mut config = QueueConfig::new()
            .with_settings(QueueSettings {
                max_batch_size: settings.max_batch_size,
                ..QueueSettings::default()
            })
            .with_priority_fn(|claim: &T| claim_priority(claim));
        if !settings.allow_duplicate_claims {
            config = config.with_duplicate_key(|claim: &T| claim.text().to_owned());
        }

        Ok(Self {
            queue: Arc::new(PriorityQueue::with_deps(config, clock, id_gen)),
            settings,
            similarity: Arc::new(jaccard),
        })
    }

    /// Replace the word-overlap similarity used to relate claims
    pub fn with_similarity(mut self, f: impl Fn(&str, &str) -> f64 + Send + Sync + 'static) -> Self {
        self.similarity = Arc::new(f);
        self
    }

    /// The underlying generic queue
    pub fn queue(&self) -> &Arc<PriorityQueue<T, R, C, I>> {
        &self.queue
    }

    pub fn settings(&self) -> &ClaimQueueSettings {
        &self.settings
    }

    /// Refuse claims below the check-worthiness floor
    pub fn ensure_check_worthy(&self, claim: &T) -> Result<(), ClaimError> {
        let score = claim.check_worthiness();
        let threshold = self.settings.min_check_worthiness;
        if score.is_nan() || score < threshold {
            return Err(ClaimError::BelowCheckWorthiness { score, threshold });
        }
        Ok(())
    }

    /// Insert a claim, returning its id (or the id of a pending duplicate)
    pub fn put_claim(&self, claim: T, metadata: Metadata) -> Result<String, ClaimError> {
        self.ensure_check_worthy(&claim)?;
        Ok(self.queue.put_with(claim, None, metadata)?)
    }

    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        (self.similarity)(a, b)
    }

    /// Whether two distinct texts are related: one contains the other or
    /// their similarity exceeds the relation threshold
    pub fn texts_related(&self, a: &str, b: &str) -> bool {
        is_related(a, b, &*self.similarity, self.settings.relation_threshold)
    }

    /// Every known claim, in any status, related to `claim`
    ///
    /// Linear in the number of items the queue has seen.
    pub fn get_related_claims(&self, claim: &T) -> Vec<(String, T)> {
        let text = claim.text();
        self.queue
            .filter_items(|item| self.texts_related(text, item.payload.text()))
            .into_iter()
            .map(|item| (item.id, item.payload))
            .collect()
    }
}

impl<T, R, C, I> Clone for ClaimPriorityQueue<T, R, C, I> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            settings: self.settings.clone(),
            similarity: Arc::clone(&self.similarity),
        }
    }
}

impl<T, R, C, I> fmt::Debug for ClaimPriorityQueue<T, R, C, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimPriorityQueue")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
