// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processor specialised for claims
//!
//! Wraps an [`AsyncProcessor`] over a [`ClaimPriorityQueue`] and adds a
//! relationship pass over successfully processed claims.

use crate::claim::ClaimLike;
use crate::config::ClaimProcessorConfig;
use crate::error::ClaimError;
use crate::queue::ClaimPriorityQueue;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};
use vf_core::{
    AsyncProcessor, Clock, IdGen, ProcessFn, ProcessingResult, ProcessingStatus,
    ProgressCallback, SystemClock, UuidIdGen,
};

/// `(item id, claim, result if it succeeded)`
pub type RelatedResult<T, R> = (String, T, Option<R>);

/// Claim processor; dereferences to the generic [`AsyncProcessor`] for
/// control and inspection (`pause`, `cancel`, `progress`, ...)
pub struct AsyncClaimProcessor<T, R, C = SystemClock, I = UuidIdGen> {
    processor: AsyncProcessor<T, R, C, I>,
    claims: ClaimPriorityQueue<T, R, C, I>,
    relationships: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl<T, R> AsyncClaimProcessor<T, R, SystemClock, UuidIdGen>
where
    T: ClaimLike + Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    pub fn new(
        func: impl ProcessFn<T, R> + 'static,
        config: ClaimProcessorConfig,
    ) -> Result<Self, ClaimError> {
        Self::with_deps(func, config, SystemClock, UuidIdGen)
    }
}

impl<T, R, C, I> AsyncClaimProcessor<T, R, C, I>
where
    T: ClaimLike + Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    C: Clock + 'static,
    I: IdGen + 'static,
{
    pub fn with_deps(
        func: impl ProcessFn<T, R> + 'static,
        config: ClaimProcessorConfig,
        clock: C,
        id_gen: I,
    ) -> Result<Self, ClaimError> {
        config.validate()?;
        let claims = ClaimPriorityQueue::with_deps(config.queue.clone(), clock, id_gen)?;
        let processor = AsyncProcessor::with_queue(
            func,
            config.processor_config(),
            Arc::clone(claims.queue()),
        )?;
        Ok(Self {
            processor,
            claims,
            relationships: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Replace the similarity used for related-claim lookups and the
    /// relationship pass
    pub fn with_similarity(mut self, f: impl Fn(&str, &str) -> f64 + Send + Sync + 'static) -> Self {
        self.claims = self.claims.with_similarity(f);
        self
    }

    pub fn processor(&self) -> &AsyncProcessor<T, R, C, I> {
        &self.processor
    }

    pub fn claim_queue(&self) -> &ClaimPriorityQueue<T, R, C, I> {
        &self.claims
    }

    /// Process claims after checking every one against the
    /// check-worthiness floor; nothing is enqueued if any claim fails it
    pub async fn process_items(
        &self,
        items: Vec<T>,
        callback: Option<ProgressCallback>,
    ) -> Result<Vec<ProcessingResult<T, R>>, ClaimError> {
        self.ensure_check_worthy(&items)?;
        Ok(self.processor.process_items(items, callback).await?)
    }

    /// Detached form of [`Self::process_items`]
    pub fn start(
        &self,
        items: Vec<T>,
        callback: Option<ProgressCallback>,
    ) -> Result<Vec<String>, ClaimError> {
        self.ensure_check_worthy(&items)?;
        Ok(self.processor.start(items, callback)?)
    }

    pub async fn wait(&self) -> ProcessingStatus {
        self.processor.wait().await
    }

    fn ensure_check_worthy(&self, items: &[T]) -> Result<(), ClaimError> {
        items
            .iter()
            .try_for_each(|claim| self.claims.ensure_check_worthy(claim))
    }

    /// The value a claim produced, if it was processed successfully
    pub fn get_claim_result(&self, id: &str) -> Option<R> {
        self.processor
            .get_result(id)
            .filter(|result| result.success)
            .and_then(|result| result.result)
    }

    /// Link every pair of successful results whose claim texts are more
    /// similar than the relation threshold; returns the number of pairs
    ///
    /// Replaces any relationships recorded by an earlier pass.
    pub fn set_result_relationships(&self) -> usize {
        let results = self.processor.get_results();
        let mut successful: Vec<_> = results.values().filter(|result| result.success).collect();
        successful.sort_by(|a, b| a.item_id.cmp(&b.item_id));

        let threshold = self.claims.settings().relation_threshold;
        let mut relationships: HashMap<String, Vec<String>> = HashMap::new();
        let mut pairs = 0;
        for (i, left) in successful.iter().enumerate() {
            for right in &successful[i + 1..] {
                if self.claims.similarity(left.item.text(), right.item.text()) <= threshold {
                    continue;
                }
                relationships
                    .entry(left.item_id.clone())
                    .or_default()
                    .push(right.item_id.clone());
                relationships
                    .entry(right.item_id.clone())
                    .or_default()
                    .push(left.item_id.clone());
                pairs += 1;
            }
        }

        tracing::info!(
            relationships = pairs,
            claims = relationships.len(),
            "claim relationships established"
        );
        *self.lock_relationships() = relationships;
        pairs
    }

    /// Claims linked to `id` by the last [`Self::set_result_relationships`]
    pub fn get_claim_relationships(&self, id: &str) -> Vec<RelatedResult<T, R>> {
        let related = self
            .lock_relationships()
            .get(id)
            .cloned()
            .unwrap_or_default();
        related
            .into_iter()
            .filter_map(|related_id| {
                let result = self.processor.get_result(&related_id)?;
                let value = if result.success { result.result } else { None };
                Some((related_id, result.item, value))
            })
            .collect()
    }

    /// Queue-level related claims, with their results where available
    pub fn get_related_claims(&self, claim: &T) -> Vec<RelatedResult<T, R>> {
        self.claims
            .get_related_claims(claim)
            .into_iter()
            .map(|(id, item)| {
                let value = self.get_claim_result(&id);
                (id, item, value)
            })
            .collect()
    }

    fn lock_relationships(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.relationships.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T, R, C, I> Deref for AsyncClaimProcessor<T, R, C, I> {
    type Target = AsyncProcessor<T, R, C, I>;

    fn deref(&self) -> &Self::Target {
        &self.processor
    }
}

impl<T, R, C, I> Clone for AsyncClaimProcessor<T, R, C, I> {
    fn clone(&self) -> Self {
        Self {
            processor: self.processor.clone(),
            claims: self.claims.clone(),
            relationships: Arc::clone(&self.relationships),
        }
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
