// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::claim::Claim;
use vf_core::{FakeClock, ItemStatus, QueueError, SequentialIdGen};

type TestQueue = ClaimPriorityQueue<Claim, (), FakeClock, SequentialIdGen>;

fn claim_queue(settings: ClaimQueueSettings) -> TestQueue {
    ClaimPriorityQueue::with_deps(settings, FakeClock::new(), SequentialIdGen::new("claim"))
        .unwrap()
}

fn put(queue: &TestQueue, claim: Claim) -> String {
    queue.put_claim(claim, Metadata::new()).unwrap()
}

#[test]
fn most_check_worthy_claim_comes_out_first() {
    let queue = claim_queue(ClaimQueueSettings::default());
    put(&queue, Claim::new("GDP grew 2%", 0.6));
    put(&queue, Claim::new("Unemployment hit 50%", 0.95));
    put(&queue, Claim::new("Crime fell", 0.8));

    let order: Vec<_> = std::iter::from_fn(|| queue.queue().try_get())
        .map(|item| item.payload.text)
        .collect();
    assert_eq!(order, vec!["Unemployment hit 50%", "Crime fell", "GDP grew 2%"]);
}

#[test]
fn health_claim_overtakes_equally_worthy_claim() {
    let queue = claim_queue(ClaimQueueSettings::default());
    put(&queue, Claim::new("Taxes rose", 0.7));
    put(&queue, Claim::new("Vitamin C cures colds", 0.7).with_domain("health"));

    let first = queue.queue().try_get().unwrap();
    assert_eq!(first.payload.text, "Vitamin C cures colds");
}

#[test]
fn claims_below_the_floor_are_refused() {
    let queue = claim_queue(ClaimQueueSettings::default());
    let err = queue
        .put_claim(Claim::new("meh", 0.2), Metadata::new())
        .unwrap_err();

    assert!(matches!(
        err,
        ClaimError::BelowCheckWorthiness { score, threshold } if score == 0.2 && threshold == 0.5
    ));
    assert!(queue.queue().is_empty());
    assert_eq!(queue.queue().total_items(), 0);
}

#[test]
fn nan_check_worthiness_is_refused() {
    let queue = claim_queue(ClaimQueueSettings::default());
    assert!(queue.ensure_check_worthy(&Claim::new("?", f64::NAN)).is_err());
}

#[test]
fn check_worthiness_above_one_falls_below_the_priority_floor() {
    let queue = claim_queue(ClaimQueueSettings::default());
    let err = queue
        .put_claim(Claim::new("overrated", 1.5), Metadata::new())
        .unwrap_err();
    assert!(matches!(err, ClaimError::Queue(QueueError::BelowThreshold { .. })));
}

#[test]
fn duplicate_text_reuses_the_pending_claim() {
    let queue = claim_queue(ClaimQueueSettings::default());
    let first = put(&queue, Claim::new("Same text", 0.9));
    let second = put(&queue, Claim::new("Same text", 0.6).with_domain("science"));

    assert_eq!(first, second);
    assert_eq!(queue.queue().total_items(), 1);
}

#[test]
fn duplicates_can_be_allowed() {
    let queue = claim_queue(ClaimQueueSettings {
        allow_duplicate_claims: true,
        ..ClaimQueueSettings::default()
    });
    let first = put(&queue, Claim::new("Same text", 0.9));
    let second = put(&queue, Claim::new("Same text", 0.9));

    assert_ne!(first, second);
    assert_eq!(queue.queue().len(), 2);
}

#[test]
fn batches_are_capped_by_claim_batch_size() {
    let queue = claim_queue(ClaimQueueSettings {
        max_batch_size: 2,
        ..ClaimQueueSettings::default()
    });
    for n in 0..5 {
        put(&queue, Claim::new(format!("claim number {n}"), 0.9));
    }
    assert_eq!(queue.queue().get_batch(None).len(), 2);
    assert_eq!(queue.queue().get_batch(Some(10)).len(), 2);
}

#[test]
fn related_claims_include_substrings_and_similar_text() {
    let queue = claim_queue(ClaimQueueSettings::default());
    let contained = put(&queue, Claim::new("the vaccine is safe", 0.9));
    let similar = put(&queue, Claim::new("safe is the vaccine always", 0.9));
    put(&queue, Claim::new("interest rates fell sharply", 0.9));

    let probe = Claim::new("experts say the vaccine is safe", 0.9);
    let related: Vec<_> = queue
        .get_related_claims(&probe)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(related, vec![contained.clone()]);

    // Word overlap 4/5 with the first claim, identical words with the second
    let probe = Claim::new("the vaccine is always safe", 0.9);
    let mut related: Vec<_> = queue
        .get_related_claims(&probe)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    related.sort();
    assert_eq!(related, vec![contained, similar]);
}

#[test]
fn identical_text_is_not_related_to_itself() {
    let queue = claim_queue(ClaimQueueSettings::default());
    let claim = Claim::new("the vaccine is safe", 0.9);
    put(&queue, claim.clone());
    assert!(queue.get_related_claims(&claim).is_empty());
}

#[test]
fn related_claims_cover_every_status() {
    let queue = claim_queue(ClaimQueueSettings::default());
    let id = put(&queue, Claim::new("the vaccine is safe", 0.9));
    queue.queue().try_get().unwrap();
    queue.queue().complete(&id, ());
    assert_eq!(queue.queue().get_item(&id).unwrap().status, ItemStatus::Completed);

    let related = queue.get_related_claims(&Claim::new("the vaccine is safe for kids", 0.9));
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].0, id);
}

#[test]
fn custom_similarity_replaces_jaccard() {
    let queue = claim_queue(ClaimQueueSettings::default()).with_similarity(|_, _| 0.99);
    put(&queue, Claim::new("completely different", 0.9));

    assert_eq!(queue.similarity("a", "b"), 0.99);
    assert_eq!(
        queue.get_related_claims(&Claim::new("nothing shared", 0.9)).len(),
        1
    );
}

#[test]
fn similarity_may_inspect_the_queue() {
    let base = claim_queue(ClaimQueueSettings::default());
    let inner = Arc::clone(base.queue());
    let queue = base.with_similarity(move |_, _| if inner.len() > 0 { 0.99 } else { 0.0 });
    put(&queue, Claim::new("rates were cut", 0.9));

    let related = queue.get_related_claims(&Claim::new("prices doubled", 0.9));

    assert_eq!(related.len(), 1);
    assert_eq!(related[0].1.text, "rates were cut");
}

#[test]
fn invalid_settings_are_rejected() {
    let result = ClaimPriorityQueue::<Claim>::new(ClaimQueueSettings {
        max_batch_size: 0,
        ..ClaimQueueSettings::default()
    });
    assert!(matches!(result, Err(ClaimError::Config(_))));
}
