//! Claim pipeline specs
//!
//! Verify claim ordering, the check-worthiness floor and the relationship
//! pass over a full claim processing run.

use crate::prelude::*;
use vf_claims::{AsyncClaimProcessor, Claim, ClaimError, ClaimProcessorConfig};

/// Pretend verdict: the claim text, upper-cased
fn verdicts() -> AsyncClaimProcessor<Claim, String> {
    AsyncClaimProcessor::new(
        |claim: Claim| async move { Ok::<_, String>(claim.text.to_uppercase()) },
        ClaimProcessorConfig::default()
            .with_max_concurrency(1)
            .with_pause_poll_interval(Duration::from_millis(5)),
    )
    .unwrap()
}

#[tokio::test]
async fn claim_run_orders_filters_and_relates() {
    init_tracing();
    let processor = verdicts();
    let claims = vec![
        Claim::new("Tariffs doubled in 2024", 0.6),
        Claim::new("Drinking bleach cures covid", 0.8).with_domain("health"),
        Claim::new("Bleach cures covid", 0.9).with_domain("Health"),
        Claim::new("The new bridge cost $4bn", 0.75),
    ];

    let results = processor.process_items(claims.clone(), None).await.unwrap();

    assert_eq!(processor.status(), ProcessingStatus::Completed);
    for (result, claim) in results.iter().zip(&claims) {
        assert_eq!(result.item, *claim);
        assert_eq!(result.result.as_deref(), Some(claim.text.to_uppercase().as_str()));
    }

    // Health claims are boosted ahead of the more worthy-looking bridge claim
    let order: Vec<_> = {
        let mut items = processor.queue().get_all_items();
        items.sort_by_key(|item| item.started_at);
        items.into_iter().map(|item| item.payload.text).collect()
    };
    assert_eq!(
        order,
        vec![
            "Bleach cures covid",
            "Drinking bleach cures covid",
            "The new bridge cost $4bn",
            "Tariffs doubled in 2024",
        ]
    );

    // Word overlap relates the two bleach claims
    let related = processor.get_related_claims(&claims[2]);
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].1, claims[1]);
    assert_eq!(related[0].2.as_deref(), Some("DRINKING BLEACH CURES COVID"));

    // {bleach, cures, covid} of {drinking, bleach, cures, covid} = 0.75
    assert_eq!(processor.set_result_relationships(), 1);
    let linked = processor.get_claim_relationships(&results[2].item_id);
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].0, results[1].item_id);
}

#[tokio::test]
async fn unworthy_claim_blocks_the_whole_batch() {
    init_tracing();
    let processor = verdicts();

    let err = processor
        .process_items(
            vec![Claim::new("Big claim", 0.9), Claim::new("Idle chatter", 0.2)],
            None,
        )
        .await
        .unwrap_err();

    match err {
        ClaimError::BelowCheckWorthiness { score, threshold } => {
            assert_eq!(score, 0.2);
            assert_eq!(threshold, 0.5);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(processor.queue().is_empty());
    assert_eq!(processor.status(), ProcessingStatus::Idle);
}
