//! Processor cancellation specs
//!
//! Verify a canceled run keeps real results and reports the rest as not
//! completed.

use crate::prelude::*;

#[tokio::test]
async fn cancel_mid_run_reports_unreached_items() {
    init_tracing();
    let processor: AsyncProcessor<u32, u32> = AsyncProcessor::new(
        |n: u32| async move {
            tokio::time::sleep(Duration::from_millis(25)).await;
            Ok::<_, String>(n * 10)
        },
        fast_config().with_max_concurrency(1),
    )
    .unwrap();

    let run = {
        let processor = processor.clone();
        tokio::spawn(async move { processor.process_items(vec![1, 2, 3, 4, 5, 6], None).await })
    };
    // Let at least one item finish before canceling
    while processor.progress().processed_items == 0 {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    processor.cancel();
    let results = run.await.unwrap().unwrap();

    assert_eq!(processor.status(), ProcessingStatus::Canceled);
    assert_eq!(results.len(), 6);
    assert!(results[0].success);
    assert_eq!(results[0].result, Some(10));

    let (done, unreached): (Vec<_>, Vec<_>) = results.iter().partition(|r| r.success);
    assert!(!unreached.is_empty());
    for result in &done {
        assert_eq!(result.result, Some(result.item * 10));
    }
    for result in &unreached {
        assert_eq!(result.error.as_deref(), Some(NOT_COMPLETED));
        assert!(result.result.is_none());
    }
}

#[tokio::test]
async fn canceled_processor_can_run_again() {
    init_tracing();
    let processor: AsyncProcessor<u32, u32> = AsyncProcessor::new(
        |n: u32| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, String>(n)
        },
        fast_config().with_max_concurrency(1),
    )
    .unwrap();

    processor.start(vec![1, 2, 3], None).unwrap();
    processor.cancel();
    assert_eq!(processor.wait().await, ProcessingStatus::Canceled);

    let results = processor.process_items(vec![7], None).await.unwrap();
    assert_eq!(processor.status(), ProcessingStatus::Completed);
    assert_eq!(results[0].result, Some(7));
}
