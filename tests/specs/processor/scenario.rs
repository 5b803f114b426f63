//! End-to-end processor specs
//!
//! Verify a full run over a prioritised queue: results, order and stats.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn prioritised_run_doubles_every_payload() {
    init_tracing();
    let queue = job_queue();
    let processor = AsyncProcessor::with_queue(
        |job: Job| async move { Ok::<_, String>(job.value * 2) },
        fast_config().with_max_concurrency(2).with_retry_attempts(0),
        Arc::clone(&queue),
    )
    .unwrap();

    let jobs = vec![
        Job::new("p0.9", 0.9, 1),
        Job::new("p0.1-first", 0.1, 2),
        Job::new("p0.5", 0.5, 3),
        Job::new("p0.1-second", 0.1, 4),
        Job::new("p0.3", 0.3, 5),
    ];
    let results = processor.process_items(jobs.clone(), None).await.unwrap();

    assert_eq!(processor.status(), ProcessingStatus::Completed);
    assert_eq!(results.len(), 5);
    for (result, job) in results.iter().zip(&jobs) {
        assert!(result.success, "{} failed: {:?}", job.name, result.error);
        assert_eq!(result.item, *job);
        assert_eq!(result.result, Some(job.value * 2));
        assert_eq!(result.attempts, 1);
    }

    // Batches of two dequeue in priority order, ties by insertion
    let mut dequeued = queue.get_all_items();
    dequeued.sort_by_key(|item| item.started_at);
    let batches: Vec<Vec<String>> = dequeued
        .chunks(2)
        .map(|chunk| {
            let mut names: Vec<_> = chunk.iter().map(|item| item.payload.name.clone()).collect();
            names.sort();
            names
        })
        .collect();
    assert_eq!(
        batches,
        vec![
            vec!["p0.1-first".to_string(), "p0.1-second".to_string()],
            vec!["p0.3".to_string(), "p0.5".to_string()],
            vec!["p0.9".to_string()],
        ]
    );

    let all_by_priority: Vec<_> = queue
        .get_all_items()
        .into_iter()
        .map(|item| item.payload.name)
        .collect();
    assert_eq!(
        all_by_priority,
        vec!["p0.1-first", "p0.1-second", "p0.3", "p0.5", "p0.9"]
    );

    let progress = processor.progress();
    assert_eq!(progress.total_items, 5);
    assert_eq!(progress.processed_items, 5);
    assert_eq!(progress.failed_items, 0);
    assert_eq!(progress.success_rate, 1.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn results_keep_submission_order_despite_completion_order() {
    init_tracing();
    // C finishes first, then A, then B
    let delays = [("A", 30), ("B", 60), ("C", 5)];
    let processor: AsyncProcessor<&'static str, &'static str> = AsyncProcessor::new(
        move |name: &'static str| async move {
            let (_, delay) = delays
                .iter()
                .copied()
                .find(|(candidate, _)| *candidate == name)
                .unwrap_or((name, 0));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok::<_, String>(name)
        },
        fast_config().with_max_concurrency(3),
    )
    .unwrap();

    let results = processor.process_items(vec!["A", "B", "C"], None).await.unwrap();

    let order: Vec<_> = results.iter().map(|r| r.item).collect();
    assert_eq!(order, vec!["A", "B", "C"]);
    let mut finished: Vec<_> = results.iter().collect();
    finished.sort_by_key(|r| r.timestamp);
    let finished: Vec<_> = finished.iter().map(|r| r.item).collect();
    assert_eq!(finished, vec!["C", "A", "B"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_limit_holds_across_the_run() {
    init_tracing();
    let active = Arc::new(Mutex::new((0usize, 0usize)));
    let processor: AsyncProcessor<u32, u32> = {
        let active = Arc::clone(&active);
        AsyncProcessor::new(
            move |n: u32| {
                let active = Arc::clone(&active);
                async move {
                    {
                        let mut guard = active.lock().unwrap();
                        guard.0 += 1;
                        guard.1 = guard.1.max(guard.0);
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    active.lock().unwrap().0 -= 1;
                    Ok::<_, String>(n)
                }
            },
            fast_config().with_max_concurrency(3),
        )
        .unwrap()
    };

    let results = processor.process_items((0..12).collect(), None).await.unwrap();

    assert!(results.iter().all(|r| r.success));
    let (still_active, peak) = *active.lock().unwrap();
    assert_eq!(still_active, 0);
    assert!(peak <= 3 && peak > 0, "peak concurrency {peak}");
}
