//! Queue ordering specs
//!
//! Verify dequeue order, tie-breaks, duplicate suppression and thresholds.

use crate::prelude::*;

#[test]
fn distinct_priorities_dequeue_in_ascending_order() {
    let queue = job_queue();
    for (name, priority) in [("c", 0.7), ("a", 0.05), ("d", 0.9), ("b", 0.2)] {
        queue.put(Job::new(name, priority, 0)).unwrap();
    }

    let mut names = Vec::new();
    while let Some(item) = queue.try_get() {
        names.push(item.payload.name);
    }
    assert_eq!(names, vec!["a", "b", "c", "d"]);
}

#[test]
fn equal_priorities_dequeue_in_insertion_order() {
    let queue = job_queue();
    for name in ["first", "second", "third"] {
        queue.put(Job::new(name, 0.5, 0)).unwrap();
    }
    queue.put(Job::new("urgent", 0.1, 0)).unwrap();

    let batch: Vec<_> = queue
        .get_batch(Some(4))
        .into_iter()
        .map(|item| item.payload.name)
        .collect();
    assert_eq!(batch, vec!["urgent", "first", "second", "third"]);
}

#[test]
fn equal_display_forms_collapse_into_one_item() {
    let queue: PriorityQueue<String> = PriorityQueue::new(QueueConfig::new().deny_duplicates());

    let first = queue.put("check this".to_string()).unwrap();
    let second = queue.put("check this".to_string()).unwrap();

    assert_eq!(first, second);
    assert_eq!(queue.total_items(), 1);
}

#[test]
fn below_threshold_put_is_rejected_without_side_effects() {
    let queue: PriorityQueue<Job> = PriorityQueue::new(
        QueueConfig::new()
            .with_priority_fn(|job: &Job| job.priority)
            .with_min_priority_threshold(0.3),
    );
    queue.put(Job::new("kept", 0.4, 0)).unwrap();

    let err = queue.put(Job::new("dropped", 0.1, 0)).unwrap_err();

    assert_eq!(
        err,
        QueueError::BelowThreshold {
            priority: 0.1,
            threshold: 0.3
        }
    );
    assert_eq!(queue.len(), 1);
}

#[test]
fn terminal_items_never_return_to_pending() {
    let queue = job_queue();
    let id = queue.put(Job::new("once", 0.5, 0)).unwrap();
    queue.try_get().unwrap();

    assert!(queue.complete(&id, 1));
    assert!(!queue.fail(&id, "late failure"));

    let item = queue.get_item(&id).unwrap();
    assert_eq!(item.status, ItemStatus::Completed);
    assert_eq!(item.result, Some(1));
    assert!(item.error.is_none());
    assert!(queue.is_empty());
}
