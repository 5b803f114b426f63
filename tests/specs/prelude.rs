//! Shared helpers for the behavioral specs

#![allow(dead_code)]

pub use std::sync::{Arc, Mutex};
pub use std::time::Duration;
pub use vf_core::{
    AsyncProcessor, ItemStatus, PriorityQueue, ProcessingStatus, ProcessorConfig, QueueConfig,
    QueueError, SequentialIdGen, SystemClock, NOT_COMPLETED,
};

/// Route `tracing` output through the test harness; `RUST_LOG` filters it
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Payload carrying its own priority
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub name: String,
    pub priority: f64,
    pub value: i64,
}

impl Job {
    pub fn new(name: &str, priority: f64, value: i64) -> Self {
        Self {
            name: name.to_string(),
            priority,
            value,
        }
    }
}

/// Queue ordered by each job's own priority, with predictable ids
pub fn job_queue() -> Arc<PriorityQueue<Job, i64, SystemClock, SequentialIdGen>> {
    Arc::new(PriorityQueue::with_deps(
        QueueConfig::new().with_priority_fn(|job: &Job| job.priority),
        SystemClock,
        SequentialIdGen::new("job"),
    ))
}

/// Processor config that polls quickly while paused
pub fn fast_config() -> ProcessorConfig {
    ProcessorConfig::default().with_pause_poll_interval(Duration::from_millis(5))
}
