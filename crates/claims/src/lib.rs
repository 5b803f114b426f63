// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Claim-aware queue and processor built on `vf-core`

mod claim;
mod config;
mod error;
mod processor;
mod queue;
pub mod similarity;

pub use claim::{claim_priority, Claim, ClaimLike};
pub use config::{ClaimProcessorConfig, ClaimQueueSettings};
pub use error::ClaimError;
pub use processor::{AsyncClaimProcessor, RelatedResult};
pub use queue::ClaimPriorityQueue;
pub use similarity::{jaccard, SimilarityFn};
