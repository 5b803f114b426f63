// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed claim capability and claim scoring

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domains whose claims are boosted ahead of equally check-worthy ones
const BOOSTED_DOMAINS: [&str; 2] = ["health", "science"];

/// Multiplier applied to the priority of boosted claims
const DOMAIN_BOOST: f64 = 0.8;

/// What the claim queue needs to know about a payload
pub trait ClaimLike {
    /// Text used for duplicate detection and similarity
    fn text(&self) -> &str;

    /// Higher values are more worth checking
    fn check_worthiness(&self) -> f64;

    fn domain(&self) -> Option<&str> {
        None
    }
}

/// A claim extracted from text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub text: String,
    pub check_worthiness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Claim {
    pub fn new(text: impl Into<String>, check_worthiness: f64) -> Self {
        Self {
            text: text.into(),
            check_worthiness,
            domain: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

impl ClaimLike for Claim {
    fn text(&self) -> &str {
        &self.text
    }

    fn check_worthiness(&self) -> f64 {
        self.check_worthiness
    }

    fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Queue priority of a claim: `1 - check_worthiness`, scaled by 0.8 for
/// health and science claims. Lower is dequeued first.
pub fn claim_priority<T: ClaimLike + ?Sized>(claim: &T) -> f64 {
    let priority = 1.0 - claim.check_worthiness();
    let boosted = claim.domain().is_some_and(|domain| {
        BOOSTED_DOMAINS
            .iter()
            .any(|boosted| domain.eq_ignore_ascii_case(boosted))
    });
    if boosted {
        priority * DOMAIN_BOOST
    } else {
        priority
    }
}

#[cfg(test)]
#[path = "claim_tests.rs"]
mod tests;
