// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unit of work an [`crate::AsyncProcessor`] applies to each payload
//!
//! Processing functions are future-returning. Synchronous work goes through
//! [`blocking`], which runs every call on tokio's blocking pool so it never
//! stalls the scheduler.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Error type produced by processing functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Owned, sendable future
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Turns one payload into a result
///
/// Implemented for every `Fn(T) -> impl Future<Output = Result<R, E>>`
/// closure. The returned future must own its data; it runs in its own task
/// so a timed-out attempt can be abandoned.
pub trait ProcessFn<T, R>: Send + Sync {
    fn process(&self, item: T) -> BoxFuture<Result<R, BoxError>>;
}

impl<T, R, F, Fut, E> ProcessFn<T, R> for F
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    T: 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
    R: 'static,
{
    fn process(&self, item: T) -> BoxFuture<Result<R, BoxError>> {
        let fut = self(item);
        Box::pin(async move { fut.await.map_err(Into::<BoxError>::into) })
    }
}

/// Adapt a synchronous function so each call runs on the blocking pool
///
/// A timed-out call stops being awaited but its thread runs to completion.
pub fn blocking<T, R, E, F>(f: F) -> impl ProcessFn<T, R>
where
    F: Fn(T) -> Result<R, E> + Send + Sync + 'static,
    T: Send + 'static,
    R: Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    let f = Arc::new(f);
    move |item: T| {
        let f = Arc::clone(&f);
        async move {
            match tokio::task::spawn_blocking(move || f(item)).await {
                Ok(outcome) => outcome.map_err(Into::<BoxError>::into),
                Err(join) => Err(BoxError::from(join)),
            }
        }
    }
}
