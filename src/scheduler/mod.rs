// s3-rewind/src/scheduler/mod.rs
//! Bounded-concurrency work scheduler.
//!
//! A single coordinating loop owns the backlog cursor and the stop flag.
//! Units of work run as tokio tasks and only hand back values; all
//! bookkeeping happens in the loop when a completion is harvested. The pool
//! is topped back up after every completion (sliding window), so one slow
//! item never holds a whole batch hostage.

use std::future::Future;
use std::num::NonZeroUsize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::errors::{RestoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    /// New items are dequeued whenever a slot frees up.
    Scheduling,
    /// No new items are dequeued; outstanding units are awaited.
    Draining,
}

/// Everything a fail-fast run produced.
#[derive(Debug)]
pub struct Drained<R> {
    /// One result per dequeued item, in completion order.
    pub results: Vec<R>,
    /// How many backlog items were actually started.
    pub dequeued: usize,
}

/// Runs `work` over every backlog item with at most `max_workers` in flight.
///
/// Results come back in completion order; callers that care about identity
/// carry it inside `R`.
pub async fn run_bounded<T, R, F, Fut>(
    backlog: Vec<T>,
    max_workers: NonZeroUsize,
    work: F,
) -> Result<Vec<R>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    let drained = drive(backlog, max_workers, work, |_: &R| false).await?;
    Ok(drained.results)
}

/// Like [`run_bounded`], but stops dequeuing once a completed unit satisfies
/// `is_failure`. Units already in flight at that point still run to the end
/// and their results are still collected.
pub async fn run_bounded_fail_fast<T, R, F, Fut, P>(
    backlog: Vec<T>,
    max_workers: NonZeroUsize,
    work: F,
    is_failure: P,
) -> Result<Drained<R>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
    P: Fn(&R) -> bool,
{
    drive(backlog, max_workers, work, is_failure).await
}

async fn drive<T, R, F, Fut, P>(
    backlog: Vec<T>,
    max_workers: NonZeroUsize,
    work: F,
    stop_on: P,
) -> Result<Drained<R>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
    P: Fn(&R) -> bool,
{
    let total = backlog.len();
    let mut pending = backlog.into_iter();
    let mut in_flight: JoinSet<R> = JoinSet::new();
    let mut results = Vec::with_capacity(total);
    let mut dequeued = 0usize;
    let mut state = SchedulerState::Scheduling;
    let mut join_failure: Option<String> = None;

    loop {
        // The only place new work is started.
        if state == SchedulerState::Scheduling {
            while in_flight.len() < max_workers.get() {
                let Some(item) = pending.next() else {
                    break;
                };
                in_flight.spawn(work(item));
                dequeued += 1;
            }
        }

        let Some(joined) = in_flight.join_next().await else {
            break;
        };

        match joined {
            Ok(result) => {
                if state == SchedulerState::Scheduling && stop_on(&result) {
                    debug!(
                        dequeued,
                        in_flight = in_flight.len(),
                        "failure observed; draining without scheduling new work"
                    );
                    state = SchedulerState::Draining;
                }
                results.push(result);
            }
            Err(join_err) => {
                warn!(error = %join_err, "worker task did not complete");
                if join_failure.is_none() {
                    join_failure = Some(join_err.to_string());
                }
                state = SchedulerState::Draining;
            }
        }
    }

    if let Some(detail) = join_failure {
        return Err(RestoreError::Scheduler(detail));
    }

    debug!(total, dequeued, completed = results.len(), "scheduler drained");
    Ok(Drained { results, dequeued })
}
