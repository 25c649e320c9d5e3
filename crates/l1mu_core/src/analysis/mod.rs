//! # Analysis Module
//!
//! Per-event analyses and the loops that drive them.
//!
//! ## Submodules
//!
//! - `efficiency` - matched signal dimuons scored against the seed menu
//! - `rate` - zero-bias events scored against the seed menu
//!
//! Analyzers are stateless; all accumulation goes into the [`Counters`]
//! passed in, so the same analyzer can run sequentially or split across
//! rayon workers with identical results.

pub mod efficiency;
pub mod rate;

use std::borrow::Borrow;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::counters::Counters;
use crate::event::EventRecord;

pub use efficiency::EfficiencyAnalyzer;
pub use rate::RateAnalyzer;

pub trait Analyzer: Sync {
    fn name(&self) -> &'static str;

    /// Score one event into `counters`.
    fn process_event(&self, event: &EventRecord, counters: &mut Counters);

    /// Events between progress log lines.
    fn progress_interval(&self) -> u64 {
        10_000
    }
}

/// Process events in order until the iterator ends or `limit` is reached.
///
/// `events` may be a lazy stream; at most `limit` items are pulled from it.
pub fn run_events<A, I>(analyzer: &A, events: I, limit: Option<u64>) -> Counters
where
    A: Analyzer + ?Sized,
    I: IntoIterator,
    I::Item: Borrow<EventRecord>,
{
    let interval = analyzer.progress_interval().max(1);
    let mut counters = Counters::new();
    let mut processed = 0u64;

    let mut events = events.into_iter();
    loop {
        // Checked before pulling, so a streaming source is never read past the limit
        if limit.is_some_and(|max| processed >= max) {
            debug!(analysis = analyzer.name(), limit = ?limit, "event limit reached");
            break;
        }
        let Some(event) = events.next() else {
            break;
        };
        analyzer.process_event(event.borrow(), &mut counters);
        processed += 1;
        if processed % interval == 0 {
            info!(analysis = analyzer.name(), processed, "processing events");
        }
    }

    info!(analysis = analyzer.name(), processed, "finished");
    counters
}

/// Process a batch on the rayon pool, one partial `Counters` per worker.
///
/// Callers apply any event limit by slicing `events`.
pub fn run_events_parallel<A>(analyzer: &A, events: &[EventRecord]) -> Counters
where
    A: Analyzer + ?Sized,
{
    let counters = events
        .par_iter()
        .fold(Counters::new, |mut partial, event| {
            analyzer.process_event(event, &mut partial);
            partial
        })
        .reduce(Counters::new, Counters::merged);

    info!(analysis = analyzer.name(), processed = events.len(), "finished (parallel)");
    counters
}
