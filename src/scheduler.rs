use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::merge::FinalAggregation;
use crate::stats::PartialAggregation;

/// Runs one aggregation pass per chunk on a fixed pool of workers and folds
/// the partials into a single result on the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    workers: usize,
}

impl Scheduler {
    pub fn new(workers: usize) -> Self {
        Scheduler {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns once every chunk has been processed or, after the first hard
    /// error, once in-flight chunks have drained. Chunks not yet started when
    /// the error is seen are never run.
    pub fn run<F>(&self, data: &[u8], chunks: &[Range<usize>], work: F) -> Result<FinalAggregation>
    where
        F: Fn(&[u8]) -> Result<PartialAggregation> + Sync,
    {
        let mut merged = FinalAggregation::new();
        if chunks.is_empty() {
            return Ok(merged);
        }
        let workers = self.workers.min(chunks.len());

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, Range<usize>)>();
        for job in chunks.iter().cloned().enumerate() {
            // the receiver is alive, so this cannot fail
            let _ = job_tx.send(job);
        }
        drop(job_tx);
        let (result_tx, result_rx) = crossbeam_channel::bounded(workers);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("station-worker-{}", i))
            .build()?;
        let cancelled = AtomicBool::new(false);
        let mut first_error: Option<Error> = None;

        pool.in_place_scope(|s| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let cancelled = &cancelled;
                let work = &work;
                s.spawn(move |_| {
                    for (index, range) in job_rx.iter() {
                        if cancelled.load(Ordering::Relaxed) {
                            break;
                        }
                        let chunk = &data[range];
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(chunk)))
                            .unwrap_or(Err(Error::WorkerPanicked));
                        if outcome.is_err() {
                            cancelled.store(true, Ordering::Relaxed);
                        }
                        if result_tx.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            let mut completed = 0;
            for (index, outcome) in result_rx.iter() {
                if first_error.is_some() {
                    continue;
                }
                match outcome.and_then(|partial| merged.merge(partial)) {
                    Ok(()) => {
                        completed += 1;
                        debug!(chunk = index, completed, total = chunks.len(), "merged chunk");
                    }
                    Err(e) => {
                        error!(chunk = index, error = %e, "cancelling remaining chunks");
                        cancelled.store(true, Ordering::Relaxed);
                        first_error = Some(e);
                    }
                }
            }
        });

        match first_error {
            Some(e) => Err(e),
            None => Ok(merged),
        }
    }
}
