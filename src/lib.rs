//! Per-station min/mean/max over very large `<station>;<measurement>` files.
//!
//! The input is memory-mapped, cut into line-aligned chunks, and each chunk is
//! aggregated by its own worker into a private map. The partial maps are then
//! merged key-wise and sorted by station name.

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use memmap2::Mmap;
use tracing::{info, warn};

pub mod config;
pub mod error;
pub mod format;
pub mod generate;
pub mod merge;
pub mod parse;
pub mod partition;
pub mod scheduler;
pub mod stats;

pub use config::Config;
pub use error::{Error, Result};
pub use format::StationSummary;
pub use merge::FinalAggregation;
pub use parse::MalformedRecord;
pub use stats::{PartialAggregation, StationStats};

use partition::partition;
use scheduler::Scheduler;
use stats::aggregate_chunk;

/// Output of a complete run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub stations: Vec<StationSummary>,
    pub lines: u64,
    pub skipped: u64,
}

pub fn aggregate_file(path: impl AsRef<Path>, config: &Config) -> Result<Report> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let len = file.metadata().map_err(|e| Error::io(path, e))?.len();
    if len == 0 {
        return aggregate_bytes(&[], config);
    }
    // SAFETY: the file is only read, and is assumed not to be truncated
    // while the run is in progress.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::io(path, e))?;
    aggregate_bytes(&mmap, config)
}

pub fn aggregate_bytes(data: &[u8], config: &Config) -> Result<Report> {
    let start = Instant::now();
    let chunks = partition(data, config.target_chunks(), config.min_chunk_bytes);
    let scheduler = Scheduler::new(config.workers);
    let merged = scheduler.run(data, &chunks, aggregate_chunk)?;
    let (lines, skipped) = (merged.lines, merged.skipped);
    let stations = format::summarize(merged);

    info!(
        bytes = data.len(),
        chunks = chunks.len(),
        workers = scheduler.workers(),
        stations = stations.len(),
        lines,
        skipped,
        elapsed = ?start.elapsed(),
        "aggregation finished"
    );
    if skipped > 0 {
        warn!(skipped, "malformed lines were skipped");
    }
    Ok(Report { stations, lines, skipped })
}
