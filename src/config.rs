use std::num::NonZeroUsize;
use std::thread;

pub const DEFAULT_CHUNKS_PER_WORKER: usize = 4;
pub const DEFAULT_MIN_CHUNK_BYTES: usize = 64 * 1024;

/// Knobs for one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub workers: usize,
    pub chunks_per_worker: usize,
    pub min_chunk_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1),
            chunks_per_worker: DEFAULT_CHUNKS_PER_WORKER,
            min_chunk_bytes: DEFAULT_MIN_CHUNK_BYTES,
        }
    }
}

impl Config {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_chunks_per_worker(mut self, chunks: usize) -> Self {
        self.chunks_per_worker = chunks.max(1);
        self
    }

    pub fn with_min_chunk_bytes(mut self, bytes: usize) -> Self {
        self.min_chunk_bytes = bytes.max(1);
        self
    }

    pub fn target_chunks(&self) -> usize {
        self.workers.saturating_mul(self.chunks_per_worker)
    }
}
