use ahash::AHashMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::parse::parse_line;

/// Malformed lines logged per chunk before going quiet.
const WARN_LIMIT: u64 = 3;

/// Running statistics for one station, in tenths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationStats {
    pub min: i32,
    pub max: i32,
    pub sum: i64,
    pub count: u64,
}

impl StationStats {
    pub fn new(value: i32) -> Self {
        StationStats {
            min: value,
            max: value,
            sum: value as i64,
            count: 1,
        }
    }

    /// Folds in one observation. Returns `None` if the sum or count would
    /// overflow, leaving `self` untouched.
    pub fn add(&mut self, value: i32) -> Option<()> {
        let sum = self.sum.checked_add(value as i64)?;
        let count = self.count.checked_add(1)?;
        self.sum = sum;
        self.count = count;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        Some(())
    }

    /// Combines two sets of statistics for the same station.
    pub fn combine(&mut self, other: &StationStats) -> Option<()> {
        let sum = self.sum.checked_add(other.sum)?;
        let count = self.count.checked_add(other.count)?;
        self.sum = sum;
        self.count = count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        Some(())
    }

    /// Mean in tenths, rounded half up.
    pub fn mean_tenths(&self) -> i32 {
        let sum = self.sum as i128;
        let count = self.count as i128;
        (2 * sum + count).div_euclid(2 * count) as i32
    }
}

pub type StationMap = AHashMap<Box<[u8]>, StationStats>;

/// Statistics gathered from one chunk. Owned by a single worker while it
/// scans, then moved to the reducer.
#[derive(Debug, Default)]
pub struct PartialAggregation {
    pub stations: StationMap,
    pub lines: u64,
    pub skipped: u64,
}

impl PartialAggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates only when `station` is seen for the first time.
    pub fn update(&mut self, station: &[u8], value: i32) -> Result<()> {
        match self.stations.get_mut(station) {
            Some(stats) => stats.add(value).ok_or_else(|| Error::overflow(station))?,
            None => {
                self.stations.insert(station.into(), StationStats::new(value));
            }
        }
        Ok(())
    }

    /// Parses every line in `chunk` and folds it in. Malformed lines are
    /// skipped and counted.
    pub fn scan(&mut self, chunk: &[u8]) -> Result<()> {
        let mut start = 0;
        for end in memchr::memchr_iter(b'\n', chunk).chain([chunk.len()]) {
            let line = &chunk[start..end];
            start = end + 1;
            if end == chunk.len() && line.is_empty() {
                // nothing after the final newline
                break;
            }
            self.lines += 1;
            match parse_line(line) {
                Ok((station, value)) => self.update(station, value)?,
                Err(reason) => {
                    self.skipped += 1;
                    if self.skipped <= WARN_LIMIT {
                        warn!(line = %String::from_utf8_lossy(line), %reason, "skipping malformed line");
                    }
                }
            }
        }
        Ok(())
    }
}

/// Runs the aggregator over one chunk from scratch.
pub fn aggregate_chunk(chunk: &[u8]) -> Result<PartialAggregation> {
    let mut partial = PartialAggregation::new();
    partial.scan(chunk)?;
    debug!(
        bytes = chunk.len(),
        lines = partial.lines,
        skipped = partial.skipped,
        stations = partial.stations.len(),
        "chunk done"
    );
    Ok(partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_sets_everything() {
        let mut partial = PartialAggregation::new();
        partial.update(b"Oslo", -50).unwrap();
        assert_eq!(partial.stations[&b"Oslo"[..]], StationStats { min: -50, max: -50, sum: -50, count: 1 });
    }

    #[test]
    fn update_tracks_min_max_sum_count() {
        let mut partial = PartialAggregation::new();
        for v in [30, -50, 100, 20] {
            partial.update(b"Oslo", v).unwrap();
        }
        assert_eq!(partial.stations[&b"Oslo"[..]], StationStats { min: -50, max: 100, sum: 100, count: 4 });
    }

    #[test]
    fn scan_counts_and_skips() {
        let mut partial = PartialAggregation::new();
        partial.scan(b"Oslo;-5.0\nbroken\n\nOslo;10.0\nBergen;3.0\n").unwrap();
        assert_eq!(partial.lines, 5);
        assert_eq!(partial.skipped, 2);
        assert_eq!(partial.stations.len(), 2);
        assert_eq!(partial.stations[&b"Oslo"[..]].count, 2);
    }

    #[test]
    fn scan_handles_missing_trailing_newline() {
        let mut partial = PartialAggregation::new();
        partial.scan(b"Oslo;-5.0\nBergen;3.0").unwrap();
        assert_eq!(partial.lines, 2);
        assert_eq!(partial.skipped, 0);
    }

    #[test]
    fn scan_of_empty_chunk_is_empty() {
        let partial = aggregate_chunk(b"").unwrap();
        assert_eq!(partial.lines, 0);
        assert!(partial.stations.is_empty());
    }

    #[test]
    fn overflow_is_detected() {
        let mut stats = StationStats { min: 0, max: 10, sum: i64::MAX - 5, count: 3 };
        assert_eq!(stats.add(10), None);
        assert_eq!(stats.sum, i64::MAX - 5);

        let mut partial = PartialAggregation::new();
        partial.stations.insert((*b"Oslo").into(), stats);
        assert!(matches!(partial.update(b"Oslo", 10), Err(Error::NumericOverflow { .. })));
    }

    #[test]
    fn mean_rounds_half_up() {
        let stats = |sum, count| StationStats { min: 0, max: 0, sum, count };
        assert_eq!(stats(25, 2).mean_tenths(), 13);
        assert_eq!(stats(-25, 2).mean_tenths(), -12);
        assert_eq!(stats(50, 2).mean_tenths(), 25);
        assert_eq!(stats(10, 3).mean_tenths(), 3);
        assert_eq!(stats(-10, 3).mean_tenths(), -3);
    }
}
