use std::collections::hash_map::Entry;

use crate::error::{Error, Result};
use crate::stats::{PartialAggregation, StationMap};

/// The merged result of every chunk of a run.
#[derive(Debug, Default)]
pub struct FinalAggregation {
    pub stations: StationMap,
    pub lines: u64,
    pub skipped: u64,
}

impl FinalAggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one sealed partial in. Key-wise min/max/sum/count combination is
    /// associative and commutative, so the order partials arrive in does not
    /// change the result.
    pub fn merge(&mut self, partial: PartialAggregation) -> Result<()> {
        merge_maps(&mut self.stations, partial.stations)?;
        self.lines += partial.lines;
        self.skipped += partial.skipped;
        Ok(())
    }
}

pub fn merge_maps(global: &mut StationMap, local: StationMap) -> Result<()> {
    for (station, stats) in local {
        match global.entry(station) {
            Entry::Occupied(mut entry) => {
                if entry.get_mut().combine(&stats).is_none() {
                    return Err(Error::overflow(entry.key()));
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(stats);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{aggregate_chunk, StationStats};

    fn partials() -> Vec<PartialAggregation> {
        [
            &b"Oslo;-5.0\nBergen;3.0\n"[..],
            b"Oslo;10.0\nTromso;-1.1\n",
            b"Bergen;7.5\nbad line\n",
            b"Tromso;2.0\nOslo;0.1\n",
        ]
        .into_iter()
        .map(|chunk| aggregate_chunk(chunk).unwrap())
        .collect()
    }

    fn merged(order: &[usize]) -> FinalAggregation {
        let mut parts: Vec<Option<PartialAggregation>> = partials().into_iter().map(Some).collect();
        let mut result = FinalAggregation::new();
        for &i in order {
            result.merge(parts[i].take().unwrap()).unwrap();
        }
        result
    }

    #[test]
    fn merge_order_does_not_matter() {
        let reference = merged(&[0, 1, 2, 3]);
        for order in [[3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1], [0, 2, 1, 3]] {
            let other = merged(&order);
            assert_eq!(other.stations, reference.stations);
            assert_eq!(other.lines, reference.lines);
            assert_eq!(other.skipped, reference.skipped);
        }
    }

    #[test]
    fn merge_combines_key_wise() {
        let result = merged(&[0, 1, 2, 3]);
        assert_eq!(result.stations[&b"Oslo"[..]], StationStats { min: -50, max: 100, sum: 51, count: 3 });
        assert_eq!(result.stations[&b"Bergen"[..]], StationStats { min: 30, max: 75, sum: 105, count: 2 });
        assert_eq!(result.lines, 8);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn merge_is_associative() {
        // (a + b) + c == a + (b + c)
        let mut p = partials();
        let (c, b, a) = (p.pop().unwrap(), p.pop().unwrap(), p.pop().unwrap());
        let mut left = a.stations.clone();
        merge_maps(&mut left, b.stations.clone()).unwrap();
        merge_maps(&mut left, c.stations.clone()).unwrap();

        let mut right = b.stations;
        merge_maps(&mut right, c.stations).unwrap();
        let mut outer = a.stations;
        merge_maps(&mut outer, right).unwrap();
        assert_eq!(left, outer);
    }

    #[test]
    fn merge_detects_overflow() {
        let mut global = StationMap::default();
        global.insert((*b"Oslo").into(), StationStats { min: 0, max: 0, sum: i64::MAX, count: 1 });
        let mut local = StationMap::default();
        local.insert((*b"Oslo").into(), StationStats::new(1));
        assert!(matches!(merge_maps(&mut global, local), Err(Error::NumericOverflow { .. })));
    }
}
