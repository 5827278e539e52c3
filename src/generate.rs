//! Synthetic `<station>;<measurement>` datasets for benchmarking.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::format::Tenths;

pub const COLDEST_TENTHS: i32 = -999;
pub const HOTTEST_TENTHS: i32 = 999;
pub const DEFAULT_SAMPLE: usize = 10_000;
const BATCH_SIZE: usize = 10_000;

const BUILTIN_STATIONS: &[&str] = &[
    "Abha", "Abidjan", "Accra", "Addis Ababa", "Adelaide", "Alexandria", "Anchorage", "Asmara",
    "Bamako", "Bangkok", "Banjul", "Bergen", "Bissau", "Bridgetown", "Bulawayo", "Cairo",
    "Conakry", "Cracow", "Dhaka", "Hamburg", "Istanbul", "Jakarta", "Kabul", "Lagos",
    "Libreville", "Lilongwe", "Maseru", "Mogadishu", "Monrovia", "Oslo", "Ouagadougou",
    "Palembang", "Phnom Penh", "Roseau", "St. John's", "Suva", "Tashkent", "Tokyo", "Tromsø",
    "Vientiane", "Windhoek", "Yamoussoukro", "Ålesund", "Ōsaka",
];

pub fn builtin_station_names() -> Vec<String> {
    BUILTIN_STATIONS.iter().map(|s| s.to_string()).collect()
}

/// Reads a `weather_stations.csv`-style file: the name is everything before
/// the first `;`, and lines containing `#` are comments. Names are
/// de-duplicated and returned sorted.
pub fn load_station_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let names: BTreeSet<&str> = contents
        .lines()
        .filter(|line| !line.contains('#'))
        .filter_map(|line| line.split(';').next())
        .filter(|name| !name.is_empty())
        .collect();
    Ok(names.into_iter().map(str::to_owned).collect())
}

/// Rough output size in bytes for `rows` records over `names`.
pub fn estimate_file_size(names: &[String], rows: u64) -> u64 {
    let longest = names.iter().map(String::len).max().unwrap_or(0);
    let shortest = names.iter().map(String::len).min().unwrap_or(0);
    let per_record = ((longest + shortest * 2) + ",-123.4".len()) as f64 / 2.0;
    (rows as f64 * per_record * 0.57) as u64
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSummary {
    pub rows: u64,
    pub bytes: u64,
    pub stations: BTreeSet<String>,
}

#[derive(Debug)]
pub struct Generator {
    working_set: Vec<String>,
    rng: StdRng,
}

impl Generator {
    /// Draws `sample` names with replacement from `names` as the working set
    /// rows are picked from.
    pub fn new(names: &[String], sample: usize, seed: Option<u64>) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::NoStations);
        }
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let working_set = (0..sample.max(1))
            .map(|_| names[rng.random_range(0..names.len())].clone())
            .collect();
        Ok(Generator { working_set, rng })
    }

    /// Writes `rows` newline-terminated records to `out`.
    pub fn write_rows<W: Write>(&mut self, mut out: W, rows: u64) -> std::io::Result<GeneratedSummary> {
        let mut stations = BTreeSet::new();
        let mut bytes = 0u64;
        let mut batch = String::with_capacity(BATCH_SIZE * 24);
        let mut remaining = rows;
        while remaining > 0 {
            let n = remaining.min(BATCH_SIZE as u64);
            batch.clear();
            for _ in 0..n {
                let station = &self.working_set[self.rng.random_range(0..self.working_set.len())];
                let value = self.rng.random_range(COLDEST_TENTHS..=HOTTEST_TENTHS);
                // writing into a String cannot fail
                let _ = writeln!(batch, "{};{}", station, Tenths(value));
                if !stations.contains(station) {
                    stations.insert(station.clone());
                }
            }
            out.write_all(batch.as_bytes())?;
            bytes += batch.len() as u64;
            remaining -= n;
            debug!(written = rows - remaining, rows, "batch written");
        }
        out.flush()?;
        Ok(GeneratedSummary { rows, bytes, stations })
    }
}

pub fn generate_file(path: impl AsRef<Path>, generator: &mut Generator, rows: u64) -> Result<GeneratedSummary> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let summary = generator
        .write_rows(BufWriter::new(file), rows)
        .map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), rows, bytes = summary.bytes, "dataset written");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_line;

    #[test]
    fn rows_are_well_formed_and_in_range() {
        let names = builtin_station_names();
        let mut generator = Generator::new(&names, 50, Some(7)).unwrap();
        let mut out = Vec::new();
        let summary = generator.write_rows(&mut out, 2_500).unwrap();
        assert_eq!(summary.rows, 2_500);
        assert_eq!(summary.bytes, out.len() as u64);
        assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), 2_500);
        for line in out.split(|&b| b == b'\n').filter(|l| !l.is_empty()) {
            let (station, value) = parse_line(line).unwrap();
            assert!((COLDEST_TENTHS..=HOTTEST_TENTHS).contains(&value));
            assert!(summary.stations.contains(std::str::from_utf8(station).unwrap()));
        }
    }

    #[test]
    fn same_seed_same_output() {
        let names = builtin_station_names();
        let run = |seed| {
            let mut out = Vec::new();
            Generator::new(&names, 10, Some(seed)).unwrap().write_rows(&mut out, 100).unwrap();
            out
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn empty_station_list_is_rejected() {
        assert!(matches!(Generator::new(&[], 10, Some(1)), Err(Error::NoStations)));
    }

    #[test]
    fn estimate_uses_name_lengths() {
        let names = vec!["ab".to_string(), "abcdef".to_string()];
        // ((6 + 2 * 2) + 7) / 2 = 8.5 bytes per record
        assert_eq!(estimate_file_size(&names, 1_000), (1_000.0 * 8.5 * 0.57) as u64);
        assert_eq!(estimate_file_size(&[], 10), 19);
    }
}
