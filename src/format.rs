use std::fmt;
use std::io::{self, Write};

use crate::merge::FinalAggregation;

/// One output line: a station and its statistics in tenths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSummary {
    pub station: Box<[u8]>,
    pub min: i32,
    pub mean: i32,
    pub max: i32,
    pub count: u64,
}

impl StationSummary {
    pub fn name(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.station)
    }
}

impl fmt::Display for StationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}/{}/{}",
            self.name(),
            Tenths(self.min),
            Tenths(self.mean),
            Tenths(self.max)
        )
    }
}

/// Fixed-point tenths printed with exactly one fractional digit.
#[derive(Debug, Clone, Copy)]
pub struct Tenths(pub i32);

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

/// Consumes the merged map and returns one summary per station, sorted by
/// raw key bytes.
pub fn summarize(aggregation: FinalAggregation) -> Vec<StationSummary> {
    let mut rows: Vec<StationSummary> = aggregation
        .stations
        .into_iter()
        .map(|(station, stats)| StationSummary {
            station,
            min: stats.min,
            mean: stats.mean_tenths(),
            max: stats.max,
            count: stats.count,
        })
        .collect();
    rows.sort_unstable_by(|a, b| a.station.cmp(&b.station));
    rows
}

/// `<name>=<min>/<mean>/<max>`, one station per line.
pub fn write_lines<W: Write>(mut out: W, rows: &[StationSummary]) -> io::Result<()> {
    for row in rows {
        out.write_all(&row.station)?;
        writeln!(out, "={}/{}/{}", Tenths(row.min), Tenths(row.mean), Tenths(row.max))?;
    }
    out.flush()
}

/// `{a=<min>/<mean>/<max>, b=...}` on a single line.
pub fn write_braced<W: Write>(mut out: W, rows: &[StationSummary]) -> io::Result<()> {
    out.write_all(b"{")?;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            out.write_all(b", ")?;
        }
        out.write_all(&row.station)?;
        write!(out, "={}/{}/{}", Tenths(row.min), Tenths(row.mean), Tenths(row.max))?;
    }
    out.write_all(b"}\n")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregate_chunk;

    fn rows(input: &[u8]) -> Vec<StationSummary> {
        let mut merged = FinalAggregation::new();
        merged.merge(aggregate_chunk(input).unwrap()).unwrap();
        summarize(merged)
    }

    #[test]
    fn tenths_format() {
        assert_eq!(Tenths(0).to_string(), "0.0");
        assert_eq!(Tenths(-5).to_string(), "-0.5");
        assert_eq!(Tenths(25).to_string(), "2.5");
        assert_eq!(Tenths(-999).to_string(), "-99.9");
        assert_eq!(Tenths(i32::MIN).to_string(), "-214748364.8");
    }

    #[test]
    fn oslo_bergen_scenario() {
        let rows = rows(b"Oslo;-5.0\nOslo;10.0\nBergen;3.0\n");
        let mut out = Vec::new();
        write_lines(&mut out, &rows).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Bergen=3.0/3.0/3.0\nOslo=-5.0/2.5/10.0\n");
    }

    #[test]
    fn braced_output() {
        let rows = rows(b"b;1.0\na;2.0\n");
        let mut out = Vec::new();
        write_braced(&mut out, &rows).unwrap();
        assert_eq!(out, b"{a=2.0/2.0/2.0, b=1.0/1.0/1.0}\n");
    }

    #[test]
    fn sorted_by_raw_bytes() {
        let rows = rows("b;1.0\nB;1.0\nÅlesund;1.0\na;1.0\n".as_bytes());
        let names: Vec<_> = rows.iter().map(|r| r.name().into_owned()).collect();
        assert_eq!(names, ["B", "a", "b", "Ålesund"]);
    }

    #[test]
    fn min_le_mean_le_max() {
        let rows = rows(b"x;-99.9\nx;99.9\nx;0.1\ny;-0.1\ny;-0.2\nz;5.5\n");
        for row in &rows {
            assert!(row.min <= row.mean && row.mean <= row.max, "{}", row);
        }
        assert_eq!(rows[1].to_string(), "y=-0.2/-0.1/-0.1");
    }
}
