use std::fmt;

use memchr::memchr;

pub const DELIMITER: u8 = b';';

/// Why a line was rejected. Never fatal: callers skip the line and count it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedRecord {
    Empty,
    MissingDelimiter,
    InvalidValue,
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRecord::Empty => write!(f, "empty line"),
            MalformedRecord::MissingDelimiter => write!(f, "no ';' delimiter"),
            MalformedRecord::InvalidValue => write!(f, "measurement is not a decimal with at most one fractional digit"),
        }
    }
}

impl std::error::Error for MalformedRecord {}

/// Splits `line` (without its `\n`) on the first `;` and parses the value as
/// tenths. The station key is returned as raw bytes.
pub fn parse_line(line: &[u8]) -> Result<(&[u8], i32), MalformedRecord> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() {
        return Err(MalformedRecord::Empty);
    }
    let idx = memchr(DELIMITER, line).ok_or(MalformedRecord::MissingDelimiter)?;
    let value = parse_tenths(&line[idx + 1..])?;
    Ok((&line[..idx], value))
}

/// Parses `-?\d+(\.\d)?` into a fixed-point value scaled by ten.
pub fn parse_tenths(raw: &[u8]) -> Result<i32, MalformedRecord> {
    let (negative, digits) = match raw.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some(_) => (false, raw),
        None => return Err(MalformedRecord::InvalidValue),
    };
    let (whole, fraction) = match memchr(b'.', digits) {
        Some(dot) => (&digits[..dot], Some(&digits[dot + 1..])),
        None => (digits, None),
    };
    if whole.is_empty() || !whole.iter().all(u8::is_ascii_digit) {
        return Err(MalformedRecord::InvalidValue);
    }
    let tenth = match fraction {
        None => 0,
        Some([d]) if d.is_ascii_digit() => (d - b'0') as i32,
        Some(_) => return Err(MalformedRecord::InvalidValue),
    };
    let whole: i32 = lexical_core::parse(whole).map_err(|_| MalformedRecord::InvalidValue)?;
    let magnitude = whole
        .checked_mul(10)
        .and_then(|v| v.checked_add(tenth))
        .ok_or(MalformedRecord::InvalidValue)?;
    Ok(if negative { -magnitude } else { magnitude })
}
