use std::ops::Range;

use memchr::memchr;

/// Splits `data` into up to `target_chunks` contiguous byte ranges that
/// cover it exactly once. Every boundary except the last sits just past a
/// `\n`, so no record straddles two chunks. Chunks smaller than
/// `min_chunk_bytes` are avoided by lowering the chunk count.
pub fn partition(data: &[u8], target_chunks: usize, min_chunk_bytes: usize) -> Vec<Range<usize>> {
    let len = data.len();
    if len == 0 {
        return Vec::new();
    }
    let by_size = len / min_chunk_bytes.max(1);
    let chunks = target_chunks.min(by_size).max(1);
    let chunk_size = len / chunks;

    let mut ranges = Vec::with_capacity(chunks);
    let mut start = 0;
    for i in 0..chunks {
        if start >= len {
            break;
        }
        let end = if i == chunks - 1 {
            len
        } else {
            next_boundary(data, (start + chunk_size).max(start + 1))
        };
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Position just past the first `\n` at or after `pos`, or `data.len()`.
fn next_boundary(data: &[u8], pos: usize) -> usize {
    if pos >= data.len() {
        return data.len();
    }
    // The byte before `pos` may itself be the terminator.
    if data[pos - 1] == b'\n' {
        return pos;
    }
    match memchr(b'\n', &data[pos..]) {
        Some(offset) => pos + offset + 1,
        None => data.len(),
    }
}
