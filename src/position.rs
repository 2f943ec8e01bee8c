//! Byte-offset ↔ line/column mapping, shared by the CLI's miette rendering and
//! by anything that needs to turn a raw offset back into a `(line, column)`
//! pair. Line starts are precomputed once and positions resolved by binary
//! search over them.

/// Byte offset of the start of each line (line 0 always starts at offset 0).
pub fn compute_line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// Convert a byte offset to a 1-based (line, column) pair using precomputed line starts.
pub fn offset_to_line_col(line_starts: &[usize], offset: usize) -> (usize, usize) {
    let line = match line_starts.binary_search(&offset) {
        Ok(idx) => idx,
        Err(idx) => idx.saturating_sub(1),
    };
    let col = offset - line_starts[line];
    (line + 1, col + 1)
}

/// Inverse of [`offset_to_line_col`]: given a 1-based line and 0-based column,
/// recover the byte offset. Used to build a miette `SourceSpan` from a
/// `Diagnostic`'s line/column range.
pub fn line_col_to_offset(line_starts: &[usize], line: usize, column: usize) -> usize {
    let start = line_starts.get(line.saturating_sub(1)).copied().unwrap_or(0);
    start + column
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_line_starts() {
        let src = "abc\ndef\nghi";
        let starts = compute_line_starts(src);
        assert_eq!(starts, vec![0, 4, 8]);
        assert_eq!(offset_to_line_col(&starts, 5), (2, 2));
        assert_eq!(line_col_to_offset(&starts, 2, 1), 5);
    }

    #[test]
    fn first_line_starts_at_zero() {
        let starts = compute_line_starts("no newlines here");
        assert_eq!(offset_to_line_col(&starts, 0), (1, 1));
    }
}
