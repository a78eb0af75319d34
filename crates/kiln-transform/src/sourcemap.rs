//! Position helpers for building bundle source maps
//!
//! Lines are 0-based. Columns count UTF-16 code units, as browsers expect.

use parcel_sourcemap::{Mapping, OriginalLocation};

/// Move a (line, column) cursor past `text`
pub fn advance(line: &mut u32, column: &mut u32, text: &str) {
    match text.rfind('\n') {
        Some(last) => {
            *line += text.matches('\n').count() as u32;
            *column = text[last + 1..].encode_utf16().count() as u32;
        }
        None => *column += text.encode_utf16().count() as u32,
    }
}

/// Mappings for text that passes through unchanged: each line start maps to itself
pub fn identity_mappings(source: &str) -> Vec<Mapping> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .filter(|start| *start < source.len())
        .enumerate()
        .map(|(line, _)| Mapping {
            generated_line: line as u32,
            generated_column: 0,
            original: Some(OriginalLocation::new(line as u32, 0, 0, None)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_counts_utf16() {
        let (mut line, mut column) = (0, 0);
        advance(&mut line, &mut column, "ab");
        assert_eq!((line, column), (0, 2));
        advance(&mut line, &mut column, "\n\u{1F600}c");
        // the emoji is 4 bytes but 2 UTF-16 units
        assert_eq!((line, column), (1, 3));
    }

    #[test]
    fn test_identity_mappings_skip_trailing_empty_line() {
        let mappings = identity_mappings("a\nb\n");
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[1].generated_line, 1);
        assert_eq!(mappings[1].original.as_ref().unwrap().original_line, 1);
    }
}
