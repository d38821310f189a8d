//! Flat-buffer splice
//!
//! Used for textarea-like surfaces whose value is a single string.

use super::utf16::Utf16Index;
use crate::error::OffsetError;

/// Replace the UTF-16 range `start..end` of `text` with `replacement`.
///
/// Requires `start <= end <= len16(text)`, with neither offset splitting a
/// surrogate pair.
pub fn splice_at(
    text: &str,
    start: usize,
    end: usize,
    replacement: &str,
) -> Result<String, OffsetError> {
    let (from, to) = Utf16Index::new(text).byte_range(start, end)?;

    let mut out = String::with_capacity(text.len() - (to - from) + replacement.len());
    out.push_str(&text[..from]);
    out.push_str(replacement);
    out.push_str(&text[to..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offsets::utf16::{len16, slice16};
    use proptest::prelude::*;

    #[test]
    fn test_replace_word() {
        assert_eq!(splice_at("I recieve it", 2, 9, "receive").unwrap(), "I receive it");
    }

    #[test]
    fn test_insert_at_point() {
        assert_eq!(splice_at("ac", 1, 1, "b").unwrap(), "abc");
    }

    #[test]
    fn test_delete_range() {
        assert_eq!(splice_at("abcd", 1, 3, "").unwrap(), "ad");
    }

    #[test]
    fn test_whole_text() {
        assert_eq!(splice_at("teh", 0, 3, "the").unwrap(), "the");
    }

    #[test]
    fn test_offsets_count_utf16_units() {
        // "😀" occupies two units, so "teh" starts at 3
        assert_eq!(splice_at("😀 teh", 3, 6, "the").unwrap(), "😀 the");
    }

    #[test]
    fn test_rejects_bad_ranges() {
        assert!(matches!(splice_at("abc", 2, 1, "x"), Err(OffsetError::Inverted { .. })));
        assert!(matches!(splice_at("abc", 1, 4, "x"), Err(OffsetError::OutOfBounds { .. })));
        assert_eq!(splice_at("😀", 1, 2, "x"), Err(OffsetError::SplitsCodePoint(1)));
    }

    proptest! {
        #[test]
        fn prop_replacement_reads_back(
            text in "[a-zé😀 ]{0,24}",
            replacement in "[A-Zß ]{0,8}",
            a in 0usize..64,
            b in 0usize..64,
        ) {
            let chars: Vec<char> = text.chars().collect();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo = lo.min(chars.len());
            let hi = hi.min(chars.len());
            // Map char positions to UTF-16 positions so no surrogate gets split
            let start: usize = chars[..lo].iter().map(|c| c.len_utf16()).sum();
            let end: usize = chars[..hi].iter().map(|c| c.len_utf16()).sum();

            let out = splice_at(&text, start, end, &replacement).unwrap();
            let r16 = len16(&replacement);
            prop_assert_eq!(slice16(&out, start, start + r16).unwrap(), replacement.as_str());
            prop_assert_eq!(len16(&out), len16(&text) - (end - start) + r16);
        }
    }
}
