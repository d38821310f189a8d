//! UTF-16 offset conversion
//!
//! Corrections are addressed in UTF-16 code units because that is what DOM
//! text nodes, `Range` boundaries and textarea selections count in. Rust
//! strings are indexed by byte, so every crossing between the two goes
//! through a `Utf16Index`.

use crate::error::OffsetError;

/// Byte ↔ UTF-16 mapping for one text
#[derive(Debug, Clone)]
pub struct Utf16Index {
    /// (byte offset, UTF-16 offset) at every char start plus the end of text.
    /// Empty when the text is ASCII and both coordinates coincide.
    stops: Vec<(usize, usize)>,
    len_bytes: usize,
    len16: usize,
}

impl Utf16Index {
    pub fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self {
                stops: Vec::new(),
                len_bytes: text.len(),
                len16: text.len(),
            };
        }

        let mut stops = Vec::with_capacity(text.len() + 1);
        let mut unit = 0;
        for (byte, ch) in text.char_indices() {
            stops.push((byte, unit));
            unit += ch.len_utf16();
        }
        stops.push((text.len(), unit));

        Self {
            stops,
            len_bytes: text.len(),
            len16: unit,
        }
    }

    /// Length of the text in UTF-16 code units
    pub fn len16(&self) -> usize {
        self.len16
    }

    /// Convert a byte offset (must be a char boundary) to UTF-16 units
    pub fn to_utf16(&self, byte: usize) -> Option<usize> {
        if self.stops.is_empty() {
            return (byte <= self.len_bytes).then_some(byte);
        }
        self.stops
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|i| self.stops[i].1)
    }

    /// Convert a UTF-16 offset to a byte offset
    pub fn to_byte(&self, unit: usize) -> Result<usize, OffsetError> {
        if unit > self.len16 {
            return Err(OffsetError::OutOfBounds {
                start: unit,
                end: unit,
                len: self.len16,
            });
        }
        if self.stops.is_empty() {
            return Ok(unit);
        }
        self.stops
            .binary_search_by_key(&unit, |&(_, u)| u)
            .map(|i| self.stops[i].0)
            .map_err(|_| OffsetError::SplitsCodePoint(unit))
    }

    /// Convert a UTF-16 range to a byte range, validating order and bounds
    pub fn byte_range(&self, start: usize, end: usize) -> Result<(usize, usize), OffsetError> {
        if start > end {
            return Err(OffsetError::Inverted { start, end });
        }
        if end > self.len16 {
            return Err(OffsetError::OutOfBounds {
                start,
                end,
                len: self.len16,
            });
        }
        Ok((self.to_byte(start)?, self.to_byte(end)?))
    }
}

/// Length of `text` in UTF-16 code units
pub fn len16(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Slice `text` by a UTF-16 range
pub fn slice16(text: &str, start: usize, end: usize) -> Result<&str, OffsetError> {
    let (from, to) = Utf16Index::new(text).byte_range(start, end)?;
    Ok(&text[from..to])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_identity() {
        let index = Utf16Index::new("hello");
        assert_eq!(index.len16(), 5);
        assert_eq!(index.to_utf16(3), Some(3));
        assert_eq!(index.to_byte(5), Ok(5));
    }

    #[test]
    fn test_multibyte_chars() {
        // "é" is 2 bytes / 1 unit, "😀" is 4 bytes / 2 units
        let text = "é😀x";
        let index = Utf16Index::new(text);
        assert_eq!(index.len16(), 4);
        assert_eq!(index.to_utf16(0), Some(0));
        assert_eq!(index.to_utf16(2), Some(1));
        assert_eq!(index.to_utf16(6), Some(3));
        assert_eq!(index.to_utf16(7), Some(4));
        assert_eq!(index.to_byte(3), Ok(6));
    }

    #[test]
    fn test_byte_inside_char_has_no_utf16_offset() {
        let index = Utf16Index::new("é");
        assert_eq!(index.to_utf16(1), None);
    }

    #[test]
    fn test_surrogate_split_rejected() {
        let index = Utf16Index::new("a😀b");
        assert_eq!(index.to_byte(2), Err(OffsetError::SplitsCodePoint(2)));
    }

    #[test]
    fn test_out_of_bounds() {
        let index = Utf16Index::new("abc");
        assert!(matches!(index.to_byte(4), Err(OffsetError::OutOfBounds { .. })));
        assert!(matches!(index.byte_range(1, 9), Err(OffsetError::OutOfBounds { .. })));
    }

    #[test]
    fn test_inverted_range() {
        let index = Utf16Index::new("abc");
        assert_eq!(index.byte_range(2, 1), Err(OffsetError::Inverted { start: 2, end: 1 }));
    }

    #[test]
    fn test_slice16() {
        assert_eq!(slice16("naïve café", 6, 10), Ok("café"));
        assert_eq!(len16("naïve café"), 10);
    }
}
