//! Correction data model

use serde::{Deserialize, Serialize};

/// Where a correction came from
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionOrigin {
    /// Matched one of the rules
    #[default]
    Rule,
    /// Low-confidence demo suggestion emitted when no rule matched
    Fallback,
}

/// A proposed replacement for one span of text
///
/// Offsets are UTF-16 code units into the plain-text rendering of the
/// source: a textarea's value, or a contenteditable element's text content.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub original_text: String,
    pub suggested_text: String,
    pub explanation: String,
    pub start_offset: usize,
    pub end_offset: usize,
    #[serde(default)]
    pub origin: CorrectionOrigin,
}

impl Correction {
    /// Length of the replaced span in UTF-16 units
    pub fn span_len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// True if the two spans share at least one unit
    pub fn overlaps(&self, other: &Correction) -> bool {
        self.start_offset < other.end_offset && other.start_offset < self.end_offset
    }

    /// True if this span fully contains `start..end`
    pub fn contains_range(&self, start: usize, end: usize) -> bool {
        self.start_offset <= start && end <= self.end_offset
    }
}

/// Ascending start offset (flat-buffer rendering order)
pub fn sort_ascending(corrections: &mut [Correction]) {
    corrections.sort_by_key(|c| (c.start_offset, c.end_offset));
}

/// Descending start offset (tree mutation order, back-to-front)
pub fn sort_descending(corrections: &mut [Correction]) {
    corrections.sort_by(|a, b| {
        b.start_offset
            .cmp(&a.start_offset)
            .then(b.end_offset.cmp(&a.end_offset))
    });
}
