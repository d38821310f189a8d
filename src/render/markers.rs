//! MarkerTable: side table from marker identity to Correction
//!
//! Painted markers (DOM spans, mirror spans, `DocTree` marker nodes) carry
//! nothing but their `MarkerId`. Everything else about the correction lives
//! here, so the data model never depends on presentation nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::checker::Correction;
use crate::offsets::{len16, splice_at};

/// Identity of one painted marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u32);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of a paint pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintReport {
    pub painted: usize,
    /// Corrections whose offsets did not resolve against the surface
    pub skipped: usize,
}

/// Outcome of accepting one marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub marker: MarkerId,
    pub correction: Correction,
    /// Other markers that stopped existing because they sat inside the replaced range
    pub dropped: Vec<MarkerId>,
}

#[derive(Debug, Clone, Default)]
pub struct MarkerTable {
    next_id: u32,
    entries: BTreeMap<MarkerId, Correction>,
}

impl MarkerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id without storing anything yet
    pub fn allocate(&mut self) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn insert(&mut self, correction: Correction) -> MarkerId {
        let id = self.allocate();
        self.entries.insert(id, correction);
        id
    }

    /// Store a correction under an id obtained from `allocate`
    pub fn insert_at(&mut self, id: MarkerId, correction: Correction) {
        self.entries.insert(id, correction);
    }

    pub fn get(&self, id: MarkerId) -> Option<&Correction> {
        self.entries.get(&id)
    }

    pub fn remove(&mut self, id: MarkerId) -> Option<Correction> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<MarkerId> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, &Correction)> {
        self.entries.iter().map(|(id, c)| (*id, c))
    }

    /// Entries ordered by start offset
    pub fn by_position(&self) -> Vec<(MarkerId, &Correction)> {
        let mut list: Vec<_> = self.iter().collect();
        list.sort_by_key(|(id, c)| (c.start_offset, c.end_offset, *id));
        list
    }

    /// Remove everything, returning the ids that were present
    pub fn clear(&mut self) -> Vec<MarkerId> {
        let ids = self.ids();
        self.entries.clear();
        ids
    }

    /// Keep the remaining entries consistent after `start..end` was replaced by
    /// `replacement`.
    ///
    /// Entries before the edit are untouched, entries after it are shifted,
    /// entries enclosing it absorb the edit. Entries partially overlapping or
    /// inside the edited range are removed and returned.
    pub fn apply_edit(&mut self, start: usize, end: usize, replacement: &str) -> Vec<MarkerId> {
        let new_len = len16(replacement);
        let mut dropped = Vec::new();

        for (id, c) in self.entries.iter_mut() {
            if c.end_offset <= start {
                continue;
            }
            if c.start_offset >= end {
                c.start_offset = c.start_offset - end + start + new_len;
                c.end_offset = c.end_offset - end + start + new_len;
                continue;
            }
            if c.start_offset <= start && end <= c.end_offset && c.span_len() > end - start {
                let inner_start = start - c.start_offset;
                let inner_end = end - c.start_offset;
                if let Ok(text) = splice_at(&c.original_text, inner_start, inner_end, replacement) {
                    c.original_text = text;
                    c.end_offset = c.end_offset - end + start + new_len;
                    continue;
                }
            }
            dropped.push(*id);
        }

        for id in &dropped {
            self.entries.remove(id);
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::CorrectionOrigin;

    fn correction(original: &str, suggested: &str, start: usize) -> Correction {
        Correction {
            original_text: original.to_string(),
            suggested_text: suggested.to_string(),
            explanation: String::new(),
            start_offset: start,
            end_offset: start + len16(original),
            origin: CorrectionOrigin::Rule,
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let mut table = MarkerTable::new();
        let a = table.insert(correction("teh", "the", 0));
        let b = table.insert(correction("teh", "the", 4));
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        table.remove(a);
        let c = table.insert(correction("teh", "the", 8));
        assert_ne!(a, c);
    }

    #[test]
    fn test_edit_shifts_following_entries() {
        // "I recieve teh package": accept "recieve" (2..9) → "receive" (same length)
        // then a longer replacement
        let mut table = MarkerTable::new();
        let before = table.insert(correction("I", "Me", 0));
        let after = table.insert(correction("teh", "the", 10));

        let dropped = table.apply_edit(2, 9, "receives");
        assert!(dropped.is_empty());
        assert_eq!(table.get(before).unwrap().start_offset, 0);
        assert_eq!(table.get(after).unwrap().start_offset, 11);
        assert_eq!(table.get(after).unwrap().end_offset, 14);
    }

    #[test]
    fn test_edit_inside_enclosing_entry() {
        let mut table = MarkerTable::new();
        let outer = table.insert(correction("its teh", "it's teh", 0));
        let dropped = table.apply_edit(4, 7, "the");
        assert!(dropped.is_empty());
        let outer = table.get(outer).unwrap();
        assert_eq!(outer.original_text, "its the");
        assert_eq!(outer.end_offset, 7);
    }

    #[test]
    fn test_edit_drops_inner_and_partial_entries() {
        let mut table = MarkerTable::new();
        let inner = table.insert(correction("teh", "the", 4));
        let partial = table.insert(correction("teh end", "the end", 4));
        let dropped = table.apply_edit(0, 7, "it's the");
        assert_eq!(dropped, vec![inner, partial]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_by_position() {
        let mut table = MarkerTable::new();
        table.insert(correction("teh", "the", 10));
        table.insert(correction("recieve", "receive", 2));
        let starts: Vec<_> = table.by_position().iter().map(|(_, c)| c.start_offset).collect();
        assert_eq!(starts, vec![2, 10]);
    }
}
