//! Tree offset resolution
//!
//! Maps a flat `start..end` range onto the text leaves of a tree (a
//! contenteditable subtree, or a `DocTree`). Leaves are visited in document
//! order while a running UTF-16 count is accumulated.
//!
//! Boundary policy:
//! - the start leaf is the first whose span strictly passes `start`
//! - the end leaf is the first whose span reaches `end` (end-inclusive), so an
//!   `end` sitting exactly on a boundary resolves to the leaf that owns it

use serde::{Deserialize, Serialize};

/// A position inside one text leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position<L> {
    pub leaf: L,
    /// UTF-16 offset within the leaf
    pub offset: usize,
}

/// A resolved range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Located<L> {
    pub start: Position<L>,
    pub end: Position<L>,
}

impl<L: PartialEq> Located<L> {
    /// True when both ends fall in the same leaf
    pub fn is_single_leaf(&self) -> bool {
        self.start.leaf == self.end.leaf
    }
}

/// Resolve `start..end` against `(leaf, utf16_len)` pairs in document order.
///
/// Returns `None` when the range is empty/inverted or runs past the total text
/// length; callers skip that correction.
pub fn locate<L, I>(leaves: I, start: usize, end: usize) -> Option<Located<L>>
where
    L: Clone,
    I: IntoIterator<Item = (L, usize)>,
{
    if start >= end {
        return None;
    }

    let mut running = 0usize;
    let mut start_pos: Option<Position<L>> = None;

    for (leaf, len) in leaves {
        let next = running + len;

        if start_pos.is_none() && next > start {
            start_pos = Some(Position {
                leaf: leaf.clone(),
                offset: start - running,
            });
        }

        if next >= end {
            if let Some(from) = start_pos.take() {
                return Some(Located {
                    start: from,
                    end: Position {
                        leaf,
                        offset: end - running,
                    },
                });
            }
        }

        running = next;
    }

    None
}
