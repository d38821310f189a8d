//! MirrorOverlay - highlight model for flat-buffer surfaces
//!
//! A textarea cannot style ranges of its own value, so highlights are drawn
//! on a mirror layer stacked over it. The textarea stays the real editing
//! surface (value, caret, selection); its glyphs are made transparent and the
//! mirror paints the same text with marked spans on top.
//!
//! This module owns the model: the value, the marked spans and the segment
//! list the mirror is built from. The DOM side (`web::mirror`) only turns
//! segments into nodes.

use super::markers::{Accepted, MarkerId, MarkerTable, PaintReport};
use crate::checker::{sort_ascending, Correction};
use crate::console;
use crate::error::RenderError;
use crate::offsets::{slice16, splice_at};

/// Computed-style properties copied from the textarea onto the mirror so
/// glyphs line up pixel for pixel
pub const MIRRORED_PROPERTIES: &[&str] = &[
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "font-variant",
    "font-stretch",
    "letter-spacing",
    "word-spacing",
    "line-height",
    "text-transform",
    "text-indent",
    "text-align",
    "tab-size",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "border-top-width",
    "border-right-width",
    "border-bottom-width",
    "border-left-width",
    "box-sizing",
    "color",
];

/// Fixed declarations for the mirror layer itself
pub const OVERLAY_DECLARATIONS: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("top", "0"),
    ("left", "0"),
    ("right", "0"),
    ("bottom", "0"),
    ("margin", "0"),
    ("white-space", "pre-wrap"),
    ("overflow-wrap", "break-word"),
    ("overflow", "hidden"),
    ("pointer-events", "none"),
    ("border-style", "solid"),
    ("border-color", "transparent"),
];

/// Build the full declaration list for a mirror, reading live values through
/// `computed` (property name → computed value)
pub fn mirror_declarations<F>(computed: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out: Vec<(String, String)> = OVERLAY_DECLARATIONS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    for prop in MIRRORED_PROPERTIES {
        if let Some(value) = computed(prop).filter(|v| !v.is_empty()) {
            out.push((prop.to_string(), value));
        }
    }
    out
}

/// One run of mirror content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlaySegment {
    Text(String),
    Mark { id: MarkerId, text: String },
}

#[derive(Debug, Clone, Default)]
pub struct MirrorOverlay {
    value: String,
    table: MarkerTable,
    segments: Vec<OverlaySegment>,
}

impl MirrorOverlay {
    pub fn new(value: impl Into<String>) -> Self {
        let mut overlay = Self {
            value: value.into(),
            ..Self::default()
        };
        overlay.rebuild();
        overlay
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn segments(&self) -> &[OverlaySegment] {
        &self.segments
    }

    pub fn markers(&self) -> &MarkerTable {
        &self.table
    }

    pub fn correction(&self, id: MarkerId) -> Option<&Correction> {
        self.table.get(id)
    }

    /// Replace all spans with `corrections`, checked against the current value.
    ///
    /// Spans are laid out in ascending start order. A span whose offsets do
    /// not resolve to its original text is skipped, and so is a span starting
    /// before the previous one ended: the mirror must reproduce the value
    /// exactly once or the glyphs drift.
    pub fn paint(&mut self, mut corrections: Vec<Correction>) -> PaintReport {
        self.table.clear();
        sort_ascending(&mut corrections);

        let mut report = PaintReport::default();
        let mut last_end = 0;

        for c in corrections {
            let resolves = slice16(&self.value, c.start_offset, c.end_offset)
                .map(|s| s == c.original_text)
                .unwrap_or(false);
            if !resolves || c.start_offset >= c.end_offset {
                report.skipped += 1;
                continue;
            }
            if c.start_offset < last_end {
                console::log(&format!(
                    "[MirrorOverlay] overlapping span {}..{} not displayed",
                    c.start_offset, c.end_offset
                ));
                report.skipped += 1;
                continue;
            }
            last_end = c.end_offset;
            self.table.insert(c);
            report.painted += 1;
        }

        self.rebuild();
        report
    }

    /// The value changed underneath: every span is stale
    pub fn invalidate(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.table.clear();
        self.rebuild();
    }

    /// Apply one suggestion to the value. The returned `Accepted` names the
    /// marker; the new value is available from `value()`.
    pub fn accept(&mut self, id: MarkerId) -> Result<Accepted, RenderError> {
        let correction = self.table.remove(id).ok_or(RenderError::UnknownMarker(id))?;

        self.value = splice_at(
            &self.value,
            correction.start_offset,
            correction.end_offset,
            &correction.suggested_text,
        )?;
        let dropped = self.table.apply_edit(
            correction.start_offset,
            correction.end_offset,
            &correction.suggested_text,
        );
        self.rebuild();

        Ok(Accepted {
            marker: id,
            correction,
            dropped,
        })
    }

    /// Drop every span, leaving plain text
    pub fn clear(&mut self) -> usize {
        let removed = self.table.clear().len();
        self.rebuild();
        removed
    }

    fn rebuild(&mut self) {
        self.segments.clear();
        let mut cursor = 0;

        for (id, c) in self.table.by_position() {
            if c.start_offset > cursor {
                if let Ok(text) = slice16(&self.value, cursor, c.start_offset) {
                    self.segments.push(OverlaySegment::Text(text.to_string()));
                }
            }
            if let Ok(text) = slice16(&self.value, c.start_offset, c.end_offset) {
                self.segments.push(OverlaySegment::Mark {
                    id,
                    text: text.to_string(),
                });
            }
            cursor = c.end_offset;
        }

        let total = crate::offsets::len16(&self.value);
        if cursor < total {
            if let Ok(text) = slice16(&self.value, cursor, total) {
                self.segments.push(OverlaySegment::Text(text.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{CorrectionSource, GrammarChecker};

    fn text_of(segments: &[OverlaySegment]) -> String {
        segments
            .iter()
            .map(|s| match s {
                OverlaySegment::Text(t) => t.as_str(),
                OverlaySegment::Mark { text, .. } => text.as_str(),
            })
            .collect()
    }

    fn marks(segments: &[OverlaySegment]) -> Vec<&str> {
        segments
            .iter()
            .filter_map(|s| match s {
                OverlaySegment::Mark { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn painted(value: &str) -> MirrorOverlay {
        let mut overlay = MirrorOverlay::new(value);
        let corrections = GrammarChecker::new().check(value).unwrap();
        overlay.paint(corrections);
        overlay
    }

    #[test]
    fn test_plain_value_is_one_segment() {
        let overlay = MirrorOverlay::new("hello\nworld");
        assert_eq!(overlay.segments(), &[OverlaySegment::Text("hello\nworld".into())]);
    }

    #[test]
    fn test_empty_value_has_no_segments() {
        assert!(MirrorOverlay::new("").segments().is_empty());
    }

    #[test]
    fn test_segments_reproduce_value() {
        let overlay = painted("I recieve teh package");
        assert_eq!(text_of(overlay.segments()), "I recieve teh package");
        assert_eq!(marks(overlay.segments()), vec!["recieve", "teh"]);
        assert_eq!(overlay.markers().len(), 2);
    }

    #[test]
    fn test_overlapping_span_not_displayed() {
        let mut overlay = MirrorOverlay::new("its teh end");
        let report = overlay.paint(GrammarChecker::new().check("its teh end").unwrap());
        assert_eq!(report, PaintReport { painted: 1, skipped: 1 });
        assert_eq!(marks(overlay.segments()), vec!["its teh"]);
        assert_eq!(text_of(overlay.segments()), "its teh end");
    }

    #[test]
    fn test_stale_corrections_skipped() {
        let corrections = GrammarChecker::new().check("I recieve teh package").unwrap();
        let mut overlay = MirrorOverlay::new("I received the package");
        let report = overlay.paint(corrections);
        assert_eq!(report.painted, 0);
        assert_eq!(report.skipped, 2);
        assert!(overlay.markers().is_empty());
    }

    #[test]
    fn test_accept_replaces_one_span_and_keeps_others_consistent() {
        let mut overlay = painted("We recieve seperate teh boxes");
        let (first, _) = overlay.markers().by_position()[0];

        let accepted = overlay.accept(first).unwrap();
        assert_eq!(accepted.correction.original_text, "recieve");
        assert!(accepted.dropped.is_empty());
        assert_eq!(overlay.value(), "We receive seperate teh boxes");
        assert_eq!(overlay.markers().len(), 2);

        for (_, c) in overlay.markers().iter() {
            assert_eq!(slice16(overlay.value(), c.start_offset, c.end_offset).unwrap(), c.original_text);
        }
        assert_eq!(marks(overlay.segments()), vec!["seperate", "teh"]);
    }

    #[test]
    fn test_accept_with_length_change_shifts_later_spans() {
        let mut overlay = painted("teh accomodate");
        let (first, _) = overlay.markers().by_position()[0];
        overlay.accept(first).unwrap();
        let (second, _) = overlay.markers().by_position()[0];
        overlay.accept(second).unwrap();
        assert_eq!(overlay.value(), "the accommodate");
        assert!(overlay.markers().is_empty());
    }

    #[test]
    fn test_accept_unknown_marker() {
        let mut overlay = painted("teh");
        assert_eq!(overlay.accept(MarkerId(99)), Err(RenderError::UnknownMarker(MarkerId(99))));
    }

    #[test]
    fn test_invalidate_clears_spans() {
        let mut overlay = painted("teh");
        overlay.invalidate("the");
        assert!(overlay.markers().is_empty());
        assert_eq!(overlay.segments(), &[OverlaySegment::Text("the".into())]);
    }

    #[test]
    fn test_clear() {
        let mut overlay = painted("teh teh");
        assert_eq!(overlay.clear(), 2);
        assert_eq!(text_of(overlay.segments()), "teh teh");
    }

    #[test]
    fn test_mirror_declarations_copy_computed_style() {
        let decls = mirror_declarations(|prop| match prop {
            "font-size" => Some("14px".to_string()),
            "line-height" => Some("20px".to_string()),
            "padding-top" => Some(String::new()),
            _ => None,
        });
        assert!(decls.contains(&("font-size".to_string(), "14px".to_string())));
        assert!(decls.contains(&("line-height".to_string(), "20px".to_string())));
        assert!(decls.contains(&("pointer-events".to_string(), "none".to_string())));
        assert!(!decls.iter().any(|(k, _)| k == "padding-top"));
    }
}
