//! Suggestion panel placement
//!
//! The panel is centred horizontally over the hovered marker and sits above
//! it. Too close to the top of the viewport it flips below the marker. It is
//! always clamped horizontally to stay `viewport_margin` away from the edges.

use serde::{Deserialize, Serialize};

use crate::config::PanelGeometry;

/// Viewport-relative rectangle (as from `getBoundingClientRect`)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelPlacement {
    pub left: f64,
    pub top: f64,
    /// `top` is the panel's bottom edge (the host translates it up by its own height)
    pub above: bool,
}

pub fn place_panel(anchor: Rect, viewport: Viewport, geometry: &PanelGeometry) -> PanelPlacement {
    let margin = geometry.viewport_margin;

    let mut top = anchor.top - geometry.gap;
    let mut above = true;
    if top < margin {
        top = anchor.bottom() + geometry.gap;
        above = false;
    }

    let centred = anchor.left + anchor.width / 2.0 - geometry.width / 2.0;
    let max_left = viewport.width - geometry.width - margin;
    // Narrow viewports: the left margin wins.
    let left = centred.min(max_left).max(margin);

    PanelPlacement { left, top, above }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1024.0,
        height: 768.0,
    };

    #[test]
    fn test_centred_above_anchor() {
        let placement = place_panel(Rect::new(400.0, 300.0, 60.0, 18.0), VIEWPORT, &PanelGeometry::default());
        assert_eq!(placement.left, 400.0 + 30.0 - 140.0);
        assert_eq!(placement.top, 292.0);
        assert!(placement.above);
    }

    #[test]
    fn test_flips_below_near_top() {
        let placement = place_panel(Rect::new(400.0, 12.0, 60.0, 18.0), VIEWPORT, &PanelGeometry::default());
        assert!(!placement.above);
        assert_eq!(placement.top, 12.0 + 18.0 + 8.0);
    }

    #[test]
    fn test_clamped_to_left_margin() {
        let placement = place_panel(Rect::new(5.0, 300.0, 20.0, 18.0), VIEWPORT, &PanelGeometry::default());
        assert_eq!(placement.left, 10.0);
    }

    #[test]
    fn test_clamped_to_right_margin() {
        let placement = place_panel(Rect::new(1000.0, 300.0, 20.0, 18.0), VIEWPORT, &PanelGeometry::default());
        assert_eq!(placement.left, 1024.0 - 280.0 - 10.0);
    }

    #[test]
    fn test_narrow_viewport_keeps_left_margin() {
        let narrow = Viewport {
            width: 200.0,
            height: 400.0,
        };
        let placement = place_panel(Rect::new(50.0, 300.0, 20.0, 18.0), narrow, &PanelGeometry::default());
        assert_eq!(placement.left, 10.0);
    }
}
