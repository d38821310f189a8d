//! Textarea mirror overlay
//!
//! The textarea is wrapped in a positioned container and a mirror `<div>`
//! copying its computed text layout is stacked on top. The textarea's own
//! glyphs turn transparent (the caret keeps its color), and the mirror renders
//! the `MirrorOverlay` segments with marked spans. Only the spans take
//! pointer events, so typing and selection still reach the textarea.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement, HtmlTextAreaElement};

use super::{MARKER_ATTR, MARKER_CLASS};
use crate::checker::Correction;
use crate::console;
use crate::error::RenderError;
use crate::render::{mirror_declarations, Accepted, MarkerId, MirrorOverlay, OverlaySegment, PaintReport};

const WRAPPER_CLASS: &str = "linguist-ai-textarea-wrapper";
const MIRROR_CLASS: &str = "linguist-ai-textarea-mirror";

/// Textarea properties overridden while the mirror is attached
const TEXTAREA_OVERRIDES: &[&str] = &["background", "color", "caret-color", "position", "z-index"];

pub struct MirrorSurface {
    document: Document,
    textarea: HtmlTextAreaElement,
    wrapper: HtmlElement,
    mirror: HtmlElement,
    overlay: MirrorOverlay,
    saved_style: Vec<(String, String)>,
    on_scroll: Closure<dyn FnMut(Event)>,
}

impl MirrorSurface {
    pub fn attach(document: Document, textarea: HtmlTextAreaElement) -> Result<Self, JsValue> {
        let window = super::window()?;
        let parent = textarea
            .parent_node()
            .ok_or_else(|| JsValue::from_str("textarea is detached"))?;

        let wrapper: HtmlElement = document.create_element("div")?.dyn_into()?;
        wrapper.set_class_name(WRAPPER_CLASS);
        wrapper.style().set_property("position", "relative")?;
        wrapper.style().set_property("display", "inline-block")?;

        let mirror: HtmlElement = document.create_element("div")?.dyn_into()?;
        mirror.set_class_name(MIRROR_CLASS);
        mirror.set_attribute("aria-hidden", "true")?;

        let computed = window.get_computed_style(&textarea)?;
        let declarations = mirror_declarations(|prop| {
            computed
                .as_ref()
                .and_then(|style| style.get_property_value(prop).ok())
        });
        let mirror_style = mirror.style();
        for (prop, value) in &declarations {
            mirror_style.set_property(prop, value)?;
        }

        let textarea_style = textarea.style();
        let mut saved_style = Vec::new();
        for prop in TEXTAREA_OVERRIDES {
            saved_style.push((prop.to_string(), textarea_style.get_property_value(prop)?));
        }
        let caret = computed
            .as_ref()
            .and_then(|style| style.get_property_value("color").ok())
            .unwrap_or_else(|| "#000".to_string());
        textarea_style.set_property("background", "transparent")?;
        textarea_style.set_property("color", "transparent")?;
        textarea_style.set_property("caret-color", &caret)?;
        textarea_style.set_property("position", "relative")?;
        textarea_style.set_property("z-index", "0")?;
        mirror_style.set_property("z-index", "1")?;

        keep_focus(&document, &textarea, || {
            parent.insert_before(&wrapper, Some(textarea.as_ref()))?;
            wrapper.append_child(&textarea)?;
            wrapper.append_child(&mirror)
        })?;

        let on_scroll = {
            let textarea = textarea.clone();
            let mirror = mirror.clone();
            Closure::wrap(Box::new(move |_event: Event| {
                mirror.set_scroll_top(textarea.scroll_top());
                mirror.set_scroll_left(textarea.scroll_left());
            }) as Box<dyn FnMut(Event)>)
        };
        textarea.add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())?;

        let overlay = MirrorOverlay::new(textarea.value());
        let surface = Self {
            document,
            textarea,
            wrapper,
            mirror,
            overlay,
            saved_style,
            on_scroll,
        };
        surface.render()?;
        Ok(surface)
    }

    pub fn textarea(&self) -> &HtmlTextAreaElement {
        &self.textarea
    }

    /// The element marker spans live in
    pub fn container(&self) -> &Element {
        self.mirror.as_ref()
    }

    pub fn correction(&self, id: MarkerId) -> Option<&Correction> {
        self.overlay.correction(id)
    }

    pub fn paint(&mut self, corrections: Vec<Correction>) -> Result<PaintReport, JsValue> {
        self.overlay.invalidate(self.textarea.value());
        let report = self.overlay.paint(corrections);
        self.render()?;
        Ok(report)
    }

    pub fn invalidate(&mut self) -> Result<(), JsValue> {
        self.overlay.invalidate(self.textarea.value());
        self.render()
    }

    /// Apply a suggestion to the textarea value, keeping the caret where it
    /// was relative to the surrounding text
    pub fn accept(&mut self, id: MarkerId) -> Result<Accepted, RenderError> {
        let caret = self.textarea.selection_start().ok().flatten();
        let accepted = self.overlay.accept(id)?;
        self.textarea.set_value(self.overlay.value());

        if let Some(caret) = caret.map(|c| c as usize) {
            let c = &accepted.correction;
            let new_len = crate::offsets::len16(&c.suggested_text);
            let moved = if caret >= c.end_offset {
                caret - c.end_offset + c.start_offset + new_len
            } else {
                caret.min(c.start_offset)
            };
            let _ = self.textarea.set_selection_range(moved as u32, moved as u32);
        }

        self.render()
            .map_err(|e| RenderError::Dom(e.as_string().unwrap_or_default()))?;
        Ok(accepted)
    }

    fn render(&self) -> Result<(), JsValue> {
        self.mirror.set_text_content(None);
        for segment in self.overlay.segments() {
            match segment {
                OverlaySegment::Text(text) => {
                    self.mirror.append_child(&self.document.create_text_node(text))?;
                }
                OverlaySegment::Mark { id, text } => {
                    let span: HtmlElement = self.document.create_element("span")?.dyn_into()?;
                    span.set_class_name(MARKER_CLASS);
                    span.set_attribute(MARKER_ATTR, &id.0.to_string())?;
                    let style = span.style();
                    style.set_property("pointer-events", "auto")?;
                    style.set_property("text-decoration", "underline wavy #ef4444")?;
                    style.set_property("text-underline-offset", "3px")?;
                    span.set_text_content(Some(text));
                    self.mirror.append_child(&span)?;
                }
            }
        }
        // A trailing newline needs content after it to take up a line
        if self.overlay.value().ends_with('\n') {
            self.mirror.append_child(&self.document.create_text_node(" "))?;
        }
        self.mirror.set_scroll_top(self.textarea.scroll_top());
        Ok(())
    }

    /// Put the textarea back where it was and drop the mirror
    pub fn teardown(self) {
        let _ = self
            .textarea
            .remove_event_listener_with_callback("scroll", self.on_scroll.as_ref().unchecked_ref());

        let style = self.textarea.style();
        for (prop, value) in &self.saved_style {
            let restored = if value.is_empty() {
                style.remove_property(prop).map(|_| ())
            } else {
                style.set_property(prop, value)
            };
            if restored.is_err() {
                console::warn(&format!("[Mirror] could not restore textarea {}", prop));
            }
        }

        if let Some(parent) = self.wrapper.parent_node() {
            let moved = keep_focus(&self.document, &self.textarea, || {
                parent.insert_before(&self.textarea, Some(self.wrapper.as_ref()))
            });
            if let Err(e) = moved {
                console::error(&format!("[Mirror] could not restore textarea: {:?}", e));
                return;
            }
        }
        self.wrapper.remove();
    }
}

/// Run a DOM move of `textarea`. Re-inserting a focused element blurs it, so
/// focus, selection and scroll position are put back afterwards.
fn keep_focus<T>(
    document: &Document,
    textarea: &HtmlTextAreaElement,
    relocate: impl FnOnce() -> Result<T, JsValue>,
) -> Result<T, JsValue> {
    let element: &Element = textarea.as_ref();
    let focused = document.active_element().as_ref() == Some(element);
    let start = textarea.selection_start().ok().flatten();
    let end = textarea.selection_end().ok().flatten();
    let direction = textarea.selection_direction().ok().flatten();
    let scroll_top = textarea.scroll_top();

    let moved = relocate()?;

    if focused && document.active_element().as_ref() != Some(element) {
        textarea.focus()?;
        if let (Some(start), Some(end)) = (start, end) {
            match direction {
                Some(direction) => textarea.set_selection_range_with_direction(start, end, &direction)?,
                None => textarea.set_selection_range(start, end)?,
            }
        }
        textarea.set_scroll_top(scroll_top);
    }
    Ok(moved)
}

#[cfg(test)]
mod wasm_tests {
    use super::*;
    use crate::checker::{CorrectionSource, GrammarChecker};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    /// A textarea inside its own host element, attached to the page
    fn textarea_in_host(value: &str) -> (Document, Element, HtmlTextAreaElement) {
        let document = crate::web::document().unwrap();
        let host = document.create_element("div").unwrap();
        let textarea: HtmlTextAreaElement = document.create_element("textarea").unwrap().dyn_into().unwrap();
        textarea.set_value(value);
        host.append_child(&textarea).unwrap();
        document.body().unwrap().append_child(&host).unwrap();
        (document, host, textarea)
    }

    fn corrections(text: &str) -> Vec<Correction> {
        GrammarChecker::new().with_fallback(false).check(text).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_teardown_restores_page() {
        let (document, host, textarea) = textarea_in_host("I recieve teh package");
        textarea.style().set_property("color", "rgb(1, 2, 3)").unwrap();

        let mut surface = MirrorSurface::attach(document.clone(), textarea.clone()).unwrap();
        let wrapper = textarea.parent_element().unwrap();
        assert_eq!(wrapper.class_name(), WRAPPER_CLASS);
        assert_eq!(textarea.style().get_property_value("color").unwrap(), "transparent");

        let report = surface.paint(corrections("I recieve teh package")).unwrap();
        assert_eq!(report.painted, 2);
        let marks = surface
            .container()
            .query_selector_all(&format!(".{}", MARKER_CLASS))
            .unwrap();
        assert_eq!(marks.length(), 2);

        surface.teardown();
        let parent = textarea.parent_element().unwrap();
        assert_eq!(parent, host);
        assert_eq!(host.child_nodes().length(), 1);
        assert!(document.query_selector(&format!(".{}", WRAPPER_CLASS)).unwrap().is_none());
        assert!(document.query_selector(&format!(".{}", MIRROR_CLASS)).unwrap().is_none());
        assert_eq!(textarea.style().get_property_value("color").unwrap(), "rgb(1, 2, 3)");
        assert_eq!(textarea.style().get_property_value("background").unwrap(), "");
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_attach_and_teardown_keep_focus_and_selection() {
        let (document, host, textarea) = textarea_in_host("I recieve teh package");
        textarea.focus().unwrap();
        textarea.set_selection_range(2, 9).unwrap();
        let focused = || document.active_element() == Some(textarea.clone().unchecked_into::<Element>());
        assert!(focused());

        let surface = MirrorSurface::attach(document.clone(), textarea.clone()).unwrap();
        assert!(focused());
        assert_eq!(textarea.selection_start().unwrap(), Some(2));
        assert_eq!(textarea.selection_end().unwrap(), Some(9));

        surface.teardown();
        assert!(focused());
        assert_eq!(textarea.selection_start().unwrap(), Some(2));
        assert_eq!(textarea.selection_end().unwrap(), Some(9));
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_accept_rewrites_textarea_value() {
        let (document, host, textarea) = textarea_in_host("I recieve teh package");
        let mut surface = MirrorSurface::attach(document, textarea.clone()).unwrap();
        surface.paint(corrections("I recieve teh package")).unwrap();

        let id = surface
            .container()
            .query_selector(&format!(".{}", MARKER_CLASS))
            .unwrap()
            .and_then(|span| crate::web::marker_id_of(&span))
            .unwrap();
        let accepted = surface.accept(id).unwrap();
        assert_eq!(accepted.correction.suggested_text, "receive");
        assert_eq!(textarea.value(), "I receive teh package");

        surface.teardown();
        host.remove();
    }
}
