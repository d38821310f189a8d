//! Floating suggestion panel
//!
//! Lives in a closed shadow root attached to a host element on `<body>`, so
//! page styles cannot reach it. Created once and re-attached on every show.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement, ShadowRootInit, ShadowRootMode};

use crate::checker::Correction;
use crate::controller::PanelPlacement;

const HOST_ID: &str = "linguist-ai-tooltip-host";

const PANEL_CSS: &str = "
.tooltip {
  position: fixed;
  z-index: 2147483647;
  background: #1f2937;
  color: #f9fafb;
  padding: 12px 16px;
  border-radius: 8px;
  box-shadow: 0 10px 25px rgba(0,0,0,0.3);
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  font-size: 13px;
  box-sizing: border-box;
  pointer-events: auto;
}
.tooltip-suggestion { color: #34d399; font-weight: 600; margin: 4px 0; }
.tooltip-explanation { color: #9ca3af; font-size: 12px; margin-bottom: 10px; }
.tooltip-accept {
  background: #3b82f6;
  color: white;
  border: none;
  padding: 6px 14px;
  border-radius: 6px;
  cursor: pointer;
  font-size: 12px;
  font-weight: 500;
}
.tooltip-accept:hover { background: #2563eb; }
";

pub struct PanelView {
    document: Document,
    host: HtmlElement,
    card: HtmlElement,
    suggestion: Element,
    explanation: Element,
    _listeners: Vec<Closure<dyn FnMut(Event)>>,
}

fn listener<F: FnMut() + 'static>(mut f: F) -> Closure<dyn FnMut(Event)> {
    Closure::wrap(Box::new(move |_event: Event| f()) as Box<dyn FnMut(Event)>)
}

impl PanelView {
    pub fn new<A, E, L>(document: Document, width: f64, on_accept: A, on_enter: E, on_leave: L) -> Result<Self, JsValue>
    where
        A: FnMut() + 'static,
        E: FnMut() + 'static,
        L: FnMut() + 'static,
    {
        let host: HtmlElement = document.create_element("div")?.dyn_into()?;
        host.set_id(HOST_ID);
        let shadow = host.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Closed))?;

        let style = document.create_element("style")?;
        style.set_text_content(Some(PANEL_CSS));

        let card: HtmlElement = document.create_element("div")?.dyn_into()?;
        card.set_class_name("tooltip");
        card.style().set_property("width", &format!("{}px", width))?;

        let suggestion = document.create_element("div")?;
        suggestion.set_class_name("tooltip-suggestion");
        let explanation = document.create_element("div")?;
        explanation.set_class_name("tooltip-explanation");
        let button = document.create_element("button")?;
        button.set_class_name("tooltip-accept");
        button.set_text_content(Some("Accept"));

        card.append_child(&suggestion)?;
        card.append_child(&explanation)?;
        card.append_child(&button)?;
        shadow.append_child(&style)?;
        shadow.append_child(&card)?;

        let on_accept = listener(on_accept);
        let on_enter = listener(on_enter);
        let on_leave = listener(on_leave);
        button.add_event_listener_with_callback("click", on_accept.as_ref().unchecked_ref())?;
        card.add_event_listener_with_callback("mouseenter", on_enter.as_ref().unchecked_ref())?;
        card.add_event_listener_with_callback("mouseleave", on_leave.as_ref().unchecked_ref())?;

        Ok(Self {
            document,
            host,
            card,
            suggestion,
            explanation,
            _listeners: vec![on_accept, on_enter, on_leave],
        })
    }

    pub fn show(&self, correction: &Correction, placement: PanelPlacement) -> Result<(), JsValue> {
        // textContent, never innerHTML: suggestions may contain markup characters
        self.suggestion
            .set_text_content(Some(&format!("→ {}", correction.suggested_text)));
        self.explanation.set_text_content(Some(&correction.explanation));

        let style = self.card.style();
        style.set_property("left", &format!("{}px", placement.left))?;
        style.set_property("top", &format!("{}px", placement.top))?;
        style.set_property(
            "transform",
            if placement.above { "translateY(-100%)" } else { "none" },
        )?;

        if !self.host.is_connected() {
            let body = self
                .document
                .body()
                .ok_or_else(|| JsValue::from_str("No body element"))?;
            body.append_child(&self.host)?;
        }
        Ok(())
    }

    pub fn hide(&self) {
        self.host.remove();
    }

    pub fn is_visible(&self) -> bool {
        self.host.is_connected()
    }
}
