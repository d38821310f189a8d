//! Browser bindings (wasm32 only)
//!
//! Everything in here is glue: the platform-agnostic core (checker, render
//! models, controller, stats) is driven by DOM events and `chrome.*` APIs.
//!
//! - `chrome.rs` - `chrome.storage` / `chrome.runtime` access through `Reflect`
//! - `dom_tree.rs` - `TreeSurface` over live DOM text nodes
//! - `mirror.rs` - textarea mirror overlay
//! - `panel.rs` - floating suggestion panel in a closed shadow root
//! - `content.rs` - content script: enrolment, controller host, effect executor
//! - `background.rs` / `popup.rs` - the other two extension entry points

pub mod background;
pub mod chrome;
pub mod content;
pub mod dom_tree;
pub mod mirror;
pub mod panel;
pub mod popup;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Window};

pub const MARKER_CLASS: &str = "linguist-ai-error";
pub const MARKER_ATTR: &str = "data-linguist-marker";
pub const TARGET_SELECTOR: &str = "textarea, [contenteditable=\"true\"]";

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object available"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("No document object available"))
}

/// Resolve after `ms` milliseconds
pub async fn sleep(ms: u32) -> Result<(), JsValue> {
    let window = window()?;
    let promise = timer_promise(|resolve| {
        window.set_timeout_with_callback_and_timeout_and_arguments_0(resolve, ms as i32)
    });
    JsFuture::from(promise).await?;
    Ok(())
}

/// A Promise that `arm` hands to a timer as its resolve callback. It rejects
/// with the error when arming fails, instead of never settling.
fn timer_promise(arm: impl FnOnce(&js_sys::Function) -> Result<i32, JsValue>) -> js_sys::Promise {
    let mut arm = Some(arm);
    js_sys::Promise::new(&mut |resolve, reject| {
        if let Some(arm) = arm.take() {
            if let Err(e) = arm(&resolve) {
                let _ = reject.call1(&JsValue::NULL, &e);
            }
        }
    })
}

/// Parse the numeric id stored on a marker node
pub fn marker_id_of(element: &web_sys::Element) -> Option<crate::render::MarkerId> {
    element
        .get_attribute(MARKER_ATTR)?
        .parse::<u32>()
        .ok()
        .map(crate::render::MarkerId)
}

pub(crate) fn as_element(target: Option<web_sys::EventTarget>) -> Option<web_sys::Element> {
    target?.dyn_into::<web_sys::Element>().ok()
}
