//! Popup: the on/off toggle and the running total

use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Event, HtmlInputElement};

use super::chrome;
use crate::console;
use crate::stats::{Request, StatsSnapshot};

fn by_id(document: &Document, id: &str) -> Result<web_sys::Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("popup is missing #{}", id)))
}

fn label_for(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "OFF"
    }
}

async fn send(request: &Request) -> Result<JsValue, JsValue> {
    let message = request
        .serialize(&Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    chrome::send_message(message).await
}

#[wasm_bindgen(js_name = startPopup)]
pub fn start_popup() -> Result<(), JsValue> {
    let document = super::document()?;
    let toggle: HtmlInputElement = by_id(&document, "toggle")?.dyn_into()?;
    let toggle_label = by_id(&document, "toggleLabel")?;
    let total = by_id(&document, "totalCorrections")?;

    {
        let toggle = toggle.clone();
        let toggle_label = toggle_label.clone();
        spawn_local(async move {
            let stats = match send(&Request::GetStats).await {
                Ok(response) => serde_wasm_bindgen::from_value::<StatsSnapshot>(response).unwrap_or_else(|e| {
                    console::warn(&format!("[Popup] unexpected stats response: {}", e));
                    StatsSnapshot::default()
                }),
                Err(e) => {
                    console::warn(&format!("[Popup] getStats failed: {:?}", e));
                    StatsSnapshot::default()
                }
            };
            toggle.set_checked(stats.extension_enabled);
            toggle_label.set_text_content(Some(label_for(stats.extension_enabled)));
            total.set_text_content(Some(&stats.total_corrections.to_string()));
        });
    }

    let on_change = {
        let toggle = toggle.clone();
        Closure::wrap(Box::new(move |_event: Event| {
            let enabled = toggle.checked();
            toggle_label.set_text_content(Some(label_for(enabled)));
            spawn_local(async move {
                if let Err(e) = send(&Request::SetEnabled { enabled }).await {
                    console::error(&format!("[Popup] setEnabled failed: {:?}", e));
                }
            });
        }) as Box<dyn FnMut(Event)>)
    };
    toggle.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())?;
    on_change.forget();

    Ok(())
}
