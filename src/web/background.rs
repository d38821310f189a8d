//! Background service worker
//!
//! Owns the only writable copy of the stats. Storage is read once at start;
//! every request is answered from the in-memory relay and the keys it touched
//! are flushed to `chrome.storage.local` afterwards, in request order.
//!
//! The worker script registers its `chrome.runtime` listeners synchronously
//! and forwards them here. Events that arrive while the snapshot is still
//! loading wait in a `Deferred` and are replayed once it lands.

use std::rc::Rc;

use js_sys::{Function, Object};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use super::chrome;
use crate::console;
use crate::stats::{BackgroundRelay, Deferred, Response};

#[wasm_bindgen]
pub struct BackgroundWorker {
    relay: Rc<Deferred<BackgroundRelay>>,
}

/// Start loading the stats snapshot and hand back the worker the listeners
/// forward to. Returns immediately.
#[wasm_bindgen(js_name = startBackground)]
pub fn start_background() -> BackgroundWorker {
    let relay = Rc::new(Deferred::new());

    let loading = relay.clone();
    spawn_local(async move {
        let outcome = chrome::storage_get(JsValue::NULL)
            .await
            .and_then(BackgroundRelay::new)
            .map_err(|e| {
                console::error(&format!("[Background] loading stats failed: {:?}", e));
                e.as_string().unwrap_or_else(|| "storage unavailable".to_string())
            });
        let replayed = loading.resolve(outcome);
        console::log(&format!("[Background] ready ({} queued event(s) replayed)", replayed));
    });

    BackgroundWorker { relay }
}

#[wasm_bindgen]
impl BackgroundWorker {
    /// `runtime.onInstalled`: fill in missing defaults
    #[wasm_bindgen(js_name = onInstalled)]
    pub fn on_installed(&self) {
        self.relay.run(|relay| match relay {
            Ok(relay) => {
                if let Err(e) = relay.on_installed() {
                    console::error(&format!("[Background] initializing defaults failed: {:?}", e));
                }
                flush(relay);
            }
            Err(e) => console::error(&format!("[Background] defaults skipped: {}", e)),
        });
    }

    /// `runtime.onMessage`: answer through `send_response` once the stats
    /// are loaded
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, request: JsValue, send_response: Function) {
        self.relay.run(move |relay| {
            let response = match relay {
                Ok(relay) => relay.handle(request),
                Err(e) => Response::failure(format!("stats unavailable: {}", e))
                    .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
                    .map_err(|e| JsValue::from_str(&e.to_string())),
            }
            .unwrap_or_else(|e| {
                console::error(&format!("[Background] serializing response failed: {:?}", e));
                JsValue::NULL
            });

            if let Err(e) = send_response.call1(&JsValue::NULL, &response) {
                console::warn(&format!("[Background] sendResponse failed: {:?}", e));
            }
            if let Ok(relay) = relay {
                flush(relay);
            }
        });
    }
}

/// Persist whatever the last request changed
fn flush(relay: &BackgroundRelay) {
    let writes = match relay.take_pending_writes() {
        Ok(writes) => writes,
        Err(e) => {
            console::error(&format!("[Background] collecting writes failed: {:?}", e));
            return;
        }
    };
    let empty = writes
        .dyn_ref::<Object>()
        .map(|o| Object::keys(o).length() == 0)
        .unwrap_or(true);
    if empty {
        return;
    }
    spawn_local(async move {
        if let Err(e) = chrome::storage_set(writes).await {
            console::error(&format!("[Background] storage write failed: {:?}", e));
        }
    });
}
