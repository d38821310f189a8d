//! Message relay between content scripts, the popup and the background worker
//!
//! Requests are tagged by `action`:
//! - `{action:"incrementCorrections"}` → `{success:true, total}`
//! - `{action:"getStats"}` → `{totalCorrections, extensionEnabled}`
//! - `{action:"setEnabled", enabled}` → `{success:true}`
//!
//! Anything else answers `{success:false, error}`.
//!
//! The background worker keeps one `BackgroundRelay` over a write-through
//! cache of `chrome.storage.local`: every request is handled synchronously
//! against the cache, so increments are serialized, and the changed keys are
//! flushed afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

use super::counter::{Stats, StatsSnapshot};
use super::storage::{KeyValueStore, MemoryStore, WriteThrough};
use crate::console;
use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    IncrementCorrections,
    GetStats,
    SetEnabled { enabled: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Incremented { success: bool, total: u64 },
    Stats(StatsSnapshot),
    Failure { success: bool, error: String },
    Ack { success: bool },
}

impl Response {
    pub fn failure(error: impl Into<String>) -> Self {
        Response::Failure {
            success: false,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Response::Incremented { success, .. }
            | Response::Failure { success, .. }
            | Response::Ack { success } => *success,
            Response::Stats(_) => true,
        }
    }
}

impl From<StorageError> for Response {
    fn from(e: StorageError) -> Self {
        Response::failure(e.to_string())
    }
}

pub struct Relay<S> {
    stats: Stats<S>,
}

impl<S: KeyValueStore> Relay<S> {
    pub fn new(store: S) -> Self {
        Self {
            stats: Stats::new(store),
        }
    }

    pub fn stats(&self) -> &Stats<S> {
        &self.stats
    }

    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::IncrementCorrections => match self.stats.increment() {
                Ok(total) => Response::Incremented { success: true, total },
                Err(e) => {
                    console::warn(&format!("[Relay] increment failed: {}", e));
                    e.into()
                }
            },
            Request::GetStats => Response::Stats(self.stats.snapshot()),
            Request::SetEnabled { enabled } => match self.stats.set_enabled(enabled) {
                Ok(()) => Response::Ack { success: true },
                Err(e) => e.into(),
            },
        }
    }

    /// Handle a raw message; malformed or unknown requests get a failure response
    pub fn handle_value(&self, message: Value) -> Response {
        match serde_json::from_value::<Request>(message) {
            Ok(request) => self.handle(request),
            Err(e) => {
                console::warn(&format!("[Relay] rejected message: {}", e));
                Response::failure(format!("unrecognized request: {}", e))
            }
        }
    }

    pub fn handle_json(&self, message: &str) -> String {
        let response = match serde_json::from_str::<Value>(message) {
            Ok(value) => self.handle_value(value),
            Err(e) => Response::failure(format!("invalid JSON: {}", e)),
        };
        serde_json::to_string(&response).unwrap_or_else(|_| r#"{"success":false}"#.to_string())
    }
}

// =============================================================================
// WASM binding
// =============================================================================

/// Relay owned by the background worker
#[wasm_bindgen]
pub struct BackgroundRelay {
    inner: Relay<WriteThrough<MemoryStore>>,
}

#[wasm_bindgen]
impl BackgroundRelay {
    /// Build from a `chrome.storage.local.get(null)` snapshot
    #[wasm_bindgen(constructor)]
    pub fn new(snapshot: JsValue) -> Result<BackgroundRelay, JsValue> {
        let object: Map<String, Value> = if snapshot.is_undefined() || snapshot.is_null() {
            Map::new()
        } else {
            serde_wasm_bindgen::from_value(snapshot).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        Ok(Self {
            inner: Relay::new(WriteThrough::new(MemoryStore::from_object(object))),
        })
    }

    /// `runtime.onInstalled`: fill in missing defaults
    #[wasm_bindgen(js_name = onInstalled)]
    pub fn on_installed(&self) -> Result<(), JsValue> {
        self.inner
            .stats()
            .initialize_defaults()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn handle(&self, message: JsValue) -> Result<JsValue, JsValue> {
        let value: Value = serde_wasm_bindgen::from_value(message).unwrap_or(Value::Null);
        let response = self.inner.handle_value(value);
        response
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Keys changed since the last call, as a plain object for `chrome.storage.local.set`
    #[wasm_bindgen(js_name = takePendingWrites)]
    pub fn take_pending_writes(&self) -> Result<JsValue, JsValue> {
        let writes = self
            .inner
            .stats()
            .store()
            .drain()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        writes
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn relay() -> Relay<MemoryStore> {
        Relay::new(MemoryStore::new())
    }

    #[test]
    fn test_request_wire_format() {
        let request: Request = serde_json::from_value(json!({ "action": "incrementCorrections" })).unwrap();
        assert_eq!(request, Request::IncrementCorrections);
        let request: Request = serde_json::from_value(json!({ "action": "setEnabled", "enabled": false })).unwrap();
        assert_eq!(request, Request::SetEnabled { enabled: false });
    }

    #[test]
    fn test_increment_response() {
        let relay = relay();
        relay.handle(Request::IncrementCorrections);
        let response = relay.handle_value(json!({ "action": "incrementCorrections" }));
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({ "success": true, "total": 2 }));
    }

    #[test]
    fn test_get_stats_response() {
        let relay = relay();
        relay.handle(Request::IncrementCorrections);
        relay.handle(Request::SetEnabled { enabled: false });
        let response = relay.handle_json(r#"{"action":"getStats"}"#);
        let value: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value, json!({ "totalCorrections": 1, "extensionEnabled": false }));
    }

    #[test]
    fn test_unknown_action_fails() {
        let relay = relay();
        let response = relay.handle_value(json!({ "action": "selfDestruct" }));
        assert!(!response.is_success());
        let response = relay.handle_json("not json");
        assert!(response.contains(r#""success":false"#));
    }

    #[test]
    fn test_set_enabled_ack() {
        let relay = relay();
        let response = relay.handle(Request::SetEnabled { enabled: true });
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({ "success": true }));
        assert!(relay.stats().is_enabled().unwrap());
    }

    #[test]
    fn test_responses_parse_back() {
        let parsed: Response = serde_json::from_value(json!({ "success": true, "total": 3 })).unwrap();
        assert_eq!(parsed, Response::Incremented { success: true, total: 3 });
        let parsed: Response = serde_json::from_value(json!({ "totalCorrections": 3, "extensionEnabled": true })).unwrap();
        assert!(matches!(parsed, Response::Stats(_)));
        let parsed: Response = serde_json::from_value(json!({ "success": false, "error": "x" })).unwrap();
        assert_eq!(parsed, Response::failure("x"));
    }

    #[test]
    fn test_write_through_flushes_increments() {
        let relay = Relay::new(WriteThrough::new(MemoryStore::new()));
        relay.handle(Request::IncrementCorrections);
        relay.handle(Request::IncrementCorrections);
        let flushed = relay.stats().store().drain().unwrap();
        assert_eq!(flushed.get("totalCorrections"), Some(&json!(2)));
    }
}
