//! `chrome.*` extension APIs
//!
//! There are no `web_sys` bindings for the extension namespace, so calls go
//! through `Reflect` on the global `chrome` object. Manifest V3 methods
//! return promises when no callback is passed.

use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Walk `chrome.<path...>`
fn resolve(path: &[&str]) -> Result<JsValue, JsValue> {
    let mut current = Reflect::get(&js_sys::global(), &JsValue::from_str("chrome"))?;
    for segment in path {
        if current.is_undefined() || current.is_null() {
            return Err(JsValue::from_str(&format!("chrome.{} is not available", path.join("."))));
        }
        current = Reflect::get(&current, &JsValue::from_str(segment))?;
    }
    if current.is_undefined() {
        return Err(JsValue::from_str(&format!("chrome.{} is not available", path.join("."))));
    }
    Ok(current)
}

/// Call `chrome.<object>.<method>(args...)`
fn call(object: &[&str], method: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let target = resolve(object)?;
    let function: Function = Reflect::get(&target, &JsValue::from_str(method))?
        .dyn_into()
        .map_err(|_| JsValue::from_str(&format!("{} is not a function", method)))?;
    let args: js_sys::Array = args.iter().collect();
    function.apply(&target, &args)
}

async fn await_call(object: &[&str], method: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let result = call(object, method, args)?;
    match result.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(value) => Ok(value),
    }
}

/// `chrome.storage.local.get(keys)`; `keys = null` reads everything
pub async fn storage_get(keys: JsValue) -> Result<JsValue, JsValue> {
    await_call(&["storage", "local"], "get", &[keys]).await
}

pub async fn storage_set(items: JsValue) -> Result<(), JsValue> {
    await_call(&["storage", "local"], "set", &[items]).await?;
    Ok(())
}

pub async fn send_message(message: JsValue) -> Result<JsValue, JsValue> {
    await_call(&["runtime"], "sendMessage", &[message]).await
}

/// `chrome.<event>.addListener(listener)`, e.g. `["runtime", "onMessage"]`
pub fn add_listener(event: &[&str], listener: &Function) -> Result<(), JsValue> {
    call(event, "addListener", &[listener.clone().into()])?;
    Ok(())
}

/// Build `{ [key]: value }`
pub fn object_with(key: &str, value: &JsValue) -> Result<Object, JsValue> {
    let object = Object::new();
    Reflect::set(&object, &JsValue::from_str(key), value)?;
    Ok(object)
}
