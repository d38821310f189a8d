//! LinguistCore: Inline Grammar Suggestions for Editable Fields
//!
//! A Rust/WASM implementation of the LinguistAI extension core.
//!
//! # Architecture
//!
//! ## Checking
//! - `checker/rules.rs` - RuleSet: ordered regex rules (pattern → suggestion → explanation)
//! - `checker/source.rs` - GrammarChecker: the Correction Source, plus the `LinguistChecker` JS facade
//!
//! ## Offsets
//! - `offsets/utf16.rs` - Utf16Index: byte ↔ UTF-16 offset conversion
//! - `offsets/splice.rs` - splice_at: flat-buffer replacement
//! - `offsets/locate.rs` - locate: global offsets → (leaf, position) in a text tree
//!
//! ## Rendering
//! - `render/markers.rs` - MarkerTable: side table from marker identity to Correction
//! - `render/overlay.rs` - MirrorOverlay: highlight model for textarea-like surfaces
//! - `render/tree.rs` - TreePainter + DocTree: marker painting for rich-text surfaces
//!
//! ## Interaction
//! - `controller/engine.rs` - Controller: debounce, generation tokens, hover/accept
//! - `controller/watch.rs` - WatchSet: explicit enrolment of editable elements
//! - `controller/panel.rs` - suggestion panel placement
//!
//! ## Persistence
//! - `stats/` - Session counter, enabled flag and the message relay
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { LinguistChecker, startContentScript } from 'linguist-core';
//!
//! await init();
//!
//! const checker = new LinguistChecker();
//! const corrections = checker.check("I recieve teh package");
//! // [{ originalText: "recieve", suggestedText: "receive", startOffset: 2, endOffset: 9, ... }, ...]
//!
//! // Inside the extension content script:
//! startContentScript({ debounceMs: 600 });
//! ```

pub mod checker;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod offsets;
pub mod render;
pub mod stats;

#[cfg(feature = "cli")]
pub mod packaging;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use checker::*;
pub use config::*;
pub use error::*;
pub use offsets::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("linguist-core v{}", env!("CARGO_PKG_VERSION"))
}
