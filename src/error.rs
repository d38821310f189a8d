//! Error taxonomy
//!
//! None of these ever reach the end user: a failed check, an unresolvable
//! span or an unavailable store all degrade to "no suggestions shown".

use crate::render::MarkerId;
use wasm_bindgen::JsValue;

/// The Correction Source could not produce a result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckError {
    #[error("invalid rule pattern `{id}`: {reason}")]
    InvalidPattern { id: String, reason: String },

    #[error("check rejected: {0}")]
    Rejected(String),
}

/// A flat offset range does not fit the text it was computed against.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OffsetError {
    #[error("range {start}..{end} is inverted")]
    Inverted { start: usize, end: usize },

    #[error("range {start}..{end} exceeds text length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("offset {0} splits a surrogate pair")]
    SplitsCodePoint(usize),
}

/// A correction could not be painted, accepted or removed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("offsets {start}..{end} do not resolve to text")]
    Unresolved { start: usize, end: usize },

    #[error("range crosses an element boundary")]
    CrossesBoundary,

    #[error("unknown marker {0}")]
    UnknownMarker(MarkerId),

    #[error(transparent)]
    Offset(#[from] OffsetError),

    #[error("DOM operation failed: {0}")]
    Dom(String),
}

/// Persisted key-value storage failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("value for `{key}` is malformed: {reason}")]
    Malformed { key: String, reason: String },
}

/// Any failure inside the core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinguistError {
    #[error(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    Offset(#[from] OffsetError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<LinguistError> for JsValue {
    fn from(e: LinguistError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

/// Building the extension archive failed.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("{0} not found")]
    MissingDirectory(std::path::PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error: {0}")]
    Zip(String),
}
