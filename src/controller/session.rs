//! Per-element check session
//!
//! # State Machine
//! `Idle → Debouncing → Checking → Displaying`, back to `Debouncing` on the
//! next edit. Every transition into `Debouncing` or `Checking` bumps the
//! generation; a completed check is only displayed if it carries the current
//! generation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one enrolled editable element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element {}", self.0)
    }
}

/// Identity of one pending timer, owned by the controller and scheduled by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u32);

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Debounce elapsed: snapshot the element and run a check
    Check(ElementId),
    /// Grace period after the pointer left a marker or the panel
    HidePanel,
}

/// Which render path an element uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceKind {
    /// `<textarea>`-like: single flat value, highlighted through a mirror overlay
    FlatBuffer,
    /// Rich-text (`contenteditable`): markers wrapped around text nodes
    Tree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Debouncing,
    Checking,
    Displaying,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Debouncing => "debouncing",
            Phase::Checking => "checking",
            Phase::Displaying => "displaying",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub kind: SurfaceKind,
    pub phase: Phase,
    pub generation: u64,
    /// Pending debounce timer, if any
    pub debounce: Option<TimerId>,
}

impl Session {
    pub fn new(kind: SurfaceKind) -> Self {
        Self {
            kind,
            phase: Phase::Idle,
            generation: 0,
            debounce: None,
        }
    }

    /// Start a new generation; results of earlier ones become stale
    pub fn bump(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_invalidates_previous_generation() {
        let mut session = Session::new(SurfaceKind::FlatBuffer);
        let first = session.bump();
        assert!(session.is_current(first));
        let second = session.bump();
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
    }

    #[test]
    fn test_surface_kind_serde() {
        assert_eq!(serde_json::to_string(&SurfaceKind::FlatBuffer).unwrap(), "\"flatBuffer\"");
        let kind: SurfaceKind = serde_json::from_str("\"tree\"").unwrap();
        assert_eq!(kind, SurfaceKind::Tree);
    }
}
