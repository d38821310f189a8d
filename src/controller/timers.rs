//! Host-side bookkeeping for scheduled timers
//!
//! `C` is whatever the host has to keep alive while a timer is pending: the
//! JS callback in the browser. A cancelled timer's callback is dropped at
//! once. A fired one is still running when it reports back, so it moves to a
//! single retired slot and is dropped when the next timer fires.
//!
//! `H` is the host's timer handle (`setTimeout` id in the browser).

use std::collections::HashMap;

use super::session::TimerId;

pub struct TimerSlots<H, C> {
    pending: HashMap<TimerId, (H, C)>,
    retired: Option<C>,
}

impl<H, C> Default for TimerSlots<H, C> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            retired: None,
        }
    }
}

impl<H, C> TimerSlots<H, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a scheduled timer. Returns the handle of a timer it replaced,
    /// which the host must clear.
    pub fn schedule(&mut self, id: TimerId, handle: H, callback: C) -> Option<H> {
        self.pending
            .insert(id, (handle, callback))
            .map(|(previous, _)| previous)
    }

    /// Forget a timer before it fires. Returns the handle to clear; the
    /// callback is dropped.
    pub fn cancel(&mut self, id: TimerId) -> Option<H> {
        self.pending.remove(&id).map(|(handle, _)| handle)
    }

    /// Called from inside the firing callback
    pub fn fired(&mut self, id: TimerId) {
        if let Some((_, callback)) = self.pending.remove(&id) {
            self.retired = Some(callback);
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
