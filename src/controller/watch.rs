//! WatchSet: explicit enrolment of editable elements
//!
//! Elements are enrolled once, at startup or when they appear later in the
//! page. Subscribers (the controller host) hear about every addition and
//! removal, so late elements are attached the same way as early ones.
//!
//! `H` is the host's element handle: a DOM `Element` in the browser, any
//! comparable value in tests.

use super::session::{ElementId, SurfaceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    Added { id: ElementId, kind: SurfaceKind },
    Removed { id: ElementId },
}

pub type Subscriber = Box<dyn FnMut(&WatchEvent)>;

pub struct WatchSet<H> {
    next_id: u32,
    entries: Vec<(ElementId, SurfaceKind, H)>,
    subscribers: Vec<Subscriber>,
}

impl<H> Default for WatchSet<H> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
            subscribers: Vec::new(),
        }
    }
}

impl<H: PartialEq> WatchSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    /// Enroll an element. Enrolling the same handle twice returns the existing id
    /// and notifies nobody.
    pub fn enroll(&mut self, handle: H, kind: SurfaceKind) -> ElementId {
        if let Some(id) = self.id_of(&handle) {
            return id;
        }
        let id = ElementId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, kind, handle));
        self.notify(WatchEvent::Added { id, kind });
        id
    }

    pub fn remove(&mut self, id: ElementId) -> Option<H> {
        let pos = self.entries.iter().position(|(e, _, _)| *e == id)?;
        let (_, _, handle) = self.entries.remove(pos);
        self.notify(WatchEvent::Removed { id });
        Some(handle)
    }

    /// Remove every element, notifying subscribers for each one
    pub fn clear(&mut self) -> Vec<ElementId> {
        let ids = self.ids();
        for id in &ids {
            self.remove(*id);
        }
        ids
    }

    pub fn id_of(&self, handle: &H) -> Option<ElementId> {
        self.entries
            .iter()
            .find(|(_, _, h)| h == handle)
            .map(|(id, _, _)| *id)
    }

    pub fn get(&self, id: ElementId) -> Option<&H> {
        self.entries.iter().find(|(e, _, _)| *e == id).map(|(_, _, h)| h)
    }

    pub fn kind(&self, id: ElementId) -> Option<SurfaceKind> {
        self.entries.iter().find(|(e, _, _)| *e == id).map(|(_, k, _)| *k)
    }

    pub fn ids(&self) -> Vec<ElementId> {
        self.entries.iter().map(|(id, _, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn notify(&mut self, event: WatchEvent) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }
}
