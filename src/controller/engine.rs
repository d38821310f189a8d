//! Controller: debounce, generation tokens, hover and accept
//!
//! The controller never touches the page. Each event handler updates the
//! per-instance state and returns the `Effect`s the host must carry out, in
//! order. Timers are identified by `TimerId`; the host schedules them and
//! reports back through `on_timer`.
//!
//! # Usage
//! ```rust,ignore
//! let mut controller = Controller::new(LinguistConfig::default());
//! host.run(controller.attach(id, SurfaceKind::FlatBuffer, true));
//! host.run(controller.on_input(id));
//! // ...debounce elapses
//! host.run(controller.on_timer(timer));   // → RunCheck { element, generation }
//! host.run(controller.on_check_complete(id, generation, result)); // → Paint
//! ```

use std::collections::{BTreeMap, HashMap};

use super::panel::{place_panel, PanelPlacement, Rect, Viewport};
use super::session::{ElementId, Phase, Session, SurfaceKind, TimerId, TimerTask};
use crate::checker::Correction;
use crate::config::LinguistConfig;
use crate::console;
use crate::error::CheckError;
use crate::render::MarkerId;

// =============================================================================
// Effects
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScheduleTimer { id: TimerId, delay_ms: u32 },
    CancelTimer(TimerId),
    /// Snapshot the element's content now and hand it to the Correction Source
    RunCheck { element: ElementId, generation: u64 },
    Paint { element: ElementId, corrections: Vec<Correction> },
    /// Content changed: existing highlights no longer line up
    Invalidate(ElementId),
    /// Remove every marker and overlay layer of the element
    Teardown(ElementId),
    ShowPanel {
        element: ElementId,
        marker: MarkerId,
        placement: PanelPlacement,
    },
    HidePanel,
    /// Replace the marker's text with its suggestion
    Accept { element: ElementId, marker: MarkerId },
    /// Bump the persisted acceptance counter; follows a successful `Accept`
    RecordAcceptance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelState {
    Hidden,
    Shown {
        element: ElementId,
        marker: MarkerId,
        hide: Option<TimerId>,
    },
}

// =============================================================================
// Controller
// =============================================================================

pub struct Controller {
    config: LinguistConfig,
    enabled: bool,
    sessions: HashMap<ElementId, Session>,
    timers: BTreeMap<TimerId, TimerTask>,
    next_timer: u32,
    panel: PanelState,
}

impl Controller {
    pub fn new(config: LinguistConfig) -> Self {
        Self {
            config,
            enabled: true,
            sessions: HashMap::new(),
            timers: BTreeMap::new(),
            next_timer: 0,
            panel: PanelState::Hidden,
        }
    }

    pub fn config(&self) -> &LinguistConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self, element: ElementId) -> Option<Phase> {
        self.sessions.get(&element).map(|s| s.phase)
    }

    pub fn generation(&self, element: ElementId) -> Option<u64> {
        self.sessions.get(&element).map(|s| s.generation)
    }

    pub fn kind(&self, element: ElementId) -> Option<SurfaceKind> {
        self.sessions.get(&element).map(|s| s.kind)
    }

    pub fn attached(&self) -> usize {
        self.sessions.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn timer_task(&self, id: TimerId) -> Option<TimerTask> {
        self.timers.get(&id).copied()
    }

    /// The marker the panel is currently showing, if any
    pub fn panel_target(&self) -> Option<(ElementId, MarkerId)> {
        match self.panel {
            PanelState::Shown { element, marker, .. } => Some((element, marker)),
            PanelState::Hidden => None,
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Start tracking an element. Elements that already hold text are checked
    /// after the usual debounce.
    pub fn attach(&mut self, element: ElementId, kind: SurfaceKind, has_text: bool) -> Vec<Effect> {
        if self.sessions.contains_key(&element) {
            return Vec::new();
        }
        self.sessions.insert(element, Session::new(kind));

        let mut effects = Vec::new();
        if self.enabled && has_text {
            self.debounce(element, &mut effects);
        }
        effects
    }

    pub fn detach(&mut self, element: ElementId) -> Vec<Effect> {
        let Some(session) = self.sessions.remove(&element) else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        if let Some(timer) = session.debounce {
            self.cancel(timer, &mut effects);
        }
        if matches!(self.panel, PanelState::Shown { element: e, .. } if e == element) {
            self.hide_panel(&mut effects);
        }
        effects.push(Effect::Teardown(element));
        effects
    }

    /// Toggle the whole instance. Disabling cancels every timer, tears down
    /// every element and makes in-flight checks stale.
    pub fn set_enabled(&mut self, enabled: bool) -> Vec<Effect> {
        if enabled == self.enabled {
            return Vec::new();
        }
        self.enabled = enabled;

        let mut effects = Vec::new();
        let mut elements: Vec<ElementId> = self.sessions.keys().copied().collect();
        elements.sort();

        if enabled {
            for element in elements {
                self.debounce(element, &mut effects);
            }
            return effects;
        }

        self.hide_panel(&mut effects);
        for element in elements {
            if let Some(session) = self.sessions.get_mut(&element) {
                session.bump();
                session.phase = Phase::Idle;
                if let Some(timer) = session.debounce.take() {
                    self.timers.remove(&timer);
                    effects.push(Effect::CancelTimer(timer));
                }
            }
            effects.push(Effect::Teardown(element));
        }
        // Anything left would fire into a disabled instance
        for (timer, _) in std::mem::take(&mut self.timers) {
            effects.push(Effect::CancelTimer(timer));
        }
        effects
    }

    // -------------------------------------------------------------------------
    // Checking
    // -------------------------------------------------------------------------

    pub fn on_input(&mut self, element: ElementId) -> Vec<Effect> {
        if !self.enabled || !self.sessions.contains_key(&element) {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if matches!(self.panel, PanelState::Shown { element: e, .. } if e == element) {
            self.hide_panel(&mut effects);
        }
        effects.push(Effect::Invalidate(element));
        self.debounce(element, &mut effects);
        effects
    }

    pub fn on_focus(&mut self, element: ElementId) -> Vec<Effect> {
        if !self.enabled || !self.sessions.contains_key(&element) {
            return Vec::new();
        }
        let mut effects = Vec::new();
        self.debounce(element, &mut effects);
        effects
    }

    pub fn on_timer(&mut self, timer: TimerId) -> Vec<Effect> {
        let Some(task) = self.timers.remove(&timer) else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        match task {
            TimerTask::Check(element) => {
                if let Some(session) = self.sessions.get_mut(&element) {
                    if session.debounce == Some(timer) {
                        session.debounce = None;
                        self.run_check(element, &mut effects);
                    }
                }
            }
            TimerTask::HidePanel => {
                if let PanelState::Shown { hide: Some(t), .. } = self.panel {
                    if t == timer {
                        self.panel = PanelState::Hidden;
                        effects.push(Effect::HidePanel);
                    }
                }
            }
        }
        effects
    }

    /// A check finished. Results from an older generation, a detached element
    /// or a disabled instance are discarded.
    pub fn on_check_complete(
        &mut self,
        element: ElementId,
        generation: u64,
        result: Result<Vec<Correction>, CheckError>,
    ) -> Vec<Effect> {
        let enabled = self.enabled;
        let Some(session) = self.sessions.get_mut(&element) else {
            return Vec::new();
        };
        if !enabled || !session.is_current(generation) || session.phase != Phase::Checking {
            console::log(&format!(
                "[Controller] discarding stale check for {} (generation {})",
                element, generation
            ));
            return Vec::new();
        }

        match result {
            Ok(corrections) => {
                session.phase = Phase::Displaying;
                vec![Effect::Paint { element, corrections }]
            }
            Err(e) => {
                session.phase = Phase::Idle;
                console::warn(&format!("[Controller] check failed for {}: {}", element, e));
                Vec::new()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Hover and accept
    // -------------------------------------------------------------------------

    pub fn marker_entered(
        &mut self,
        element: ElementId,
        marker: MarkerId,
        anchor: Rect,
        viewport: Viewport,
    ) -> Vec<Effect> {
        if !self.enabled || !self.sessions.contains_key(&element) {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if let PanelState::Shown { hide: Some(t), .. } = self.panel {
            self.cancel(t, &mut effects);
        }
        self.panel = PanelState::Shown {
            element,
            marker,
            hide: None,
        };
        effects.push(Effect::ShowPanel {
            element,
            marker,
            placement: place_panel(anchor, viewport, &self.config.panel),
        });
        effects
    }

    pub fn marker_left(&mut self) -> Vec<Effect> {
        let delay = self.config.marker_leave_grace_ms;
        self.schedule_hide(delay)
    }

    pub fn panel_entered(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let PanelState::Shown { element, marker, hide: Some(t) } = self.panel {
            self.cancel(t, &mut effects);
            self.panel = PanelState::Shown {
                element,
                marker,
                hide: None,
            };
        }
        effects
    }

    pub fn panel_left(&mut self) -> Vec<Effect> {
        let delay = self.config.panel_leave_grace_ms;
        self.schedule_hide(delay)
    }

    /// Accept the suggestion the panel is showing, then re-check the element
    /// right away.
    pub fn accept(&mut self) -> Vec<Effect> {
        let PanelState::Shown { element, marker, .. } = self.panel else {
            return Vec::new();
        };
        if !self.enabled {
            return Vec::new();
        }

        let mut effects = Vec::new();
        self.hide_panel(&mut effects);
        effects.push(Effect::Accept { element, marker });

        if let Some(timer) = self.sessions.get_mut(&element).and_then(|s| s.debounce.take()) {
            self.cancel(timer, &mut effects);
        }
        self.run_check(element, &mut effects);
        effects
    }

    /// The host reports back after carrying out `Effect::Accept`. Only an
    /// edit that actually landed is counted.
    pub fn accept_finished(&mut self, applied: bool) -> Vec<Effect> {
        if applied {
            vec![Effect::RecordAcceptance]
        } else {
            Vec::new()
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn allocate_timer(&mut self, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer = self.next_timer.wrapping_add(1);
        self.timers.insert(id, task);
        id
    }

    fn cancel(&mut self, timer: TimerId, effects: &mut Vec<Effect>) {
        if self.timers.remove(&timer).is_some() {
            effects.push(Effect::CancelTimer(timer));
        }
    }

    /// Replace the element's debounce timer and start a new generation
    fn debounce(&mut self, element: ElementId, effects: &mut Vec<Effect>) {
        let previous = match self.sessions.get_mut(&element) {
            Some(session) => session.debounce.take(),
            None => return,
        };
        if let Some(timer) = previous {
            self.cancel(timer, effects);
        }

        let timer = self.allocate_timer(TimerTask::Check(element));
        if let Some(session) = self.sessions.get_mut(&element) {
            session.bump();
            session.phase = Phase::Debouncing;
            session.debounce = Some(timer);
        }
        effects.push(Effect::ScheduleTimer {
            id: timer,
            delay_ms: self.config.debounce_ms,
        });
    }

    fn run_check(&mut self, element: ElementId, effects: &mut Vec<Effect>) {
        if let Some(session) = self.sessions.get_mut(&element) {
            let generation = session.bump();
            session.phase = Phase::Checking;
            effects.push(Effect::RunCheck { element, generation });
        }
    }

    fn schedule_hide(&mut self, delay_ms: u32) -> Vec<Effect> {
        let PanelState::Shown { element, marker, hide } = self.panel else {
            return Vec::new();
        };
        let mut effects = Vec::new();
        if let Some(t) = hide {
            self.cancel(t, &mut effects);
        }
        let timer = self.allocate_timer(TimerTask::HidePanel);
        self.panel = PanelState::Shown {
            element,
            marker,
            hide: Some(timer),
        };
        effects.push(Effect::ScheduleTimer { id: timer, delay_ms });
        effects
    }

    fn hide_panel(&mut self, effects: &mut Vec<Effect>) {
        if let PanelState::Shown { hide, .. } = self.panel {
            if let Some(t) = hide {
                self.cancel(t, effects);
            }
            self.panel = PanelState::Hidden;
            effects.push(Effect::HidePanel);
        }
    }
}
