//! Content script
//!
//! Hosts one `Controller` per page and carries out its effects against the
//! DOM. All state sits in a single `Rc<RefCell<..>>`; DOM callbacks borrow it
//! briefly and never while dispatching events, since dispatching runs page
//! (and our own) listeners synchronously.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::Reflect;
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, Event, EventInit, HtmlElement, HtmlTextAreaElement, MouseEvent,
    MutationObserver, MutationObserverInit, MutationRecord, Node, Window,
};

use super::dom_tree::DomTree;
use super::mirror::MirrorSurface;
use super::panel::PanelView;
use super::{as_element, chrome, marker_id_of, MARKER_ATTR, TARGET_SELECTOR};
use crate::checker::{Correction, CorrectionSource, GrammarChecker};
use crate::config::LinguistConfig;
use crate::console;
use crate::error::RenderError;
use crate::controller::{
    Controller, Effect, ElementId, Rect, SurfaceKind, TimerSlots, Viewport, WatchEvent, WatchSet,
};
use crate::render::{MarkerId, TreePainter};
use crate::stats::{Request, KEY_ENABLED};

// =============================================================================
// Surfaces
// =============================================================================

enum Surface {
    Flat(MirrorSurface),
    Tree(TreePainter<DomTree>),
}

impl Surface {
    fn container(&self) -> &Element {
        match self {
            Surface::Flat(mirror) => mirror.container(),
            Surface::Tree(painter) => painter.surface().root(),
        }
    }

    fn correction(&self, marker: MarkerId) -> Option<&Correction> {
        match self {
            Surface::Flat(mirror) => mirror.correction(marker),
            Surface::Tree(painter) => painter.correction(marker),
        }
    }

    fn teardown(self) {
        match self {
            Surface::Flat(mirror) => mirror.teardown(),
            Surface::Tree(mut painter) => {
                painter.clear();
            }
        }
    }
}

// =============================================================================
// State
// =============================================================================

struct ContentState {
    window: Window,
    document: Document,
    controller: Controller,
    checker: GrammarChecker,
    watch: WatchSet<Element>,
    watch_events: Rc<RefCell<Vec<WatchEvent>>>,
    surfaces: HashMap<ElementId, Surface>,
    /// `setTimeout` handles with the callbacks the browser will invoke
    timers: TimerSlots<i32, Closure<dyn FnMut()>>,
    panel: Option<PanelView>,
    /// Set while we dispatch our own `input` event after an accept
    suppress_input: bool,
}

type Shared = Rc<RefCell<ContentState>>;

/// Start the content script. `config` is an optional (partial) `LinguistConfig` object.
#[wasm_bindgen(js_name = startContentScript)]
pub fn start_content_script(config: JsValue) -> Result<(), JsValue> {
    let config: LinguistConfig = if config.is_undefined() || config.is_null() {
        LinguistConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?
    };
    config.validate()?;

    let window = super::window()?;
    let document = super::document()?;

    let watch_events = Rc::new(RefCell::new(Vec::new()));
    let mut watch = WatchSet::new();
    {
        let sink = watch_events.clone();
        watch.subscribe(Box::new(move |event: &WatchEvent| sink.borrow_mut().push(*event)));
    }

    let shared: Shared = Rc::new(RefCell::new(ContentState {
        window,
        document: document.clone(),
        checker: GrammarChecker::from_config(&config),
        controller: Controller::new(config),
        watch,
        watch_events,
        surfaces: HashMap::new(),
        timers: TimerSlots::new(),
        panel: None,
        suppress_input: false,
    }));

    install_panel(&shared)?;
    install_listeners(&shared, &document)?;
    install_observer(&shared, &document)?;
    install_enabled_sync(&shared)?;

    // Elements already on the page
    let existing = document.query_selector_all(TARGET_SELECTOR)?;
    for i in 0..existing.length() {
        if let Some(el) = existing.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
            enroll(&shared, el);
        }
    }

    console::log("[LinguistAI] content script ready");
    Ok(())
}

// =============================================================================
// Enrolment
// =============================================================================

fn surface_kind(el: &Element) -> Option<SurfaceKind> {
    if el.is_instance_of::<HtmlTextAreaElement>() {
        return Some(SurfaceKind::FlatBuffer);
    }
    match el.dyn_ref::<HtmlElement>() {
        Some(html) if html.is_content_editable() && el.matches(TARGET_SELECTOR).unwrap_or(false) => {
            Some(SurfaceKind::Tree)
        }
        _ => None,
    }
}

fn has_text(el: &Element) -> bool {
    match el.dyn_ref::<HtmlTextAreaElement>() {
        Some(textarea) => !textarea.value().trim().is_empty(),
        None => el.text_content().map(|t| !t.trim().is_empty()).unwrap_or(false),
    }
}

fn enroll(shared: &Shared, el: Element) -> Option<ElementId> {
    let kind = surface_kind(&el)?;
    let id = {
        let mut state = shared.borrow_mut();
        match state.watch.id_of(&el) {
            Some(id) => id,
            None => state.watch.enroll(el, kind),
        }
    };
    drain_watch_events(shared);
    Some(id)
}

/// Feed WatchSet notifications into the controller
fn drain_watch_events(shared: &Shared) {
    let queue = shared.borrow().watch_events.clone();
    let events: Vec<WatchEvent> = queue.borrow_mut().drain(..).collect();
    for event in events {
        let effects = {
            let mut state = shared.borrow_mut();
            match event {
                WatchEvent::Added { id, kind } => {
                    let text = state.watch.get(id).map(has_text).unwrap_or(false);
                    state.controller.attach(id, kind, text)
                }
                WatchEvent::Removed { id } => state.controller.detach(id),
            }
        };
        run_effects(shared, effects);
    }
}

/// The enrolled element whose text (or mirror) contains `node`
fn owner_of(state: &ContentState, node: &Node) -> Option<ElementId> {
    state
        .surfaces
        .iter()
        .find(|(_, surface)| surface.container().contains(Some(node)))
        .map(|(id, _)| *id)
}

// =============================================================================
// DOM listeners
// =============================================================================

fn install_listeners(shared: &Shared, document: &Document) -> Result<(), JsValue> {
    let on_input = {
        let shared = shared.clone();
        Closure::wrap(Box::new(move |event: Event| {
            if shared.borrow().suppress_input {
                return;
            }
            let Some(el) = as_element(event.target()) else { return };
            let Some(id) = enroll(&shared, el) else { return };
            let effects = shared.borrow_mut().controller.on_input(id);
            run_effects(&shared, effects);
        }) as Box<dyn FnMut(Event)>)
    };
    document.add_event_listener_with_callback_and_bool("input", on_input.as_ref().unchecked_ref(), true)?;
    on_input.forget();

    let on_focus = {
        let shared = shared.clone();
        Closure::wrap(Box::new(move |event: Event| {
            let Some(el) = as_element(event.target()) else { return };
            let Some(id) = enroll(&shared, el) else { return };
            let effects = shared.borrow_mut().controller.on_focus(id);
            run_effects(&shared, effects);
        }) as Box<dyn FnMut(Event)>)
    };
    document.add_event_listener_with_callback_and_bool("focusin", on_focus.as_ref().unchecked_ref(), true)?;
    on_focus.forget();

    let on_over = {
        let shared = shared.clone();
        Closure::wrap(Box::new(move |event: MouseEvent| {
            let Some(target) = as_element(event.target()) else { return };
            let Ok(Some(marker_el)) = target.closest(&format!("[{}]", MARKER_ATTR)) else { return };
            let Some(marker) = marker_id_of(&marker_el) else { return };

            let effects = {
                let mut state = shared.borrow_mut();
                let Some(element) = owner_of(&state, marker_el.as_ref()) else { return };
                let rect = marker_el.get_bounding_client_rect();
                let anchor = Rect::new(rect.left(), rect.top(), rect.width(), rect.height());
                let viewport = Viewport {
                    width: state.window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0),
                    height: state.window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0),
                };
                state.controller.marker_entered(element, marker, anchor, viewport)
            };
            run_effects(&shared, effects);
        }) as Box<dyn FnMut(MouseEvent)>)
    };
    document.add_event_listener_with_callback("mouseover", on_over.as_ref().unchecked_ref())?;
    on_over.forget();

    let on_out = {
        let shared = shared.clone();
        Closure::wrap(Box::new(move |event: MouseEvent| {
            let Some(target) = as_element(event.target()) else { return };
            let Ok(Some(marker_el)) = target.closest(&format!("[{}]", MARKER_ATTR)) else { return };
            // Moving between children of the same marker is not leaving it
            if let Some(related) = event.related_target().and_then(|t| t.dyn_into::<Node>().ok()) {
                if marker_el.contains(Some(&related)) {
                    return;
                }
            }
            let effects = shared.borrow_mut().controller.marker_left();
            run_effects(&shared, effects);
        }) as Box<dyn FnMut(MouseEvent)>)
    };
    document.add_event_listener_with_callback("mouseout", on_out.as_ref().unchecked_ref())?;
    on_out.forget();

    Ok(())
}

fn install_observer(shared: &Shared, document: &Document) -> Result<(), JsValue> {
    let callback = {
        let shared = shared.clone();
        Closure::wrap(Box::new(move |records: js_sys::Array, _observer: MutationObserver| {
            let mut added = Vec::new();
            for record in records.iter() {
                let Ok(record) = record.dyn_into::<MutationRecord>() else { continue };
                let nodes = record.added_nodes();
                for i in 0..nodes.length() {
                    let Some(el) = nodes.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                        continue;
                    };
                    if el.matches(TARGET_SELECTOR).unwrap_or(false) {
                        added.push(el.clone());
                    }
                    if let Ok(inner) = el.query_selector_all(TARGET_SELECTOR) {
                        for j in 0..inner.length() {
                            if let Some(e) = inner.get(j).and_then(|n| n.dyn_into::<Element>().ok()) {
                                added.push(e);
                            }
                        }
                    }
                }
            }

            for el in added {
                enroll(&shared, el);
            }

            // Elements that left the page
            {
                let mut state = shared.borrow_mut();
                let gone: Vec<ElementId> = state
                    .watch
                    .ids()
                    .into_iter()
                    .filter(|id| state.watch.get(*id).map(|el| !el.is_connected()).unwrap_or(true))
                    .collect();
                for id in gone {
                    state.watch.remove(id);
                }
            }
            drain_watch_events(&shared);
        }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>)
    };

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("No body element"))?;
    observer.observe_with_options(&body, &init)?;
    callback.forget();
    Ok(())
}

fn install_panel(shared: &Shared) -> Result<(), JsValue> {
    let (document, width) = {
        let state = shared.borrow();
        (state.document.clone(), state.controller.config().panel.width)
    };

    let weak = Rc::downgrade(shared);
    let on_accept = {
        let weak = weak.clone();
        move || {
            if let Some(shared) = weak.upgrade() {
                let effects = shared.borrow_mut().controller.accept();
                run_effects(&shared, effects);
            }
        }
    };
    let on_enter = {
        let weak = weak.clone();
        move || {
            if let Some(shared) = weak.upgrade() {
                let effects = shared.borrow_mut().controller.panel_entered();
                run_effects(&shared, effects);
            }
        }
    };
    let on_leave = move || {
        if let Some(shared) = weak.upgrade() {
            let effects = shared.borrow_mut().controller.panel_left();
            run_effects(&shared, effects);
        }
    };

    let panel = PanelView::new(document, width, on_accept, on_enter, on_leave)?;
    shared.borrow_mut().panel = Some(panel);
    Ok(())
}

/// Follow `extensionEnabled` in storage
fn install_enabled_sync(shared: &Shared) -> Result<(), JsValue> {
    {
        let shared = shared.clone();
        spawn_local(async move {
            match chrome::storage_get(JsValue::from_str(KEY_ENABLED)).await {
                Ok(items) => {
                    let enabled = Reflect::get(&items, &JsValue::from_str(KEY_ENABLED))
                        .map(|v| v != JsValue::FALSE)
                        .unwrap_or(true);
                    let effects = shared.borrow_mut().controller.set_enabled(enabled);
                    run_effects(&shared, effects);
                }
                Err(e) => console::warn(&format!("[LinguistAI] reading enabled flag failed: {:?}", e)),
            }
        });
    }

    let on_changed = {
        let shared = shared.clone();
        Closure::wrap(Box::new(move |changes: JsValue, area: JsValue| {
            if area.as_string().as_deref() != Some("local") {
                return;
            }
            let Ok(change) = Reflect::get(&changes, &JsValue::from_str(KEY_ENABLED)) else { return };
            if change.is_undefined() {
                return;
            }
            let enabled = Reflect::get(&change, &JsValue::from_str("newValue"))
                .map(|v| v != JsValue::FALSE)
                .unwrap_or(true);
            let effects = shared.borrow_mut().controller.set_enabled(enabled);
            run_effects(&shared, effects);
        }) as Box<dyn FnMut(JsValue, JsValue)>)
    };
    chrome::add_listener(&["storage", "onChanged"], on_changed.as_ref().unchecked_ref())?;
    on_changed.forget();
    Ok(())
}

// =============================================================================
// Effect executor
// =============================================================================

fn run_effects(shared: &Shared, effects: Vec<Effect>) {
    for effect in effects {
        if let Err(e) = run_effect(shared, effect) {
            console::warn(&format!("[LinguistAI] effect failed: {:?}", e));
        }
    }
}

fn run_effect(shared: &Shared, effect: Effect) -> Result<(), JsValue> {
    match effect {
        Effect::ScheduleTimer { id, delay_ms } => {
            let weak = Rc::downgrade(shared);
            let fire = Closure::wrap(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    let effects = {
                        let mut state = shared.borrow_mut();
                        state.timers.fired(id);
                        state.controller.on_timer(id)
                    };
                    run_effects(&shared, effects);
                }
            }) as Box<dyn FnMut()>);
            let mut state = shared.borrow_mut();
            let handle = state
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(fire.as_ref().unchecked_ref(), delay_ms as i32)?;
            if let Some(previous) = state.timers.schedule(id, handle, fire) {
                state.window.clear_timeout_with_handle(previous);
            }
        }

        Effect::CancelTimer(id) => {
            let mut state = shared.borrow_mut();
            if let Some(handle) = state.timers.cancel(id) {
                state.window.clear_timeout_with_handle(handle);
            }
        }

        Effect::RunCheck { element, generation } => {
            let (text, checker, latency) = {
                let state = shared.borrow();
                let Some(el) = state.watch.get(element) else { return Ok(()) };
                let text = match el.dyn_ref::<HtmlTextAreaElement>() {
                    Some(textarea) => textarea.value(),
                    None => el.text_content().unwrap_or_default(),
                };
                (text, state.checker.clone(), state.controller.config().check_latency_ms)
            };
            let weak = Rc::downgrade(shared);
            spawn_local(async move {
                if latency > 0 {
                    if let Err(e) = super::sleep(latency).await {
                        console::warn(&format!("[LinguistAI] latency timer failed: {:?}", e));
                    }
                }
                let result = checker.check(&text);
                if let Some(shared) = weak.upgrade() {
                    let effects = shared
                        .borrow_mut()
                        .controller
                        .on_check_complete(element, generation, result);
                    run_effects(&shared, effects);
                }
            });
        }

        Effect::Paint { element, corrections } => {
            let mut state = shared.borrow_mut();
            let state = &mut *state;
            if !state.surfaces.contains_key(&element) {
                let Some(el) = state.watch.get(element).cloned() else { return Ok(()) };
                let surface = match el.dyn_into::<HtmlTextAreaElement>() {
                    Ok(textarea) => Surface::Flat(MirrorSurface::attach(state.document.clone(), textarea)?),
                    Err(el) => Surface::Tree(TreePainter::new(DomTree::new(state.document.clone(), el))),
                };
                state.surfaces.insert(element, surface);
            }
            let report = match state.surfaces.get_mut(&element) {
                Some(Surface::Flat(mirror)) => mirror.paint(corrections)?,
                Some(Surface::Tree(painter)) => painter.paint(corrections),
                None => return Ok(()),
            };
            if report.skipped > 0 {
                console::log(&format!(
                    "[LinguistAI] {}: painted {}, skipped {}",
                    element, report.painted, report.skipped
                ));
            }
        }

        Effect::Invalidate(element) => {
            let mut state = shared.borrow_mut();
            match state.surfaces.get_mut(&element) {
                Some(Surface::Flat(mirror)) => mirror.invalidate()?,
                Some(Surface::Tree(painter)) => {
                    // Rewrapping under the caret would move it: only drop
                    // markers whose text the edit touched
                    let stale: Vec<MarkerId> = painter
                        .markers()
                        .iter()
                        .filter(|(id, c)| painter.surface().marker_text(*id).as_deref() != Some(c.original_text.as_str()))
                        .map(|(id, _)| id)
                        .collect();
                    for id in stale {
                        if let Err(e) = painter.unwrap(id) {
                            console::warn(&format!("[LinguistAI] unwrap {} failed: {}", id, e));
                        }
                    }
                }
                None => {}
            }
        }

        Effect::Teardown(element) => {
            let surface = shared.borrow_mut().surfaces.remove(&element);
            if let Some(surface) = surface {
                surface.teardown();
            }
        }

        Effect::ShowPanel { element, marker, placement } => {
            let state = shared.borrow();
            let Some(correction) = state.surfaces.get(&element).and_then(|s| s.correction(marker)) else {
                return Ok(());
            };
            if let Some(panel) = &state.panel {
                panel.show(correction, placement)?;
            }
        }

        Effect::HidePanel => {
            if let Some(panel) = &shared.borrow().panel {
                panel.hide();
            }
        }

        Effect::Accept { element, marker } => {
            let target = {
                let mut state = shared.borrow_mut();
                let accepted = match state.surfaces.get_mut(&element) {
                    Some(Surface::Flat(mirror)) => mirror.accept(marker),
                    Some(Surface::Tree(painter)) => painter.accept(marker),
                    None => Err(RenderError::UnknownMarker(marker)),
                };
                match accepted {
                    Ok(_) => state.watch.get(element).cloned(),
                    Err(e) => {
                        console::warn(&format!("[LinguistAI] accept {} failed: {}", marker, e));
                        None
                    }
                }
            };
            let applied = target.is_some();

            // Let the page see the edit, without scheduling a second check
            if let Some(target) = target {
                let init = EventInit::new();
                init.set_bubbles(true);
                let event = Event::new_with_event_init_dict("input", &init)?;
                shared.borrow_mut().suppress_input = true;
                let dispatched = target.dispatch_event(&event);
                shared.borrow_mut().suppress_input = false;
                if let Err(e) = dispatched {
                    console::warn(&format!("[LinguistAI] input event failed: {:?}", e));
                }
            }

            let effects = shared.borrow_mut().controller.accept_finished(applied);
            run_effects(shared, effects);
        }

        Effect::RecordAcceptance => {
            let message = Request::IncrementCorrections
                .serialize(&Serializer::json_compatible())
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            spawn_local(async move {
                if let Err(e) = chrome::send_message(message).await {
                    console::warn(&format!("[LinguistAI] recording acceptance failed: {:?}", e));
                }
            });
        }
    }
    Ok(())
}
