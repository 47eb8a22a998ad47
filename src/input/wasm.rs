use std::sync::Arc;

use anyhow::{anyhow, Result};
use glam::Vec2;
use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{window, Element, HtmlElement, KeyboardEvent, TouchEvent};

use super::{InputState, KeyCode};

const KNOB_CENTERED: &str = "translate(-50%, -50%)";

/// Handles DOM keyboard and joystick events and updates the shared [`InputState`].
pub struct WasmInputHandler {
    listeners: Vec<EventListener>,
}

impl WasmInputHandler {
    /// Listens for keys on the document and for touches on the joystick zone.
    /// `knob` is moved to follow the tracked touch.
    pub fn attach(zone: &Element, knob: HtmlElement, input: Arc<InputState>) -> Result<Self> {
        let window = window().ok_or_else(|| anyhow!("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow!("document not available"))?;

        let mut listeners = Vec::new();

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(&document, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if let Some(code) = KeyCode::from_dom_key(&event.key()) {
                    input_state.set_key_down(code);
                }
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(&document, "keyup", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if let Some(code) = KeyCode::from_dom_key(&event.key()) {
                    input_state.set_key_up(code);
                }
            }));
        }

        let active = EventListenerOptions::enable_prevent_default();

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new_with_options(
                zone,
                "touchstart",
                active,
                move |event| {
                    let Some(event) = event.dyn_ref::<TouchEvent>() else {
                        return;
                    };
                    event.prevent_default();
                    if let Some(touch) = event.changed_touches().get(0) {
                        input_state.touch_start(touch.identifier());
                    }
                },
            ));
        }

        {
            let input_state = Arc::clone(&input);
            let zone = zone.clone();
            let knob = knob.clone();
            listeners.push(EventListener::new_with_options(
                &document,
                "touchmove",
                active,
                move |event| {
                    let Some(event) = event.dyn_ref::<TouchEvent>() else {
                        return;
                    };
                    let rect = zone.get_bounding_client_rect();
                    let centre = Vec2::new(
                        (rect.left() + rect.width() / 2.0) as f32,
                        (rect.top() + rect.height() / 2.0) as f32,
                    );
                    let touches = event.changed_touches();
                    for index in 0..touches.length() {
                        let Some(touch) = touches.get(index) else {
                            continue;
                        };
                        let point = Vec2::new(touch.client_x() as f32, touch.client_y() as f32);
                        if let Some(offset) = input_state.touch_move(touch.identifier(), point - centre) {
                            event.prevent_default();
                            set_knob_transform(&knob, &knob_transform(offset));
                        }
                    }
                },
            ));
        }

        for kind in ["touchend", "touchcancel"] {
            let input_state = Arc::clone(&input);
            let knob = knob.clone();
            listeners.push(EventListener::new(&document, kind, move |event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                let touches = event.changed_touches();
                for index in 0..touches.length() {
                    let released = touches
                        .get(index)
                        .is_some_and(|touch| input_state.touch_end(touch.identifier()));
                    if released {
                        set_knob_transform(&knob, KNOB_CENTERED);
                    }
                }
            }));
        }

        Ok(Self { listeners })
    }
}

impl Drop for WasmInputHandler {
    fn drop(&mut self) {
        self.listeners.clear();
    }
}

fn knob_transform(offset: Vec2) -> String {
    format!(
        "translate(calc(-50% + {}px), calc(-50% + {}px))",
        offset.x, offset.y
    )
}

fn set_knob_transform(knob: &HtmlElement, transform: &str) {
    if let Err(err) = knob.style().set_property("transform", transform) {
        log::warn!("failed to move joystick knob: {err:?}");
    }
}
