#![cfg(target_arch = "wasm32")]
//! Browser entry point.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use glam::Vec3;
use gloo_events::EventListener;
use js_sys::{Array, Reflect};
use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{window, ErrorEvent, HtmlCanvasElement, HtmlElement, Response};

use crate::app::{camera_params, light_params};
use crate::assets::{avatar_from_obj, clips_from_manifest, AssetEvent};
use crate::console::{shared_console, ConsoleHandle, ConsoleLogger};
use crate::error::{AssetError, ViewerError};
use crate::input::wasm::WasmInputHandler;
use crate::input::xr::{Handedness, HeadPose, ImmersiveSession, XrInputSource};
use crate::input::InputState;
use crate::render::{FrameView, Renderer};
use crate::scene::Scene;
use crate::simulation::Simulation;

#[wasm_bindgen(start)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
}

/// Forwards records to the browser's developer console.
struct BrowserConsole;

impl Log for BrowserConsole {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&message),
            Level::Warn => web_sys::console::warn_1(&message),
            _ => web_sys::console::log_1(&message),
        }
    }

    fn flush(&self) {}
}

type EventQueue = Rc<RefCell<Vec<AssetEvent>>>;

#[wasm_bindgen]
pub struct WasmViewer {
    inner: Rc<RefCell<AppState>>,
}

#[wasm_bindgen]
impl WasmViewer {
    /// Binds the viewer to the page and starts loading the avatar and its clips.
    pub async fn create(
        canvas_id: String,
        joystick_id: String,
        knob_id: String,
        avatar_url: String,
        animations_url: String,
    ) -> Result<WasmViewer, JsValue> {
        let scene = Scene::default_room().map_err(|err| JsValue::from_str(&format!("{err:#}")))?;
        let config = scene.tuning.clone();

        let console = shared_console(config.console_capacity);
        if ConsoleLogger::new(Arc::clone(&console), Box::new(BrowserConsole), LevelFilter::Info)
            .install()
            .is_err()
        {
            log::warn!("logger already installed; the debug console stays empty");
        }

        let window = window().ok_or_else(|| JsValue::from_str("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document not available"))?;
        let canvas = document
            .get_element_by_id(&canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas element not found"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("element is not a canvas"))?;
        let zone = document
            .get_element_by_id(&joystick_id)
            .ok_or_else(|| JsValue::from_str("joystick element not found"))?;
        let knob = document
            .get_element_by_id(&knob_id)
            .ok_or_else(|| JsValue::from_str("joystick knob not found"))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| JsValue::from_str("joystick knob is not an HTML element"))?;

        let renderer = Renderer::new(canvas, &scene)
            .await
            .map_err(|err| JsValue::from_str(&err.to_string()))?;

        let input = Arc::new(InputState::new(config.joystick_radius));
        let input_handler = WasmInputHandler::attach(&zone, knob, Arc::clone(&input))
            .map_err(|err| JsValue::from_str(&err.to_string()))?;

        let error_listener = EventListener::new(&window, "error", |event| {
            let message = event
                .dyn_ref::<ErrorEvent>()
                .map(ErrorEvent::message)
                .unwrap_or_else(|| "unknown error".to_string());
            ViewerError::RuntimeFault(message).report();
        });

        let events: EventQueue = Rc::default();
        spawn_local(load_assets(avatar_url, animations_url, Rc::clone(&events)));

        let state = AppState {
            simulation: Simulation::new(config),
            scene,
            renderer,
            input,
            console,
            events,
            xr_session: None,
            head: HeadPose::default(),
            last_time: None,
            _input_handler: input_handler,
            _error_listener: error_listener,
            animation_closure: None,
        };

        Ok(Self {
            inner: Rc::new(RefCell::new(state)),
        })
    }

    pub fn start(&self) -> Result<(), JsValue> {
        schedule_animation_loop(Rc::clone(&self.inner))
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.inner.borrow_mut().renderer.resize((width, height));
    }

    /// Switches to immersive presentation. The session's input sources are
    /// read again on every frame.
    pub fn set_xr_session(&self, session: JsValue) {
        self.inner.borrow_mut().xr_session = Some(session);
    }

    pub fn clear_xr_session(&self) {
        self.inner.borrow_mut().xr_session = None;
    }

    /// Head position and gaze direction of the current XR viewer pose.
    pub fn set_head_pose(&self, x: f32, y: f32, z: f32, fx: f32, fy: f32, fz: f32) {
        let forward = Vec3::new(fx, fy, fz).try_normalize().unwrap_or(Vec3::NEG_Z);
        self.inner.borrow_mut().head = HeadPose {
            position: Vec3::new(x, y, z),
            forward,
        };
    }
}

struct AppState {
    scene: Scene,
    renderer: Renderer,
    simulation: Simulation,
    input: Arc<InputState>,
    console: ConsoleHandle,
    events: EventQueue,
    xr_session: Option<JsValue>,
    head: HeadPose,
    last_time: Option<f64>,
    _input_handler: WasmInputHandler,
    _error_listener: EventListener,
    animation_closure: Option<Closure<dyn FnMut()>>,
}

impl AppState {
    fn render_frame(&mut self) -> Result<()> {
        let events: Vec<AssetEvent> = self.events.borrow_mut().drain(..).collect();
        for event in events {
            if let Err(err) = self.simulation.apply_asset_event(event) {
                err.report();
            }
        }

        let now = now_ms();
        let dt = self
            .last_time
            .map(|last| ((now - last) / 1000.0).max(0.0) as f32)
            .unwrap_or(0.0);
        self.last_time = Some(now);

        let session = self.xr_session.as_ref().map(|session| ImmersiveSession {
            input_sources: read_input_sources(session),
            head: self.head,
        });
        self.simulation
            .frame(&self.input.snapshot(), session.as_ref(), dt);

        let rig = self.simulation.follow();
        let camera = camera_params(&rig.camera, self.renderer.aspect(), self.simulation.config());
        self.renderer
            .update_globals(&camera, &light_params(&self.scene));

        let console = self.console.lock().clone();
        let frame = FrameView {
            scene: &self.scene,
            avatar: self.simulation.avatar().map(|avatar| avatar.model_matrix()),
            console_transform: rig.console.model_matrix(),
            console: &console,
        };
        self.renderer.render(&frame).map_err(|err| {
            let message = err
                .as_string()
                .unwrap_or_else(|| "unknown canvas error".to_string());
            anyhow!("render failed: {message}")
        })?;
        Ok(())
    }
}

fn schedule_animation_loop(app: Rc<RefCell<AppState>>) -> Result<()> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let mut state = app.borrow_mut();
    let app_clone = Rc::clone(&app);

    let closure = Closure::wrap(Box::new(move || {
        if let Err(err) = app_clone.borrow_mut().render_frame() {
            ViewerError::RuntimeFault(err.to_string()).report();
        }
        if let Err(err) = schedule_animation_loop(Rc::clone(&app_clone)) {
            web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
        }
    }) as Box<dyn FnMut()>);

    window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;

    state.animation_closure = Some(closure);
    Ok(())
}

fn now_ms() -> f64 {
    window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Avatar first; clips are only requested once it loaded.
async fn load_assets(avatar_url: String, animations_url: String, events: EventQueue) {
    let avatar = match fetch_text(&avatar_url).await {
        Ok(text) => avatar_from_obj(&avatar_url, &text),
        Err(err) => Err(err),
    };
    let loaded = avatar.is_ok();
    events.borrow_mut().push(AssetEvent::Avatar(avatar));
    if !loaded {
        return;
    }
    let clips = match fetch_text(&animations_url).await {
        Ok(text) => clips_from_manifest(&animations_url, &text),
        Err(err) => Err(err),
    };
    events.borrow_mut().push(AssetEvent::Animations(clips));
}

async fn fetch_text(url: &str) -> Result<String, AssetError> {
    let fetch_error = |reason: String| AssetError::Fetch {
        url: url.to_string(),
        reason,
    };
    let window = window().ok_or_else(|| fetch_error("window not available".into()))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|err| fetch_error(format!("{err:?}")))?
        .dyn_into::<Response>()
        .map_err(|_| fetch_error("not a response".into()))?;
    if !response.ok() {
        return Err(fetch_error(format!("HTTP {}", response.status())));
    }
    let text = response
        .text()
        .map_err(|err| fetch_error(format!("{err:?}")))?;
    JsFuture::from(text)
        .await
        .map_err(|err| fetch_error(format!("{err:?}")))?
        .as_string()
        .ok_or_else(|| fetch_error("body is not text".into()))
}

/// Reads `session.inputSources[i].handedness` and `.gamepad.axes`.
fn read_input_sources(session: &JsValue) -> Vec<XrInputSource> {
    let Ok(sources) = Reflect::get(session, &"inputSources".into()) else {
        return Vec::new();
    };
    let length = Reflect::get(&sources, &"length".into())
        .ok()
        .and_then(|length| length.as_f64())
        .unwrap_or(0.0) as u32;
    (0..length)
        .filter_map(|index| Reflect::get_u32(&sources, index).ok())
        .filter(|source| !source.is_undefined() && !source.is_null())
        .map(|source| {
            let handedness = Reflect::get(&source, &"handedness".into())
                .ok()
                .and_then(|value| value.as_string())
                .map(|name| Handedness::from_name(&name))
                .unwrap_or_default();
            let axes = Reflect::get(&source, &"gamepad".into())
                .ok()
                .filter(|gamepad| !gamepad.is_undefined() && !gamepad.is_null())
                .and_then(|gamepad| Reflect::get(&gamepad, &"axes".into()).ok())
                .filter(|axes| !axes.is_undefined() && !axes.is_null())
                .map(|axes| {
                    Array::from(&axes)
                        .iter()
                        .map(|value| value.as_f64().unwrap_or(0.0) as f32)
                        .collect()
                });
            XrInputSource { handedness, axes }
        })
        .collect()
}
