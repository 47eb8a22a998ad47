use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use log::{info, LevelFilter};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use room_viewer::app::{camera_params, light_params, map_winit_key, print_final_state};
use room_viewer::{
    shared_console, AssetLoader, ConsoleHandle, ConsoleLogger, FrameView, InputState, KeyCode,
    Renderer, Scene, Simulation, ViewerConfig, ViewerError,
};

const DEFAULT_AVATAR: &str = "assets/avatar.obj";
const DEFAULT_ANIMATIONS: &str = "assets/animations.xml";

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    let console = shared_console(ViewerConfig::default().console_capacity);
    let forward = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .build();
    let level = forward.filter().max(LevelFilter::Info);
    if let Err(err) = ConsoleLogger::new(Arc::clone(&console), Box::new(forward), level).install() {
        eprintln!("Error: {err}");
    }

    if let Err(err) = run(console) {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run(console: ConsoleHandle) -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let scene = match &options.room {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read room {}", path.display()))?;
            Scene::from_xml(&xml).with_context(|| format!("failed to parse room {}", path.display()))?
        }
        None => Scene::default_room()?,
    };
    console.lock().set_capacity(scene.tuning.console_capacity);

    println!(
        "Loaded room with {} objects ({} lights)",
        scene.objects.len(),
        scene.lights.len()
    );

    if options.summary_only {
        return run_headless(&scene, &options, &console);
    }
    match run_interactive(&scene, &options, &console) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!(
                "{err}. Falling back to --summary-only mode (set DISPLAY or install a GPU driver to enable rendering)."
            );
            run_headless(&scene, &options, &console)
        }
        Err(err) => Err(err),
    }
}

fn run_headless(scene: &Scene, options: &CliOptions, console: &ConsoleHandle) -> Result<()> {
    let mut simulation = Simulation::new(scene.tuning.clone());
    let loader = AssetLoader::spawn(options.avatar.clone(), options.animations.clone());
    for event in loader.wait() {
        if let Err(err) = simulation.apply_asset_event(event) {
            err.report();
        }
    }

    let input = InputState::new(scene.tuning.joystick_radius);
    for key in &options.held {
        input.set_key_down(*key);
    }
    if let Some(vector) = options.joystick {
        input.set_joystick_vector(vector);
    }
    let snapshot = input.snapshot();
    for _ in 0..options.frames {
        simulation.frame(&snapshot, None, options.dt);
    }

    print_final_state(&simulation, &console.lock());
    Ok(())
}

fn run_interactive(scene: &Scene, options: &CliOptions, console: &ConsoleHandle) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(EventLoop::new);
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        ViewerError::RuntimeFault(payload_message(info.payload())).report();
        default_hook(info);
    }));

    let mut app = ViewerApp {
        scene: scene.clone(),
        simulation: Simulation::new(scene.tuning.clone()),
        input: InputState::new(scene.tuning.joystick_radius),
        console: Arc::clone(console),
        avatar_path: options.avatar.clone(),
        animations_path: options.animations.clone(),
        loader: None,
        renderer: None,
        last_frame: Instant::now(),
        init_error: None,
        last_error: None,
    };
    let result = event_loop.run_app(&mut app);
    drop(panic::take_hook());

    if let Some(err) = app.init_error {
        return Err(err.into());
    }
    result.context("event loop failed")?;
    if let Some(err) = app.last_error {
        return Err(err);
    }
    print_final_state(&app.simulation, &console.lock());
    Ok(())
}

struct ViewerApp {
    scene: Scene,
    simulation: Simulation,
    input: InputState,
    console: ConsoleHandle,
    avatar_path: PathBuf,
    animations_path: PathBuf,
    loader: Option<AssetLoader>,
    renderer: Option<Renderer>,
    last_frame: Instant,
    init_error: Option<WindowInitError>,
    last_error: Option<anyhow::Error>,
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("Room Viewer")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.init_error = Some(WindowInitError::from_error("window", err));
                event_loop.exit();
                return;
            }
        };
        match block_on(Renderer::new(window, &self.scene)) {
            Ok(renderer) => {
                self.renderer = Some(renderer);
                self.loader = Some(AssetLoader::spawn(
                    self.avatar_path.clone(),
                    self.animations_path.clone(),
                ));
                self.last_frame = Instant::now();
            }
            Err(err) => {
                self.init_error = Some(WindowInitError::from_error("renderer", format!("{err:#}")));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if window_id != renderer.window_id() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => renderer.resize(size),
            WindowEvent::KeyboardInput { event, .. } => {
                let Some(key) = map_winit_key(&event.logical_key) else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => self.input.set_key_down(key),
                    ElementState::Released => self.input.set_key_up(key),
                }
            }
            WindowEvent::RedrawRequested => {
                // The panic hook already logged the fault; keep rendering.
                match panic::catch_unwind(AssertUnwindSafe(|| self.redraw())) {
                    Ok(Err(err)) => {
                        self.last_error = Some(err);
                        event_loop.exit();
                    }
                    Ok(Ok(())) | Err(_) => {}
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            renderer.window().request_redraw();
        }
    }
}

impl ViewerApp {
    fn redraw(&mut self) -> Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };

        if let Some(loader) = &self.loader {
            for event in loader.poll() {
                if let Err(err) = self.simulation.apply_asset_event(event) {
                    err.report();
                }
            }
        }
        if !renderer.has_avatar_mesh() {
            if let Some(mesh) = self.simulation.avatar_mesh() {
                renderer.set_avatar_mesh(mesh);
            }
        }

        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.simulation.frame(&self.input.snapshot(), None, dt);

        let rig = self.simulation.follow();
        let camera = camera_params(&rig.camera, renderer.aspect(), self.simulation.config());
        renderer.update_globals(&camera, &light_params(&self.scene));

        let console = self.console.lock().clone();
        let frame = FrameView {
            scene: &self.scene,
            avatar: self.simulation.avatar().map(|avatar| avatar.model_matrix()),
            console_transform: rig.console.model_matrix(),
            console: &console,
        };
        match renderer.render(&frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = renderer.window().inner_size();
                renderer.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(anyhow!("GPU is out of memory")),
            Err(wgpu::SurfaceError::Timeout) => info!("Surface timeout; retrying next frame"),
            Err(other) => ViewerError::RuntimeFault(other.to_string()).report(),
        }
        Ok(())
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", payload_message(&*panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else {
        "unknown panic".into()
    }
}

const USAGE: &str = "Usage: room-viewer [--room <xml>] [--avatar <obj>] [--animations <xml>] \
[--summary-only] [--frames N] [--dt SECONDS] [--hold KEY]... [--joystick X,Y]";

#[derive(Debug)]
struct CliOptions {
    room: Option<PathBuf>,
    avatar: PathBuf,
    animations: PathBuf,
    summary_only: bool,
    frames: u32,
    dt: f32,
    held: Vec<KeyCode>,
    joystick: Option<Vec2>,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            room: None,
            avatar: PathBuf::from(DEFAULT_AVATAR),
            animations: PathBuf::from(DEFAULT_ANIMATIONS),
            summary_only: false,
            frames: 60,
            dt: 1.0 / 60.0,
            held: Vec::new(),
            joystick: None,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("{arg} expects a value\n{USAGE}"))
            };
            match arg.as_str() {
                "--room" => options.room = Some(PathBuf::from(value()?)),
                "--avatar" => options.avatar = PathBuf::from(value()?),
                "--animations" => options.animations = PathBuf::from(value()?),
                "--summary-only" => options.summary_only = true,
                "--frames" => {
                    options.frames = value()?.parse().context("--frames expects an integer")?
                }
                "--dt" => {
                    let dt: f32 = value()?.parse().context("--dt expects seconds")?;
                    if dt.is_nan() || dt < 0.0 {
                        bail!("--dt must not be negative");
                    }
                    options.dt = dt;
                }
                "--hold" => {
                    let key = value()?;
                    let code = KeyCode::from_dom_key(&key)
                        .ok_or_else(|| anyhow!("unknown key {key:?}"))?;
                    options.held.push(code);
                }
                "--joystick" => options.joystick = Some(parse_joystick(&value()?)?),
                other => bail!("Unknown argument: {other}\n{USAGE}"),
            }
        }
        Ok(options)
    }
}

fn parse_joystick(value: &str) -> Result<Vec2> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| anyhow!("--joystick expects X,Y"))?;
    let vector = Vec2::new(x.trim().parse()?, y.trim().parse()?);
    Ok(vector.clamp_length_max(1.0))
}
