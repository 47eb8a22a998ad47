use std::f64::consts::TAU;

use anyhow::{anyhow, Result};
use glam::{Mat4, Vec3};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::common::{CameraParams, FrameView, LightParams};
use crate::console::DebugConsole;
use crate::scene::{Scene, SceneObject, Shape};

/// Width of the room area shown by the top-down view, in world units.
const VIEW_EXTENT: f64 = 6.0;
const CONSOLE_LINE_HEIGHT: f64 = 24.0;

/// Top-down renderer backed by a 2D canvas for WebAssembly builds.
pub struct Renderer {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    size: (u32, u32),
    background: String,
}

impl Renderer {
    /// Creates a renderer that draws into the provided HTML canvas element.
    pub async fn new(canvas: HtmlCanvasElement, scene: &Scene) -> Result<Self> {
        let context = canvas
            .get_context("2d")
            .map_err(|err| anyhow!("failed to query canvas context: {err:?}"))?
            .ok_or_else(|| anyhow!("canvas does not support 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| anyhow!("failed to cast canvas context"))?;

        let size = (canvas.width(), canvas.height());
        Ok(Self {
            canvas,
            context,
            size,
            background: css_color(scene.background, 1.0),
        })
    }

    pub fn aspect(&self) -> f32 {
        self.size.0 as f32 / self.size.1.max(1) as f32
    }

    /// Updates the canvas dimensions to match the browser layout.
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 == 0 || new_size.1 == 0 {
            return;
        }
        self.size = new_size;
        self.canvas.set_width(new_size.0);
        self.canvas.set_height(new_size.1);
    }

    /// The top-down view has a fixed projection, so camera and lights are ignored.
    pub fn update_globals(&self, _camera: &CameraParams, _light: &LightParams) {}

    /// Draws the room from above, the avatar as an arrow and the console panel.
    pub fn render(&mut self, frame: &FrameView<'_>) -> Result<(), JsValue> {
        self.clear_background();

        let mut objects: Vec<&SceneObject> = frame.scene.objects.iter().collect();
        objects.sort_by(|a, b| a.world_position().y.total_cmp(&b.world_position().y));
        for object in objects {
            self.draw_object(object)?;
        }
        if let Some(model) = frame.avatar {
            self.draw_avatar(model);
        }
        self.draw_console(frame.console)
    }

    fn clear_background(&self) {
        self.context.set_fill_style(&self.background.as_str().into());
        self.context
            .fill_rect(0.0, 0.0, self.size.0 as f64, self.size.1 as f64);
    }

    fn scale(&self) -> f64 {
        self.size.0.min(self.size.1) as f64 / VIEW_EXTENT
    }

    /// World XZ to canvas pixels, +Z pointing down the screen.
    fn project(&self, point: Vec3) -> (f64, f64) {
        let scale = self.scale();
        (
            self.size.0 as f64 * 0.5 + point.x as f64 * scale,
            self.size.1 as f64 * 0.5 + point.z as f64 * scale,
        )
    }

    fn draw_object(&self, object: &SceneObject) -> Result<(), JsValue> {
        let world = object.world_matrix();
        let (x, y) = self.project(world.w_axis.truncate());
        let scale = self.scale();
        self.context
            .set_fill_style(&css_color(object.color, object.opacity).into());
        match object.shape {
            Shape::Box { size } => {
                let half_x = (world.x_axis.truncate() * size.x * 0.5).length() as f64 * scale;
                let half_z = (world.z_axis.truncate() * size.z * 0.5).length() as f64 * scale;
                let angle = (world.x_axis.z as f64).atan2(world.x_axis.x as f64);
                self.context.save();
                self.context.translate(x, y)?;
                self.context.rotate(angle)?;
                self.context
                    .fill_rect(-half_x, -half_z, half_x * 2.0, half_z * 2.0);
                self.context.restore();
            }
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                ..
            } => self.fill_circle(x, y, radius_top.max(radius_bottom) as f64 * scale)?,
            Shape::Cone { radius, .. }
            | Shape::Disc { radius, .. }
            | Shape::Icosahedron { radius } => {
                let footprint = world.x_axis.truncate().length().max(world.z_axis.truncate().length());
                self.fill_circle(x, y, (radius * footprint) as f64 * scale)?
            }
        }
        Ok(())
    }

    fn fill_circle(&self, x: f64, y: f64, radius: f64) -> Result<(), JsValue> {
        self.context.begin_path();
        self.context.arc(x, y, radius.max(1.0), 0.0, TAU)?;
        self.context.fill();
        Ok(())
    }

    fn draw_avatar(&self, model: Mat4) {
        let forward = model.z_axis.truncate() * 0.35;
        let side = model.x_axis.truncate() * 0.2;
        let origin = model.w_axis.truncate();
        let tip = self.project(origin + forward);
        let left = self.project(origin - forward * 0.6 + side);
        let right = self.project(origin - forward * 0.6 - side);

        self.context.set_fill_style(&"#8c9ec7".into());
        self.context.begin_path();
        self.context.move_to(tip.0, tip.1);
        self.context.line_to(left.0, left.1);
        self.context.line_to(right.0, right.1);
        self.context.close_path();
        self.context.fill();
    }

    fn draw_console(&self, console: &DebugConsole) -> Result<(), JsValue> {
        let height = 16.0 + console.len().max(1) as f64 * CONSOLE_LINE_HEIGHT;
        let width = (self.size.0 as f64 * 0.5).max(320.0);
        self.context.set_fill_style(&"rgba(0, 0, 0, 0.7)".into());
        self.context.fill_rect(0.0, 0.0, width, height);

        self.context.set_fill_style(&"white".into());
        self.context.set_font("20px monospace");
        for (index, line) in console.lines().enumerate() {
            self.context
                .fill_text(line, 10.0, 30.0 + index as f64 * CONSOLE_LINE_HEIGHT)?;
        }
        Ok(())
    }
}

fn css_color(color: Vec3, alpha: f32) -> String {
    let [r, g, b] = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round().to_array();
    format!("rgba({r}, {g}, {b}, {alpha})")
}
