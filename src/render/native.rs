use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use super::common::{CameraParams, FrameView, LightParams};
use super::console_text::{self, ConsoleRaster};
use crate::mesh::{self, Mesh};
use crate::scene::Scene;

const AVATAR_COLOR: Vec4 = Vec4::new(0.55, 0.62, 0.78, 1.0);
/// World size of the console plane, matching the texture's 2:1 aspect.
const CONSOLE_SIZE: Vec3 = Vec3::new(1.2, 0.6, 1.0);

/// GPU renderer backed by wgpu that draws the room, the avatar and the console plane.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    pipeline: wgpu::RenderPipeline,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    meshes: HashMap<String, MeshBuffers>,
    furniture: Vec<DrawItem>,
    avatar: Option<DrawItem>,
    console: DrawItem,
    console_pipeline: wgpu::RenderPipeline,
    console_texture: wgpu::Texture,
    console_bind_group: wgpu::BindGroup,
    console_raster: ConsoleRaster,
    /// Revision of the console buffer last uploaded to `console_texture`.
    console_revision: Option<u64>,
    clear_color: wgpu::Color,
}

impl Renderer {
    /// Initializes the GPU renderer and uploads the static room.
    pub async fn new(window: Arc<Window>, scene: &Scene) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("viewer-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor)
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("room-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let global_layout = uniform_layout::<GlobalUniform>(&device, "global-bind-layout");
        let object_layout = uniform_layout::<ObjectConstants>(&device, "object-bind-layout");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("room-pipeline-layout"),
            bind_group_layouts: &[&global_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global-uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global-bind-group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("room-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout()],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        let mut meshes = HashMap::new();
        let mut furniture = Vec::with_capacity(scene.objects.len());
        for object in &scene.objects {
            let key = object.shape.cache_key();
            meshes
                .entry(key.clone())
                .or_insert_with(|| MeshBuffers::from_mesh(&device, &object.shape.mesh(), &object.name));
            let color = object.color.extend(object.opacity);
            let item = DrawItem::new(&device, &object_layout, key, object.world_matrix(), color);
            item.write(&queue);
            furniture.push(item);
        }
        // Translucent parts last so the opaque room shows through them.
        furniture.sort_by(|a, b| b.color.w.total_cmp(&a.color.w));

        const CONSOLE_MESH: &str = "console-quad";
        meshes.insert(
            CONSOLE_MESH.to_string(),
            MeshBuffers::from_mesh(&device, &mesh::quad(1.0, 1.0), CONSOLE_MESH),
        );
        let console = DrawItem::new(
            &device,
            &object_layout,
            CONSOLE_MESH.to_string(),
            Mat4::IDENTITY,
            Vec4::ONE,
        );

        let console_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("console-texture"),
            size: wgpu::Extent3d {
                width: console_text::TEXTURE_WIDTH,
                height: console_text::TEXTURE_HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let console_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("console-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("console-texture-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let console_view = console_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let console_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("console-texture-bind-group"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&console_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&console_sampler),
                },
            ],
        });
        let console_pipeline = create_console_pipeline(
            &device,
            &[&global_layout, &object_layout, &texture_layout],
            surface_format,
        );

        let background = scene.background;
        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth,
            pipeline,
            global_buffer,
            global_bind_group,
            object_layout,
            meshes,
            furniture,
            avatar: None,
            console,
            console_pipeline,
            console_texture,
            console_bind_group,
            console_raster: ConsoleRaster::new(console_text::load_font()),
            console_revision: None,
            clear_color: wgpu::Color {
                r: background.x as f64,
                g: background.y as f64,
                b: background.z as f64,
                a: 1.0,
            },
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Exposes the inner window for event handling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Uploads the avatar mesh once it has been loaded.
    pub fn set_avatar_mesh(&mut self, mesh: &Mesh) {
        const AVATAR_MESH: &str = "avatar";
        self.meshes.insert(
            AVATAR_MESH.to_string(),
            MeshBuffers::from_mesh(&self.device, mesh, AVATAR_MESH),
        );
        self.avatar = Some(DrawItem::new(
            &self.device,
            &self.object_layout,
            AVATAR_MESH.to_string(),
            Mat4::IDENTITY,
            AVATAR_COLOR,
        ));
    }

    pub fn has_avatar_mesh(&self) -> bool {
        self.avatar.is_some()
    }

    /// Updates the camera and lighting uniforms before rendering.
    pub fn update_globals(&self, camera: &CameraParams, light: &LightParams) {
        let uniform = GlobalUniform {
            view_proj: camera.view_proj.to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).into(),
            ambient: light.ambient.extend(1.0).into(),
            point_position: light.point_position.extend(light.point_range).into(),
            point_color: light.point_color.extend(light.point_intensity).into(),
            sun_direction: light.sun_direction.extend(0.0).into(),
            sun_color: light.sun_color.extend(1.0).into(),
        };
        self.queue
            .write_buffer(&self.global_buffer, 0, bytes_of(&uniform));
    }

    /// Draws the room, the avatar when present and the console plane.
    pub fn render(&mut self, frame: &FrameView<'_>) -> Result<(), wgpu::SurfaceError> {
        if let (Some(item), Some(model)) = (self.avatar.as_mut(), frame.avatar) {
            item.model = model;
            item.write(&self.queue);
        }
        self.console.model = frame.console_transform * Mat4::from_scale(CONSOLE_SIZE);
        self.console.write(&self.queue);
        self.upload_console(frame);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("viewer-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("room-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.global_bind_group, &[]);

            let avatar = frame.avatar.and(self.avatar.as_ref());
            let opaque_end = self.furniture.partition_point(|item| item.color.w >= 1.0);
            let (opaque, translucent) = self.furniture.split_at(opaque_end);
            let items = opaque
                .iter()
                .chain(avatar)
                .chain(translucent);
            for item in items {
                self.draw_item(&mut pass, item);
            }

            pass.set_pipeline(&self.console_pipeline);
            pass.set_bind_group(0, &self.global_bind_group, &[]);
            pass.set_bind_group(2, &self.console_bind_group, &[]);
            self.draw_item(&mut pass, &self.console);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn draw_item(&self, pass: &mut wgpu::RenderPass<'_>, item: &DrawItem) {
        let Some(mesh) = self.meshes.get(&item.mesh) else {
            return;
        };
        pass.set_vertex_buffer(0, mesh.vertex.slice(..));
        pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
        pass.set_bind_group(1, &item.bind_group, &[]);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    /// Redraws the console texture when the buffer changed since the last upload.
    fn upload_console(&mut self, frame: &FrameView<'_>) {
        let revision = frame.console.revision();
        if self.console_revision == Some(revision) {
            return;
        }
        self.console_revision = Some(revision);
        let pixels = self.console_raster.render(frame.console.lines());
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.console_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(console_text::TEXTURE_WIDTH * 4),
                rows_per_image: Some(console_text::TEXTURE_HEIGHT),
            },
            wgpu::Extent3d {
                width: console_text::TEXTURE_WIDTH,
                height: console_text::TEXTURE_HEIGHT,
                depth_or_array_layers: 1,
            },
        );
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
    wgpu::VertexBufferLayout {
        array_stride: (Mesh::STRIDE * std::mem::size_of::<f32>()) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Unlit textured pipeline for the console plane; tests depth but never writes it.
fn create_console_pipeline(
    device: &wgpu::Device,
    layouts: &[&wgpu::BindGroupLayout],
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("console-shader"),
        source: wgpu::ShaderSource::Wgsl(CONSOLE_SHADER.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("console-pipeline-layout"),
        bind_group_layouts: layouts,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("console-pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

fn uniform_layout<T>(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }],
    })
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    [
        matrix.x_axis.extend(0.0).to_array(),
        matrix.y_axis.extend(0.0).to_array(),
        matrix.z_axis.extend(0.0).to_array(),
    ]
}

/// One drawn object: its mesh, transform and a uniform buffer holding both.
struct DrawItem {
    mesh: String,
    model: Mat4,
    color: Vec4,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl DrawItem {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        mesh: String,
        model: Mat4,
        color: Vec4,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object-uniform"),
            size: std::mem::size_of::<ObjectConstants>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object-bind-group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            mesh,
            model,
            color,
            buffer,
            bind_group,
        }
    }

    fn write(&self, queue: &wgpu::Queue) {
        let normal = Mat3::from_mat4(self.model).inverse().transpose();
        let constants = ObjectConstants {
            model: self.model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            color: self.color.into(),
        };
        queue.write_buffer(&self.buffer, 0, bytes_of(&constants));
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    ambient: [f32; 4],
    point_position: [f32; 4],
    point_color: [f32; 4],
    sun_direction: [f32; 4],
    sun_color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ObjectConstants {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    color: [f32; 4],
}

const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    // xyz position, w range (0 = unlimited)
    point_position: vec4<f32>,
    // rgb color, w intensity
    point_color: vec4<f32>,
    sun_direction: vec4<f32>,
    sun_color: vec4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;
    let world_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;
    out.normal = normalize(world_normal);
    return out;
}

const INV_PI: f32 = 0.31830988;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    var normal = normalize(input.normal);
    if (dot(normal, globals.camera_position.xyz - input.world_pos) < 0.0) {
        normal = -normal;
    }

    var irradiance = globals.ambient.rgb;

    let to_point = globals.point_position.xyz - input.world_pos;
    let distance = max(length(to_point), 0.0001);
    var falloff = globals.point_color.w / max(distance * distance, 0.01);
    if (globals.point_position.w > 0.0) {
        let window = clamp(1.0 - pow(distance / globals.point_position.w, 4.0), 0.0, 1.0);
        falloff = falloff * window * window;
    }
    irradiance += globals.point_color.rgb * falloff * max(dot(normal, to_point / distance), 0.0);

    let to_sun = normalize(-globals.sun_direction.xyz);
    irradiance += globals.sun_color.rgb * max(dot(normal, to_sun), 0.0);

    let lit = object.color.rgb * irradiance * INV_PI;
    return vec4<f32>(lit, object.color.a);
}
"#;

const CONSOLE_SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

@group(2) @binding(0)
var console_texture: texture_2d<f32>;
@group(2) @binding(1)
var console_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = globals.view_proj * object.model * vec4<f32>(input.position, 1.0);
    // The unit quad spans -0.5..0.5; texture rows run top to bottom.
    out.uv = vec2<f32>(input.position.x + 0.5, 0.5 - input.position.y);
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(console_texture, console_sampler, input.uv) * object.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 160);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 128);
    }

    #[test]
    fn console_plane_matches_texture_aspect() {
        let texture = console_text::TEXTURE_WIDTH as f32 / console_text::TEXTURE_HEIGHT as f32;
        assert!((CONSOLE_SIZE.x / CONSOLE_SIZE.y - texture).abs() < 1e-6);
    }

    #[test]
    fn normal_matrix_is_padded_per_column() {
        let packed = mat3_to_3x4(Mat3::from_diagonal(glam::Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(packed[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(packed[1], [0.0, 2.0, 0.0, 0.0]);
        assert_eq!(packed[2], [0.0, 0.0, 3.0, 0.0]);
    }
}
