//! wgpu renderer for recorded frames.
//!
//! Every [`DrawCommand`] becomes plain coloured triangles:
//!
//! | Command | Geometry |
//! |---------|----------|
//! | Rect | one quad |
//! | Circle | triangle fan of [`CIRCLE_SEGMENTS`] slices |
//! | Line | quad along the segment, `thickness` wide |
//! | Text | one quad per lit 5x7 glyph pixel |
//! | Texture | the sprite's disc or square, tinted per texture |
//!
//! The camera is screen-space: canvas pixels with y pointing down, mapped
//! onto the whole window. Pixel scaling to the window happens in the
//! projection, so the canvas is never resampled.

use std::sync::Arc;

use sparkfly_ecs::canvas::{Color, TextureId};
use wgpu::util::DeviceExt;

use super::recorder::DrawCommand;
use super::text;

// ---------------------------------------------------------------------------
// Vertex
// ---------------------------------------------------------------------------

/// A single vertex with 2D position and RGBA color, sent to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck_derive::Pod, bytemuck_derive::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Camera2D
// ---------------------------------------------------------------------------

/// Screen-space orthographic camera over a `width` x `height` canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera2D {
    pub width: f32,
    pub height: f32,
}

impl Camera2D {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Column-major 4x4 matrix mapping canvas `(0, 0)` to the top-left of
    /// clip space and `(width, height)` to the bottom-right.
    pub fn orthographic_matrix(&self) -> [f32; 16] {
        let sx = 2.0 / self.width;
        let sy = -2.0 / self.height;
        [
            sx, 0.0, 0.0, 0.0, // column 0
            0.0, sy, 0.0, 0.0, // column 1
            0.0, 0.0, 1.0, 0.0, // column 2
            -1.0, 1.0, 0.0, 1.0, // column 3
        ]
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(480.0, 480.0)
    }
}

// ---------------------------------------------------------------------------
// Sprites
// ---------------------------------------------------------------------------

/// Slices per circle fan.
pub const CIRCLE_SEGMENTS: usize = 24;

/// How a texture handle is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    /// Side (or diameter) in canvas pixels.
    pub size: f32,
    pub color: [f32; 4],
    pub round: bool,
}

/// Sprite for each texture handle.
pub fn sprite_for(texture: TextureId) -> Sprite {
    let (size, hex, round) = match texture {
        TextureId::Fly => (8.0, 0xffe066ff, true),
        TextureId::Spark => (12.0, 0x66ccffff, true),
        TextureId::Insulator => (16.0, 0x8a7f70ff, false),
        TextureId::Minus => (14.0, 0x4477ffff, true),
        TextureId::Plus => (14.0, 0xff5544ff, true),
    };
    Sprite {
        size,
        color: Color::from_hex(hex).to_f32(),
        round,
    }
}

// ---------------------------------------------------------------------------
// Tessellation
// ---------------------------------------------------------------------------

fn push_quad(out: &mut Vec<Vertex>, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
    let corners = [[x, y], [x + w, y], [x + w, y + h], [x, y + h]];
    for i in [0, 1, 2, 0, 2, 3] {
        out.push(Vertex {
            position: corners[i],
            color,
        });
    }
}

fn push_circle(out: &mut Vec<Vertex>, cx: f32, cy: f32, r: f32, color: [f32; 4]) {
    let step = std::f32::consts::TAU / CIRCLE_SEGMENTS as f32;
    for i in 0..CIRCLE_SEGMENTS {
        let (a0, a1) = (i as f32 * step, (i + 1) as f32 * step);
        out.push(Vertex {
            position: [cx, cy],
            color,
        });
        out.push(Vertex {
            position: [cx + r * a0.cos(), cy + r * a0.sin()],
            color,
        });
        out.push(Vertex {
            position: [cx + r * a1.cos(), cy + r * a1.sin()],
            color,
        });
    }
}

fn push_line(out: &mut Vec<Vertex>, start: [f32; 2], end: [f32; 2], thickness: f32, color: [f32; 4]) {
    let (dx, dy) = (end[0] - start[0], end[1] - start[1]);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return;
    }
    let half = thickness.max(1.0) / 2.0;
    let (nx, ny) = (-dy / len * half, dx / len * half);
    let corners = [
        [start[0] + nx, start[1] + ny],
        [end[0] + nx, end[1] + ny],
        [end[0] - nx, end[1] - ny],
        [start[0] - nx, start[1] - ny],
    ];
    for i in [0, 1, 2, 0, 2, 3] {
        out.push(Vertex {
            position: corners[i],
            color,
        });
    }
}

/// Triangles for a recorded frame, plus the colour of its last clear.
///
/// Pure CPU work; the GPU only sees the result.
pub fn tessellate(commands: &[DrawCommand]) -> (Vec<Vertex>, [f32; 4]) {
    let mut vertices = Vec::new();
    let mut clear = Color::BLACK.to_f32();

    for cmd in commands {
        match cmd {
            DrawCommand::Clear(color) => {
                vertices.clear();
                clear = color.to_f32();
            }
            DrawCommand::Rect {
                top_left,
                width,
                height,
                color,
            } => push_quad(
                &mut vertices,
                top_left.x as f32,
                top_left.y as f32,
                *width as f32,
                *height as f32,
                color.to_f32(),
            ),
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => push_circle(
                &mut vertices,
                center.x as f32,
                center.y as f32,
                *radius as f32,
                color.to_f32(),
            ),
            DrawCommand::Line {
                start,
                end,
                color,
                thickness,
            } => push_line(
                &mut vertices,
                [start.x as f32, start.y as f32],
                [end.x as f32, end.y as f32],
                *thickness as f32,
                color.to_f32(),
            ),
            DrawCommand::Text {
                text: string,
                position,
                size,
                color,
                centered,
            } => {
                let scale = text::scale_for_size(*size);
                let mut origin = [position.x as f32, position.y as f32];
                if *centered {
                    origin[0] -= text::text_width(string, scale) / 2.0;
                    origin[1] -= text::text_height(scale) / 2.0;
                }
                let rgba = color.to_f32();
                for [x, y] in text::layout(string, origin, scale) {
                    push_quad(&mut vertices, x, y, scale, scale, rgba);
                }
            }
            DrawCommand::Texture {
                position,
                texture,
                centered,
            } => {
                let sprite = sprite_for(*texture);
                let half = sprite.size / 2.0;
                let (mut cx, mut cy) = (position.x as f32, position.y as f32);
                if !*centered {
                    cx += half;
                    cy += half;
                }
                if sprite.round {
                    push_circle(&mut vertices, cx, cy, half, sprite.color);
                } else {
                    push_quad(
                        &mut vertices,
                        cx - half,
                        cy - half,
                        sprite.size,
                        sprite.size,
                        sprite.color,
                    );
                }
            }
        }
    }

    (vertices, clear)
}

// ---------------------------------------------------------------------------
// DebugRenderer
// ---------------------------------------------------------------------------

/// Initial vertex buffer capacity; the buffer grows when a frame needs more.
const INITIAL_VERTICES: usize = 64 * 1024;

/// wgpu renderer that presents recorded frames.
///
/// Call [`DebugRenderer::new`] with an `Arc<winit::window::Window>`. This
/// performs async adapter/device selection, surface creation, and pipeline
/// setup; any failure is returned and the game does not start.
pub struct DebugRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    window: Arc<winit::window::Window>,
    pub camera: Camera2D,
}

impl DebugRenderer {
    /// Initialize wgpu for `window`, showing a `camera`-sized canvas.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable GPU adapter or device is available,
    /// or the surface cannot be created.
    pub async fn new(
        window: Arc<winit::window::Window>,
        camera: Camera2D,
    ) -> Result<Self, anyhow::Error> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("no suitable GPU adapter found"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("sparkfly_renderer"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("surface reports no texture formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sparkfly_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let camera_matrix = camera.orthographic_matrix();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_uniform"),
            contents: bytemuck::cast_slice(&camera_matrix),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sparkfly_pipeline_layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sparkfly_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let vertex_buffer = Self::create_vertex_buffer(&device, INITIAL_VERTICES);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            vertex_buffer,
            vertex_capacity: INITIAL_VERTICES,
            camera_buffer,
            camera_bind_group,
            window,
            camera,
        })
    }

    fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vertex_buffer"),
            size: (capacity * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Tessellate and present one recorded frame.
    ///
    /// # Errors
    ///
    /// Returns a [`wgpu::SurfaceError`] if the surface cannot provide an
    /// output texture (e.g., window minimized, surface lost).
    pub fn render(&mut self, commands: &[DrawCommand]) -> Result<(), wgpu::SurfaceError> {
        let camera_matrix = self.camera.orthographic_matrix();
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&camera_matrix));

        let (vertices, clear) = tessellate(commands);
        if vertices.len() > self.vertex_capacity {
            let capacity = vertices.len().next_power_of_two();
            tracing::debug!(capacity, "growing vertex buffer");
            self.vertex_buffer = Self::create_vertex_buffer(&self.device, capacity);
            self.vertex_capacity = capacity;
        }
        if !vertices.is_empty() {
            self.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sparkfly_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sparkfly_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(clear[0]),
                            g: f64::from(clear[1]),
                            b: f64::from(clear[2]),
                            a: f64::from(clear[3]),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

            let vertex_count = vertices.len() as u32;
            if vertex_count > 0 {
                render_pass.draw(0..vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Resize the surface when the window size changes. Zero-sized
    /// (minimised) windows are ignored.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn window(&self) -> &winit::window::Window {
        &self.window
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
