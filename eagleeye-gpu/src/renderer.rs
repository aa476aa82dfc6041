use crate::device::GpuContext;
use bytemuck::{Pod, Zeroable};
use eagleeye_core::{Error, Result};
use nalgebra::Matrix4;
use std::sync::Arc;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Position and colour of one point instance or one axis line endpoint
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl PointVertex {
    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout descriptor
    pub fn desc(step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            step_mode,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Camera uniform data
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    params: [f32; 4],
}

/// Per-frame inputs the renderer cannot derive itself
#[derive(Debug, Clone, Copy)]
pub struct FrameUniforms {
    pub view_proj: Matrix4<f32>,
    /// Transform of the point object; axis lines are drawn untransformed
    pub model: Matrix4<f32>,
    pub point_size: f32,
}

/// A vertex buffer that is destroyed as soon as its owner drops it.
pub struct GpuBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl GpuBuffer {
    fn upload(context: &GpuContext, label: &str, vertices: &[PointVertex]) -> Option<Self> {
        if vertices.is_empty() {
            return None;
        }
        let buffer = context.create_buffer_init(label, vertices, wgpu::BufferUsages::VERTEX);
        Some(Self {
            buffer,
            count: vertices.len() as u32,
        })
    }

    /// Number of vertices held
    pub(crate) fn len(&self) -> u32 {
        self.count
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
    }
}

/// Renders one point object plus an optional axes marker into a window.
pub struct PointCloudRenderer {
    context: GpuContext,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    point_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    points: Option<GpuBuffer>,
    axes: Option<GpuBuffer>,
    revision: Option<u64>,
    clear_color: wgpu::Color,
}

impl PointCloudRenderer {
    /// Create new point cloud renderer
    pub async fn new(window: Arc<Window>, clear_color: [f32; 3]) -> Result<Self> {
        let size = window.inner_size();
        let (context, surface) = GpuContext::for_window(window).await?;
        let surface_config = context.surface_config(&surface, size.width, size.height)?;
        surface.configure(&context.device, &surface_config);

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: std::mem::size_of::<SceneUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = context.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
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

        let uniform_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = context.create_shader_module(
            "Point Cloud Shader",
            include_str!("shaders/point_cloud.wgsl"),
        );

        let layout = context.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Cloud Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let point_pipeline = create_pipeline(
            &context.device,
            &layout,
            &shader,
            surface_config.format,
            PipelineKind::Points,
        );
        let line_pipeline = create_pipeline(
            &context.device,
            &layout,
            &shader,
            surface_config.format,
            PipelineKind::Lines,
        );

        let depth_view = create_depth_view(&context.device, &surface_config);

        Ok(Self {
            context,
            surface,
            surface_config,
            point_pipeline,
            line_pipeline,
            uniform_buffer,
            uniform_bind_group,
            depth_view,
            points: None,
            axes: None,
            revision: None,
            clear_color: wgpu::Color {
                r: clear_color[0] as f64,
                g: clear_color[1] as f64,
                b: clear_color[2] as f64,
                a: 1.0,
            },
        })
    }

    /// Surface size in physical pixels
    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Revision of the geometry currently on the GPU
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    /// Replace the GPU geometry with a new scene revision. The previous
    /// buffers are destroyed before the new ones are created.
    pub fn upload(&mut self, revision: u64, points: &[PointVertex], axes: &[PointVertex]) {
        self.release_geometry();
        self.points = GpuBuffer::upload(&self.context, "Point Instance Buffer", points);
        self.axes = GpuBuffer::upload(&self.context, "Axes Vertex Buffer", axes);
        self.revision = Some(revision);
        log::debug!(
            "Uploaded revision {}: {} points, {} axis vertices",
            revision,
            points.len(),
            axes.len()
        );
    }

    /// Drop all GPU geometry; the next frame clears to the background only.
    pub fn release_geometry(&mut self) {
        self.points = None;
        self.axes = None;
        self.revision = None;
    }

    /// Resize renderer surface
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.context.device, &self.surface_config);
            self.depth_view = create_depth_view(&self.context.device, &self.surface_config);
        }
    }

    fn write_uniforms(&self, frame: &FrameUniforms) {
        let aspect = self.surface_config.width as f32 / self.surface_config.height.max(1) as f32;
        let uniform = SceneUniform {
            view_proj: frame.view_proj.into(),
            model: frame.model.into(),
            params: [frame.point_size, aspect, 0.0, 0.0],
        };
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Draw one frame.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped; only
    /// running out of memory is reported as an error.
    pub fn render(&mut self, frame: &FrameUniforms) -> Result<()> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.context.device, &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface frame timed out");
                return Ok(());
            }
            Err(e) => return Err(Error::from(e)),
        };

        self.write_uniforms(frame);

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Point Cloud Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Cloud Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if let Some(points) = &self.points {
                render_pass.set_pipeline(&self.point_pipeline);
                render_pass.set_vertex_buffer(0, points.buffer.slice(..));
                render_pass.draw(0..6, 0..points.len());
            }

            if let Some(axes) = &self.axes {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, axes.buffer.slice(..));
                render_pass.draw(0..axes.len(), 0..1);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[derive(Clone, Copy)]
enum PipelineKind {
    Points,
    Lines,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    kind: PipelineKind,
) -> wgpu::RenderPipeline {
    let (label, entry_point, step_mode, topology) = match kind {
        PipelineKind::Points => (
            "Point Sprite Pipeline",
            "vs_point",
            wgpu::VertexStepMode::Instance,
            wgpu::PrimitiveTopology::TriangleList,
        ),
        PipelineKind::Lines => (
            "Axes Line Pipeline",
            "vs_line",
            wgpu::VertexStepMode::Vertex,
            wgpu::PrimitiveTopology::LineList,
        ),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point,
            buffers: &[PointVertex::desc(step_mode)],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
