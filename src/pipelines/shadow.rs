//! Shadow mapping for the one shadow casting directional light.
//!
//! The light looks from its position at its target through an orthographic frustum. Every
//! frame, shadow casters are drawn depth-only into the shadow map before the main pass,
//! which then samples it with a 3x3 percentage closer filter.

use cgmath::{InnerSpace, Matrix4, Point3, Vector3, ortho};
use wgpu::util::DeviceExt;

use crate::{
    camera::{CameraUniform, OPENGL_TO_WGPU_MATRIX, mk_bind_group_layout},
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    settings::ShadowSettings,
};

/// View projection of the light's orthographic shadow camera, in wgpu clip space.
pub fn directional_shadow_matrix(
    position: Point3<f32>,
    target: Point3<f32>,
    shadow: &ShadowSettings,
) -> Matrix4<f32> {
    let direction = target - position;
    // look_at degenerates when looking straight up or down
    let up = if direction.normalize().cross(Vector3::unit_y()).magnitude2() < 1e-6 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    let view = Matrix4::look_at_rh(position, target, up);
    let projection = ortho(
        shadow.left,
        shadow.right,
        shadow.bottom,
        shadow.top,
        shadow.near,
        shadow.far,
    );
    OPENGL_TO_WGPU_MATRIX * projection * view
}

/// GPU side of the shadow pass: the light's camera buffer and the depth-only pipelines.
pub struct ShadowResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub pipeline: wgpu::RenderPipeline,
    /// Casters with double sided materials block light with both faces.
    pub pipeline_double_sided: wgpu::RenderPipeline,
}

impl ShadowResources {
    pub fn new(device: &wgpu::Device, position: Point3<f32>, view_proj: Matrix4<f32>) -> Self {
        let uniform = CameraUniform::from_view_proj(position, view_proj);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let layout = mk_bind_group_layout(device, "shadow_camera_bind_group_layout");
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("shadow_camera_bind_group"),
        });
        let pipeline = mk_shadow_pipeline(device, &layout, false);
        let pipeline_double_sided = mk_shadow_pipeline(device, &layout, true);

        Self {
            uniform,
            buffer,
            bind_group,
            pipeline,
            pipeline_double_sided,
        }
    }

    /// Starts the depth-only pass that fills `shadow_map`.
    pub fn begin_pass<'a>(
        encoder: &'a mut wgpu::CommandEncoder,
        shadow_map: &'a Texture,
    ) -> wgpu::RenderPass<'a> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        })
    }

    pub fn pipeline_for(&self, double_sided: bool) -> &wgpu::RenderPipeline {
        if double_sided {
            &self.pipeline_double_sided
        } else {
            &self.pipeline
        }
    }
}

pub fn mk_shadow_pipeline(
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    double_sided: bool,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[Some(camera_bind_group_layout)],
        ..Default::default()
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Shadow Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[ModelVertex::desc(), InstanceRaw::desc()],
            compilation_options: Default::default(),
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: (!double_sided).then_some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: Some(true),
            depth_compare: Some(wgpu::CompareFunction::LessEqual),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
    })
}
