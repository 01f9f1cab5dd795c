//! Gradient sky dome.
//!
//! A large sphere around the origin, seen from the inside, whose colour blends from the
//! bottom colour at the horizon to the top colour overhead.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{ModelVertex, Vertex},
        primitives,
    },
    pipelines::basic::{Target, mk_render_pipeline},
    render::{Flat, Render},
    settings::SkySettings,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyUniform {
    pub top_colour: [f32; 3],
    pub offset: f32,
    pub bottom_colour: [f32; 3],
    pub exponent: f32,
}

impl SkyUniform {
    /// Colour of the dome at `world_position`, as computed by `sky.wgsl`.
    pub fn colour_at(&self, world_position: Vector3<f32>) -> [f32; 3] {
        let shifted = world_position + Vector3::new(self.offset, self.offset, self.offset);
        let h = shifted.normalize().y;
        let t = h.max(0.0).powf(self.exponent).max(0.0);
        let mut colour = [0.0; 3];
        for (i, channel) in colour.iter_mut().enumerate() {
            *channel = self.bottom_colour[i] + (self.top_colour[i] - self.bottom_colour[i]) * t;
        }
        colour
    }
}

impl From<&SkySettings> for SkyUniform {
    fn from(settings: &SkySettings) -> Self {
        Self {
            top_colour: settings.top_colour.to_array(),
            offset: settings.offset,
            bottom_colour: settings.bottom_colour.to_array(),
            exponent: settings.exponent,
        }
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("sky_bind_group_layout"),
    })
}

pub fn mk_sky_pipeline(
    device: &wgpu::Device,
    target: Target,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    sky_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sky Pipeline Layout"),
        bind_group_layouts: &[Some(camera_bind_group_layout), Some(sky_bind_group_layout)],
        ..Default::default()
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Sky Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("sky.wgsl").into()),
    };
    // inside of the sphere only
    mk_render_pipeline(
        device,
        &layout,
        target,
        Some(wgpu::BlendState::REPLACE),
        Some(wgpu::Face::Front),
        &[ModelVertex::desc()],
        shader,
    )
}

/// Sphere geometry and uniform of the sky.
pub struct SkyDome {
    pub uniform: SkyUniform,
    pub buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: usize,
}

impl SkyDome {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, settings: &SkySettings) -> Self {
        let geometry = primitives::sphere(
            settings.radius,
            settings.width_segments,
            settings.height_segments,
        );
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Vertex Buffer"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform = SkyUniform::from(settings);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("sky_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            vertex_buffer,
            index_buffer,
            num_indices: geometry.indices.len(),
        }
    }

    pub fn get_render(&self) -> Render<'_> {
        Render::Sky(Flat {
            vertex: &self.vertex_buffer,
            index: &self.index_buffer,
            group: &self.bind_group,
            amount: self.num_indices,
        })
    }
}
