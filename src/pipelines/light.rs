//! The light rig as the lit shaders see it.
//!
//! All lights of the scene are packed into a single uniform together with the shadow
//! camera and the tone mapping parameters. The shadow map and its comparison sampler
//! live in the same bind group.

use anyhow::bail;
use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::Texture,
    pipelines::shadow::directional_shadow_matrix,
    settings::{
        DirectionalLightSettings, HemisphereLightSettings, LightSettings, MAX_DIRECTIONAL_LIGHTS,
        MAX_HEMISPHERE_LIGHTS, RendererSettings, ToneMapping,
    },
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightRaw {
    /// Unit vector from the lit point toward the light.
    pub direction: [f32; 3],
    pub intensity: f32,
    pub colour: [f32; 3],
    pub casts_shadow: f32,
}

impl From<&DirectionalLightSettings> for DirectionalLightRaw {
    fn from(light: &DirectionalLightSettings) -> Self {
        let to_light = light.position - light.target;
        let direction = if to_light.magnitude2() > f32::EPSILON {
            to_light.normalize()
        } else {
            cgmath::Vector3::unit_y()
        };
        Self {
            direction: direction.into(),
            intensity: light.intensity,
            colour: light.colour.to_array(),
            casts_shadow: if light.shadow.is_some() { 1.0 } else { 0.0 },
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HemisphereLightRaw {
    pub sky_colour: [f32; 3],
    pub intensity: f32,
    pub ground_colour: [f32; 3],
    // uniforms require 16 byte spacing
    pub _padding: f32,
}

impl From<&HemisphereLightSettings> for HemisphereLightRaw {
    fn from(light: &HemisphereLightSettings) -> Self {
        Self {
            sky_colour: light.sky_colour.to_array(),
            intensity: light.intensity,
            ground_colour: light.ground_colour.to_array(),
            _padding: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub directional: [DirectionalLightRaw; MAX_DIRECTIONAL_LIGHTS],
    pub hemisphere: [HemisphereLightRaw; MAX_HEMISPHERE_LIGHTS],
    /// Ambient colour premultiplied by its intensity.
    pub ambient: [f32; 3],
    pub exposure: f32,
    pub shadow_view_proj: [[f32; 4]; 4],
    /// Directional count, hemisphere count, tone mapping on, shadows on.
    pub counts: [u32; 4],
    /// Depth bias, shadow map texel size.
    pub shadow_params: [f32; 4],
}

impl LightUniform {
    pub fn new(lights: &LightSettings, renderer: &RendererSettings) -> anyhow::Result<Self> {
        if lights.directional.len() > MAX_DIRECTIONAL_LIGHTS {
            bail!("too many directional lights: {}", lights.directional.len());
        }
        if lights.hemisphere.len() > MAX_HEMISPHERE_LIGHTS {
            bail!("too many hemisphere lights: {}", lights.hemisphere.len());
        }

        let mut directional = [DirectionalLightRaw::default(); MAX_DIRECTIONAL_LIGHTS];
        for (raw, light) in directional.iter_mut().zip(&lights.directional) {
            *raw = light.into();
        }
        let mut hemisphere = [HemisphereLightRaw::default(); MAX_HEMISPHERE_LIGHTS];
        for (raw, light) in hemisphere.iter_mut().zip(&lights.hemisphere) {
            *raw = light.into();
        }

        let caster = lights.shadow_caster().filter(|_| renderer.shadows_enabled);
        let (shadow_view_proj, shadow_params) = match caster {
            Some((light, shadow)) => (
                directional_shadow_matrix(light.position, light.target, shadow),
                [shadow.bias, 1.0 / shadow.map_size.max(1) as f32, 0.0, 0.0],
            ),
            None => (Matrix4::identity(), [0.0; 4]),
        };

        Ok(Self {
            directional,
            hemisphere,
            ambient: lights
                .ambient
                .colour
                .scaled(lights.ambient.intensity)
                .to_array(),
            exposure: renderer.tone_mapping_exposure,
            shadow_view_proj: shadow_view_proj.into(),
            counts: [
                lights.directional.len() as u32,
                lights.hemisphere.len() as u32,
                (renderer.tone_mapping == ToneMapping::AcesFilmic) as u32,
                caster.is_some() as u32,
            ],
            shadow_params,
        })
    }

    pub fn shadows_enabled(&self) -> bool {
        self.counts[3] != 0
    }

    pub fn shadow_view_proj(&self) -> Matrix4<f32> {
        self.shadow_view_proj.into()
    }

    /// Diffuse irradiance the shader computes for a surface normal, without shadows.
    pub fn irradiance(&self, normal: Vector3<f32>) -> [f32; 3] {
        let normal = normal.normalize();
        let mut total = self.ambient;
        for light in &self.directional[..self.counts[0] as usize] {
            let dot = normal.dot(light.direction.into()).max(0.0);
            for (sum, channel) in total.iter_mut().zip(light.colour) {
                *sum += channel * light.intensity * dot;
            }
        }
        for light in &self.hemisphere[..self.counts[1] as usize] {
            let weight = 0.5 * normal.y + 0.5;
            for ((sum, sky), ground) in total
                .iter_mut()
                .zip(light.sky_colour)
                .zip(light.ground_colour)
            {
                *sum += (ground + (sky - ground) * weight) * light.intensity;
            }
        }
        total
    }
}

/// Specular response the lit shader adds per directional light for metallic-roughness
/// materials. All directions point away from the surface.
pub fn brdf_ggx(
    normal: Vector3<f32>,
    view_dir: Vector3<f32>,
    light_dir: Vector3<f32>,
    roughness: f32,
    f0: [f32; 3],
) -> [f32; 3] {
    let alpha = roughness.max(0.0525).powi(2);
    let a2 = alpha * alpha;
    let half_sum = light_dir + view_dir;
    let half_dir = half_sum / half_sum.magnitude2().max(1e-8).sqrt();
    let n_dot_l = normal.dot(light_dir).clamp(0.0, 1.0);
    let n_dot_v = normal.dot(view_dir).clamp(0.0, 1.0);
    let n_dot_h = normal.dot(half_dir).clamp(0.0, 1.0);
    let v_dot_h = view_dir.dot(half_dir).clamp(0.0, 1.0);

    let gv = n_dot_l * (a2 + (1.0 - a2) * n_dot_v * n_dot_v).sqrt();
    let gl = n_dot_v * (a2 + (1.0 - a2) * n_dot_l * n_dot_l).sqrt();
    let visibility = 0.5 / (gv + gl).max(1e-6);
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    let distribution = a2 / (std::f32::consts::PI * denom * denom);
    f0.map(|f0| (f0 + (1.0 - f0) * (1.0 - v_dot_h).powi(5)) * visibility * distribution)
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

/// The light uniform, the shadow map it samples and the bind group tying them together.
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub shadow_map: Texture,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    /// `shadow_map_size` is the already clamped edge length; a 1x1 map is bound when
    /// shadows are off so the layout stays the same.
    pub fn new(
        device: &wgpu::Device,
        uniform: LightUniform,
        shadow_map_size: u32,
    ) -> anyhow::Result<Self> {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let size = if uniform.shadows_enabled() {
            shadow_map_size.max(1)
        } else {
            1
        };
        let shadow_map = Texture::create_shadow_map(device, size);
        let Some(sampler) = shadow_map.sampler.as_ref() else {
            bail!("shadow map was created without a comparison sampler");
        };
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("light_bind_group"),
        });

        Ok(Self {
            uniform,
            buffer,
            shadow_map,
            bind_group,
            bind_group_layout,
        })
    }
}
