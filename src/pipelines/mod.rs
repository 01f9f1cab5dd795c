//! Render pipelines of the viewer.
//!
//! - `basic`: opaque lit meshes, plus the shared pipeline builder
//! - `transparent`: alpha blended lit meshes
//! - `unlit`: flat coloured meshes (sun, glow)
//! - `sky`: the gradient dome
//! - `shadow`: depth-only pass from the shadow casting light
//! - `light`: the light rig uniform and shadow map binding

pub mod basic;
pub mod light;
pub mod shadow;
pub mod sky;
pub mod transparent;
pub mod unlit;

pub use basic::Target;

use crate::data_structures::model::MaterialPass;

/// Every pipeline the main pass switches between.
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub basic_double_sided: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
    pub transparent_double_sided: wgpu::RenderPipeline,
    pub unlit: wgpu::RenderPipeline,
    pub sky: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        target: Target,
        material_layout: &wgpu::BindGroupLayout,
        camera_layout: &wgpu::BindGroupLayout,
        light_layout: &wgpu::BindGroupLayout,
        sky_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let basic = |double_sided| {
            basic::mk_basic_pipeline(
                device,
                target,
                material_layout,
                camera_layout,
                light_layout,
                double_sided,
            )
        };
        let transparent = |double_sided| {
            transparent::mk_transparent_pipeline(
                device,
                target,
                material_layout,
                camera_layout,
                light_layout,
                double_sided,
            )
        };
        Self {
            basic: basic(false),
            basic_double_sided: basic(true),
            transparent: transparent(false),
            transparent_double_sided: transparent(true),
            unlit: unlit::mk_unlit_pipeline(device, target, material_layout, camera_layout),
            sky: sky::mk_sky_pipeline(device, target, camera_layout, sky_layout),
        }
    }

    /// The lit pipeline drawing materials of `pass`.
    pub fn lit(&self, pass: MaterialPass) -> &wgpu::RenderPipeline {
        match (pass.transparent, pass.double_sided) {
            (false, false) => &self.basic,
            (false, true) => &self.basic_double_sided,
            (true, false) => &self.transparent,
            (true, true) => &self.transparent_double_sided,
        }
    }
}
