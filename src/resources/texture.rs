use crate::{
    colour::Colour,
    data_structures::{
        model::{Material, MaterialPass, MaterialUniform},
        texture::Texture,
    },
};

/// Colour map, its sampler, the material uniform and the emissive map.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

/// An untextured Lambert material of a single colour. Opacity below one makes it transparent.
pub fn colour_material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    name: &str,
    colour: Colour,
    opacity: f32,
) -> Material {
    let white = Texture::create_solid(device, queue, [255; 4], name);
    Material::new(
        device,
        name,
        white.clone(),
        white,
        MaterialUniform::lambert(colour.with_alpha(opacity)),
        MaterialPass {
            transparent: opacity < 1.0,
            double_sided: false,
        },
        layout,
    )
}

/// Decodes image bytes, logging instead of failing so a broken texture only loses its map.
pub fn decode_image(bytes: &[u8], label: &str) -> Option<image::DynamicImage> {
    match image::load_from_memory(bytes) {
        Ok(img) => Some(img),
        Err(err) => {
            log::warn!("could not decode texture {label}: {err}");
            None
        }
    }
}
