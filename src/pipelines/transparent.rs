use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::basic::{Target, mk_render_pipeline},
};

/**
 * Lit meshes whose material has an opacity below one, like the ground plane.
 *
 * Same shader as the opaque pipeline, only with alpha blending. Drawn after every
 * opaque mesh so that what's behind is already in the colour target.
 * Double sided materials get a variant without culling.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    target: Target,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
    double_sided: bool,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Transparent Pipeline Layout"),
        bind_group_layouts: &[
            Some(material_bind_group_layout),
            Some(camera_bind_group_layout),
            Some(light_bind_group_layout),
        ],
        ..Default::default()
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Transparent Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("model.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        target,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        (!double_sided).then_some(wgpu::Face::Back),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
