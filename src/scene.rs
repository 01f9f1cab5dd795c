//! The castle scene: sky dome, a hidden sun with its glow, the ground and the castle model.

use std::f32::consts::FRAC_PI_2;

use cgmath::{EuclideanSpace, Quaternion, Rad, Rotation3, Vector3};

use crate::{
    data_structures::{
        instance::Instance,
        model::Model,
        primitives,
        scene_graph::{ModelNode, SceneNode, Shadows, enable_shadows},
    },
    pipelines::sky::SkyDome,
    render::Render,
    resources::texture::colour_material,
    settings::ViewerSettings,
};

pub struct CastleScene {
    pub sky: SkyDome,
    pub sun: ModelNode,
    pub sun_glow: ModelNode,
    pub ground: ModelNode,
    pub castle: Option<Box<dyn SceneNode>>,
}

impl CastleScene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        sky_layout: &wgpu::BindGroupLayout,
        settings: &ViewerSettings,
    ) -> Self {
        let sky = SkyDome::new(device, sky_layout, &settings.sky);

        let sun_settings = &settings.sun;
        let mk_sun = |name: &str, radius: f32, opacity: f32| {
            let geometry = primitives::sphere(radius, sun_settings.segments, sun_settings.segments);
            let material = colour_material(
                device,
                queue,
                material_layout,
                name,
                sun_settings.colour,
                opacity,
            );
            let model = Model::single(device, name, &geometry.vertices, &geometry.indices, material);
            let mut node = ModelNode::from_model(Some(name.to_string()), device, model);
            node.set_local_transform(Instance::from(sun_settings.position.to_vec()));
            node.set_visible(sun_settings.visible);
            node.update_world_transform_all();
            node
        };
        let sun = mk_sun("sun", sun_settings.radius, sun_settings.opacity);
        let sun_glow = mk_sun("sun glow", sun_settings.glow_radius, sun_settings.glow_opacity);

        let ground_settings = &settings.ground;
        let geometry = primitives::plane(ground_settings.size, ground_settings.size, 1, 1);
        let material = colour_material(
            device,
            queue,
            material_layout,
            "ground",
            ground_settings.colour,
            ground_settings.opacity,
        );
        let model = Model::single(device, "ground", &geometry.vertices, &geometry.indices, material);
        let mut ground = ModelNode::from_model(Some("ground".to_string()), device, model);
        ground.set_local_transform(Instance {
            position: Vector3::new(0.0, ground_settings.height, 0.0),
            rotation: Quaternion::from_angle_x(Rad(-FRAC_PI_2)),
            scale: Vector3::new(1.0, 1.0, 1.0),
        });
        ground.set_shadows(Shadows {
            cast: false,
            receive: ground_settings.receive_shadow,
        });
        ground.update_world_transform_all();

        Self {
            sky,
            sun,
            sun_glow,
            ground,
            castle: None,
        }
    }

    /// Adds the loaded castle. Every mesh in it casts and receives shadows.
    pub fn set_castle(&mut self, mut castle: Box<dyn SceneNode>) {
        enable_shadows(castle.as_mut());
        castle.update_world_transform_all();
        self.castle = Some(castle);
    }

    pub fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        self.sun.write_to_buffers(queue);
        self.sun_glow.write_to_buffers(queue);
        self.ground.write_to_buffers(queue);
        if let Some(castle) = self.castle.as_mut() {
            castle.write_to_buffers(queue);
        }
    }

    pub fn render(&self) -> Render<'_> {
        let unlit = self
            .sun
            .get_render()
            .into_iter()
            .chain(self.sun_glow.get_render())
            .collect();
        Render::Composed(vec![
            self.sky.get_render(),
            Render::from(&self.ground as &dyn SceneNode),
            match self.castle.as_deref() {
                Some(castle) => Render::from(castle),
                None => Render::None,
            },
            Render::Unlit(unlit),
        ])
    }
}
