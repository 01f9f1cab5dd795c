//! Scene graph and hierarchical scene organization.
//!
//! A loaded glTF scene becomes a tree of [`SceneNode`]s: [`ContainerNode`]s for empty
//! transform nodes and [`ModelNode`]s for nodes that carry a mesh. Local transforms are
//! composed top-down into world transforms, which model nodes upload into their
//! per-instance vertex buffer.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{instance::Instance, model},
    render::{Instanced, Render},
};

/// Shadow participation of a node, mirroring `castShadow` / `receiveShadow`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Shadows {
    pub cast: bool,
    pub receive: bool,
}

impl Shadows {
    pub const BOTH: Shadows = Shadows {
        cast: true,
        receive: true,
    };
}

pub trait SceneNode {
    fn name(&self) -> Option<&str>;

    fn get_local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn get_world_transform(&self) -> &Instance;

    /// Recomputes this node's world transform from its parent's and recurses.
    fn update_world_transforms(&mut self, parent_world_transform: &Instance);

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn is_mesh(&self) -> bool;

    fn shadows(&self) -> Shadows;

    /// Only meaningful for mesh nodes; containers ignore it.
    fn set_shadows(&mut self, shadows: Shadows);

    fn is_visible(&self) -> bool;

    /// Invisible nodes hide their whole subtree.
    fn set_visible(&mut self, visible: bool);

    fn write_to_buffers(&mut self, queue: &wgpu::Queue);

    fn get_render(&self) -> Vec<Instanced<'_>>;

    /// Recomputes world transforms of the whole subtree treating `self` as a root.
    fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&Instance::default());
    }
}

/// Depth-first visit of `node` and all of its descendants.
pub fn traverse_mut(node: &mut dyn SceneNode, visit: &mut dyn FnMut(&mut dyn SceneNode)) {
    visit(node);
    for child in node.get_children_mut().iter_mut() {
        traverse_mut(child.as_mut(), visit);
    }
}

pub fn traverse(node: &dyn SceneNode, visit: &mut dyn FnMut(&dyn SceneNode)) {
    visit(node);
    for child in node.get_children() {
        traverse(child.as_ref(), visit);
    }
}

/// Makes every mesh in the subtree cast and receive shadows.
pub fn enable_shadows(node: &mut dyn SceneNode) {
    traverse_mut(node, &mut |node: &mut dyn SceneNode| {
        if node.is_mesh() {
            node.set_shadows(Shadows::BOTH);
        }
    });
}

pub struct ContainerNode {
    name: Option<String>,
    pub children: Vec<Box<dyn SceneNode>>,
    local: Instance,
    world: Instance,
    visible: bool,
}

impl ContainerNode {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            children: vec![],
            local: Instance::default(),
            world: Instance::default(),
            visible: true,
        }
    }
}

impl SceneNode for ContainerNode {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn get_world_transform(&self) -> &Instance {
        &self.world
    }

    fn update_world_transforms(&mut self, parent_world_transform: &Instance) {
        self.world = parent_world_transform * &self.local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn is_mesh(&self) -> bool {
        false
    }

    fn shadows(&self) -> Shadows {
        Shadows::default()
    }

    fn set_shadows(&mut self, _: Shadows) {}

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue));
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        if !self.visible {
            return Vec::new();
        }
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .collect()
    }
}

pub struct ModelNode {
    name: Option<String>,
    children: Vec<Box<dyn SceneNode>>,
    instance_buffer: wgpu::Buffer,
    local: Instance,
    world: Instance,
    shadows: Shadows,
    visible: bool,
    needs_upload: bool,
    model: model::Model,
}

impl ModelNode {
    pub fn from_model(name: Option<String>, device: &wgpu::Device, model: model::Model) -> Self {
        let world = Instance::default();
        let shadows = Shadows::default();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&[world.to_raw(shadows.receive)]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            name,
            children: vec![],
            instance_buffer,
            local: Instance::default(),
            world,
            shadows,
            visible: true,
            needs_upload: false,
            model,
        }
    }
}

impl SceneNode for ModelNode {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn get_world_transform(&self) -> &Instance {
        &self.world
    }

    fn update_world_transforms(&mut self, parent_world_transform: &Instance) {
        let world = parent_world_transform * &self.local;
        if world != self.world {
            self.world = world;
            self.needs_upload = true;
        }
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn is_mesh(&self) -> bool {
        true
    }

    fn shadows(&self) -> Shadows {
        self.shadows
    }

    fn set_shadows(&mut self, shadows: Shadows) {
        if shadows.receive != self.shadows.receive {
            self.needs_upload = true;
        }
        self.shadows = shadows;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        if self.needs_upload {
            let raw = self.world.to_raw(self.shadows.receive);
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&[raw]));
            self.needs_upload = false;
        }
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue));
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        if !self.visible {
            return Vec::new();
        }
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .chain([Instanced {
                instance: &self.instance_buffer,
                model: &self.model,
                amount: 1,
                cast_shadow: self.shadows.cast,
            }])
            .collect()
    }
}

impl<'a> From<&'a dyn SceneNode> for Render<'a> {
    fn from(node: &'a dyn SceneNode) -> Self {
        let (transparents, defaults): (Vec<_>, Vec<_>) = node
            .get_render()
            .into_iter()
            .partition(|instanced| instanced.model.is_transparent());
        Render::Composed(vec![
            Render::Defaults(defaults),
            Render::Transparents(transparents),
        ])
    }
}
