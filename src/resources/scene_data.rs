//! glTF documents turned into plain CPU side scene data.
//!
//! Nothing in here touches the GPU, which keeps the parsing testable without a device.
//! [`super::upload_gltf`] uploads the result.

use anyhow::{Context, bail};
use cgmath::{InnerSpace, Quaternion, Vector3};

use crate::data_structures::{
    instance::Instance,
    model::{MaterialPass, MaterialUniform, ModelVertex},
};

#[derive(Clone, Debug)]
pub struct NodeData {
    pub name: Option<String>,
    pub transform: Instance,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct PrimitiveData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Index into [`SceneData::materials`], `None` for the default material.
    pub material: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct MeshData {
    pub name: String,
    pub primitives: Vec<PrimitiveData>,
}

impl MeshData {
    /// Indices of the drawable primitives grouped by the pass their material needs.
    ///
    /// Groups come opaque before transparent and single before double sided.
    pub fn primitives_by_pass(&self, materials: &[MaterialData]) -> Vec<(MaterialPass, Vec<usize>)> {
        let default = MaterialData::default();
        let mut groups: Vec<(MaterialPass, Vec<usize>)> = Vec::new();
        for (i, primitive) in self.primitives.iter().enumerate() {
            if primitive.indices.is_empty() {
                continue;
            }
            let pass = primitive
                .material
                .and_then(|index| materials.get(index))
                .unwrap_or(&default)
                .pass();
            match groups.iter_mut().find(|(group, _)| *group == pass) {
                Some((_, primitives)) => primitives.push(i),
                None => groups.push((pass, vec![i])),
            }
        }
        groups.sort_by_key(|(pass, _)| (pass.transparent, pass.double_sided));
        groups
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialData {
    pub name: String,
    /// Linear RGBA, multiplied with the colour map.
    pub base_colour: [f32; 4],
    /// Index into the document's images.
    pub image: Option<usize>,
    pub transparent: bool,
    /// Fragments less opaque than this are discarded. Only set for `MASK` materials.
    pub alpha_cutoff: Option<f32>,
    /// Drawn without back face culling and lit from both sides.
    pub double_sided: bool,
    /// Linear RGB, multiplied with the emissive map.
    pub emissive: [f32; 3],
    pub emissive_image: Option<usize>,
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for MaterialData {
    /// The material glTF prescribes for primitives without one.
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_colour: [1.0; 4],
            image: None,
            transparent: false,
            alpha_cutoff: None,
            double_sided: false,
            emissive: [0.0; 3],
            emissive_image: None,
            metallic: 1.0,
            roughness: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneData {
    pub nodes: Vec<NodeData>,
    /// Nodes of the default scene (or the first one).
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

impl SceneData {
    /// `buffers` holds the data of every buffer of the document, in order.
    pub fn from_gltf(gltf: &gltf::Document, buffers: &[Vec<u8>]) -> anyhow::Result<Self> {
        if buffers.len() < gltf.buffers().len() {
            bail!(
                "document declares {} buffers but only {} were loaded",
                gltf.buffers().len(),
                buffers.len()
            );
        }

        let materials = gltf.materials().map(MaterialData::from).collect();

        let mut meshes = Vec::new();
        for mesh in gltf.meshes() {
            let name = mesh
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh {}", mesh.index()));
            let mut primitives = Vec::new();
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!(
                        "skipping primitive {} of {name}: mode {:?} is not supported",
                        primitive.index(),
                        primitive.mode()
                    );
                    continue;
                }
                let data = read_primitive(&primitive, buffers)
                    .with_context(|| format!("primitive {} of {name}", primitive.index()))?;
                primitives.push(data);
            }
            meshes.push(MeshData { name, primitives });
        }

        let nodes = gltf
            .nodes()
            .map(|node| {
                let (translation, rotation, scale) = node.transform().decomposed();
                NodeData {
                    name: node.name().map(str::to_string),
                    transform: Instance {
                        position: translation.into(),
                        rotation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
                        scale: scale.into(),
                    },
                    mesh: node.mesh().map(|mesh| mesh.index()),
                    children: node.children().map(|child| child.index()).collect(),
                }
            })
            .collect();

        let roots = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .map(|scene| scene.nodes().map(|node| node.index()).collect())
            .unwrap_or_default();

        Ok(Self {
            nodes,
            roots,
            meshes,
            materials,
        })
    }

    /// Index of a primitive's material. Primitives without one, or with one out of range,
    /// get the default material, which sits right after the document's own.
    pub fn material_index(&self, material: Option<usize>) -> usize {
        material
            .filter(|&index| index < self.materials.len())
            .unwrap_or(self.materials.len())
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|mesh| &mesh.primitives)
            .map(|primitive| primitive.vertices.len())
            .sum()
    }
}

impl From<gltf::Material<'_>> for MaterialData {
    fn from(material: gltf::Material<'_>) -> Self {
        use gltf::material::AlphaMode;

        let pbr = material.pbr_metallic_roughness();
        Self {
            name: material
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("material {}", material.index().unwrap_or(0))),
            base_colour: pbr.base_color_factor(),
            image: pbr
                .base_color_texture()
                .map(|info| info.texture().source().index()),
            transparent: material.alpha_mode() == AlphaMode::Blend,
            alpha_cutoff: (material.alpha_mode() == AlphaMode::Mask)
                .then(|| material.alpha_cutoff().unwrap_or(DEFAULT_ALPHA_CUTOFF)),
            double_sided: material.double_sided(),
            emissive: material.emissive_factor(),
            emissive_image: material
                .emissive_texture()
                .map(|info| info.texture().source().index()),
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
        }
    }
}

impl MaterialData {
    pub fn pass(&self) -> MaterialPass {
        MaterialPass {
            transparent: self.transparent,
            double_sided: self.double_sided,
        }
    }
}

impl From<&MaterialData> for MaterialUniform {
    fn from(data: &MaterialData) -> Self {
        let [r, g, b] = data.emissive;
        Self {
            base_colour: data.base_colour,
            emissive: [r, g, b, 0.0],
            params: [
                data.metallic.clamp(0.0, 1.0),
                data.roughness.clamp(0.0, 1.0),
                data.alpha_cutoff.unwrap_or(0.0).max(0.0),
                1.0,
            ],
        }
    }
}

/// Cutoff of `MASK` materials that don't name one.
pub const DEFAULT_ALPHA_CUTOFF: f32 = 0.5;

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[Vec<u8>],
) -> anyhow::Result<PrimitiveData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .context("primitive has no POSITION attribute")?
        .collect();
    let tex_coords: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|coords| coords.into_f32().collect())
        .unwrap_or_default();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if let Some(out_of_range) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        bail!(
            "index {out_of_range} is out of range for {} vertices",
            positions.len()
        );
    }
    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(normals) => normals.collect(),
        None => smooth_normals(&positions, &indices),
    };

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, &position)| ModelVertex {
            position,
            tex_coords: tex_coords.get(i).copied().unwrap_or_default(),
            normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
        })
        .collect();

    Ok(PrimitiveData {
        vertices,
        indices,
        material: primitive.material().index(),
    })
}

/// Area weighted vertex normals for meshes exported without them.
pub fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let (pa, pb, pc) = (
            Vector3::from(positions[a]),
            Vector3::from(positions[b]),
            Vector3::from(positions[c]),
        );
        let face = (pb - pa).cross(pc - pa);
        for i in [a, b, c] {
            sums[i] += face;
        }
    }
    sums.into_iter()
        .map(|sum| {
            if sum.magnitude2() > 0.0 {
                sum.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}
