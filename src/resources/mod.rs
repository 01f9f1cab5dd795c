//! Loading of external assets: fetching bytes, parsing glTF and uploading it to the GPU.

use anyhow::Context;
use futures::future::try_join_all;

use crate::{
    data_structures::{
        model::{Material, MaterialUniform, Mesh, Model},
        scene_graph::{ContainerNode, ModelNode, SceneNode},
        texture::Texture,
    },
    resources::{
        fetch::{Progress, load_binary_with_progress, load_uri},
        scene_data::{MaterialData, SceneData},
        texture::decode_image,
    },
};

pub mod fetch;
pub mod scene_data;
pub mod texture;

/// Everything needed to build GPU models from a glTF file, still on the CPU.
pub struct LoadedGltf {
    pub scene: SceneData,
    pub images: Vec<Option<image::DynamicImage>>,
}

/// Fetches and parses a `.glb`/`.gltf` file plus the buffers and images it references.
pub async fn fetch_gltf(
    root: &str,
    file_name: &str,
    on_progress: impl FnMut(Progress),
) -> anyhow::Result<LoadedGltf> {
    let bytes = load_binary_with_progress(root, file_name, on_progress).await?;
    let gltf = gltf::Gltf::from_slice(&bytes)
        .with_context(|| format!("{file_name} is not a valid glTF file"))?;

    let buffers = try_join_all(gltf.buffers().map(|buffer| {
        let blob = gltf.blob.as_deref();
        async move {
            match buffer.source() {
                gltf::buffer::Source::Bin => blob
                    .map(<[u8]>::to_vec)
                    .context("glTF binary chunk is missing"),
                gltf::buffer::Source::Uri(uri) => load_uri(root, file_name, uri).await,
            }
        }
    }))
    .await?;

    let images = try_join_all(gltf.images().map(|image| {
        let buffers = &buffers;
        async move {
            let label = image
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{file_name} image {}", image.index()));
            let decoded = match image.source() {
                gltf::image::Source::View { view, .. } => {
                    let start = view.offset();
                    let end = start + view.length();
                    match buffers
                        .get(view.buffer().index())
                        .and_then(|data| data.get(start..end))
                    {
                        Some(bytes) => decode_image(bytes, &label),
                        None => {
                            log::warn!("buffer view of {label} is out of range");
                            None
                        }
                    }
                }
                gltf::image::Source::Uri { uri, .. } => {
                    match load_uri(root, file_name, uri).await {
                        Ok(bytes) => decode_image(&bytes, &label),
                        Err(err) => {
                            log::warn!("could not load {label}: {err:#}");
                            None
                        }
                    }
                }
            };
            anyhow::Ok(decoded)
        }
    }))
    .await?;

    let scene = SceneData::from_gltf(&gltf, &buffers)?;
    log::info!(
        "parsed {file_name}: {} nodes, {} meshes, {} vertices",
        scene.nodes.len(),
        scene.meshes.len(),
        scene.vertex_count()
    );
    Ok(LoadedGltf { scene, images })
}

/// Uploads parsed glTF data and builds the scene graph of its default scene.
pub fn upload_gltf(
    loaded: &LoadedGltf,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_layout: &wgpu::BindGroupLayout,
    name: &str,
) -> Box<dyn SceneNode> {
    let textures: Vec<Option<Texture>> = loaded
        .images
        .iter()
        .enumerate()
        .map(|(i, img)| {
            img.as_ref().map(|img| {
                Texture::from_image(device, queue, img, Some(&format!("{name} texture {i}")))
            })
        })
        .collect();

    let mut materials: Vec<Material> = loaded
        .scene
        .materials
        .iter()
        .map(|data| upload_material(device, queue, material_layout, data, &textures))
        .collect();
    // `SceneData::material_index` points past the document's materials for the default one
    materials.push(upload_material(
        device,
        queue,
        material_layout,
        &MaterialData::default(),
        &textures,
    ));

    let mut root = ContainerNode::new(Some(name.to_string()));
    for &index in &loaded.scene.roots {
        if let Some(node) = build_node(index, loaded, device, &materials, 0) {
            root.add_child(node);
        }
    }
    root.update_world_transform_all();
    Box::new(root)
}

fn upload_material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    data: &MaterialData,
    textures: &[Option<Texture>],
) -> Material {
    // white keeps the factor alone when there is no map
    let map = |image: Option<usize>, kind: &str| {
        image
            .and_then(|image| textures.get(image).cloned().flatten())
            .unwrap_or_else(|| {
                Texture::create_solid(device, queue, [255; 4], &format!("{} {kind}", data.name))
            })
    };
    Material::new(
        device,
        &data.name,
        map(data.image, "colour"),
        map(data.emissive_image, "emissive"),
        MaterialUniform::from(data),
        data.pass(),
        layout,
    )
}

// glTF forbids cycles but nothing stops a broken file from containing one.
const MAX_DEPTH: usize = 64;

fn build_node(
    index: usize,
    loaded: &LoadedGltf,
    device: &wgpu::Device,
    materials: &[Material],
    depth: usize,
) -> Option<Box<dyn SceneNode>> {
    if depth > MAX_DEPTH {
        log::warn!("glTF node hierarchy deeper than {MAX_DEPTH}, cutting it off");
        return None;
    }
    let data = loaded.scene.nodes.get(index)?;

    let models = data
        .mesh
        .and_then(|mesh| loaded.scene.meshes.get(mesh))
        .map(|mesh| mesh_models(device, mesh, &loaded.scene, materials))
        .unwrap_or_default();

    let mut models = models.into_iter();
    let mut node: Box<dyn SceneNode> = match models.next() {
        Some(model) => Box::new(ModelNode::from_model(data.name.clone(), device, model)),
        None => Box::new(ContainerNode::new(data.name.clone())),
    };
    // the other material passes hang below with an identity transform
    for model in models {
        node.add_child(Box::new(ModelNode::from_model(data.name.clone(), device, model)));
    }
    node.set_local_transform(data.transform.clone());

    for &child in &data.children {
        if let Some(child) = build_node(child, loaded, device, materials, depth + 1) {
            node.add_child(child);
        }
    }
    Some(node)
}

/// Splits a mesh into one model per [`MaterialPass`] so each lands in the right pipeline.
fn mesh_models(
    device: &wgpu::Device,
    mesh: &scene_data::MeshData,
    scene: &SceneData,
    materials: &[Material],
) -> Vec<Model> {
    mesh.primitives_by_pass(&scene.materials)
        .into_iter()
        .map(|(_, primitives)| {
            let mut model = Model {
                meshes: vec![],
                materials: vec![],
            };
            // global material indices in local order
            let mut used: Vec<usize> = Vec::new();
            for i in primitives {
                let primitive = &mesh.primitives[i];
                let material_index = scene.material_index(primitive.material);
                let Some(material) = materials.get(material_index) else {
                    continue;
                };
                let local_material = match used.iter().position(|&used| used == material_index) {
                    Some(local) => local,
                    None => {
                        used.push(material_index);
                        model.materials.push(material.clone());
                        model.materials.len() - 1
                    }
                };
                model.meshes.push(Mesh::new(
                    device,
                    &format!("{} primitive {i}", mesh.name),
                    &primitive.vertices,
                    &primitive.indices,
                    local_material,
                ));
            }
            model
        })
        .filter(|model| !model.meshes.is_empty())
        .collect()
}
