#[macro_use]
mod common;

use castle_viewer::{
    data_structures::model::{MaterialPass, MaterialUniform},
    resources::scene_data::{MaterialData, SceneData, smooth_normals},
};
use cgmath::Vector3;

use crate::common::test_utils::{glb, materials_glb, triangle_glb};

fn parse(bytes: &[u8]) -> anyhow::Result<SceneData> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    let buffers: Vec<Vec<u8>> = gltf.blob.clone().into_iter().collect();
    SceneData::from_gltf(&gltf, &buffers)
}

#[test]
fn triangle_scene_is_parsed() {
    let scene = parse(&triangle_glb([0, 1, 2])).unwrap();

    assert_eq!(scene.roots, [0]);
    assert_eq!(scene.nodes.len(), 2);
    let keep = &scene.nodes[0];
    assert_eq!(keep.name.as_deref(), Some("keep"));
    assert_eq!(keep.mesh, Some(0));
    assert_eq!(keep.children, [1]);
    assert_eq!(keep.transform.position, Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(keep.transform.scale, Vector3::new(1.0, 1.0, 1.0));
    assert_eq!(scene.nodes[1].mesh, None);

    let mesh = &scene.meshes[0];
    assert_eq!(mesh.name, "wall");
    let primitive = &mesh.primitives[0];
    assert_eq!(primitive.indices, [0, 1, 2]);
    assert_eq!(primitive.material, Some(0));
    assert_eq!(scene.vertex_count(), 3);
    assert_eq!(primitive.vertices[1].position, [1.0, 0.0, 0.0]);
    // no TEXCOORD_0 in the file
    assert!(primitive.vertices.iter().all(|v| v.tex_coords == [0.0, 0.0]));
}

#[test]
fn node_rotation_keeps_gltf_component_order() {
    let scene = parse(&triangle_glb([0, 1, 2])).unwrap();
    let rotation = scene.nodes[0].transform.rotation;
    // glTF stores x, y, z, w
    assert_close!(rotation.s, std::f32::consts::FRAC_1_SQRT_2);
    assert_close!(rotation.v.x, 0.0);
    assert_close!(rotation.v.y, std::f32::consts::FRAC_1_SQRT_2);
    assert_close!(rotation.v.z, 0.0);
}

#[test]
fn missing_normals_are_generated() {
    let scene = parse(&triangle_glb([0, 1, 2])).unwrap();
    for vertex in &scene.meshes[0].primitives[0].vertices {
        assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
    }
}

#[test]
fn blended_materials_are_transparent() {
    let scene = parse(&triangle_glb([0, 1, 2])).unwrap();
    let glass = &scene.materials[0];
    assert_eq!(glass.name, "glass");
    assert!(glass.transparent);
    assert_eq!(glass.base_colour, [1.0, 1.0, 1.0, 0.5]);
    assert_eq!(glass.image, None);
}

#[test]
fn out_of_range_indices_are_rejected() {
    let err = parse(&triangle_glb([0, 1, 7])).unwrap_err();
    assert!(format!("{err:#}").contains("out of range"), "{err:#}");
}

#[test]
fn missing_buffers_are_rejected() {
    let bytes = triangle_glb([0, 1, 2]);
    let gltf = gltf::Gltf::from_slice(&bytes).unwrap();
    assert!(SceneData::from_gltf(&gltf, &[]).is_err());
}

#[test]
fn scenes_without_meshes_parse_empty() {
    let json = r#"{
  "asset": { "version": "2.0" },
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "name": "empty" }]
}"#;
    let scene = parse(&glb(json, &[])).unwrap();
    // no default scene, so the first one is used
    assert_eq!(scene.roots, [0]);
    assert!(scene.meshes.is_empty());
    assert_eq!(scene.vertex_count(), 0);
}

#[test]
fn garbage_is_not_gltf() {
    assert!(gltf::Gltf::from_slice(b"definitely not a castle").is_err());
}

#[test]
fn smooth_normals_average_shared_vertices() {
    // two triangles folded along the x axis, one facing +z and one facing +y
    let positions = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, -1.0],
        [5.0, 5.0, 5.0],
    ];
    let indices = [0, 1, 2, 0, 1, 3];
    let normals = smooth_normals(&positions, &indices);

    assert_eq!(normals[2], [0.0, 0.0, 1.0]);
    assert_eq!(normals[3], [0.0, 1.0, 0.0]);
    let shared = normals[0];
    assert_close!(shared[1], std::f32::consts::FRAC_1_SQRT_2);
    assert_close!(shared[2], std::f32::consts::FRAC_1_SQRT_2);
    // unused vertices point up
    assert_eq!(normals[4], [0.0, 1.0, 0.0]);
}

#[test]
fn masked_double_sided_materials_keep_their_cutoff() {
    let materials = r#"[
        { "name": "ivy", "alphaMode": "MASK", "alphaCutoff": 0.3, "doubleSided": true },
        { "name": "banner", "alphaMode": "MASK" }
    ]"#;
    let scene = parse(&materials_glb(materials, &[Some(0), Some(1)], "")).unwrap();

    let ivy = &scene.materials[0];
    assert_eq!(ivy.name, "ivy");
    assert!(!ivy.transparent);
    assert!(ivy.double_sided);
    assert_eq!(ivy.alpha_cutoff, Some(0.3));
    assert_eq!(
        ivy.pass(),
        MaterialPass {
            transparent: false,
            double_sided: true
        }
    );
    assert_ne!(*ivy, MaterialData { name: "ivy".to_string(), ..MaterialData::default() });

    let banner = &scene.materials[1];
    assert_eq!(banner.alpha_cutoff, Some(0.5));
    assert!(!banner.double_sided);
}

#[test]
fn emissive_and_metallic_roughness_are_read() {
    let materials = r#"[{
        "name": "torch",
        "emissiveFactor": [1, 0.5, 0],
        "emissiveTexture": { "index": 0 },
        "pbrMetallicRoughness": { "metallicFactor": 0.2, "roughnessFactor": 0.7 }
    }]"#;
    let extra = r#", "textures": [{ "source": 0 }], "images": [{ "uri": "flame.png" }]"#;
    let scene = parse(&materials_glb(materials, &[Some(0)], extra)).unwrap();

    let torch = &scene.materials[0];
    assert_eq!(torch.emissive, [1.0, 0.5, 0.0]);
    assert_eq!(torch.emissive_image, Some(0));
    assert_eq!(torch.image, None);
    assert_close!(torch.metallic, 0.2);
    assert_close!(torch.roughness, 0.7);
    assert_eq!(torch.alpha_cutoff, None);

    let uniform = MaterialUniform::from(torch);
    assert_eq!(uniform.emissive, [1.0, 0.5, 0.0, 0.0]);
    assert_close!(uniform.metallic(), 0.2);
    assert_close!(uniform.roughness(), 0.7);
    assert_eq!(uniform.alpha_cutoff(), None);
    assert!(uniform.is_physical());
}

#[test]
fn material_uniforms_carry_the_alpha_cutoff() {
    let ivy = MaterialData {
        alpha_cutoff: Some(0.3),
        ..MaterialData::default()
    };
    let uniform = MaterialUniform::from(&ivy);
    assert_eq!(uniform.alpha_cutoff(), Some(0.3));
    assert_eq!(uniform.params, [1.0, 1.0, 0.3, 1.0]);

    let ground = MaterialUniform::lambert([0.1, 0.2, 0.3, 0.9]);
    assert!(!ground.is_physical());
    assert_eq!(ground.alpha_cutoff(), None);
    assert_eq!(ground.metallic(), 0.0);
    assert_eq!(ground.emissive, [0.0; 4]);
}

#[test]
fn default_material_matches_gltf_defaults() {
    let default = MaterialData::default();
    assert_eq!(default.base_colour, [1.0; 4]);
    assert_eq!(default.metallic, 1.0);
    assert_eq!(default.roughness, 1.0);
    assert_eq!(default.emissive, [0.0; 3]);
    assert_eq!(default.pass(), MaterialPass::default());
}

#[test]
fn primitives_are_grouped_by_material_pass() {
    let materials = r#"[
        { "name": "stone" },
        { "name": "glass", "alphaMode": "BLEND" },
        { "name": "ivy", "alphaMode": "MASK", "doubleSided": true },
        { "name": "flag", "alphaMode": "BLEND", "doubleSided": true }
    ]"#;
    let scene = parse(&materials_glb(
        materials,
        &[Some(1), Some(0), Some(2), None, Some(0), Some(3)],
        "",
    ))
    .unwrap();

    let groups = scene.meshes[0].primitives_by_pass(&scene.materials);
    let pass = |transparent, double_sided| MaterialPass {
        transparent,
        double_sided,
    };
    assert_eq!(
        groups,
        [
            (pass(false, false), vec![1, 3, 4]),
            (pass(false, true), vec![2]),
            (pass(true, false), vec![0]),
            (pass(true, true), vec![5]),
        ]
    );
}

#[test]
fn missing_materials_resolve_to_the_default_slot() {
    let scene = parse(&materials_glb(r#"[{ "name": "stone" }]"#, &[Some(0)], "")).unwrap();
    assert_eq!(scene.material_index(Some(0)), 0);
    assert_eq!(scene.material_index(None), 1);
    assert_eq!(scene.material_index(Some(9)), 1);
}
