//! Helpers shared by the integration tests.

/// Asserts that two floats are within `eps` of each other.
macro_rules! assert_close {
    ($left:expr, $right:expr) => {
        assert_close!($left, $right, 1e-4)
    };
    ($left:expr, $right:expr, $eps:expr) => {{
        let (left, right): (f32, f32) = ($left, $right);
        assert!(
            (left - right).abs() <= $eps,
            "{} = {left} is not close to {} = {right}",
            stringify!($left),
            stringify!($right)
        );
    }};
}

/// Packs a JSON document and a binary chunk into a `.glb` container. An empty `bin`
/// leaves the binary chunk out.
pub fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let bin_chunk = if bin.is_empty() { 0 } else { 8 + bin.len() };
    let total = 12 + 8 + json.len() + bin_chunk;
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    if !bin.is_empty() {
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
    }
    out
}

/// A `.glb` with one triangle in the XY plane and no normals.
///
/// Node 0 ("keep") holds the mesh, is translated by (1, 2, 3), rotated 90 degrees about y
/// and has node 1 ("tower") as its only child. The mesh uses a half transparent blended
/// material called "glass".
pub fn triangle_glb(indices: [u16; 3]) -> Vec<u8> {
    let (json, bin) = triangle_gltf(indices, None);
    glb(&json, &bin)
}

/// JSON and binary buffer of the triangle scene. With `external` set the buffer is
/// referenced by that URI and an image pointing at a missing file is declared as well.
pub fn triangle_gltf(indices: [u16; 3], external: Option<&str>) -> (String, Vec<u8>) {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let mut bin = Vec::new();
    for position in positions {
        for component in position {
            bin.extend_from_slice(&component.to_le_bytes());
        }
    }
    for index in indices {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    let (buffer, images) = match external {
        Some(uri) => (
            format!(r#"{{ "byteLength": {}, "uri": "{uri}" }}"#, bin.len()),
            r#", "images": [{ "uri": "missing.png" }]"#,
        ),
        None => (format!(r#"{{ "byteLength": {} }}"#, bin.len()), ""),
    };
    let json = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [
    {{ "name": "keep", "mesh": 0, "translation": [1, 2, 3], "rotation": [0, 0.70710677, 0, 0.70710677], "children": [1] }},
    {{ "name": "tower" }}
  ],
  "meshes": [{{ "name": "wall", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": 0 }}] }}],
  "materials": [{{ "name": "glass", "pbrMetallicRoughness": {{ "baseColorFactor": [1, 1, 1, 0.5] }}, "alphaMode": "BLEND" }}],
  "buffers": [{buffer}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]{images}
}}"#
    );
    (json, bin)
}

/// A `.glb` whose only mesh draws the same triangle once per entry of `primitive_materials`,
/// with `materials` as the JSON of the document's material array. `extra` is spliced into
/// the top level object, for textures and images.
pub fn materials_glb(materials: &str, primitive_materials: &[Option<usize>], extra: &str) -> Vec<u8> {
    let (_, bin) = triangle_gltf([0, 1, 2], None);
    let primitives: Vec<String> = primitive_materials
        .iter()
        .map(|material| match material {
            Some(material) => format!(
                r#"{{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": {material} }}"#
            ),
            None => r#"{ "attributes": { "POSITION": 0 }, "indices": 1 }"#.to_string(),
        })
        .collect();
    let json = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "name": "gate", "mesh": 0 }}],
  "meshes": [{{ "name": "gate", "primitives": [{}] }}],
  "materials": {materials},
  "buffers": [{{ "byteLength": {} }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]{extra}
}}"#,
        primitives.join(", "),
        bin.len()
    );
    glb(&json, &bin)
}
