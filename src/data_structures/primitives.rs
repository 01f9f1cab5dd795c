//! Procedural geometry for the sky dome, the sun and the ground.
//!
//! Vertex order, UVs and winding follow the usual WebGL scene-graph conventions: spheres
//! are built ring by ring from the north pole, planes lie in XY facing +z, and front
//! faces wind counter-clockwise.

use std::f32::consts::PI;

use crate::data_structures::model::ModelVertex;

/// Vertices and triangle-list indices of a mesh that has not been uploaded yet.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A full UV sphere around the origin.
///
/// `width_segments` is clamped to at least 3 and `height_segments` to at least 2.
/// The pole rings keep their duplicated vertices (one per column, for UV seams) but
/// emit no degenerate triangles.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    let mut grid = Vec::with_capacity(height_segments as usize + 1);
    let mut index = 0u32;

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;
        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * 2.0 * PI;
            let position = [
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            ];
            let len = (position[0] * position[0] + position[1] * position[1] + position[2] * position[2]).sqrt();
            let normal = if len > 0.0 {
                position.map(|c| c / len)
            } else {
                [0.0, 1.0, 0.0]
            };
            vertices.push(ModelVertex {
                position,
                tex_coords: [u, v],
                normal,
            });
            row.push(index);
            index += 1;
        }
        grid.push(row);
    }

    let mut indices = Vec::new();
    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    Geometry { vertices, indices }
}

/// A `width` x `height` plane in XY centred on the origin, facing +z.
pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let grid_x = width_segments.max(1);
    let grid_y = height_segments.max(1);
    let grid_x1 = grid_x + 1;
    let segment_width = width / grid_x as f32;
    let segment_height = height / grid_y as f32;

    let mut vertices = Vec::with_capacity((grid_x1 * (grid_y + 1)) as usize);
    for iy in 0..=grid_y {
        let y = iy as f32 * segment_height - height / 2.0;
        for ix in 0..=grid_x {
            let x = ix as f32 * segment_width - width / 2.0;
            vertices.push(ModelVertex {
                position: [x, -y, 0.0],
                tex_coords: [ix as f32 / grid_x as f32, iy as f32 / grid_y as f32],
                normal: [0.0, 0.0, 1.0],
            });
        }
    }

    let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = ix + grid_x1 * iy;
            let b = ix + grid_x1 * (iy + 1);
            let c = (ix + 1) + grid_x1 * (iy + 1);
            let d = (ix + 1) + grid_x1 * iy;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    Geometry { vertices, indices }
}
