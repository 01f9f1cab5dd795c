//! Scene data structures: models, textures, transforms and the scene graph.
//!
//! - `model` holds meshes, materials and the GPU buffers a model draws from
//! - `texture` wraps GPU textures and the render targets built from them
//! - `instance` is the local/world transform of a node and its GPU layout
//! - `primitives` generates the sphere and plane geometry of the sky, sun and ground
//! - `scene_graph` organises models hierarchically

pub mod instance;
pub mod model;
pub mod primitives;
pub mod scene_graph;
pub mod texture;
