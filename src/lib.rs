//! castle-viewer
//!
//! A small wgpu viewer that shows a castle glTF model standing on a ground plane under a
//! gradient sky, lit by a warm key light with soft shadows, and explored with orbit
//! controls. Runs natively in its own window and on the web inside a host element.
//!
//! High-level modules
//! - `settings`: every tunable of the scene with its default value
//! - `colour`: sRGB hex colours, linear conversion and the tone mapping curve
//! - `camera`: perspective camera, projection and camera uniform
//! - `controls`: orbit controls (rotate, pan, dolly, damping)
//! - `data_structures`: meshes, materials, textures, transforms, generated geometry and the scene graph
//! - `resources`: asset fetching with progress, glTF parsing and upload
//! - `pipelines`: lit, transparent, unlit, sky and shadow pipelines plus the light rig
//! - `render`: what to draw, sorted into batches per pipeline
//! - `scene`: the castle scene itself
//! - `context`: device, surface and size dependent targets
//! - `mount`: attaching to a host page element
//! - `viewer`: the event loop and the public `run` entry point

pub mod camera;
pub mod colour;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod mount;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod viewer;

pub use settings::ViewerSettings;
pub use viewer::run;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Mounts the viewer into the element with id `container_id` (`castle-viewer` when absent).
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn mount_castle_viewer(container_id: Option<String>) -> Result<viewer::ViewerHandle, JsValue> {
    let mut settings = ViewerSettings::default();
    if let Some(container_id) = container_id {
        settings.mount.container_id = container_id;
    }
    viewer::run(settings).map_err(|err| JsValue::from_str(&format!("{err:#}")))
}
