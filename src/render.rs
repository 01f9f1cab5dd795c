//! Render composition and pipeline batching.
//!
//! This module defines the [`Render`] enum, which scene objects use to say how they
//! should be drawn. The viewer sorts every frame's renders into batches per pipeline
//! (sky, opaque, transparent, unlit) and into the list of shadow casters.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the primary enum describing render operations
//! - [`Instanced<'a>`] contains data for instanced rendering (model + instance buffer)
//! - [`Flat<'a>`] contains data for non-instanced geometry with its own bind group

use crate::data_structures::model::Model;

/// Data for instanced object rendering: a model and its instance buffer.
#[derive(Clone)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
    pub cast_shadow: bool,
}

/// Geometry drawn straight from a vertex and index buffer with one bind group,
/// used by the sky dome.
#[derive(Clone)]
pub struct Flat<'a> {
    pub vertex: &'a wgpu::Buffer,
    pub index: &'a wgpu::Buffer,
    pub group: &'a wgpu::BindGroup,
    pub amount: usize,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Defaults(Vec<Instanced>)` renders opaque lit objects
/// - `Transparents(Vec<Instanced>)` renders alpha-blended lit objects
/// - `Unlit(Vec<Instanced>)` renders flat-coloured, alpha-blended objects without lighting
/// - `Sky(Flat)` renders the gradient sky dome
/// - `Composed(Vec<Render>)` recursively renders a composition of multiple renders
pub enum Render<'a> {
    None,
    Defaults(Vec<Instanced<'a>>),
    Transparents(Vec<Instanced<'a>>),
    Unlit(Vec<Instanced<'a>>),
    Sky(Flat<'a>),
    Composed(Vec<Render<'a>>),
}

/// Renders sorted by the pipeline that draws them.
#[derive(Default)]
pub struct Batches<'a> {
    pub sky: Vec<Flat<'a>>,
    pub basics: Vec<Instanced<'a>>,
    pub trans: Vec<Instanced<'a>>,
    pub unlit: Vec<Instanced<'a>>,
}

impl<'a> Batches<'a> {
    /// Everything lit that should end up in the shadow map.
    pub fn shadow_casters(&self) -> impl Iterator<Item = &Instanced<'a>> {
        self.basics
            .iter()
            .chain(self.trans.iter())
            .filter(|instanced| instanced.cast_shadow)
    }
}

impl<'a> Render<'a> {
    pub fn set_pipelines(self, batches: &mut Batches<'a>) {
        match self {
            Render::Defaults(mut vec) => batches.basics.append(&mut vec),
            Render::Transparents(mut vec) => batches.trans.append(&mut vec),
            Render::Unlit(mut vec) => batches.unlit.append(&mut vec),
            Render::Sky(flat) => batches.sky.push(flat),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(batches)),
            Render::None => (),
        }
    }

    pub fn into_batches(self) -> Batches<'a> {
        let mut batches = Batches::default();
        self.set_pipelines(&mut batches);
        batches
    }
}
