//! Viewer settings.
//!
//! Every tunable of the viewer lives here: colours, light intensities, shadow map sizes,
//! camera angles and the asset path. [`ViewerSettings::default`] reproduces the castle
//! scene; callers tweak fields before handing the settings to [`crate::viewer::run`].

use anyhow::bail;
use cgmath::Point3;

use crate::colour::Colour;

/// Upper bound of directional lights the lit shaders iterate over.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
/// Upper bound of hemisphere lights the lit shaders iterate over.
pub const MAX_HEMISPHERE_LIGHTS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneMapping {
    None,
    AcesFilmic,
}

#[derive(Clone, Debug)]
pub struct RendererSettings {
    pub clear_colour: Colour,
    pub clear_alpha: f64,
    /// Requested MSAA sample count; falls back to 1 when the surface format can't do it.
    pub antialias_samples: u32,
    pub tone_mapping: ToneMapping,
    pub tone_mapping_exposure: f32,
    pub shadows_enabled: bool,
    pub present_mode: wgpu::PresentMode,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            clear_colour: Colour::from_hex(0x87ceeb),
            clear_alpha: 1.0,
            antialias_samples: 4,
            tone_mapping: ToneMapping::AcesFilmic,
            tone_mapping_exposure: 1.2,
            shadows_enabled: true,
            present_mode: wgpu::PresentMode::Fifo,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CameraSettings {
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub position: Point3<f32>,
    pub look_at: Point3<f32>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fovy_degrees: 60.0,
            znear: 0.1,
            zfar: 1000.0,
            position: Point3::new(-230.0, 40.0, -3.0),
            look_at: Point3::new(0.0, 5.0, 0.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ControlSettings {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_rotate: bool,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            target: Point3::new(0.0, 5.0, 0.0),
            enable_damping: true,
            damping_factor: 0.05,
            enable_rotate: true,
            enable_pan: true,
            enable_zoom: true,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::PI,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SkySettings {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub top_colour: Colour,
    pub bottom_colour: Colour,
    pub offset: f32,
    pub exponent: f32,
}

impl Default for SkySettings {
    fn default() -> Self {
        Self {
            radius: 500.0,
            width_segments: 32,
            height_segments: 32,
            top_colour: Colour::from_hex(0x0077ff),
            bottom_colour: Colour::from_hex(0xffffff),
            offset: 33.0,
            exponent: 0.6,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SunSettings {
    pub position: Point3<f32>,
    pub colour: Colour,
    pub radius: f32,
    pub opacity: f32,
    pub glow_radius: f32,
    pub glow_opacity: f32,
    pub segments: u32,
    pub visible: bool,
}

impl Default for SunSettings {
    fn default() -> Self {
        Self {
            position: Point3::new(50.0, 50.0, -50.0),
            colour: Colour::from_hex(0xffff00),
            radius: 2.0,
            opacity: 0.8,
            glow_radius: 3.0,
            glow_opacity: 0.3,
            segments: 32,
            visible: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GroundSettings {
    pub size: f32,
    pub colour: Colour,
    pub opacity: f32,
    pub height: f32,
    pub receive_shadow: bool,
}

impl Default for GroundSettings {
    fn default() -> Self {
        Self {
            size: 1000.0,
            colour: Colour::from_hex(0x228b22),
            opacity: 0.9,
            height: -5.0,
            receive_shadow: true,
        }
    }
}

/// Orthographic shadow camera and map size of a directional light.
#[derive(Clone, Debug)]
pub struct ShadowSettings {
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub bias: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 2048,
            near: 0.5,
            far: 500.0,
            left: -100.0,
            right: 100.0,
            top: 100.0,
            bottom: -100.0,
            bias: 0.0005,
        }
    }
}

/// A light that shines from `position` toward `target`.
#[derive(Clone, Debug)]
pub struct DirectionalLightSettings {
    pub name: &'static str,
    pub colour: Colour,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub shadow: Option<ShadowSettings>,
}

#[derive(Clone, Debug)]
pub struct HemisphereLightSettings {
    pub sky_colour: Colour,
    pub ground_colour: Colour,
    pub intensity: f32,
}

#[derive(Clone, Debug)]
pub struct AmbientLightSettings {
    pub colour: Colour,
    pub intensity: f32,
}

#[derive(Clone, Debug)]
pub struct LightSettings {
    pub directional: Vec<DirectionalLightSettings>,
    pub hemisphere: Vec<HemisphereLightSettings>,
    pub ambient: AmbientLightSettings,
}

impl LightSettings {
    /// The light whose shadow map gets rendered, if any.
    pub fn shadow_caster(&self) -> Option<(&DirectionalLightSettings, &ShadowSettings)> {
        self.directional
            .iter()
            .find_map(|light| light.shadow.as_ref().map(|shadow| (light, shadow)))
    }
}

impl Default for LightSettings {
    fn default() -> Self {
        let origin = Point3::new(0.0, 0.0, 0.0);
        let directional = vec![
            // warm and strong, sitting where the sun is
            DirectionalLightSettings {
                name: "key",
                colour: Colour::from_hex(0xfff1e0),
                intensity: 4.0,
                position: SunSettings::default().position,
                target: origin,
                shadow: Some(ShadowSettings::default()),
            },
            DirectionalLightSettings {
                name: "fill",
                colour: Colour::from_hex(0xaaaaff),
                intensity: 0.5,
                position: Point3::new(-5.0, 3.0, 5.0),
                target: origin,
                shadow: None,
            },
            DirectionalLightSettings {
                name: "back",
                colour: Colour::from_hex(0xffffff),
                intensity: 0.8,
                position: Point3::new(-10.0, 5.0, -10.0),
                target: origin,
                shadow: None,
            },
            DirectionalLightSettings {
                name: "fill_below",
                colour: Colour::from_hex(0xffffff),
                intensity: 0.15,
                position: Point3::new(0.0, -10.0, 0.0),
                target: origin,
                shadow: None,
            },
        ];
        let hemisphere = vec![
            HemisphereLightSettings {
                sky_colour: Colour::from_hex(0xeeeeff),
                ground_colour: Colour::from_hex(0x444422),
                intensity: 0.3,
            },
            HemisphereLightSettings {
                sky_colour: Colour::from_hex(0xeeeeff),
                ground_colour: Colour::from_hex(0x777755),
                intensity: 0.6,
            },
        ];
        Self {
            directional,
            hemisphere,
            ambient: AmbientLightSettings {
                colour: Colour::from_hex(0xffffff),
                intensity: 0.2,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct AssetSettings {
    /// Model path relative to the asset root.
    pub model_path: String,
    /// Directory prefix for native file loads and URL path prefix on the web.
    pub root: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            model_path: "models/castle1.glb".to_string(),
            #[cfg(not(target_arch = "wasm32"))]
            root: "assets".to_string(),
            #[cfg(target_arch = "wasm32")]
            root: String::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MountSettings {
    /// Id of the element the canvas gets appended to on the web.
    pub container_id: String,
    /// Window size used natively, where there is no container to measure.
    pub fallback_size: (u32, u32),
}

impl Default for MountSettings {
    fn default() -> Self {
        Self {
            container_id: "castle-viewer".to_string(),
            fallback_size: (1280, 720),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ViewerSettings {
    pub renderer: RendererSettings,
    pub camera: CameraSettings,
    pub controls: ControlSettings,
    pub sky: SkySettings,
    pub sun: SunSettings,
    pub ground: GroundSettings,
    pub lights: LightSettings,
    pub asset: AssetSettings,
    pub mount: MountSettings,
}

impl ViewerSettings {
    pub fn with_model_path(mut self, path: impl Into<String>) -> Self {
        self.asset.model_path = path.into();
        self
    }

    /// Rejects settings the pipelines can't represent.
    pub fn validate(&self) -> anyhow::Result<()> {
        let lights = &self.lights;
        if lights.directional.len() > MAX_DIRECTIONAL_LIGHTS {
            bail!(
                "{} directional lights configured, at most {} are supported",
                lights.directional.len(),
                MAX_DIRECTIONAL_LIGHTS
            );
        }
        if lights.hemisphere.len() > MAX_HEMISPHERE_LIGHTS {
            bail!(
                "{} hemisphere lights configured, at most {} are supported",
                lights.hemisphere.len(),
                MAX_HEMISPHERE_LIGHTS
            );
        }
        let casters: Vec<_> = lights
            .directional
            .iter()
            .filter(|light| light.shadow.is_some())
            .map(|light| light.name)
            .collect();
        if casters.len() > 1 {
            bail!("only one light may cast shadows, got {:?}", casters);
        }
        if let Some((light, shadow)) = lights.shadow_caster() {
            if shadow.map_size == 0 {
                bail!("shadow map of light '{}' has size 0", light.name);
            }
            if shadow.near >= shadow.far || shadow.left >= shadow.right || shadow.bottom >= shadow.top {
                bail!("shadow camera of light '{}' has an empty frustum", light.name);
            }
        }
        if self.sky.width_segments < 3 || self.sky.height_segments < 2 {
            bail!(
                "sky dome needs at least 3x2 segments, got {}x{}",
                self.sky.width_segments,
                self.sky.height_segments
            );
        }
        if self.camera.znear <= 0.0 || self.camera.znear >= self.camera.zfar {
            bail!(
                "camera clip planes must satisfy 0 < near < far, got {} and {}",
                self.camera.znear,
                self.camera.zfar
            );
        }
        if self.camera.zfar <= self.sky.radius {
            log::warn!(
                "camera far plane {} does not reach past the sky dome radius {}",
                self.camera.zfar,
                self.sky.radius
            );
        }
        if self.controls.min_distance > self.controls.max_distance {
            bail!("orbit min_distance is larger than max_distance");
        }
        Ok(())
    }
}
