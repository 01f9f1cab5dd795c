//! GPU and window state shared by the whole viewer.

use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, Projection},
    controls::OrbitControls,
    data_structures::texture::Texture,
    pipelines::{
        Pipelines, Target,
        light::{LightResources, LightUniform},
        shadow::ShadowResources,
        sky,
    },
    resources::texture::material_layout,
    settings::ViewerSettings,
};

pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    /// MSAA sample count actually in use, 1 when multisampling is unavailable.
    pub sample_count: u32,
    pub(crate) msaa_texture: Option<Texture>,
    pub(crate) depth_texture: Texture,
    pub camera: CameraResources,
    pub projection: Projection,
    pub controls: OrbitControls,
    pub light: LightResources,
    pub shadow: ShadowResources,
    pub pipelines: Pipelines,
    pub material_layout: wgpu::BindGroupLayout,
    pub sky_layout: wgpu::BindGroupLayout,
    pub clear_colour: wgpu::Color,
}

impl Context {
    /// `size` is used whenever the window doesn't report a size of its own yet.
    pub async fn new(
        window: Arc<Window>,
        settings: &ViewerSettings,
        size: (u32, u32),
    ) -> anyhow::Result<Self> {
        let inner = window.inner_size();
        let (width, height) = if inner.width > 0 && inner.height > 0 {
            (inner.width, inner.height)
        } else {
            size
        };

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("could not create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter can present to this surface")?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .context("could not open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders write linear colour and rely on an sRGB surface for encoding.
        let Some(&first_format) = surface_caps.formats.first() else {
            anyhow::bail!("surface reports no supported formats");
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(first_format);
        if !surface_format.is_srgb() {
            log::warn!("no sRGB surface format available, colours will look dark");
        }
        let present_mode = if surface_caps
            .present_modes
            .contains(&settings.renderer.present_mode)
        {
            settings.renderer.present_mode
        } else {
            log::warn!(
                "present mode {:?} unsupported, using {:?}",
                settings.renderer.present_mode,
                wgpu::PresentMode::Fifo
            );
            wgpu::PresentMode::Fifo
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let sample_count = supported_sample_count(
            &adapter,
            surface_format,
            settings.renderer.antialias_samples,
        );
        let msaa_texture = (sample_count > 1)
            .then(|| Texture::create_msaa_texture(&device, &config, sample_count));
        let depth_texture =
            Texture::create_depth_texture(&device, [width, height], sample_count, "depth_texture");

        let projection = Projection::new(
            width,
            height,
            cgmath::Deg(settings.camera.fovy_degrees),
            settings.camera.znear,
            settings.camera.zfar,
        );
        let mut camera = Camera::from(&settings.camera);
        let mut controls = OrbitControls::new(&settings.controls, width, height);
        controls.update(&mut camera, projection.fovy());
        let camera = CameraResources::new(&device, camera, &projection);

        let mut light_uniform = LightUniform::new(&settings.lights, &settings.renderer)?;
        let max_dimension = device.limits().max_texture_dimension_2d;
        let requested = settings
            .lights
            .shadow_caster()
            .map(|(_, shadow)| shadow.map_size)
            .unwrap_or(1);
        let shadow_map_size = requested.min(max_dimension);
        if shadow_map_size < requested {
            log::warn!("shadow map of {requested} clamped to the device limit {max_dimension}");
            light_uniform.shadow_params[1] = 1.0 / shadow_map_size as f32;
        }
        let light = LightResources::new(&device, light_uniform, shadow_map_size)?;
        let light_position = settings
            .lights
            .shadow_caster()
            .map(|(light, _)| light.position)
            .unwrap_or(cgmath::Point3::new(0.0, 0.0, 0.0));
        let shadow = ShadowResources::new(&device, light_position, light.uniform.shadow_view_proj());

        let material_layout = material_layout(&device);
        let sky_layout = sky::mk_bind_group_layout(&device);
        let pipelines = Pipelines::new(
            &device,
            Target {
                format: surface_format,
                sample_count,
            },
            &material_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
            &sky_layout,
        );

        log::info!(
            "renderer ready: {width}x{height}, {surface_format:?}, {sample_count}x MSAA, shadow map {}",
            if light.uniform.shadows_enabled() {
                format!("{shadow_map_size}px")
            } else {
                "off".to_string()
            }
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            sample_count,
            msaa_texture,
            depth_texture,
            camera,
            projection,
            controls,
            light,
            shadow,
            pipelines,
            material_layout,
            sky_layout,
            clear_colour: settings
                .renderer
                .clear_colour
                .to_wgpu(settings.renderer.clear_alpha),
        })
    }

    /// Reconfigures the surface and every size dependent target. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            log::warn!("ignoring resize to {width}x{height}");
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.projection.resize(width, height);
        self.controls.set_viewport(width, height);
        self.depth_texture = Texture::create_depth_texture(
            &self.device,
            [width, height],
            self.sample_count,
            "depth_texture",
        );
        if self.sample_count > 1 {
            self.msaa_texture = Some(Texture::create_msaa_texture(
                &self.device,
                &self.config,
                self.sample_count,
            ));
        }
        true
    }

    /// Runs the orbit controls and uploads the resulting camera.
    pub fn update_camera(&mut self) {
        self.controls
            .update(&mut self.camera.camera, self.projection.fovy());
        self.camera.write_to_buffer(&self.queue, &self.projection);
    }
}

fn supported_sample_count(
    adapter: &wgpu::Adapter,
    format: wgpu::TextureFormat,
    requested: u32,
) -> u32 {
    if requested <= 1 {
        return 1;
    }
    let colour = adapter.get_texture_format_features(format).flags;
    let depth = adapter
        .get_texture_format_features(Texture::DEPTH_FORMAT)
        .flags;
    if colour.sample_count_supported(requested) && depth.sample_count_supported(requested) {
        requested
    } else {
        log::warn!("{requested}x MSAA not supported for {format:?}, rendering without it");
        1
    }
}
