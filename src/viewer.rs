//! Application event loop.
//!
//! The viewer runs as a winit [`ApplicationHandler`]. Setting up the GPU and fetching the
//! castle are asynchronous: natively the device is created with tokio's `block_on` and the
//! castle is fetched on a tokio worker, on the web both run through `spawn_local`. Results
//! come back into the loop as [`ViewerEvent`]s.
//!
//! Every frame:
//! 1. Orbit controls update the camera, the camera uniform is uploaded
//! 2. Changed node transforms are written to their instance buffers
//! 3. The castle is drawn depth-only into the key light's shadow map
//! 4. Sky, opaque, transparent and unlit batches are drawn into the main pass
//! 5. The frame is presented and the next one requested

use std::{iter, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::Context,
    data_structures::model::{DrawModel, DrawShadow},
    mount::Mount,
    pipelines::shadow::ShadowResources,
    resources::{LoadedGltf, fetch::log_progress, fetch_gltf, upload_gltf},
    scene::CastleScene,
    settings::ViewerSettings,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub enum ViewerEvent {
    /// GPU setup finished on the web.
    #[cfg(target_arch = "wasm32")]
    Initialized(Box<AppState>),
    /// The castle was fetched and parsed, or failed to.
    ModelLoaded(Box<anyhow::Result<LoadedGltf>>),
    /// The host container changed size.
    ContainerResized(u32, u32),
    Exit,
}

impl std::fmt::Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::ModelLoaded(result) => f.debug_tuple("ModelLoaded").field(&result.is_ok()).finish(),
            Self::ContainerResized(w, h) => {
                f.debug_tuple("ContainerResized").field(w).field(h).finish()
            }
            Self::Exit => f.write_str("Exit"),
        }
    }
}

/// What the loop does with the surface after a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceAction {
    /// The frame went out, nothing else to do.
    Presented,
    /// Configure the surface again at its current size.
    Reconfigure,
    /// Nothing was drawn this time.
    Skip,
}

impl SurfaceAction {
    /// Splits an acquired surface texture into the texture to draw into and what to do
    /// after presenting it. Suboptimal frames are still drawn before reconfiguring.
    pub fn of(current: wgpu::CurrentSurfaceTexture) -> (Option<wgpu::SurfaceTexture>, Self) {
        use wgpu::CurrentSurfaceTexture as Current;

        match current {
            Current::Success(texture) => (Some(texture), Self::Presented),
            Current::Suboptimal(texture) => (Some(texture), Self::Reconfigure),
            Current::Outdated | Current::Lost => (None, Self::Reconfigure),
            Current::Timeout | Current::Occluded => (None, Self::Skip),
            Current::Validation => {
                log::error!("surface texture could not be acquired, skipping the frame");
                (None, Self::Skip)
            }
        }
    }
}

/// GPU context plus the scene it draws.
pub struct AppState {
    pub(crate) ctx: Context,
    pub(crate) scene: CastleScene,
    is_surface_configured: bool,
}

impl AppState {
    pub async fn new(
        window: Arc<Window>,
        settings: &ViewerSettings,
        size: (u32, u32),
    ) -> anyhow::Result<Self> {
        let ctx = Context::new(window, settings, size).await?;
        let scene = CastleScene::new(
            &ctx.device,
            &ctx.queue,
            &ctx.material_layout,
            &ctx.sky_layout,
            settings,
        );
        Ok(Self {
            ctx,
            scene,
            is_surface_configured: true,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.is_surface_configured = self.ctx.resize(width, height);
    }

    pub fn add_castle(&mut self, loaded: &LoadedGltf, name: &str) {
        let castle = upload_gltf(
            loaded,
            &self.ctx.device,
            &self.ctx.queue,
            &self.ctx.material_layout,
            name,
        );
        self.scene.set_castle(castle);
    }

    fn update(&mut self) {
        self.ctx.update_camera();
        self.scene.write_to_buffers(&self.ctx.queue);
    }

    fn render(&self) -> SurfaceAction {
        self.ctx.window.request_redraw();

        if !self.is_surface_configured {
            return SurfaceAction::Skip;
        }

        let (output, action) = SurfaceAction::of(self.ctx.surface.get_current_texture());
        let Some(output) = output else {
            return action;
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let batches = self.scene.render().into_batches();

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if self.ctx.light.uniform.shadows_enabled() {
            let mut shadow_pass =
                ShadowResources::begin_pass(&mut encoder, &self.ctx.light.shadow_map);
            for instanced in batches.shadow_casters() {
                shadow_pass.set_pipeline(
                    self.ctx
                        .shadow
                        .pipeline_for(instanced.model.is_double_sided()),
                );
                shadow_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                shadow_pass.draw_model_depth(
                    instanced.model,
                    0..instanced.amount as u32,
                    &self.ctx.shadow.bind_group,
                );
            }
        }

        {
            let (target, resolve_target) = match &self.ctx.msaa_texture {
                Some(msaa) => (&msaa.view, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            render_pass.set_pipeline(&self.ctx.pipelines.sky);
            for sky in &batches.sky {
                render_pass.set_bind_group(0, &self.ctx.camera.bind_group, &[]);
                render_pass.set_bind_group(1, sky.group, &[]);
                render_pass.set_vertex_buffer(0, sky.vertex.slice(..));
                render_pass.set_index_buffer(sky.index.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..sky.amount as u32, 0, 0..1);
            }

            for batch in [&batches.basics, &batches.trans] {
                for instanced in batch {
                    if instanced.amount == 0 {
                        continue;
                    }
                    render_pass.set_pipeline(self.ctx.pipelines.lit(instanced.model.pass()));
                    render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                    render_pass.draw_model_instanced(
                        instanced.model,
                        0..instanced.amount as u32,
                        &self.ctx.camera.bind_group,
                        &self.ctx.light.bind_group,
                    );
                }
            }

            render_pass.set_pipeline(&self.ctx.pipelines.unlit);
            for instanced in &batches.unlit {
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_model_unlit(
                    instanced.model,
                    0..instanced.amount as u32,
                    &self.ctx.camera.bind_group,
                );
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        action
    }

    /// Stops the controls; GPU resources are released when the state is dropped.
    pub fn dispose(&mut self) {
        self.ctx.controls.dispose();
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    settings: ViewerSettings,
    mount: Option<Mount>,
    state: Option<AppState>,
    /// A castle that arrived before the GPU was ready.
    pending_castle: Option<LoadedGltf>,
    started: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, settings: ViewerSettings) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            settings,
            mount: None,
            state: None,
            pending_castle: None,
            started: Instant::now(),
        })
    }

    fn load_castle(&self) {
        let proxy = self.proxy.clone();
        let root = self.settings.asset.root.clone();
        let path = self.settings.asset.model_path.clone();
        let fut = async move {
            let loaded = fetch_gltf(&root, &path, log_progress("Castle")).await;
            if proxy
                .send_event(ViewerEvent::ModelLoaded(Box::new(loaded)))
                .is_err()
            {
                log::warn!("castle finished loading after the viewer was closed");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(fut);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(fut);
    }

    fn on_model_loaded(&mut self, loaded: anyhow::Result<LoadedGltf>) {
        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                log::error!(
                    "could not load {}: {err:#}",
                    self.settings.asset.model_path
                );
                return;
            }
        };
        match self.state.as_mut() {
            Some(state) => {
                state.add_castle(&loaded, &self.settings.asset.model_path);
                log::info!("castle ready after {:?}", self.started.elapsed());
            }
            None => self.pending_castle = Some(loaded),
        }
    }

    fn on_initialized(&mut self, mut state: AppState) {
        if let Some(loaded) = self.pending_castle.take() {
            state.add_castle(&loaded, &self.settings.asset.model_path);
            log::info!("castle ready after {:?}", self.started.elapsed());
        }
        state.ctx.window.request_redraw();
        self.state = Some(state);
    }

    /// Removes the resize listener, stops the controls, drops the GPU state and detaches
    /// the canvas.
    fn teardown(&mut self) {
        if let Some(mount) = self.mount.as_mut() {
            mount.detach();
        }
        if let Some(mut state) = self.state.take() {
            state.dispose();
        }
        self.mount = None;
        log::info!("viewer torn down");
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.mount.is_some() {
            return;
        }
        let mut mount = match Mount::attach(&self.settings.mount) {
            Ok(mount) => mount,
            Err(err) => {
                log::error!("could not mount the viewer: {err:#}");
                event_loop.exit();
                return;
            }
        };
        let (width, height) = mount.size();

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title("Castle Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;
            window_attributes = window_attributes.with_canvas(Some(mount.canvas()));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("could not create a window: {err}");
                mount.detach();
                event_loop.exit();
                return;
            }
        };

        if let Err(err) = mount.listen_resize(self.proxy.clone()) {
            log::warn!("container resizes will be missed: {err:#}");
        }
        self.mount = Some(mount);
        self.load_castle();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let init = AppState::new(window, &self.settings, (width, height));
            match self.async_runtime.block_on(init) {
                Ok(state) => self.on_initialized(state),
                Err(err) => {
                    log::error!("viewer initialization failed: {err:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let settings = self.settings.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match AppState::new(window, &settings, (width, height)).await {
                    Ok(state) => {
                        if proxy
                            .send_event(ViewerEvent::Initialized(Box::new(state)))
                            .is_err()
                        {
                            log::warn!("viewer was closed during initialization");
                        }
                    }
                    Err(err) => {
                        log::error!("viewer initialization failed: {err:#}");
                        let _ = proxy.send_event(ViewerEvent::Exit);
                    }
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        log::debug!("{event:?}");
        match event {
            #[cfg(target_arch = "wasm32")]
            ViewerEvent::Initialized(state) => {
                let mut state = *state;
                if let Some((width, height)) = self.mount.as_ref().map(Mount::size) {
                    state.resize(width, height);
                }
                self.on_initialized(state);
            }
            ViewerEvent::ModelLoaded(loaded) => self.on_model_loaded(*loaded),
            ViewerEvent::ContainerResized(width, height) => {
                if let Some(state) = self.state.as_mut() {
                    let _ = state
                        .ctx
                        .window
                        .request_inner_size(winit::dpi::LogicalSize::new(width, height));
                    state.resize(width, height);
                }
            }
            ViewerEvent::Exit => event_loop.exit(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.controls.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            // on the web the container decides the size, see `ViewerEvent::ContainerResized`
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                state.update();
                if state.render() == SurfaceAction::Reconfigure {
                    let size = (state.ctx.config.width, state.ctx.config.height);
                    state.resize(size.0, size.1);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        // fails when a second viewer is mounted, the first logger stays in place
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

/// Opens the viewer and blocks until its window is closed.
#[cfg(not(target_arch = "wasm32"))]
pub fn run(settings: ViewerSettings) -> anyhow::Result<()> {
    init_logging();
    settings.validate()?;

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, settings)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Keeps a mounted viewer alive and lets the page tear it down again.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct ViewerHandle {
    proxy: EventLoopProxy<ViewerEvent>,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl ViewerHandle {
    /// Stops rendering, removes the resize listener and the canvas.
    pub fn unmount(&self) {
        if self.proxy.send_event(ViewerEvent::Exit).is_err() {
            log::warn!("viewer was already unmounted");
        }
    }
}

/// Mounts the viewer into the page and returns immediately; rendering continues on the
/// browser's animation frames.
#[cfg(target_arch = "wasm32")]
pub fn run(settings: ViewerSettings) -> anyhow::Result<ViewerHandle> {
    use winit::platform::web::EventLoopExtWebSys;

    init_logging();
    settings.validate()?;

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
    let app = App::new(&event_loop, settings)?;
    let proxy = app.proxy.clone();
    event_loop.spawn_app(app);

    Ok(ViewerHandle { proxy })
}
