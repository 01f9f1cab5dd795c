//! Embedding the viewer into a host page.
//!
//! On the web the viewer draws into a canvas it appends to a container element, sizes
//! itself from that container and follows window resizes. Natively there is no container:
//! the window is the host and winit reports its resizes.

use crate::settings::MountSettings;

/// Size to render at for a container reporting `client_width` x `client_height`.
///
/// Collapsed containers (display none, not laid out yet) fall back to `fallback`.
pub fn effective_size(client_width: i32, client_height: i32, fallback: (u32, u32)) -> (u32, u32) {
    if client_width > 0 && client_height > 0 {
        (client_width as u32, client_height as u32)
    } else {
        fallback
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::Mount;

#[cfg(not(target_arch = "wasm32"))]
pub use native::Mount;

#[cfg(target_arch = "wasm32")]
mod web {
    use anyhow::{Context, anyhow};
    use wasm_bindgen::{JsCast, closure::Closure};
    use web_sys::{Element, HtmlCanvasElement};
    use winit::event_loop::EventLoopProxy;

    use super::{MountSettings, effective_size};
    use crate::viewer::ViewerEvent;

    pub struct Mount {
        container: Element,
        canvas: HtmlCanvasElement,
        fallback_size: (u32, u32),
        on_resize: Option<Closure<dyn FnMut()>>,
    }

    impl Mount {
        /// Creates the canvas and appends it to the container element.
        pub fn attach(settings: &MountSettings) -> anyhow::Result<Self> {
            let window = web_sys::window().context("no window")?;
            let document = window.document().context("no document")?;
            let container = document
                .get_element_by_id(&settings.container_id)
                .with_context(|| format!("no element with id '{}'", settings.container_id))?;
            let canvas: HtmlCanvasElement = document
                .create_element("canvas")
                .map_err(|err| anyhow!("could not create canvas: {err:?}"))?
                .dyn_into()
                .map_err(|_| anyhow!("created element is not a canvas"))?;
            container
                .append_child(&canvas)
                .map_err(|err| anyhow!("could not append canvas: {err:?}"))?;

            let mount = Self {
                container,
                canvas,
                fallback_size: settings.fallback_size,
                on_resize: None,
            };
            let (width, height) = mount.size();
            mount.canvas.set_width(width);
            mount.canvas.set_height(height);
            log::info!("mounted into #{} at {width}x{height}", settings.container_id);
            Ok(mount)
        }

        pub fn canvas(&self) -> HtmlCanvasElement {
            self.canvas.clone()
        }

        /// Current client size of the container.
        pub fn size(&self) -> (u32, u32) {
            effective_size(
                self.container.client_width(),
                self.container.client_height(),
                self.fallback_size,
            )
        }

        /// Re-reads the container size on every window resize and forwards it.
        pub fn listen_resize(&mut self, proxy: EventLoopProxy<ViewerEvent>) -> anyhow::Result<()> {
            let window = web_sys::window().context("no window")?;
            let container = self.container.clone();
            let fallback = self.fallback_size;
            let on_resize = Closure::<dyn FnMut()>::new(move || {
                let (width, height) = effective_size(
                    container.client_width(),
                    container.client_height(),
                    fallback,
                );
                if proxy
                    .send_event(ViewerEvent::ContainerResized(width, height))
                    .is_err()
                {
                    log::warn!("resize after the viewer was closed");
                }
            });
            window
                .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
                .map_err(|err| anyhow!("could not listen for resizes: {err:?}"))?;
            self.on_resize = Some(on_resize);
            Ok(())
        }

        /// Removes the resize listener and takes the canvas out of the container.
        pub fn detach(&mut self) {
            if let (Some(window), Some(on_resize)) = (web_sys::window(), self.on_resize.take()) {
                if let Err(err) = window.remove_event_listener_with_callback(
                    "resize",
                    on_resize.as_ref().unchecked_ref(),
                ) {
                    log::warn!("could not remove resize listener: {err:?}");
                }
            }
            if let Err(err) = self.container.remove_child(&self.canvas) {
                log::warn!("canvas was already detached: {err:?}");
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use winit::event_loop::EventLoopProxy;

    use super::MountSettings;
    use crate::viewer::ViewerEvent;

    /// The native window is its own container.
    pub struct Mount {
        size: (u32, u32),
    }

    impl Mount {
        pub fn attach(settings: &MountSettings) -> anyhow::Result<Self> {
            Ok(Self {
                size: settings.fallback_size,
            })
        }

        pub fn size(&self) -> (u32, u32) {
            self.size
        }

        /// winit delivers resizes of native windows itself.
        pub fn listen_resize(&mut self, _proxy: EventLoopProxy<ViewerEvent>) -> anyhow::Result<()> {
            Ok(())
        }

        pub fn detach(&mut self) {}
    }
}
