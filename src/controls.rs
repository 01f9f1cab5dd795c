//! Orbit camera controls.
//!
//! The camera orbits around a target point. Left drag rotates, right drag pans in screen
//! space, middle drag and the mouse wheel zoom. With damping enabled every input keeps
//! contributing a shrinking share of itself on the following frames, which makes the
//! camera glide to a halt instead of stopping dead. [`OrbitControls::update`] has to be
//! called once per frame for that to work.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Point3, Rad, Vector2, Vector3, Zero};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::{camera::Camera, settings::ControlSettings};

const EPS: f32 = 0.000001;

/// Pixel-delta wheels (touchpads) report this many pixels per notch.
const PIXELS_PER_LINE: f64 = 100.0;

/// Spherical coordinates around the y axis: `phi` is the polar angle from +y,
/// `theta` the azimuth from +z toward +x.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_vector(v: Vector3<f32>) -> Self {
        let radius = v.magnitude();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_vector(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keeps `phi` off the poles where the look-at basis degenerates.
    pub fn make_safe(mut self) -> Self {
        self.phi = self.phi.clamp(EPS, PI - EPS);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    None,
    Rotate,
    Pan,
    Dolly,
}

#[derive(Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub settings: ControlSettings,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vector3<f32>,
    pending_pan: Vector2<f32>,
    drag: Drag,
    cursor: Option<PhysicalPosition<f64>>,
    viewport: (f32, f32),
    disposed: bool,
}

impl OrbitControls {
    pub fn new(settings: &ControlSettings, width: u32, height: u32) -> Self {
        Self {
            target: settings.target,
            settings: settings.clone(),
            spherical_delta: Spherical {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            },
            scale: 1.0,
            pan_offset: Vector3::zero(),
            pending_pan: Vector2::zero(),
            drag: Drag::None,
            cursor: None,
            viewport: (width.max(1) as f32, height.max(1) as f32),
            disposed: false,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1) as f32, height.max(1) as f32);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Stops reacting to input and forgets any drag in progress.
    pub fn dispose(&mut self) {
        self.drag = Drag::None;
        self.cursor = None;
        self.disposed = true;
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Queues a screen-space pan in pixels. It is turned into world units on the next
    /// [`update`](Self::update), where the camera basis is known.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pending_pan += Vector2::new(dx, dy);
    }

    pub fn dolly_in(&mut self, dolly_scale: f32) {
        self.scale *= dolly_scale;
    }

    pub fn dolly_out(&mut self, dolly_scale: f32) {
        self.scale /= dolly_scale;
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.settings.zoom_speed)
    }

    /// Feeds a window event into the controls. Returns true when the event was used.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        if self.disposed {
            return false;
        }
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let drag = match button {
                    MouseButton::Left if self.settings.enable_rotate => Drag::Rotate,
                    MouseButton::Right if self.settings.enable_pan => Drag::Pan,
                    MouseButton::Middle if self.settings.enable_zoom => Drag::Dolly,
                    _ => return false,
                };
                match state {
                    ElementState::Pressed => self.drag = drag,
                    ElementState::Released if self.drag == drag => self.drag = Drag::None,
                    ElementState::Released => return false,
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                match (self.drag, previous) {
                    (Drag::None, _) | (_, None) => false,
                    (drag, Some(previous)) => {
                        let dx = (position.x - previous.x) as f32;
                        let dy = (position.y - previous.y) as f32;
                        self.handle_drag(drag, dx, dy);
                        true
                    }
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = Drag::None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if !self.settings.enable_zoom {
                    return false;
                }
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y as f64,
                    MouseScrollDelta::PixelDelta(pos) => pos.y / PIXELS_PER_LINE,
                };
                if notches > 0.0 {
                    self.dolly_in(self.zoom_scale());
                } else if notches < 0.0 {
                    self.dolly_out(self.zoom_scale());
                }
                notches != 0.0
            }
            _ => false,
        }
    }

    fn handle_drag(&mut self, drag: Drag, dx: f32, dy: f32) {
        let height = self.viewport.1;
        match drag {
            Drag::Rotate => {
                let speed = self.settings.rotate_speed;
                self.rotate_left(2.0 * PI * dx / height * speed);
                self.rotate_up(2.0 * PI * dy / height * speed);
            }
            Drag::Pan => {
                let speed = self.settings.pan_speed;
                self.pan(dx * speed, dy * speed);
            }
            Drag::Dolly => {
                if dy > 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if dy < 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
            }
            Drag::None => (),
        }
    }

    fn apply_pending_pan(&mut self, camera: &Camera, fovy: Rad<f32>) {
        if self.pending_pan.is_zero() {
            return;
        }
        let offset = camera.position - self.target;
        let target_distance = offset.magnitude() * (fovy.0 / 2.0).tan();
        let height = self.viewport.1;

        let forward = camera.forward();
        let right = forward.cross(camera.up).normalize();
        let up = right.cross(forward).normalize();

        let left_distance = 2.0 * self.pending_pan.x * target_distance / height;
        let up_distance = 2.0 * self.pending_pan.y * target_distance / height;
        self.pan_offset += right * -left_distance + up * up_distance;
        self.pending_pan = Vector2::zero();
    }

    /// Moves the camera by the accumulated input. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera, fovy: Rad<f32>) -> bool {
        self.apply_pending_pan(camera, fovy);

        let s = &self.settings;
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_vector(offset);

        let factor = if s.enable_damping { s.damping_factor } else { 1.0 };
        spherical.theta += self.spherical_delta.theta * factor;
        spherical.phi += self.spherical_delta.phi * factor;
        spherical.phi = spherical.phi.clamp(s.min_polar_angle, s.max_polar_angle);
        let mut spherical = spherical.make_safe();

        let previous_target = self.target;
        self.target += self.pan_offset * factor;

        spherical.radius = (spherical.radius * self.scale).clamp(s.min_distance, s.max_distance);

        let previous_position = camera.position;
        camera.position = self.target + spherical.to_vector();
        camera.look_at(self.target);

        if s.enable_damping {
            self.spherical_delta.theta *= 1.0 - s.damping_factor;
            self.spherical_delta.phi *= 1.0 - s.damping_factor;
            self.pan_offset *= 1.0 - s.damping_factor;
        } else {
            self.spherical_delta.theta = 0.0;
            self.spherical_delta.phi = 0.0;
            self.pan_offset = Vector3::zero();
        }
        self.scale = 1.0;

        (camera.position - previous_position).magnitude2() > EPS
            || (self.target - previous_target).magnitude2() > EPS
    }
}
