#[macro_use]
mod common;

use std::f32::consts::{FRAC_PI_2, PI};

use castle_viewer::{
    camera::Camera,
    controls::{OrbitControls, Spherical},
    settings::ControlSettings,
};
use cgmath::{Deg, InnerSpace, Point3, Rad, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceId, ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
};

const FOVY: Rad<f32> = Rad(FRAC_PI_2);

fn undamped() -> ControlSettings {
    ControlSettings {
        target: Point3::new(0.0, 0.0, 0.0),
        enable_damping: false,
        ..Default::default()
    }
}

fn camera() -> Camera {
    Camera::new((0.0, 0.0, 10.0), (0.0, 0.0, 0.0))
}

fn device() -> DeviceId {
    unsafe { DeviceId::dummy() }
}

fn press(button: MouseButton) -> WindowEvent {
    WindowEvent::MouseInput {
        device_id: device(),
        state: ElementState::Pressed,
        button,
    }
}

fn move_to(x: f64, y: f64) -> WindowEvent {
    WindowEvent::CursorMoved {
        device_id: device(),
        position: PhysicalPosition::new(x, y),
    }
}

fn wheel(lines: f32) -> WindowEvent {
    WindowEvent::MouseWheel {
        device_id: device(),
        delta: MouseScrollDelta::LineDelta(0.0, lines),
        phase: TouchPhase::Moved,
    }
}

fn distance(camera: &Camera, target: Point3<f32>) -> f32 {
    (camera.position - target).magnitude()
}

#[test]
fn spherical_matches_cartesian_axes() {
    let s = Spherical::from_vector(Vector3::new(0.0, 0.0, 5.0));
    assert_close!(s.radius, 5.0);
    assert_close!(s.phi, FRAC_PI_2);
    assert_close!(s.theta, 0.0);

    let up = Spherical::from_vector(Vector3::new(0.0, 3.0, 0.0));
    assert_close!(up.phi, 0.0);
    assert!(up.make_safe().phi > 0.0);

    let v = Spherical {
        radius: 2.0,
        phi: FRAC_PI_2,
        theta: FRAC_PI_2,
    }
    .to_vector();
    assert_close!(v.x, 2.0);
    assert_close!(v.y, 0.0);
    assert_close!(v.z, 0.0);
}

#[test]
fn zero_vector_has_no_angles() {
    let s = Spherical::from_vector(Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(s.radius, 0.0);
    assert_eq!(s.phi, 0.0);
    assert_eq!(s.theta, 0.0);
}

#[test]
fn rotate_left_orbits_around_target() {
    let mut camera = camera();
    let mut controls = OrbitControls::new(&undamped(), 800, 600);

    controls.rotate_left(FRAC_PI_2);
    assert!(controls.update(&mut camera, FOVY));

    assert_close!(camera.position.x, -10.0);
    assert_close!(camera.position.y, 0.0);
    assert_close!(camera.position.z, 0.0);
    assert_eq!(camera.target, Point3::new(0.0, 0.0, 0.0));

    // without damping the input is used up in one frame
    assert!(!controls.update(&mut camera, FOVY));
}

#[test]
fn damping_spreads_input_over_frames() {
    let settings = ControlSettings {
        enable_damping: true,
        damping_factor: 0.05,
        ..undamped()
    };
    let mut camera = camera();
    let mut controls = OrbitControls::new(&settings, 800, 600);

    controls.rotate_left(1.0);
    controls.update(&mut camera, FOVY);
    let first = Spherical::from_vector(camera.position - Point3::new(0.0, 0.0, 0.0)).theta;
    assert_close!(first, -0.05);

    assert!(controls.update(&mut camera, FOVY));
    let second = Spherical::from_vector(camera.position - Point3::new(0.0, 0.0, 0.0)).theta;
    assert_close!(second - first, -0.05 * 0.95);
}

#[test]
fn polar_angle_is_clamped() {
    let settings = ControlSettings {
        min_polar_angle: 0.2,
        max_polar_angle: PI / 2.0,
        ..undamped()
    };
    let mut camera = camera();
    let mut controls = OrbitControls::new(&settings, 800, 600);

    controls.rotate_up(10.0);
    controls.update(&mut camera, FOVY);
    let s = Spherical::from_vector(camera.position - controls.target);
    assert_close!(s.phi, 0.2);

    controls.rotate_up(-10.0);
    controls.update(&mut camera, FOVY);
    let s = Spherical::from_vector(camera.position - controls.target);
    assert_close!(s.phi, PI / 2.0);
}

#[test]
fn dolly_changes_distance_within_limits() {
    let settings = ControlSettings {
        min_distance: 4.0,
        max_distance: 12.0,
        ..undamped()
    };
    let mut camera = camera();
    let mut controls = OrbitControls::new(&settings, 800, 600);

    controls.dolly_in(0.5);
    controls.update(&mut camera, FOVY);
    assert_close!(distance(&camera, controls.target), 5.0);

    controls.dolly_in(0.5);
    controls.update(&mut camera, FOVY);
    assert_close!(distance(&camera, controls.target), 4.0);

    controls.dolly_out(0.1);
    controls.update(&mut camera, FOVY);
    assert_close!(distance(&camera, controls.target), 12.0);
}

#[test]
fn wheel_zooms_in_and_out() {
    let mut camera = camera();
    let mut controls = OrbitControls::new(&undamped(), 800, 600);

    assert!(controls.handle_window_events(&wheel(1.0)));
    controls.update(&mut camera, FOVY);
    assert_close!(distance(&camera, controls.target), 9.5);

    assert!(controls.handle_window_events(&wheel(-1.0)));
    controls.update(&mut camera, FOVY);
    assert_close!(distance(&camera, controls.target), 10.0);

    assert!(!controls.handle_window_events(&wheel(0.0)));
}

#[test]
fn left_drag_rotates_by_viewport_height() {
    let mut camera = camera();
    let mut controls = OrbitControls::new(&undamped(), 800, 400);

    assert!(controls.handle_window_events(&press(MouseButton::Left)));
    // the first position only anchors the drag
    assert!(!controls.handle_window_events(&move_to(0.0, 0.0)));
    assert!(controls.handle_window_events(&move_to(100.0, 0.0)));
    controls.update(&mut camera, FOVY);

    // a drag over a quarter of the height turns the camera by 90 degrees
    assert_close!(camera.position.x, -10.0);
    assert_close!(camera.position.z, 0.0);
}

#[test]
fn right_drag_pans_target_and_camera_together() {
    let mut camera = camera();
    let mut controls = OrbitControls::new(&undamped(), 800, 600);

    controls.handle_window_events(&press(MouseButton::Right));
    controls.handle_window_events(&move_to(0.0, 0.0));
    controls.handle_window_events(&move_to(30.0, 0.0));
    controls.update(&mut camera, FOVY);

    // dragging right moves the scene right, so the target moves left along -x
    assert!(controls.target.x < 0.0);
    assert_close!(controls.target.y, 0.0);
    assert_close!(camera.position.x, controls.target.x);
    assert_close!(distance(&camera, controls.target), 10.0);
}

#[test]
fn disabled_inputs_are_ignored() {
    let settings = ControlSettings {
        enable_rotate: false,
        enable_zoom: false,
        ..undamped()
    };
    let mut controls = OrbitControls::new(&settings, 800, 600);
    assert!(!controls.handle_window_events(&press(MouseButton::Left)));
    assert!(!controls.handle_window_events(&wheel(1.0)));
}

#[test]
fn disposed_controls_stop_listening() {
    let mut controls = OrbitControls::new(&undamped(), 800, 600);
    controls.handle_window_events(&press(MouseButton::Left));
    controls.dispose();

    assert!(controls.is_disposed());
    assert!(!controls.handle_window_events(&move_to(10.0, 10.0)));
    assert!(!controls.handle_window_events(&wheel(1.0)));
}

#[test]
fn initial_update_keeps_configured_view() {
    let settings = ControlSettings::default();
    let mut camera = Camera::new((-230.0, 40.0, -3.0), settings.target);
    let before = distance(&camera, settings.target);
    let mut controls = OrbitControls::new(&settings, 1280, 720);
    controls.update(&mut camera, Deg(60.0).into());

    assert_close!(distance(&camera, controls.target), before, 1e-2);
    assert_eq!(camera.target, settings.target);
}
