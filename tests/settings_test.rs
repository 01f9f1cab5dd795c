use castle_viewer::{
    ViewerSettings,
    mount::effective_size,
    settings::{MAX_DIRECTIONAL_LIGHTS, ShadowSettings, ToneMapping},
};
use cgmath::Point3;

#[test]
fn defaults_describe_the_castle_scene() {
    let settings = ViewerSettings::default();
    assert!(settings.validate().is_ok());

    assert_eq!(settings.camera.fovy_degrees, 60.0);
    assert_eq!(settings.camera.position, Point3::new(-230.0, 40.0, -3.0));
    assert_eq!(settings.controls.target, Point3::new(0.0, 5.0, 0.0));
    assert!(settings.controls.enable_damping);
    assert_eq!(settings.controls.damping_factor, 0.05);

    assert_eq!(settings.renderer.tone_mapping, ToneMapping::AcesFilmic);
    assert_eq!(settings.renderer.tone_mapping_exposure, 1.2);
    assert_eq!(settings.sky.radius, 500.0);
    assert_eq!(settings.ground.height, -5.0);
    assert!(settings.ground.receive_shadow);
    assert!(!settings.sun.visible);

    let (key, shadow) = settings.lights.shadow_caster().unwrap();
    assert_eq!(key.position, settings.sun.position);
    assert_eq!(shadow.map_size, 2048);
    assert_eq!(settings.lights.directional.len(), MAX_DIRECTIONAL_LIGHTS);

    assert_eq!(settings.asset.model_path, "models/castle1.glb");
    assert_eq!(settings.mount.container_id, "castle-viewer");
}

#[test]
fn model_path_can_be_overridden() {
    let settings = ViewerSettings::default().with_model_path("models/keep.gltf");
    assert_eq!(settings.asset.model_path, "models/keep.gltf");
}

#[test]
fn only_one_shadow_caster_is_allowed() {
    let mut settings = ViewerSettings::default();
    settings.lights.directional[1].shadow = Some(ShadowSettings::default());
    assert!(settings.validate().is_err());
}

#[test]
fn shadow_camera_must_have_volume() {
    let mut settings = ViewerSettings::default();
    settings.lights.directional[0].shadow = Some(ShadowSettings {
        near: 10.0,
        far: 10.0,
        ..Default::default()
    });
    assert!(settings.validate().is_err());

    settings.lights.directional[0].shadow = Some(ShadowSettings {
        map_size: 0,
        ..Default::default()
    });
    assert!(settings.validate().is_err());
}

#[test]
fn invalid_settings_are_rejected() {
    let mut settings = ViewerSettings::default();
    settings.lights.directional.push(settings.lights.directional[1].clone());
    assert!(settings.validate().is_err());

    let mut settings = ViewerSettings::default();
    settings.camera.znear = 0.0;
    assert!(settings.validate().is_err());

    let mut settings = ViewerSettings::default();
    settings.sky.height_segments = 1;
    assert!(settings.validate().is_err());

    let mut settings = ViewerSettings::default();
    settings.controls.min_distance = 10.0;
    settings.controls.max_distance = 5.0;
    assert!(settings.validate().is_err());
}

#[test]
fn no_shadow_caster_is_valid() {
    let mut settings = ViewerSettings::default();
    settings.lights.directional[0].shadow = None;
    assert!(settings.lights.shadow_caster().is_none());
    assert!(settings.validate().is_ok());
}

#[test]
fn collapsed_containers_use_the_fallback_size() {
    assert_eq!(effective_size(640, 480, (1280, 720)), (640, 480));
    assert_eq!(effective_size(0, 480, (1280, 720)), (1280, 720));
    assert_eq!(effective_size(640, 0, (1280, 720)), (1280, 720));
    assert_eq!(effective_size(-1, -1, (1, 1)), (1, 1));
}
