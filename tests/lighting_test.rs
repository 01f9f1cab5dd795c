#[macro_use]
mod common;

use castle_viewer::{
    colour::Colour,
    pipelines::{
        light::{LightUniform, brdf_ggx},
        shadow::directional_shadow_matrix,
        sky::SkyUniform,
    },
    settings::{
        AmbientLightSettings, DirectionalLightSettings, HemisphereLightSettings, LightSettings,
        RendererSettings, ShadowSettings, SkySettings, ToneMapping,
    },
};
use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4};

fn overhead_light(intensity: f32) -> DirectionalLightSettings {
    DirectionalLightSettings {
        name: "overhead",
        colour: Colour::WHITE,
        intensity,
        position: Point3::new(0.0, 10.0, 0.0),
        target: Point3::new(0.0, 0.0, 0.0),
        shadow: None,
    }
}

fn dark() -> AmbientLightSettings {
    AmbientLightSettings {
        colour: Colour::WHITE,
        intensity: 0.0,
    }
}

#[test]
fn default_rig_is_packed_into_the_uniform() {
    let uniform =
        LightUniform::new(&LightSettings::default(), &RendererSettings::default()).unwrap();
    assert_eq!(uniform.counts, [4, 2, 1, 1]);
    assert!(uniform.shadows_enabled());
    assert_close!(uniform.exposure, 1.2);

    for light in &uniform.directional {
        assert_close!(Vector3::from(light.direction).magnitude(), 1.0);
    }
    let key = uniform.directional[0];
    let expected = Vector3::new(50.0f32, 50.0, -50.0).normalize();
    assert_close!(key.direction[0], expected.x);
    assert_close!(key.direction[1], expected.y);
    assert_close!(key.direction[2], expected.z);
    assert_eq!(key.intensity, 4.0);
    assert_eq!(key.casts_shadow, 1.0);
    assert_eq!(uniform.directional[1].casts_shadow, 0.0);

    // ambient colour arrives premultiplied by its intensity
    for channel in uniform.ambient {
        assert_close!(channel, 0.2);
    }
    assert_close!(uniform.shadow_params[0], 0.0005);
    assert_close!(uniform.shadow_params[1], 1.0 / 2048.0);
}

#[test]
fn disabled_shadows_and_tone_mapping_are_flagged_off() {
    let renderer = RendererSettings {
        shadows_enabled: false,
        tone_mapping: ToneMapping::None,
        ..Default::default()
    };
    let uniform = LightUniform::new(&LightSettings::default(), &renderer).unwrap();
    assert_eq!(uniform.counts[2], 0);
    assert!(!uniform.shadows_enabled());
    assert_eq!(uniform.shadow_view_proj(), Matrix4::identity());
}

#[test]
fn too_many_lights_are_rejected() {
    let mut lights = LightSettings::default();
    lights.directional.push(overhead_light(1.0));
    assert!(LightUniform::new(&lights, &RendererSettings::default()).is_err());

    let mut lights = LightSettings::default();
    lights.hemisphere.push(lights.hemisphere[0].clone());
    assert!(LightUniform::new(&lights, &RendererSettings::default()).is_err());
}

#[test]
fn directional_light_follows_lambert() {
    let lights = LightSettings {
        directional: vec![overhead_light(2.0)],
        hemisphere: vec![],
        ambient: dark(),
    };
    let uniform = LightUniform::new(&lights, &RendererSettings::default()).unwrap();
    assert_eq!(uniform.counts[3], 0);

    let up = uniform.irradiance(Vector3::new(0.0, 1.0, 0.0));
    assert_close!(up[0], 2.0);
    let tilted = uniform.irradiance(Vector3::new(1.0, 1.0, 0.0));
    assert_close!(tilted[1], 2.0 * std::f32::consts::FRAC_1_SQRT_2);
    assert_eq!(uniform.irradiance(Vector3::new(0.0, -1.0, 0.0)), [0.0; 3]);
}

#[test]
fn hemisphere_light_blends_sky_and_ground() {
    let lights = LightSettings {
        directional: vec![],
        hemisphere: vec![HemisphereLightSettings {
            sky_colour: Colour::from([1.0, 0.0, 0.0]),
            ground_colour: Colour::from([0.0, 0.0, 1.0]),
            intensity: 1.0,
        }],
        ambient: AmbientLightSettings {
            colour: Colour::WHITE,
            intensity: 0.1,
        },
    };
    let uniform = LightUniform::new(&lights, &RendererSettings::default()).unwrap();

    let up = uniform.irradiance(Vector3::new(0.0, 1.0, 0.0));
    assert_close!(up[0], 1.1);
    assert_close!(up[2], 0.1);
    let side = uniform.irradiance(Vector3::new(1.0, 0.0, 0.0));
    assert_close!(side[0], 0.6);
    assert_close!(side[2], 0.6);
    let down = uniform.irradiance(Vector3::new(0.0, -1.0, 0.0));
    assert_close!(down[0], 0.1);
    assert_close!(down[2], 1.1);
}

#[test]
fn shadow_camera_looks_from_the_sun_at_the_origin() {
    let shadow = ShadowSettings::default();
    let matrix = directional_shadow_matrix(
        Point3::new(50.0, 50.0, -50.0),
        Point3::new(0.0, 0.0, 0.0),
        &shadow,
    );
    let origin = matrix * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert_close!(origin.w, 1.0);
    assert_close!(origin.x, 0.0);
    assert_close!(origin.y, 0.0);
    let distance = 7500.0f32.sqrt();
    assert_close!(origin.z, (distance - 0.5) / 499.5);

    // the frustum edges land on the clip space borders
    let view_right = Vector3::new(-1.0f32, 0.0, -1.0).normalize() * 100.0;
    let edge = matrix * Vector4::new(view_right.x, view_right.y, view_right.z, 1.0);
    assert_close!(edge.x.abs(), 1.0);
}

#[test]
fn shadow_camera_handles_straight_down_lights() {
    let matrix = directional_shadow_matrix(
        Point3::new(0.0, 100.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
        &ShadowSettings::default(),
    );
    let origin = matrix * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert!(origin.x.is_finite() && origin.y.is_finite() && origin.z.is_finite());
    assert_close!(origin.z, (100.0 - 0.5) / 499.5);
}

#[test]
fn sky_gradient_runs_from_bottom_to_top() {
    let settings = SkySettings::default();
    let sky = SkyUniform::from(&settings);
    assert_eq!(sky.offset, 33.0);
    assert_eq!(sky.exponent, 0.6);

    let below = sky.colour_at(Vector3::new(0.0, -500.0, 0.0));
    assert_eq!(below, settings.bottom_colour.to_array());

    let above = sky.colour_at(Vector3::new(0.0, 500.0, 0.0));
    let top = settings.top_colour.to_array();
    for (channel, expected) in above.into_iter().zip(top) {
        assert_close!(channel, expected, 2e-2);
    }

    let horizon = sky.colour_at(Vector3::new(500.0, 0.0, 0.0));
    assert!(horizon[0] < below[0] && horizon[0] > above[0]);
}

#[test]
fn ggx_peak_matches_closed_form() {
    let up = Vector3::unit_y();
    // mirror setup: D = 1 / (pi * alpha^2), V = 1/4, F = F0
    let [r, g, b] = brdf_ggx(up, up, up, 0.5, [0.04, 0.04, 0.04]);
    let expected = 0.04 * 0.25 / (std::f32::consts::PI * 0.0625);
    assert_close!(r, expected);
    assert_close!(g, expected);
    assert_close!(b, expected);
}

#[test]
fn ggx_highlights_spread_with_roughness() {
    let up = Vector3::unit_y();
    let polished = brdf_ggx(up, up, up, 0.3, [0.04; 3])[0];
    let weathered = brdf_ggx(up, up, up, 0.8, [0.04; 3])[0];
    assert!(polished > weathered, "{polished} <= {weathered}");

    // off the mirror direction the rough surface reflects more
    let light = Vector3::new(1.0, 1.0, 0.0).normalize();
    let view = Vector3::new(-0.2, 1.0, 0.0).normalize();
    let polished = brdf_ggx(up, view, light, 0.3, [0.04; 3])[0];
    let weathered = brdf_ggx(up, view, light, 0.8, [0.04; 3])[0];
    assert!(weathered > polished, "{weathered} <= {polished}");
}

#[test]
fn ggx_tints_metals_and_clamps_roughness() {
    let up = Vector3::unit_y();
    let [r, g, b] = brdf_ggx(up, up, up, 0.5, [1.0, 0.5, 0.25]);
    assert_close!(g / r, 0.5);
    assert_close!(b / r, 0.25);

    let mirror = brdf_ggx(up, up, up, 0.0, [0.04; 3])[0];
    let clamped = brdf_ggx(up, up, up, 0.0525, [0.04; 3])[0];
    assert_close!(mirror, clamped);
    assert!(mirror.is_finite());
}

