#[macro_use]
mod common;

use castle_viewer::colour::{Colour, aces_filmic, linear_to_srgb, srgb_to_linear};

#[test]
fn hex_colours_are_linearised() {
    assert_eq!(
        Colour::from_hex(0x000000),
        Colour {
            r: 0.0,
            g: 0.0,
            b: 0.0
        }
    );
    let white = Colour::from_hex(0xffffff);
    assert_close!(white.r, 1.0);
    assert_close!(white.g, 1.0);
    assert_close!(white.b, 1.0);

    // sRGB mid grey is about 21% linear
    let grey = Colour::from_hex(0x808080);
    assert_close!(grey.r, 0.2158605, 1e-3);

    let sky = Colour::from_hex(0x0077ff);
    assert_eq!(sky.r, 0.0);
    assert_close!(sky.b, 1.0);
    assert!(sky.g > 0.0 && sky.g < 0.5);
}

#[test]
fn srgb_encoding_inverts_decoding() {
    for c in [0.001, 0.02, 0.2, 0.5, 0.9] {
        assert_close!(linear_to_srgb(srgb_to_linear(c)), c, 1e-3);
    }
}

#[test]
fn colour_helpers() {
    let colour = Colour::from([0.2, 0.4, 0.8]);
    assert_eq!(colour.scaled(0.5).to_array(), [0.1, 0.2, 0.4]);
    assert_eq!(colour.with_alpha(0.3), [0.2, 0.4, 0.8, 0.3]);
    let clear = colour.to_wgpu(1.0);
    assert_close!(clear.g as f32, 0.4);
    assert_eq!(clear.a, 1.0);
}

#[test]
fn aces_maps_black_to_black_and_saturates() {
    assert_eq!(aces_filmic([0.0; 3], 1.2), [0.0; 3]);
    let bright = aces_filmic([100.0; 3], 1.2);
    for channel in bright {
        assert!(channel > 0.95 && channel <= 1.0);
    }
}

#[test]
fn aces_is_monotonic_for_grey() {
    let mut previous = 0.0;
    for step in 1..50 {
        let value = step as f32 * 0.1;
        let [r, g, b] = aces_filmic([value; 3], 1.0);
        assert!(r > previous, "{r} <= {previous} at {value}");
        assert_close!(r, g, 1e-2);
        assert_close!(g, b, 1e-2);
        previous = r;
    }
}

#[test]
fn exposure_brightens() {
    let dim = aces_filmic([0.18; 3], 1.0);
    let bright = aces_filmic([0.18; 3], 1.2);
    assert!(bright[0] > dim[0]);
}
