//! Colour handling.
//!
//! Colours are authored as sRGB hex values (`0x87ceeb`) and converted to linear RGB before
//! they reach a uniform or a clear colour, since all shading happens in linear space and the
//! surface applies the sRGB encoding on write.

/// A colour in linear RGB.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const WHITE: Colour = Colour {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Linear colour from an sRGB hex triplet such as `0xfff1e0`.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn with_alpha(self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
        }
    }

    /// Clear colour for a render pass. wgpu expects linear values for sRGB targets.
    pub fn to_wgpu(self, alpha: f64) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: alpha,
        }
    }
}

impl From<[f32; 3]> for Colour {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    if c < 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(0.41666) - 0.055
    }
}

fn rrt_and_odt_fit(v: f32) -> f32 {
    let a = v * (v + 0.0245786) - 0.000090537;
    let b = v * (0.983729 * v + 0.4329510) + 0.238081;
    a / b
}

/// CPU version of the ACES filmic curve in `model.wgsl`.
///
/// Kept in lockstep with the shader so the look of the tone mapping can be checked
/// without a GPU.
pub fn aces_filmic(colour: [f32; 3], exposure: f32) -> [f32; 3] {
    // column-major, matching the WGSL mat3x3 constructors
    const INPUT: [[f32; 3]; 3] = [
        [0.59719, 0.07600, 0.02840],
        [0.35458, 0.90834, 0.13383],
        [0.04823, 0.01566, 0.83777],
    ];
    const OUTPUT: [[f32; 3]; 3] = [
        [1.60475, -0.10208, -0.00327],
        [-0.53108, 1.10813, -0.07276],
        [-0.07367, -0.00605, 1.07602],
    ];
    let mul = |m: &[[f32; 3]; 3], v: [f32; 3]| {
        [
            m[0][0] * v[0] + m[1][0] * v[1] + m[2][0] * v[2],
            m[0][1] * v[0] + m[1][1] * v[1] + m[2][1] * v[2],
            m[0][2] * v[0] + m[1][2] * v[1] + m[2][2] * v[2],
        ]
    };
    let exposed = colour.map(|c| c * exposure / 0.6);
    let fitted = mul(&INPUT, exposed).map(rrt_and_odt_fit);
    mul(&OUTPUT, fitted).map(|c| c.clamp(0.0, 1.0))
}
