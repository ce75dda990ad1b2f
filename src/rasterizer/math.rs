//! Vector and matrix math for the transform pipeline
//!
//! Matrices are column-major (`m[column][row]`), vectors are columns and
//! transforms are applied as `M * v`. The approximations at the bottom are
//! selected through [`MathMode`] when the renderer runs in fast-math mode.

use std::ops::{Add, Mul, Sub};
use serde::{Deserialize, Serialize};

pub const PI: f32 = std::f32::consts::PI;
pub const DEG2RAD: f32 = PI / 180.0;
pub const RAD2DEG: f32 = 180.0 / PI;

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Normalize, using the fast inverse square root in fast-math mode
    pub fn normalize_with(self, mode: MathMode) -> Vec3 {
        let sq = self.dot(self);
        if sq == 0.0 || sq == 1.0 {
            return self;
        }
        self.scale(mode.inv_sqrt(sq))
    }

    pub fn normalize(self) -> Vec3 {
        self.normalize_with(MathMode::Precise)
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

/// 2D Vector (for texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scale(self, s: f32) -> Vec2 {
        Vec2 { x: self.x * s, y: self.y * s }
    }
}

/// Homogeneous 4D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn from_point(p: Vec3) -> Self {
        Self { x: p.x, y: p.y, z: p.z, w: 1.0 }
    }
}

/// 4x4 column-major matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Build from 16 floats in column-major order
    pub fn from_cols_array(a: &[f32; 16]) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, v) in a.iter().enumerate() {
            m[i / 4][i % 4] = *v;
        }
        Self { m }
    }

    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut a = [0.0; 16];
        for (i, v) in a.iter_mut().enumerate() {
            *v = self.m[i / 4][i % 4];
        }
        a
    }

    pub fn load_identity(&mut self) {
        *self = Self::IDENTITY;
    }

    /// Transform a point (w = 1), dropping the resulting w
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3 {
            x: m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0],
            y: m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1],
            z: m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2],
        }
    }

    pub fn transform_vec4(&self, v: Vec4) -> Vec4 {
        let m = &self.m;
        Vec4 {
            x: m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z + m[3][0] * v.w,
            y: m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z + m[3][1] * v.w,
            z: m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z + m[3][2] * v.w,
            w: m[0][3] * v.x + m[1][3] * v.y + m[2][3] * v.z + m[3][3] * v.w,
        }
    }

    /// `self * rhs`
    pub fn mul(&self, rhs: &Mat4) -> Mat4 {
        let mut out = [[0.0; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, cell) in col.iter_mut().enumerate() {
                *cell = self.m[0][r] * rhs.m[c][0]
                    + self.m[1][r] * rhs.m[c][1]
                    + self.m[2][r] * rhs.m[c][2]
                    + self.m[3][r] * rhs.m[c][3];
            }
        }
        Mat4 { m: out }
    }

    /// Post-multiply by a translation
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        for r in 0..4 {
            self.m[3][r] += self.m[0][r] * x + self.m[1][r] * y + self.m[2][r] * z;
        }
    }

    /// Post-multiply by a rotation of `angle` radians around `axis`
    pub fn rotate_with(&mut self, mode: MathMode, axis: Vec3, angle: f32) {
        let Vec3 { x, y, z } = axis.normalize_with(mode);

        let s = mode.sin(angle);
        let c = mode.cos(angle);
        let cc = 1.0 - c;

        let rot = Mat4 {
            m: [
                [x * x * cc + c, y * x * cc + z * s, x * z * cc - y * s, 0.0],
                [x * y * cc - z * s, y * y * cc + c, y * z * cc + x * s, 0.0],
                [x * z * cc + y * s, y * z * cc - x * s, z * z * cc + c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        };

        *self = self.mul(&rot);
    }

    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        self.rotate_with(MathMode::Precise, axis, angle);
    }

    /// Post-multiply by a scale
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        for r in 0..4 {
            self.m[0][r] *= x;
            self.m[1][r] *= y;
            self.m[2][r] *= z;
        }
    }

    /// Left-handed perspective projection; `fov` is the vertical field of view in radians
    pub fn perspective(aspect_ratio: f32, near: f32, far: f32, fov: f32) -> Mat4 {
        let h = 1.0 / (fov * 0.5).tan();
        let w = h / aspect_ratio;
        let depth = far - near;

        Mat4 {
            m: [
                [w, 0.0, 0.0, 0.0],
                [0.0, h, 0.0, 0.0],
                [0.0, 0.0, far / depth, 1.0],
                [0.0, 0.0, -(far * near) / depth, 0.0],
            ],
        }
    }

    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Mat4 {
        let depth = far - near;

        Mat4 {
            m: [
                [2.0 / width, 0.0, 0.0, 0.0],
                [0.0, 2.0 / height, 0.0, 0.0],
                [0.0, 0.0, 1.0 / depth, 0.0],
                [0.0, 0.0, -near / depth, 1.0],
            ],
        }
    }
}

// =============================================================================
// Approximations
// =============================================================================

/// Selects between libm functions and the bit-level approximations below
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathMode {
    Precise,
    #[default]
    Fast,
}

impl MathMode {
    pub fn sin(self, x: f32) -> f32 {
        match self {
            MathMode::Precise => x.sin(),
            MathMode::Fast => aprx_sin(x),
        }
    }

    pub fn cos(self, x: f32) -> f32 {
        match self {
            MathMode::Precise => x.cos(),
            MathMode::Fast => aprx_cos(x),
        }
    }

    pub fn inv_sqrt(self, x: f32) -> f32 {
        match self {
            MathMode::Precise => 1.0 / x.sqrt(),
            MathMode::Fast => aprx_inv_sqrt(x),
        }
    }

    pub fn sqrt(self, x: f32) -> f32 {
        match self {
            MathMode::Precise => x.sqrt(),
            MathMode::Fast if x > 0.0 => x * aprx_inv_sqrt(x),
            MathMode::Fast => 0.0,
        }
    }

    pub fn log2(self, x: f32) -> f32 {
        match self {
            MathMode::Precise => x.log2(),
            MathMode::Fast => aprx_log2(x),
        }
    }

    /// `floor(log2(x))` for positive normal `x`
    pub fn int_log2(self, x: f32) -> i32 {
        match self {
            MathMode::Precise => x.log2().floor() as i32,
            MathMode::Fast => int_log2_bits(x),
        }
    }
}

/// Fast reciprocal square root (one Newton iteration)
pub fn aprx_inv_sqrt(x: f32) -> f32 {
    let x2 = x * 0.5;
    let i = 0x5f37_59df_u32.wrapping_sub(x.to_bits() >> 1);
    let y = f32::from_bits(i);
    y * (1.5 - x2 * y * y)
}

/// Parabolic sine approximation with one precision step, input wrapped to [-PI, PI]
pub fn aprx_sin(mut x: f32) -> f32 {
    if x < -PI {
        x = (x - PI) % (PI * 2.0) + PI;
    } else if x > PI {
        x = (x + PI) % (PI * 2.0) - PI;
    }

    let y = if x < 0.0 {
        1.273_239_5 * x + 0.405_284_73 * x * x
    } else {
        1.273_239_5 * x - 0.405_284_73 * x * x
    };

    if y < 0.0 {
        0.225 * (y * -y - y) + y
    } else {
        0.225 * (y * y - y) + y
    }
}

pub fn aprx_cos(x: f32) -> f32 {
    aprx_sin(x + PI * 0.5)
}

/// Approximate base-2 logarithm: exponent plus a quadratic fit of the mantissa
pub fn aprx_log2(x: f32) -> f32 {
    let bits = x.to_bits() as i32;
    let lg2 = ((bits >> 23) & 255) - 128;

    let mantissa = f32::from_bits(((bits & !(255 << 23)) + (127 << 23)) as u32);
    let m = ((-1.0 / 3.0) * mantissa + 2.0) * mantissa - 2.0 / 3.0;
    m + lg2 as f32
}

pub fn aprx_ln(x: f32) -> f32 {
    aprx_log2(x) * std::f32::consts::LN_2
}

/// Unbiased exponent of `x`
pub fn int_log2_bits(x: f32) -> i32 {
    ((x.to_bits() >> 23) & 0xff) as i32 - 127
}
