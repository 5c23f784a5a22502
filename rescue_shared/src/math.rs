//! Math types.
//!
//! This module intentionally stays small and deterministic.
//! Rotations used by the layout are fixed quarter turns, so they are stored as
//! exact constants instead of being computed through trigonometry.

use std::f32::consts::FRAC_1_SQRT_2;

use serde::{Deserialize, Serialize};

/// 3D vector. `y` is up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Bitwise equality, used where `-0.0` and `0.0` must not compare equal.
    pub fn bits_eq(self, rhs: Self) -> bool {
        self.x.to_bits() == rhs.x.to_bits()
            && self.y.to_bits() == rhs.y.to_bits()
            && self.z.to_bits() == rhs.z.to_bits()
    }
}

/// Unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// 90 degrees about the vertical axis.
    pub const QUARTER_TURN_Y: Self = Self {
        x: 0.0,
        y: FRAC_1_SQRT_2,
        z: 0.0,
        w: FRAC_1_SQRT_2,
    };

    /// 90 degrees about X; lays a quad flat on the floor.
    pub const QUARTER_TURN_X: Self = Self {
        x: FRAC_1_SQRT_2,
        y: 0.0,
        z: 0.0,
        w: FRAC_1_SQRT_2,
    };
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}
