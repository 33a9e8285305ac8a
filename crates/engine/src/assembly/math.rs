use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn component(self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn with_component(mut self, axis: Axis, value: f32) -> Vec3 {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
        self
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Side-view projection; depth is dropped.
    pub fn xy(self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

/// Componentwise `a + (b - a) * t`, with `t` clamped to `[0, 1]`.
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    let t = clamp01(t);
    Vec3::new(
        a.x + (b.x - a.x) * t,
        a.y + (b.y - a.y) * t,
        a.z + (b.z - a.z) * t,
    )
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * clamp01(t)
}

pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Hermite ease `3t^2 - 2t^3` over a clamped input.
pub fn smoothstep(t: f32) -> f32 {
    let t = clamp01(t);
    t * t * (3.0 - 2.0 * t)
}

/// Row-major 3x3 rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    rows: [[f32; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    fn rotation_x(radians: f32) -> Mat3 {
        let (s, c) = radians.sin_cos();
        Mat3 {
            rows: [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
        }
    }

    fn rotation_y(radians: f32) -> Mat3 {
        let (s, c) = radians.sin_cos();
        Mat3 {
            rows: [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
        }
    }

    fn rotation_z(radians: f32) -> Mat3 {
        let (s, c) = radians.sin_cos();
        Mat3 {
            rows: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Euler angles in degrees, applied Z first, then X, then Y.
    pub fn from_euler_degrees(euler: Vec3) -> Mat3 {
        let z = Mat3::rotation_z(euler.z.to_radians());
        let x = Mat3::rotation_x(euler.x.to_radians());
        let y = Mat3::rotation_y(euler.y.to_radians());
        y.mul(&x).mul(&z)
    }

    pub fn mul(&self, other: &Mat3) -> Mat3 {
        let mut rows = [[0.0f32; 3]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.rows[r][k] * other.rows[k][c]).sum();
            }
        }
        Mat3 { rows }
    }

    pub fn transpose(&self) -> Mat3 {
        let mut rows = [[0.0f32; 3]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = self.rows[c][r];
            }
        }
        Mat3 { rows }
    }

    pub fn transform(&self, v: Vec3) -> Vec3 {
        let m = &self.rows;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_close(actual: Vec3, expected: Vec3) {
        let eps = 1e-5;
        assert!(
            (actual.x - expected.x).abs() <= eps
                && (actual.y - expected.y).abs() <= eps
                && (actual.z - expected.z).abs() <= eps,
            "{actual:?} vs {expected:?}"
        );
    }

    #[test]
    fn smoothstep_hits_endpoints_and_midpoint() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
        assert!((smoothstep(0.25) - 0.15625).abs() < 1e-6);
    }

    #[test]
    fn smoothstep_and_clamp_saturate_out_of_range_input() {
        assert_eq!(smoothstep(-3.0), 0.0);
        assert_eq!(smoothstep(7.5), 1.0);
        assert_eq!(clamp01(f32::NAN), 0.0);
        assert_eq!(clamp01(1.5), 1.0);
    }

    #[test]
    fn lerp_at_zero_returns_start_exactly() {
        let a = Vec3::new(0.1, 0.2, 0.3);
        let b = Vec3::new(5.0, -4.0, 9.0);
        assert_eq!(lerp_vec3(a, b, 0.0), a);
        assert_vec3_close(lerp_vec3(a, b, 0.5), Vec3::new(2.55, -1.9, 4.65));
    }

    #[test]
    fn z_rotation_quarter_turn_maps_x_to_y() {
        let m = Mat3::from_euler_degrees(Vec3::new(0.0, 0.0, 90.0));
        assert_vec3_close(m.transform(Vec3::new(1.0, 0.0, 0.0)), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn transpose_inverts_rotation() {
        let m = Mat3::from_euler_degrees(Vec3::new(30.0, -45.0, 60.0));
        let v = Vec3::new(1.5, -2.0, 0.25);
        assert_vec3_close(m.transpose().transform(m.transform(v)), v);
    }

    #[test]
    fn component_accessors_follow_axis() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.component(Axis::Y), 2.0);
        assert_eq!(v.with_component(Axis::X, 9.0), Vec3::new(9.0, 2.0, 3.0));
    }
}
