//! Angle and quaternion helpers for the pose pipeline

use serde::{Deserialize, Serialize};

/// Rotation quaternion in (w, x, y, z) order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Divides every component by the magnitude.
    ///
    /// A zero quaternion yields NaN components; callers guard against it.
    pub fn normalized(&self) -> Self {
        let mag = self.magnitude();
        Self::new(self.w / mag, self.x / mag, self.y / mag, self.z / mag)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Builds an orientation from three independent axis rotations (degrees).
///
/// Each axis contributes its half-angle sine along its own basis vector and
/// its half-angle cosine to `w`. The contributions are summed component-wise
/// and the sum is normalized. This is not a product of three rotations.
///
/// With finite angles the sum can never be zero (the three cosines would have
/// to cancel while every sine is zero), so NaN only comes from NaN input.
pub fn compose_axis_quaternion(x_angle: f64, y_angle: f64, z_angle: f64) -> Quaternion {
    let half_x = degrees_to_radians(x_angle) / 2.0;
    let half_y = degrees_to_radians(y_angle) / 2.0;
    let half_z = degrees_to_radians(z_angle) / 2.0;

    let sum = Quaternion::new(
        half_x.cos() + half_y.cos() + half_z.cos(),
        half_x.sin(),
        half_y.sin(),
        half_z.sin(),
    );

    sum.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_degrees() {
        assert!((degrees_to_radians(180.0) - std::f64::consts::PI).abs() < 1e-12);
        assert!((degrees_to_radians(90.0) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(degrees_to_radians(0.0).abs() < 1e-12);
    }

    #[test]
    fn composed_quaternion_is_unit_length() {
        let mut angle = -720.0;
        while angle <= 720.0 {
            for (x, y, z) in [
                (angle, 0.0, 0.0),
                (0.0, angle, 0.0),
                (0.0, 0.0, angle),
                (angle, angle * 0.5, -angle),
                (180.0, angle, 360.0 - angle),
            ] {
                let q = compose_axis_quaternion(x, y, z);
                assert!(
                    (q.magnitude() - 1.0).abs() < 1e-9,
                    "({x}, {y}, {z}) gave magnitude {}",
                    q.magnitude()
                );
            }
            angle += 7.5;
        }
    }

    #[test]
    fn zero_angles_give_identity() {
        let q = compose_axis_quaternion(0.0, 0.0, 0.0);
        assert!((q.w - 1.0).abs() < 1e-12);
        assert!(q.x.abs() < 1e-12 && q.y.abs() < 1e-12 && q.z.abs() < 1e-12);
    }

    #[test]
    fn single_axis_matches_summed_components() {
        // 180° about x: x contributes sin(90°)=1, w sums cos(90°)+1+1
        let q = compose_axis_quaternion(180.0, 0.0, 0.0);
        let mag = (1.0_f64 + 4.0).sqrt();
        assert!((q.x - 1.0 / mag).abs() < 1e-9);
        assert!((q.w - 2.0 / mag).abs() < 1e-9);
        assert!(q.y.abs() < 1e-12 && q.z.abs() < 1e-12);
    }

    #[test]
    fn zero_quaternion_normalizes_to_nan() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized();
        assert!(q.w.is_nan() && q.x.is_nan());
    }

    #[test]
    fn nan_angle_propagates() {
        let q = compose_axis_quaternion(f64::NAN, 0.0, 0.0);
        assert!(q.magnitude().is_nan());
    }
}
