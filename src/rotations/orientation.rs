use crate::StrError;
use russell_lab::math::PI;
use serde::{Deserialize, Serialize};

/// Tolerance below which a vector norm is regarded as zero
const NORM_TOL: f64 = 1e-12;

/// Indicates whether angle arguments are given in radians or degrees
///
/// Radians are the internal unit; degrees are an explicit alternate input path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AngleUnit {
    Radians,
    Degrees,
}

impl AngleUnit {
    /// Converts an angle given in this unit to radians
    pub fn to_radians(&self, angle: f64) -> f64 {
        match self {
            AngleUnit::Radians => angle,
            AngleUnit::Degrees => angle * PI / 180.0,
        }
    }
}

/// Holds a unit quaternion representing a rotation from crystal to sample axes
///
/// The quaternion is stored scalar-first as (q0, q1, q2, q3) with unit norm.
/// Instances are immutable; every transformation produces a new Orientation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Orientation {
    q: [f64; 4],
}

impl Orientation {
    /// Allocates the identity rotation
    pub fn new_identity() -> Self {
        Orientation { q: [1.0, 0.0, 0.0, 0.0] }
    }

    /// Allocates an instance from quaternion components (normalized internally)
    pub fn from_quaternion(q: &[f64; 4]) -> Result<Self, StrError> {
        let norm = f64::sqrt(q.iter().map(|v| v * v).sum());
        if norm < NORM_TOL {
            return Err("quaternion has zero norm");
        }
        Ok(Orientation {
            q: [q[0] / norm, q[1] / norm, q[2] / norm, q[3] / norm],
        })
    }

    /// Allocates an instance from a rotation axis and an angle
    pub fn from_axis_angle(axis: &[f64; 3], angle: f64, unit: AngleUnit) -> Result<Self, StrError> {
        let norm = f64::sqrt(axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]);
        if norm < NORM_TOL {
            return Err("rotation axis has zero norm");
        }
        let half = unit.to_radians(angle) / 2.0;
        let (sin, cos) = f64::sin_cos(half);
        Ok(Orientation {
            q: [
                cos,
                sin * axis[0] / norm,
                sin * axis[1] / norm,
                sin * axis[2] / norm,
            ],
        })
    }

    /// Allocates an instance from Bunge (z-x-z) Euler angles
    pub fn from_euler_angles(phi1: f64, big_phi: f64, phi2: f64, unit: AngleUnit) -> Self {
        let rz1 = Orientation::from_axis_angle(&[0.0, 0.0, 1.0], phi1, unit).unwrap();
        let rx = Orientation::from_axis_angle(&[1.0, 0.0, 0.0], big_phi, unit).unwrap();
        let rz2 = Orientation::from_axis_angle(&[0.0, 0.0, 1.0], phi2, unit).unwrap();
        rz1.compose(&rx).compose(&rz2)
    }

    /// Allocates a random orientation, uniform over the rotation group
    ///
    /// Uses Shoemake's subgroup algorithm on three uniform deviates.
    pub fn new_random() -> Self {
        let u1: f64 = rand::random::<f64>();
        let u2: f64 = rand::random::<f64>();
        let u3: f64 = rand::random::<f64>();
        let a = f64::sqrt(1.0 - u1);
        let b = f64::sqrt(u1);
        Orientation {
            q: [
                a * f64::sin(2.0 * PI * u2),
                a * f64::cos(2.0 * PI * u2),
                b * f64::sin(2.0 * PI * u3),
                b * f64::cos(2.0 * PI * u3),
            ],
        }
    }

    /// Returns the quaternion components (q0, q1, q2, q3)
    pub fn quaternion(&self) -> &[f64; 4] {
        &self.q
    }

    /// Composes two rotations: the result applies `other` first, then `self`
    ///
    /// This is the Hamilton product; it is associative and the identity
    /// rotation is a two-sided identity element.
    pub fn compose(&self, other: &Orientation) -> Orientation {
        let a = &self.q;
        let b = &other.q;
        Orientation {
            q: [
                a[0] * b[0] - a[1] * b[1] - a[2] * b[2] - a[3] * b[3],
                a[0] * b[1] + a[1] * b[0] + a[2] * b[3] - a[3] * b[2],
                a[0] * b[2] - a[1] * b[3] + a[2] * b[0] + a[3] * b[1],
                a[0] * b[3] + a[1] * b[2] - a[2] * b[1] + a[3] * b[0],
            ],
        }
    }

    /// Returns the inverse rotation (quaternion conjugate, exact for unit norm)
    pub fn inverse(&self) -> Orientation {
        Orientation {
            q: [self.q[0], -self.q[1], -self.q[2], -self.q[3]],
        }
    }

    /// Extracts the (axis, angle) pair with angle in [0, π]
    ///
    /// The identity rotation yields angle = 0 with the arbitrary axis (1, 0, 0);
    /// no division by a vanishing vector norm is performed.
    pub fn to_axis_angle(&self) -> ([f64; 3], f64) {
        // flip the double-cover representative so that q0 ≥ 0
        let sign = if self.q[0] < 0.0 { -1.0 } else { 1.0 };
        let w = sign * self.q[0];
        let v = [sign * self.q[1], sign * self.q[2], sign * self.q[3]];
        let norm = f64::sqrt(v[0] * v[0] + v[1] * v[1] + v[2] * v[2]);
        if norm < NORM_TOL {
            return ([1.0, 0.0, 0.0], 0.0);
        }
        let angle = 2.0 * f64::atan2(norm, w);
        ([v[0] / norm, v[1] / norm, v[2] / norm], angle)
    }

    /// Returns the rotation angle in [0, π]
    pub fn angle(&self) -> f64 {
        self.to_axis_angle().1
    }

    /// Returns the 3×3 rotation matrix equivalent to this quaternion
    pub fn rotation_matrix(&self) -> [[f64; 3]; 3] {
        let [q0, q1, q2, q3] = self.q;
        [
            [
                1.0 - 2.0 * (q2 * q2 + q3 * q3),
                2.0 * (q1 * q2 - q3 * q0),
                2.0 * (q1 * q3 + q2 * q0),
            ],
            [
                2.0 * (q1 * q2 + q3 * q0),
                1.0 - 2.0 * (q1 * q1 + q3 * q3),
                2.0 * (q2 * q3 - q1 * q0),
            ],
            [
                2.0 * (q1 * q3 - q2 * q0),
                2.0 * (q2 * q3 + q1 * q0),
                1.0 - 2.0 * (q1 * q1 + q2 * q2),
            ],
        ]
    }

    /// Rotates a vector from crystal to sample coordinates
    pub fn rotate_vector(&self, v: &[f64; 3]) -> [f64; 3] {
        let r = self.rotation_matrix();
        let mut out = [0.0; 3];
        for i in 0..3 {
            for j in 0..3 {
                out[i] += r[i][j] * v[j];
            }
        }
        out
    }

    /// Checks whether two orientations represent the same rotation
    ///
    /// Accounts for the two-to-one quaternion cover (q and -q are the same
    /// rotation).
    pub fn approx_equal(&self, other: &Orientation, tol: f64) -> bool {
        let dot: f64 = self.q.iter().zip(other.q.iter()).map(|(a, b)| a * b).sum();
        1.0 - f64::abs(dot) < tol
    }
}

/// Generates n random orientations, uniform over the rotation group
pub fn random_orientations(n: usize) -> Vec<Orientation> {
    (0..n).map(|_| Orientation::new_random()).collect()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{random_orientations, AngleUnit, Orientation};
    use russell_lab::approx_eq;
    use russell_lab::math::PI;

    #[test]
    fn identity_and_inverse_work() {
        let id = Orientation::new_identity();
        assert_eq!(id.angle(), 0.0);
        let (axis, angle) = id.to_axis_angle();
        assert_eq!(axis, [1.0, 0.0, 0.0]);
        assert_eq!(angle, 0.0);

        let o = Orientation::from_axis_angle(&[1.0, 2.0, 2.0], 0.9, AngleUnit::Radians).unwrap();
        let r = o.compose(&o.inverse());
        approx_eq(r.angle(), 0.0, 1e-14);
        assert!(r.approx_equal(&id, 1e-14));

        // identity is a two-sided identity element
        assert!(id.compose(&o).approx_equal(&o, 1e-14));
        assert!(o.compose(&id).approx_equal(&o, 1e-14));
    }

    #[test]
    fn from_axis_angle_works() {
        let o = Orientation::from_axis_angle(&[0.0, 0.0, 2.0], PI / 3.0, AngleUnit::Radians).unwrap();
        let (axis, angle) = o.to_axis_angle();
        approx_eq(angle, PI / 3.0, 1e-15);
        approx_eq(axis[2], 1.0, 1e-15);

        let deg = Orientation::from_axis_angle(&[0.0, 0.0, 1.0], 60.0, AngleUnit::Degrees).unwrap();
        assert!(deg.approx_equal(&o, 1e-14));

        assert_eq!(
            Orientation::from_axis_angle(&[0.0, 0.0, 0.0], 1.0, AngleUnit::Radians).err(),
            Some("rotation axis has zero norm")
        );
    }

    #[test]
    fn from_quaternion_normalizes() {
        let o = Orientation::from_quaternion(&[2.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(o.quaternion(), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            Orientation::from_quaternion(&[0.0, 0.0, 0.0, 0.0]).err(),
            Some("quaternion has zero norm")
        );
    }

    #[test]
    fn composition_is_associative() {
        let a = Orientation::from_euler_angles(0.3, 0.8, 1.1, AngleUnit::Radians);
        let b = Orientation::from_euler_angles(-0.4, 0.2, 0.9, AngleUnit::Radians);
        let c = Orientation::from_euler_angles(2.0, 1.3, -0.5, AngleUnit::Radians);
        let lhs = a.compose(&b).compose(&c);
        let rhs = a.compose(&b.compose(&c));
        assert!(lhs.approx_equal(&rhs, 1e-14));
    }

    #[test]
    fn euler_angles_work() {
        // pure z-rotation
        let o = Orientation::from_euler_angles(35.0, 0.0, 0.0, AngleUnit::Degrees);
        let z = Orientation::from_axis_angle(&[0.0, 0.0, 1.0], 35.0, AngleUnit::Degrees).unwrap();
        assert!(o.approx_equal(&z, 1e-14));

        // pure x-rotation
        let o = Orientation::from_euler_angles(0.0, 17.0, 0.0, AngleUnit::Degrees);
        let x = Orientation::from_axis_angle(&[1.0, 0.0, 0.0], 17.0, AngleUnit::Degrees).unwrap();
        assert!(o.approx_equal(&x, 1e-14));
    }

    #[test]
    fn rotation_matrix_works() {
        let o = Orientation::from_axis_angle(&[0.0, 0.0, 1.0], PI / 2.0, AngleUnit::Radians).unwrap();
        let e2 = o.rotate_vector(&[1.0, 0.0, 0.0]);
        approx_eq(e2[0], 0.0, 1e-15);
        approx_eq(e2[1], 1.0, 1e-15);
        approx_eq(e2[2], 0.0, 1e-15);

        // rotation matrices are orthogonal: R Rᵀ = I
        let r = o.rotation_matrix();
        for i in 0..3 {
            for j in 0..3 {
                let mut sum = 0.0;
                for k in 0..3 {
                    sum += r[i][k] * r[j][k];
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                approx_eq(sum, expected, 1e-15);
            }
        }
    }

    #[test]
    fn random_orientations_work() {
        let all = random_orientations(100);
        assert_eq!(all.len(), 100);
        for o in &all {
            let norm: f64 = o.quaternion().iter().map(|v| v * v).sum();
            approx_eq(norm, 1.0, 1e-14);
            let angle = o.angle();
            assert!(angle >= 0.0 && angle <= PI);
        }
    }
}
