use crate::rotations::Orientation;
use crate::StrError;
use russell_tensor::{t2_ddot_t2, Mandel, Tensor2};
use serde::{Deserialize, Serialize};

/// Tolerance below which a vector norm is regarded as zero
const NORM_TOL: f64 = 1e-12;

/// Tolerance on the direction-normal inner product
const ORTHO_TOL: f64 = 1e-10;

/// Holds one slip system: a plane normal and an in-plane slip direction
///
/// Both vectors are unit vectors in crystal coordinates and mutually
/// orthogonal by construction (the direction lies in the plane).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlipSystem {
    /// Unit slip direction in crystal coordinates
    pub direction: [f64; 3],

    /// Unit plane normal in crystal coordinates
    pub normal: [f64; 3],
}

/// Holds a crystal basis and an ordered collection of slip systems
///
/// Slip system indices are stable and assigned in insertion order; per-system
/// hardening and damage arrays are indexed by this order. Systems are not
/// expanded to their symmetry-equivalent family members; the caller supplies
/// each member explicitly.
pub struct Lattice {
    lattice_parameter: f64,
    systems: Vec<SlipSystem>,
}

impl Lattice {
    /// Allocates a cubic lattice with the given lattice parameter
    pub fn new_cubic(lattice_parameter: f64) -> Result<Self, StrError> {
        if lattice_parameter <= 0.0 {
            return Err("lattice parameter must be positive");
        }
        Ok(Lattice {
            lattice_parameter,
            systems: Vec::new(),
        })
    }

    /// Returns the lattice parameter
    pub fn lattice_parameter(&self) -> f64 {
        self.lattice_parameter
    }

    /// Appends one slip system given Miller-index style direction and plane
    ///
    /// The vectors are normalized internally. For a cubic basis, directions
    /// and plane normals share the same Cartesian components.
    pub fn add_slip_system(&mut self, direction: &[f64; 3], plane: &[f64; 3]) -> Result<(), StrError> {
        let dir_norm = norm3(direction);
        if dir_norm < NORM_TOL {
            return Err("slip direction has zero norm");
        }
        let pla_norm = norm3(plane);
        if pla_norm < NORM_TOL {
            return Err("slip plane normal has zero norm");
        }
        let d = [
            direction[0] / dir_norm,
            direction[1] / dir_norm,
            direction[2] / dir_norm,
        ];
        let n = [plane[0] / pla_norm, plane[1] / pla_norm, plane[2] / pla_norm];
        if f64::abs(d[0] * n[0] + d[1] * n[1] + d[2] * n[2]) > ORTHO_TOL {
            return Err("slip direction must lie in the slip plane");
        }
        self.systems.push(SlipSystem { direction: d, normal: n });
        Ok(())
    }

    /// Returns the number of slip systems
    pub fn ntotal(&self) -> usize {
        self.systems.len()
    }

    /// Returns a slip system by index
    pub fn system(&self, i: usize) -> Result<&SlipSystem, StrError> {
        self.systems.get(i).ok_or("slip system index is out of range")
    }

    /// Computes the Schmid tensor of a system in sample coordinates
    ///
    /// The Schmid tensor is the symmetrized dyad of the rotated slip
    /// direction and plane normal.
    pub fn schmid_tensor(&self, i: usize, orientation: &Orientation) -> Result<Tensor2, StrError> {
        let system = self.system(i)?;
        let d = orientation.rotate_vector(&system.direction);
        let n = orientation.rotate_vector(&system.normal);
        let mut m = [[0.0; 3]; 3];
        for a in 0..3 {
            for b in 0..3 {
                m[a][b] = 0.5 * (d[a] * n[b] + n[a] * d[b]);
            }
        }
        Tensor2::from_matrix(&m, Mandel::Symmetric)
    }

    /// Computes the plane-normal dyad of a system in sample coordinates
    pub fn normal_tensor(&self, i: usize, orientation: &Orientation) -> Result<Tensor2, StrError> {
        let system = self.system(i)?;
        let n = orientation.rotate_vector(&system.normal);
        let mut m = [[0.0; 3]; 3];
        for a in 0..3 {
            for b in 0..3 {
                m[a][b] = n[a] * n[b];
            }
        }
        Tensor2::from_matrix(&m, Mandel::Symmetric)
    }

    /// Computes the resolved shear stress on a system
    pub fn resolved_shear(&self, i: usize, stress: &Tensor2, orientation: &Orientation) -> Result<f64, StrError> {
        check_stress(stress)?;
        let schmid = self.schmid_tensor(i, orientation)?;
        Ok(t2_ddot_t2(&schmid, stress))
    }

    /// Computes the stress normal to the slip plane of a system
    pub fn normal_stress(&self, i: usize, stress: &Tensor2, orientation: &Orientation) -> Result<f64, StrError> {
        check_stress(stress)?;
        let nn = self.normal_tensor(i, orientation)?;
        Ok(t2_ddot_t2(&nn, stress))
    }
}

/// Checks that a stress tensor uses the 3D symmetric Mandel representation
pub(crate) fn check_stress(stress: &Tensor2) -> Result<(), StrError> {
    if stress.mandel() != Mandel::Symmetric {
        return Err("stress tensor must use the symmetric 3D Mandel representation");
    }
    Ok(())
}

fn norm3(v: &[f64; 3]) -> f64 {
    f64::sqrt(v[0] * v[0] + v[1] * v[1] + v[2] * v[2])
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Lattice;
    use crate::rotations::{AngleUnit, Orientation};
    use russell_lab::approx_eq;
    use russell_tensor::{Mandel, Tensor2};

    #[test]
    fn new_cubic_captures_errors() {
        assert_eq!(Lattice::new_cubic(0.0).err(), Some("lattice parameter must be positive"));
        assert_eq!(Lattice::new_cubic(-1.0).err(), Some("lattice parameter must be positive"));
    }

    #[test]
    fn add_slip_system_captures_errors() {
        let mut lattice = Lattice::new_cubic(1.0).unwrap();
        assert_eq!(
            lattice.add_slip_system(&[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0]).err(),
            Some("slip direction has zero norm")
        );
        assert_eq!(
            lattice.add_slip_system(&[1.0, 0.0, 0.0], &[0.0, 0.0, 0.0]).err(),
            Some("slip plane normal has zero norm")
        );
        assert_eq!(
            lattice.add_slip_system(&[1.0, 0.0, 0.0], &[1.0, 1.0, 1.0]).err(),
            Some("slip direction must lie in the slip plane")
        );
        assert_eq!(lattice.ntotal(), 0);
    }

    #[test]
    fn systems_keep_insertion_order() {
        let mut lattice = Lattice::new_cubic(1.0).unwrap();
        lattice.add_slip_system(&[1.0, -1.0, 0.0], &[1.0, 1.0, 1.0]).unwrap();
        lattice.add_slip_system(&[0.0, 1.0, -1.0], &[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(lattice.ntotal(), 2);
        let s0 = lattice.system(0).unwrap();
        approx_eq(s0.direction[0], 1.0 / f64::sqrt(2.0), 1e-15);
        approx_eq(s0.direction[1], -1.0 / f64::sqrt(2.0), 1e-15);
        let s1 = lattice.system(1).unwrap();
        approx_eq(s1.direction[1], 1.0 / f64::sqrt(2.0), 1e-15);
        assert_eq!(lattice.system(2).err(), Some("slip system index is out of range"));
    }

    #[test]
    fn schmid_tensor_works() {
        let mut lattice = Lattice::new_cubic(1.0).unwrap();
        lattice.add_slip_system(&[1.0, -1.0, 0.0], &[1.0, 1.0, 1.0]).unwrap();
        let identity = Orientation::new_identity();
        let schmid = lattice.schmid_tensor(0, &identity).unwrap();

        // with the identity orientation the Schmid tensor is sym(d ⊗ n)
        let s2 = f64::sqrt(2.0);
        let s3 = f64::sqrt(3.0);
        let d = [1.0 / s2, -1.0 / s2, 0.0];
        let n = [1.0 / s3, 1.0 / s3, 1.0 / s3];
        for a in 0..3 {
            for b in 0..3 {
                let expected = 0.5 * (d[a] * n[b] + n[a] * d[b]);
                approx_eq(schmid.get(a, b), expected, 1e-15);
            }
        }
    }

    #[test]
    fn resolved_shear_works() {
        let mut lattice = Lattice::new_cubic(1.0).unwrap();
        lattice.add_slip_system(&[1.0, 0.0, 0.0], &[0.0, 0.0, 1.0]).unwrap();
        let stress = Tensor2::from_matrix(
            &[
                [100.0, -25.0, 10.0], //
                [-25.0, -17.0, 15.0], //
                [10.0, 15.0, 35.0],   //
            ],
            Mandel::Symmetric,
        )
        .unwrap();

        // with the identity orientation, system ([100], (001)) resolves σ13
        let identity = Orientation::new_identity();
        let tau = lattice.resolved_shear(0, &stress, &identity).unwrap();
        approx_eq(tau, 10.0, 1e-13);

        // normal stress on the (001) plane is σ33
        let sn = lattice.normal_stress(0, &stress, &identity).unwrap();
        approx_eq(sn, 35.0, 1e-13);

        // a 90° rotation about x maps the plane normal onto -y: σn becomes σ22
        let rot = Orientation::from_axis_angle(&[1.0, 0.0, 0.0], 90.0, AngleUnit::Degrees).unwrap();
        let sn = lattice.normal_stress(0, &stress, &rot).unwrap();
        approx_eq(sn, -17.0, 1e-12);
    }

    #[test]
    fn mandel_representation_is_checked() {
        let mut lattice = Lattice::new_cubic(1.0).unwrap();
        lattice.add_slip_system(&[1.0, 0.0, 0.0], &[0.0, 0.0, 1.0]).unwrap();
        let stress_2d = Tensor2::new(Mandel::Symmetric2D);
        let identity = Orientation::new_identity();
        assert_eq!(
            lattice.resolved_shear(0, &stress_2d, &identity).err(),
            Some("stress tensor must use the symmetric 3D Mandel representation")
        );
    }
}
