use crate::rotations::{AngleUnit, Orientation};
use crate::StrError;

/// Tolerance used to decide whether two symmetry operations coincide
const OPERATION_TOL: f64 = 1e-10;

/// Misorientation angles below this value (radians) clamp to the exact identity
const ZERO_ANGLE_TOL: f64 = 1e-10;

/// Upper bound on the order of the supported proper point groups
const MAX_GROUP_ORDER: usize = 24;

/// Holds the finite set of rotations equivalent under a crystal point group
///
/// The operation set is generated as the closure of a small generator set,
/// so it contains the identity and is closed under composition by
/// construction.
pub struct SymmetryGroup {
    symbol: String,
    operations: Vec<Orientation>,
}

impl SymmetryGroup {
    /// Allocates a new instance given a proper point group symbol
    ///
    /// Supported symbols: "1", "2", "222", "3", "32", "4", "422", "6", "622",
    /// "23", "432".
    pub fn new(symbol: &str) -> Result<Self, StrError> {
        let z = [0.0, 0.0, 1.0];
        let x = [1.0, 0.0, 0.0];
        let d = [1.0, 1.0, 1.0]; // cubic body diagonal
        let generators: Vec<([f64; 3], f64)> = match symbol {
            "1" => vec![],
            "2" => vec![(z, 180.0)],
            "222" => vec![(z, 180.0), (x, 180.0)],
            "3" => vec![(z, 120.0)],
            "32" => vec![(z, 120.0), (x, 180.0)],
            "4" => vec![(z, 90.0)],
            "422" => vec![(z, 90.0), (x, 180.0)],
            "6" => vec![(z, 60.0)],
            "622" => vec![(z, 60.0), (x, 180.0)],
            "23" => vec![(z, 180.0), (d, 120.0)],
            "432" => vec![(z, 90.0), (d, 120.0)],
            _ => return Err("unknown point group symbol"),
        };
        let mut operations = vec![Orientation::new_identity()];
        for (axis, angle) in &generators {
            let op = Orientation::from_axis_angle(axis, *angle, AngleUnit::Degrees)?;
            if !contains(&operations, &op) {
                operations.push(op);
            }
        }
        // close the set under composition
        loop {
            let mut added = false;
            let n = operations.len();
            for i in 0..n {
                for j in 0..n {
                    let product = operations[i].compose(&operations[j]);
                    if !contains(&operations, &product) {
                        operations.push(product);
                        added = true;
                    }
                }
            }
            if operations.len() > MAX_GROUP_ORDER {
                return Err("point group closure exceeded the maximum order");
            }
            if !added {
                break;
            }
        }
        Ok(SymmetryGroup {
            symbol: symbol.to_string(),
            operations,
        })
    }

    /// Returns the point group symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the number of symmetry operations (the group order)
    pub fn order(&self) -> usize {
        self.operations.len()
    }

    /// Returns the symmetry operations
    pub fn operations(&self) -> &[Orientation] {
        &self.operations
    }

    /// Computes the minimum-angle rotation relating two orientations
    ///
    /// With r = o1⁻¹ ∘ o2, searches all operation pairs (g1, g2) for the
    /// equivalent rotation g1 ∘ r ∘ g2⁻¹ with the smallest angle. The search
    /// is O(|G|²). Ties are broken by the first candidate found in the fixed
    /// enumeration order of the operation set (deterministic, but dependent
    /// on the generated order). Near-zero minima clamp to the exact identity
    /// so that identical orientations yield angle = 0 without floating-point
    /// residue.
    pub fn misorientation(&self, o1: &Orientation, o2: &Orientation) -> Orientation {
        let r = o1.inverse().compose(o2);
        let mut best = Orientation::new_identity();
        let mut best_angle = f64::MAX;
        for g1 in &self.operations {
            for g2 in &self.operations {
                let candidate = g1.compose(&r.compose(&g2.inverse()));
                let angle = candidate.angle();
                if angle < best_angle {
                    best_angle = angle;
                    best = candidate;
                }
            }
        }
        if best_angle < ZERO_ANGLE_TOL {
            return Orientation::new_identity();
        }
        best
    }

    /// Computes misorientations elementwise over two equal-length lists
    ///
    /// The result at index k is identical to `misorientation(&a[k], &b[k])`;
    /// there is no ordering dependency between elements.
    pub fn misorientation_block(
        &self,
        a: &[Orientation],
        b: &[Orientation],
    ) -> Result<Vec<Orientation>, StrError> {
        if a.len() != b.len() {
            return Err("orientation lists must have the same length");
        }
        Ok(a.iter()
            .zip(b.iter())
            .map(|(o1, o2)| self.misorientation(o1, o2))
            .collect())
    }
}

/// Checks whether an equivalent rotation is already in the operation set
fn contains(operations: &[Orientation], op: &Orientation) -> bool {
    operations.iter().any(|o| o.approx_equal(op, OPERATION_TOL))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SymmetryGroup;
    use crate::rotations::{random_orientations, AngleUnit, Orientation};
    use russell_lab::approx_eq;
    use russell_lab::math::PI;

    #[test]
    fn new_captures_errors() {
        assert_eq!(SymmetryGroup::new("5").err(), Some("unknown point group symbol"));
        assert_eq!(SymmetryGroup::new("").err(), Some("unknown point group symbol"));
    }

    #[test]
    fn group_orders_are_correct() {
        for (symbol, order) in [
            ("1", 1),
            ("2", 2),
            ("222", 4),
            ("3", 3),
            ("32", 6),
            ("4", 4),
            ("422", 8),
            ("6", 6),
            ("622", 12),
            ("23", 12),
            ("432", 24),
        ] {
            let group = SymmetryGroup::new(symbol).unwrap();
            assert_eq!(group.order(), order, "wrong order for group {}", symbol);
        }
    }

    #[test]
    fn operation_set_is_closed() {
        let group = SymmetryGroup::new("432").unwrap();
        let ops = group.operations();
        // contains the identity
        assert!(ops.iter().any(|o| o.approx_equal(&Orientation::new_identity(), 1e-12)));
        // closed under composition
        for a in ops {
            for b in ops {
                let product = a.compose(b);
                assert!(ops.iter().any(|o| o.approx_equal(&product, 1e-10)));
            }
        }
    }

    #[test]
    fn self_misorientation_is_exactly_zero() {
        for symbol in ["1", "222", "622", "432"] {
            let group = SymmetryGroup::new(symbol).unwrap();
            for o in &random_orientations(5) {
                let m = group.misorientation(o, o);
                assert_eq!(m.angle(), 0.0);
            }
        }
    }

    #[test]
    fn misorientation_picks_the_minimum_angle() {
        // two orientations separated by a 100° z-rotation under 4-fold
        // symmetry are equivalent to a 10° misorientation
        let group = SymmetryGroup::new("4").unwrap();
        let o1 = Orientation::new_identity();
        let o2 = Orientation::from_axis_angle(&[0.0, 0.0, 1.0], 100.0, AngleUnit::Degrees).unwrap();
        let m = group.misorientation(&o1, &o2);
        approx_eq(m.angle(), 10.0 * PI / 180.0, 1e-13);
    }

    #[test]
    fn block_matches_elementwise_calls() {
        let group = SymmetryGroup::new("432").unwrap();
        let a = random_orientations(8);
        let b = random_orientations(8);
        let block = group.misorientation_block(&a, &b).unwrap();
        assert_eq!(block.len(), 8);
        for k in 0..8 {
            let single = group.misorientation(&a[k], &b[k]);
            assert!(block[k].approx_equal(&single, 1e-14));
            assert_eq!(block[k].angle(), single.angle());
        }
    }

    #[test]
    fn block_captures_errors() {
        let group = SymmetryGroup::new("432").unwrap();
        let a = random_orientations(3);
        let b = random_orientations(4);
        assert_eq!(
            group.misorientation_block(&a, &b).err(),
            Some("orientation lists must have the same length")
        );
    }
}
