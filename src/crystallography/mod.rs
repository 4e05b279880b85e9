//! Implements crystallographic geometry: symmetry groups, lattices, and slip systems

mod lattice;
mod symmetry_group;
pub use crate::crystallography::lattice::*;
pub use crate::crystallography::symmetry_group::*;
