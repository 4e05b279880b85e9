//! Makes available common structures and functions to model crystal plasticity
//!
//! You may write `use cpmat::prelude::*` in your code and obtain access to
//! commonly used functionality.

pub use crate::crystallography::{Lattice, SymmetryGroup};
pub use crate::history::{History, HistoryValue};
pub use crate::material::{
    identity_projection, CrystalDamageTrait, NilDamageModel, PlanarDamageModel, PowerLawSlipRule,
    SigmoidTransformation, SlipHardeningTrait, SlipPlaneDamageTrait, SlipRuleTrait, TransferFunctionTrait,
    VocePerSystemHardening, WorkPlaneDamage,
};
pub use crate::rotations::{random_orientations, AngleUnit, Orientation};
pub use crate::StrError;
