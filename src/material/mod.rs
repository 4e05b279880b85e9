//! Implements the slip-rule / hardening / damage material model family

mod crystal_damage;
mod plane_damage;
mod slip_hardening;
mod slip_rule;
mod transfer;
pub use crate::material::crystal_damage::*;
pub use crate::material::plane_damage::*;
pub use crate::material::slip_hardening::*;
pub use crate::material::slip_rule::*;
pub use crate::material::transfer::*;
