//! Cpmat - Crystal plasticity constitutive modeling kernel
//!
//! This crate implements the constitutive core of a crystal plasticity
//! simulator: crystallographic geometry (orientations, symmetry groups,
//! lattices and slip systems), the named internal-state container passed
//! between models, and the slip-rule / hardening / damage model family.
//! Every rate function ships its analytic derivatives with respect to
//! stress and internal state, so that an outer implicit (Newton-type)
//! integrator can assemble consistent residual Jacobians.
//!
//! The outer strain/stress-controlled drivers and any finite element
//! machinery are external collaborators; they interact with this crate
//! only through the model traits and the [crate::history::History]
//! container.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod crystallography;
pub mod history;
pub mod material;
pub mod prelude;
pub mod rotations;
