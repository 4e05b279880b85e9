//! Implements rotations represented as unit quaternions

mod orientation;
pub use crate::rotations::orientation::*;
