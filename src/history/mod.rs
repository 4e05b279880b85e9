//! Implements the named internal-state container passed between models

mod history;
pub use crate::history::history::*;
