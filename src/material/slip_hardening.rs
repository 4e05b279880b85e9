use crate::history::History;
use crate::StrError;
use russell_lab::Vector;

/// Specifies the essential functions for slip hardening models
///
/// A hardening model evolves per-system slip resistances given the slip
/// rates. All mutable state lives in the caller-owned [History]; model
/// instances hold material constants only and may be shared across
/// integration points evaluated on independent threads.
pub trait SlipHardeningTrait: Send + Sync {
    /// Declares the internal variables required by this model
    fn populate_history(&self, history: &mut History) -> Result<(), StrError>;

    /// Writes the initial values of the declared internal variables
    ///
    /// Only touches keys declared by this model, so several models may
    /// compose their state into one History.
    fn init_history(&self, history: &mut History) -> Result<(), StrError>;

    /// Returns the number of slip systems covered by this model
    fn nsystems(&self) -> usize;

    /// Returns the current slip resistance of a system
    fn strength(&self, system: usize, history: &History, temperature: f64) -> Result<f64, StrError>;

    /// Calculates the strength rate of a system given all slip rates
    fn strength_rate(
        &self,
        system: usize,
        slip_rates: &Vector,
        history: &History,
        temperature: f64,
    ) -> Result<f64, StrError>;

    /// Calculates the derivative of the strength rate w.r.t each slip rate
    ///
    /// `deriv` must have one entry per slip system.
    fn d_strength_rate_d_slip(
        &self,
        system: usize,
        slip_rates: &Vector,
        history: &History,
        temperature: f64,
        deriv: &mut Vector,
    ) -> Result<(), StrError>;

    /// Calculates the derivative of the strength rate w.r.t each history slot
    ///
    /// `deriv` must have one entry per flattened history slot.
    fn d_strength_rate_d_history(
        &self,
        system: usize,
        slip_rates: &Vector,
        history: &History,
        temperature: f64,
        deriv: &mut Vector,
    ) -> Result<(), StrError>;

    /// Calculates the derivative of the strength w.r.t each history slot
    fn d_strength_d_history(
        &self,
        system: usize,
        history: &History,
        temperature: f64,
        deriv: &mut Vector,
    ) -> Result<(), StrError>;
}

/// Implements per-system saturating (Voce-type) hardening
///
/// The strength of system i evolves as
///
/// ```text
/// ṡᵢ = kᵢ ((satᵢ - sᵢ)/(satᵢ - s0ᵢ))^mᵢ |γ̇ᵢ|    (0 once sᵢ ≥ satᵢ)
/// ```
///
/// There is no cross-system coupling: system i hardens with its own slip
/// rate only.
pub struct VocePerSystemHardening {
    s0: Vec<f64>,
    k: Vec<f64>,
    sat: Vec<f64>,
    m: Vec<f64>,
}

impl VocePerSystemHardening {
    /// Allocates a new instance
    ///
    /// All parameter slices must have the same positive length (one entry
    /// per slip system, in lattice insertion order).
    pub fn new(s0: &[f64], k: &[f64], sat: &[f64], m: &[f64]) -> Result<Self, StrError> {
        let n = s0.len();
        if n == 0 {
            return Err("hardening parameter arrays must not be empty");
        }
        if k.len() != n || sat.len() != n || m.len() != n {
            return Err("hardening parameter arrays must have the same length");
        }
        for i in 0..n {
            if s0[i] <= 0.0 {
                return Err("initial strength must be positive");
            }
            if sat[i] <= s0[i] {
                return Err("saturation strength must exceed the initial strength");
            }
        }
        Ok(VocePerSystemHardening {
            s0: s0.to_vec(),
            k: k.to_vec(),
            sat: sat.to_vec(),
            m: m.to_vec(),
        })
    }

    /// Returns the history key of a system's strength
    pub fn key(system: usize) -> String {
        format!("strength{}", system)
    }

    fn check_system(&self, system: usize) -> Result<(), StrError> {
        if system >= self.s0.len() {
            return Err("slip system index is out of range");
        }
        Ok(())
    }

    fn check_slip_rates(&self, slip_rates: &Vector) -> Result<(), StrError> {
        if slip_rates.dim() != self.s0.len() {
            return Err("slip rates vector size must match the number of systems");
        }
        Ok(())
    }
}

impl SlipHardeningTrait for VocePerSystemHardening {
    fn populate_history(&self, history: &mut History) -> Result<(), StrError> {
        for i in 0..self.s0.len() {
            history.add_scalar(&VocePerSystemHardening::key(i))?;
        }
        Ok(())
    }

    fn init_history(&self, history: &mut History) -> Result<(), StrError> {
        for i in 0..self.s0.len() {
            history.set_scalar(&VocePerSystemHardening::key(i), self.s0[i])?;
        }
        Ok(())
    }

    fn nsystems(&self) -> usize {
        self.s0.len()
    }

    fn strength(&self, system: usize, history: &History, _temperature: f64) -> Result<f64, StrError> {
        self.check_system(system)?;
        history.get_scalar(&VocePerSystemHardening::key(system))
    }

    fn strength_rate(
        &self,
        system: usize,
        slip_rates: &Vector,
        history: &History,
        temperature: f64,
    ) -> Result<f64, StrError> {
        self.check_slip_rates(slip_rates)?;
        let s = self.strength(system, history, temperature)?;
        let x = (self.sat[system] - s) / (self.sat[system] - self.s0[system]);
        if x <= 0.0 {
            return Ok(0.0); // saturated
        }
        Ok(self.k[system] * f64::powf(x, self.m[system]) * f64::abs(slip_rates[system]))
    }

    fn d_strength_rate_d_slip(
        &self,
        system: usize,
        slip_rates: &Vector,
        history: &History,
        temperature: f64,
        deriv: &mut Vector,
    ) -> Result<(), StrError> {
        self.check_slip_rates(slip_rates)?;
        if deriv.dim() != self.s0.len() {
            return Err("derivative vector size must match the number of systems");
        }
        deriv.fill(0.0);
        let s = self.strength(system, history, temperature)?;
        let x = (self.sat[system] - s) / (self.sat[system] - self.s0[system]);
        if x <= 0.0 {
            return Ok(());
        }
        deriv[system] = self.k[system] * f64::powf(x, self.m[system]) * f64::signum(slip_rates[system]);
        Ok(())
    }

    fn d_strength_rate_d_history(
        &self,
        system: usize,
        slip_rates: &Vector,
        history: &History,
        temperature: f64,
        deriv: &mut Vector,
    ) -> Result<(), StrError> {
        self.check_slip_rates(slip_rates)?;
        if deriv.dim() != history.size() {
            return Err("derivative vector size must match the history size");
        }
        deriv.fill(0.0);
        let s = self.strength(system, history, temperature)?;
        let denominator = self.sat[system] - self.s0[system];
        let x = (self.sat[system] - s) / denominator;
        if x <= 0.0 {
            return Ok(());
        }
        let offset = history.offset(&VocePerSystemHardening::key(system))?;
        deriv[offset] = -self.k[system] * self.m[system] * f64::powf(x, self.m[system] - 1.0)
            * f64::abs(slip_rates[system])
            / denominator;
        Ok(())
    }

    fn d_strength_d_history(
        &self,
        system: usize,
        history: &History,
        _temperature: f64,
        deriv: &mut Vector,
    ) -> Result<(), StrError> {
        self.check_system(system)?;
        if deriv.dim() != history.size() {
            return Err("derivative vector size must match the history size");
        }
        deriv.fill(0.0);
        let offset = history.offset(&VocePerSystemHardening::key(system))?;
        deriv[offset] = 1.0;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
