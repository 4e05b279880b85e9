use super::SlipHardeningTrait;
use crate::history::History;
use crate::StrError;
use russell_lab::Vector;

/// Specifies the essential functions for slip rules
///
/// A slip rule maps the resolved shear stress on a system and the current
/// hardening state to a slip rate, and exposes the derivatives required by
/// an implicit integrator. A slip rule owns its hardening model and
/// delegates history declaration and initialization to it.
pub trait SlipRuleTrait: Send + Sync {
    /// Declares the internal variables required by this model
    fn populate_history(&self, history: &mut History) -> Result<(), StrError>;

    /// Writes the initial values of the declared internal variables
    fn init_history(&self, history: &mut History) -> Result<(), StrError>;

    /// Returns the associated hardening model
    fn hardening(&self) -> &dyn SlipHardeningTrait;

    /// Returns the current slip resistance of a system
    fn strength(&self, system: usize, history: &History, temperature: f64) -> Result<f64, StrError>;

    /// Calculates the slip rate of a system given the resolved shear stress
    fn slip_rate(&self, system: usize, shear: f64, history: &History, temperature: f64) -> Result<f64, StrError>;

    /// Calculates the derivative of the slip rate w.r.t the resolved shear
    fn d_slip_rate_d_shear(
        &self,
        system: usize,
        shear: f64,
        history: &History,
        temperature: f64,
    ) -> Result<f64, StrError>;

    /// Calculates the derivative of the slip rate w.r.t each history slot
    ///
    /// `deriv` must have one entry per flattened history slot.
    fn d_slip_rate_d_history(
        &self,
        system: usize,
        shear: f64,
        history: &History,
        temperature: f64,
        deriv: &mut Vector,
    ) -> Result<(), StrError>;
}

/// Implements the power-law slip rule
///
/// ```text
/// γ̇ = g0 sign(τ) (|τ| / s)ⁿ
/// ```
///
/// where s is the current slip resistance provided by the hardening model.
/// A non-positive resistance makes the power law ill-defined and is a fatal
/// material-data error.
pub struct PowerLawSlipRule {
    hardening: Box<dyn SlipHardeningTrait>,
    g0: f64,
    n: f64,
}

impl PowerLawSlipRule {
    /// Allocates a new instance
    pub fn new(hardening: Box<dyn SlipHardeningTrait>, g0: f64, n: f64) -> Result<Self, StrError> {
        if g0 <= 0.0 {
            return Err("reference slip rate must be positive");
        }
        if n < 1.0 {
            return Err("rate sensitivity exponent must be at least one");
        }
        Ok(PowerLawSlipRule { hardening, g0, n })
    }

    fn checked_strength(&self, system: usize, history: &History, temperature: f64) -> Result<f64, StrError> {
        let strength = self.hardening.strength(system, history, temperature)?;
        if strength <= 0.0 {
            return Err("slip system strength must be positive");
        }
        Ok(strength)
    }
}

impl SlipRuleTrait for PowerLawSlipRule {
    fn populate_history(&self, history: &mut History) -> Result<(), StrError> {
        self.hardening.populate_history(history)
    }

    fn init_history(&self, history: &mut History) -> Result<(), StrError> {
        self.hardening.init_history(history)
    }

    fn hardening(&self) -> &dyn SlipHardeningTrait {
        self.hardening.as_ref()
    }

    fn strength(&self, system: usize, history: &History, temperature: f64) -> Result<f64, StrError> {
        self.hardening.strength(system, history, temperature)
    }

    fn slip_rate(&self, system: usize, shear: f64, history: &History, temperature: f64) -> Result<f64, StrError> {
        let strength = self.checked_strength(system, history, temperature)?;
        Ok(self.g0 * f64::signum(shear) * f64::powf(f64::abs(shear) / strength, self.n))
    }

    fn d_slip_rate_d_shear(
        &self,
        system: usize,
        shear: f64,
        history: &History,
        temperature: f64,
    ) -> Result<f64, StrError> {
        let strength = self.checked_strength(system, history, temperature)?;
        Ok(self.g0 * self.n / strength * f64::powf(f64::abs(shear) / strength, self.n - 1.0))
    }

    fn d_slip_rate_d_history(
        &self,
        system: usize,
        shear: f64,
        history: &History,
        temperature: f64,
        deriv: &mut Vector,
    ) -> Result<(), StrError> {
        if deriv.dim() != history.size() {
            return Err("derivative vector size must match the history size");
        }
        let strength = self.checked_strength(system, history, temperature)?;
        let rate = self.slip_rate(system, shear, history, temperature)?;
        // chain rule: ∂γ̇/∂h = (∂γ̇/∂s)(∂s/∂h) with ∂γ̇/∂s = -n γ̇ / s
        self.hardening.d_strength_d_history(system, history, temperature, deriv)?;
        let factor = -self.n * rate / strength;
        for k in 0..deriv.dim() {
            deriv[k] *= factor;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{PowerLawSlipRule, SlipRuleTrait};
    use crate::history::History;
    use crate::material::VocePerSystemHardening;
    use russell_lab::{approx_eq, deriv1_central5, Vector};

    const T: f64 = 300.0;

    /// Compares an analytic derivative with a central-difference value
    fn check_deriv(ana: f64, num: f64) {
        approx_eq(ana, num, 1e-6 * (1.0 + f64::abs(num)));
    }

    fn sample_rule() -> PowerLawSlipRule {
        let hardening = VocePerSystemHardening::new(&[20.0], &[1000.0], &[40.0], &[1.5]).unwrap();
        PowerLawSlipRule::new(Box::new(hardening), 1.0, 3.0).unwrap()
    }

    #[test]
    fn new_captures_errors() {
        let hardening = VocePerSystemHardening::new(&[20.0], &[1000.0], &[40.0], &[1.5]).unwrap();
        assert_eq!(
            PowerLawSlipRule::new(Box::new(hardening), 0.0, 3.0).err(),
            Some("reference slip rate must be positive")
        );
        let hardening = VocePerSystemHardening::new(&[20.0], &[1000.0], &[40.0], &[1.5]).unwrap();
        assert_eq!(
            PowerLawSlipRule::new(Box::new(hardening), 1.0, 0.5).err(),
            Some("rate sensitivity exponent must be at least one")
        );
    }

    #[test]
    fn slip_rate_works() {
        let rule = sample_rule();
        let mut history = History::new();
        rule.populate_history(&mut history).unwrap();
        rule.init_history(&mut history).unwrap();

        // γ̇ = g0 sign(τ) (|τ|/s)ⁿ with s = 20
        let tau: f64 = 50.0;
        approx_eq(rule.slip_rate(0, tau, &history, T).unwrap(), (50.0f64 / 20.0).powi(3), 1e-14);
        approx_eq(
            rule.slip_rate(0, -tau, &history, T).unwrap(),
            -(50.0f64 / 20.0).powi(3),
            1e-14,
        );
    }

    #[test]
    fn non_positive_strength_is_fatal() {
        let rule = sample_rule();
        let mut history = History::new();
        rule.populate_history(&mut history).unwrap();
        history.set_scalar("strength0", -5.0).unwrap();
        assert_eq!(
            rule.slip_rate(0, 50.0, &history, T).err(),
            Some("slip system strength must be positive")
        );
        assert_eq!(
            rule.d_slip_rate_d_shear(0, 50.0, &history, T).err(),
            Some("slip system strength must be positive")
        );
    }

    #[test]
    fn d_slip_rate_d_shear_works() {
        let rule = sample_rule();
        let mut history = History::new();
        rule.populate_history(&mut history).unwrap();
        rule.init_history(&mut history).unwrap();

        for tau in [30.0, 50.0, -45.0] {
            let ana = rule.d_slip_rate_d_shear(0, tau, &history, T).unwrap();
            let mut args = 0;
            let num = deriv1_central5(tau, &mut args, |t, _: &mut i32| rule.slip_rate(0, t, &history, T)).unwrap();
            check_deriv(ana, num);
        }
    }

    #[test]
    fn d_slip_rate_d_history_works() {
        let rule = sample_rule();
        let mut history = History::new();
        rule.populate_history(&mut history).unwrap();
        rule.init_history(&mut history).unwrap();
        history.set_scalar("strength0", 23.0).unwrap();

        let tau = 50.0;
        let mut ana = Vector::new(history.size());
        rule.d_slip_rate_d_history(0, tau, &history, T, &mut ana).unwrap();

        let flat = history.flatten();
        for j in 0..history.size() {
            let mut args = history.clone();
            let num = deriv1_central5(flat[j], &mut args, |v, a| {
                let mut perturbed = flat.clone();
                perturbed[j] = v;
                a.restore(&perturbed)?;
                rule.slip_rate(0, tau, a, T)
            })
            .unwrap();
            check_deriv(ana[j], num);
        }
    }
}
