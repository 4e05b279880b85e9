use russell_lab::Vector;

/// Specifies a scalar damage kernel acting on a slip plane
///
/// The kernel accumulates a damage rate from the per-system resolved shears
/// and slip rates, a normal-stress measure, and the current damage value,
/// and exposes exact partial derivatives w.r.t every argument.
pub trait SlipPlaneDamageTrait: Send + Sync {
    /// Returns the initial value of the plane damage variable
    fn initial_damage(&self) -> f64;

    /// Calculates the damage rate
    fn damage_rate(&self, shears: &Vector, slip_rates: &Vector, normal: f64, damage: f64) -> f64;

    /// Calculates the derivative of the damage rate w.r.t each resolved shear
    fn d_damage_rate_d_shear(
        &self,
        shears: &Vector,
        slip_rates: &Vector,
        normal: f64,
        damage: f64,
        deriv: &mut Vector,
    );

    /// Calculates the derivative of the damage rate w.r.t each slip rate
    fn d_damage_rate_d_slip(
        &self,
        shears: &Vector,
        slip_rates: &Vector,
        normal: f64,
        damage: f64,
        deriv: &mut Vector,
    );

    /// Calculates the derivative of the damage rate w.r.t the normal stress
    fn d_damage_rate_d_normal(&self, shears: &Vector, slip_rates: &Vector, normal: f64, damage: f64) -> f64;

    /// Calculates the derivative of the damage rate w.r.t the damage value
    fn d_damage_rate_d_damage(&self, shears: &Vector, slip_rates: &Vector, normal: f64, damage: f64) -> f64;
}

/// Implements the plastic-work damage kernel
///
/// ```text
/// ḋ = Σᵢ τᵢ γ̇ᵢ
/// ```
///
/// The rate is exactly the slip-plane plastic work rate, independent of the
/// normal stress and of the current damage value.
pub struct WorkPlaneDamage {}

impl WorkPlaneDamage {
    /// Allocates a new instance
    pub fn new() -> Self {
        WorkPlaneDamage {}
    }
}

impl SlipPlaneDamageTrait for WorkPlaneDamage {
    fn initial_damage(&self) -> f64 {
        0.0
    }

    fn damage_rate(&self, shears: &Vector, slip_rates: &Vector, _normal: f64, _damage: f64) -> f64 {
        assert_eq!(shears.dim(), slip_rates.dim());
        let mut sum = 0.0;
        for i in 0..shears.dim() {
            sum += shears[i] * slip_rates[i];
        }
        sum
    }

    fn d_damage_rate_d_shear(
        &self,
        shears: &Vector,
        slip_rates: &Vector,
        _normal: f64,
        _damage: f64,
        deriv: &mut Vector,
    ) {
        assert_eq!(deriv.dim(), shears.dim());
        for i in 0..shears.dim() {
            deriv[i] = slip_rates[i];
        }
    }

    fn d_damage_rate_d_slip(
        &self,
        shears: &Vector,
        _slip_rates: &Vector,
        _normal: f64,
        _damage: f64,
        deriv: &mut Vector,
    ) {
        assert_eq!(deriv.dim(), shears.dim());
        for i in 0..shears.dim() {
            deriv[i] = shears[i];
        }
    }

    fn d_damage_rate_d_normal(&self, _shears: &Vector, _slip_rates: &Vector, _normal: f64, _damage: f64) -> f64 {
        0.0
    }

    fn d_damage_rate_d_damage(&self, _shears: &Vector, _slip_rates: &Vector, _normal: f64, _damage: f64) -> f64 {
        0.0
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
