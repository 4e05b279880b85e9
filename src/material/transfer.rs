use crate::StrError;

/// Specifies a scalar transfer function used inside damage models
///
/// A transfer function maps a damage variable and a normal-stress measure
/// into a saturation factor, typically in [0, 1], together with its exact
/// partial derivatives.
pub trait TransferFunctionTrait: Send + Sync {
    /// Maps the damage variable and normal stress into a saturation factor
    fn map(&self, damage: f64, normal: f64) -> f64;

    /// Calculates the derivative of the map w.r.t the damage variable
    fn d_map_d_damage(&self, damage: f64, normal: f64) -> f64;

    /// Calculates the derivative of the map w.r.t the normal stress
    fn d_map_d_normal(&self, damage: f64, normal: f64) -> f64;
}

/// Implements a sigmoid saturation transform of the damage variable
///
/// ```text
/// map(x, ·) = 1                          for x ≥ c
/// map(x, ·) = 1 / (1 + (x/(c-x))^(-β))   for 0 < x < c
/// map(x, ·) = 0                          for x ≤ 0
/// ```
///
/// The map is continuous at x = c (the left limit equals one) and ignores
/// the normal stress entirely.
pub struct SigmoidTransformation {
    c: f64,
    beta: f64,
}

impl SigmoidTransformation {
    /// Allocates a new instance
    pub fn new(c: f64, beta: f64) -> Result<Self, StrError> {
        if c <= 0.0 {
            return Err("sigmoid saturation level must be positive");
        }
        if beta <= 0.0 {
            return Err("sigmoid exponent must be positive");
        }
        Ok(SigmoidTransformation { c, beta })
    }
}

impl TransferFunctionTrait for SigmoidTransformation {
    fn map(&self, damage: f64, _normal: f64) -> f64 {
        if damage >= self.c {
            return 1.0;
        }
        if damage <= 0.0 {
            return 0.0;
        }
        // 1/(1 + u^(-β)) = u^β/(1 + u^β), stable for small x
        let ub = f64::powf(damage / (self.c - damage), self.beta);
        ub / (1.0 + ub)
    }

    fn d_map_d_damage(&self, damage: f64, _normal: f64) -> f64 {
        if damage >= self.c || damage <= 0.0 {
            return 0.0;
        }
        let u = damage / (self.c - damage);
        let ub = f64::powf(u, self.beta);
        let du = self.c / ((self.c - damage) * (self.c - damage));
        self.beta * f64::powf(u, self.beta - 1.0) * du / ((1.0 + ub) * (1.0 + ub))
    }

    fn d_map_d_normal(&self, _damage: f64, _normal: f64) -> f64 {
        0.0
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
