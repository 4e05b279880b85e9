use super::{SlipPlaneDamageTrait, SlipRuleTrait, TransferFunctionTrait};
use crate::crystallography::{check_stress, Lattice};
use crate::history::History;
use crate::rotations::Orientation;
use crate::StrError;
use russell_lab::{Matrix, Vector};
use russell_tensor::{t2_dyad_t2, Mandel, Tensor2, Tensor4};

/// History key of the nil damage placeholder variable
const NIL_KEY: &str = "nil_damage";

/// History key of the slip-plane damage variable
const DAMAGE_KEY: &str = "slip_damage";

/// Specifies the essential functions for crystal damage models
///
/// A damage model maps the nominal (undamaged) stress onto an effective
/// stress through a fourth-order projection operator and contributes rates
/// to its declared history entries. Both functions ship full Jacobians
/// w.r.t stress and history, which must agree with central-difference
/// approximations of the base functions (the primary correctness contract
/// of the damage subsystem).
///
/// The rate functions accept a second, read-only `fixed` history holding
/// variables owned by other composed models (e.g., the hardening strengths
/// read by the slip rule); the damage rate must not differentiate through
/// these.
pub trait CrystalDamageTrait: Send + Sync {
    /// Declares the internal variables required by this model
    fn populate_history(&self, history: &mut History) -> Result<(), StrError>;

    /// Writes the initial values of the declared internal variables
    fn init_history(&self, history: &mut History) -> Result<(), StrError>;

    /// Calculates the projection operator mapping nominal to effective stress
    fn projection(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        slip_rule: &dyn SlipRuleTrait,
        temperature: f64,
    ) -> Result<Tensor4, StrError>;

    /// Calculates the derivative of the projection w.r.t each Mandel stress component
    fn d_projection_d_stress(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        slip_rule: &dyn SlipRuleTrait,
        temperature: f64,
    ) -> Result<Vec<Tensor4>, StrError>;

    /// Calculates the derivative of the projection w.r.t each flattened history slot
    fn d_projection_d_history(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        slip_rule: &dyn SlipRuleTrait,
        temperature: f64,
    ) -> Result<Vec<Tensor4>, StrError>;

    /// Calculates the damage-rate contributions to the declared history entries
    fn damage_rate(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        slip_rule: &dyn SlipRuleTrait,
        temperature: f64,
        fixed: &History,
    ) -> Result<History, StrError>;

    /// Calculates the derivative of the damage rates w.r.t stress
    ///
    /// Returns a (history.size() × 6) matrix over flatten offsets and
    /// Mandel components.
    fn d_damage_d_stress(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        slip_rule: &dyn SlipRuleTrait,
        temperature: f64,
        fixed: &History,
    ) -> Result<Matrix, StrError>;

    /// Calculates the derivative of the damage rates w.r.t the history
    ///
    /// Returns a (history.size() × history.size()) matrix over flatten
    /// offsets.
    fn d_damage_d_history(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        slip_rule: &dyn SlipRuleTrait,
        temperature: f64,
        fixed: &History,
    ) -> Result<Matrix, StrError>;
}

/// Returns the identity projection operator (6×6 identity in the Mandel basis)
pub fn identity_projection() -> Tensor4 {
    let mut ii = Tensor4::new(Mandel::Symmetric);
    let mat = ii.matrix_mut();
    for i in 0..6 {
        mat.set(i, i, 1.0);
    }
    ii
}

/// Subtracts a scaled operator: target -= factor · source
fn sub_scaled(target: &mut Tensor4, factor: f64, source: &Tensor4) {
    let mat = target.matrix_mut();
    for a in 0..6 {
        for b in 0..6 {
            let value = mat.get(a, b) - factor * source.matrix().get(a, b);
            mat.set(a, b, value);
        }
    }
}

/// Implements the no-damage baseline model
///
/// The projection operator is always the identity and the rate contribution
/// to the single declared (placeholder) history entry is exactly zero, as
/// are all Jacobians. This model doubles as the contract reference for the
/// damage interface.
pub struct NilDamageModel {}

impl NilDamageModel {
    /// Allocates a new instance
    pub fn new() -> Self {
        NilDamageModel {}
    }
}

impl CrystalDamageTrait for NilDamageModel {
    fn populate_history(&self, history: &mut History) -> Result<(), StrError> {
        history.add_scalar(NIL_KEY)
    }

    fn init_history(&self, history: &mut History) -> Result<(), StrError> {
        history.set_scalar(NIL_KEY, 0.0)
    }

    fn projection(
        &self,
        stress: &Tensor2,
        _history: &History,
        _orientation: &Orientation,
        _lattice: &Lattice,
        _slip_rule: &dyn SlipRuleTrait,
        _temperature: f64,
    ) -> Result<Tensor4, StrError> {
        check_stress(stress)?;
        Ok(identity_projection())
    }

    fn d_projection_d_stress(
        &self,
        stress: &Tensor2,
        _history: &History,
        _orientation: &Orientation,
        _lattice: &Lattice,
        _slip_rule: &dyn SlipRuleTrait,
        _temperature: f64,
    ) -> Result<Vec<Tensor4>, StrError> {
        check_stress(stress)?;
        Ok((0..6).map(|_| Tensor4::new(Mandel::Symmetric)).collect())
    }

    fn d_projection_d_history(
        &self,
        stress: &Tensor2,
        history: &History,
        _orientation: &Orientation,
        _lattice: &Lattice,
        _slip_rule: &dyn SlipRuleTrait,
        _temperature: f64,
    ) -> Result<Vec<Tensor4>, StrError> {
        check_stress(stress)?;
        Ok((0..history.size()).map(|_| Tensor4::new(Mandel::Symmetric)).collect())
    }

    fn damage_rate(
        &self,
        stress: &Tensor2,
        history: &History,
        _orientation: &Orientation,
        _lattice: &Lattice,
        _slip_rule: &dyn SlipRuleTrait,
        _temperature: f64,
        _fixed: &History,
    ) -> Result<History, StrError> {
        check_stress(stress)?;
        let mut rate = history.clone();
        rate.zero();
        Ok(rate)
    }

    fn d_damage_d_stress(
        &self,
        stress: &Tensor2,
        history: &History,
        _orientation: &Orientation,
        _lattice: &Lattice,
        _slip_rule: &dyn SlipRuleTrait,
        _temperature: f64,
        _fixed: &History,
    ) -> Result<Matrix, StrError> {
        check_stress(stress)?;
        Ok(Matrix::new(history.size(), 6))
    }

    fn d_damage_d_history(
        &self,
        stress: &Tensor2,
        history: &History,
        _orientation: &Orientation,
        _lattice: &Lattice,
        _slip_rule: &dyn SlipRuleTrait,
        _temperature: f64,
        _fixed: &History,
    ) -> Result<Matrix, StrError> {
        check_stress(stress)?;
        Ok(Matrix::new(history.size(), history.size()))
    }
}

/// Implements a slip-plane damage model with one lattice-wide damage variable
///
/// The damage variable d accumulates according to a slip-plane kernel (e.g.
/// the plastic-work kernel) evaluated at the mean plane-normal stress, and
/// degrades the plane-normal stress components through a transfer function:
///
/// ```text
/// P(σ, d) = I − Σᵢ map(d, σₙᵢ) Nᵢ ⊗ Nᵢ
/// ḋ       = kernel(τ, γ̇, σ̄ₙ, d)
/// ```
///
/// where Nᵢ is the plane-normal dyad of system i and σₙᵢ = Nᵢ : σ. Slip
/// rates inside ḋ are evaluated by the slip rule reading the hardening
/// strengths from the `fixed` history, so the damage Jacobians do not
/// differentiate through variables owned by the hardening model.
pub struct PlanarDamageModel {
    kernel: Box<dyn SlipPlaneDamageTrait>,
    transfer: Box<dyn TransferFunctionTrait>,
}

impl PlanarDamageModel {
    /// Allocates a new instance
    pub fn new(kernel: Box<dyn SlipPlaneDamageTrait>, transfer: Box<dyn TransferFunctionTrait>) -> Self {
        PlanarDamageModel { kernel, transfer }
    }

    /// Evaluates per-system shears and slip rates plus the mean normal stress
    fn slip_state(
        &self,
        stress: &Tensor2,
        orientation: &Orientation,
        lattice: &Lattice,
        slip_rule: &dyn SlipRuleTrait,
        temperature: f64,
        fixed: &History,
    ) -> Result<(Vector, Vector, f64), StrError> {
        let n = lattice.ntotal();
        let mut shears = Vector::new(n);
        let mut rates = Vector::new(n);
        let mut normal_sum = 0.0;
        for i in 0..n {
            let tau = lattice.resolved_shear(i, stress, orientation)?;
            shears[i] = tau;
            rates[i] = slip_rule.slip_rate(i, tau, fixed, temperature)?;
            normal_sum += lattice.normal_stress(i, stress, orientation)?;
        }
        Ok((shears, rates, normal_sum / (n as f64)))
    }

    fn check(&self, stress: &Tensor2, lattice: &Lattice) -> Result<(), StrError> {
        check_stress(stress)?;
        if lattice.ntotal() == 0 {
            return Err("lattice must define at least one slip system");
        }
        Ok(())
    }
}

impl CrystalDamageTrait for PlanarDamageModel {
    fn populate_history(&self, history: &mut History) -> Result<(), StrError> {
        history.add_scalar(DAMAGE_KEY)
    }

    fn init_history(&self, history: &mut History) -> Result<(), StrError> {
        history.set_scalar(DAMAGE_KEY, self.kernel.initial_damage())
    }

    fn projection(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        _slip_rule: &dyn SlipRuleTrait,
        _temperature: f64,
    ) -> Result<Tensor4, StrError> {
        self.check(stress, lattice)?;
        let damage = history.get_scalar(DAMAGE_KEY)?;
        let mut projection = identity_projection();
        let mut dyad = Tensor4::new(Mandel::Symmetric);
        for i in 0..lattice.ntotal() {
            let nn = lattice.normal_tensor(i, orientation)?;
            let sn = lattice.normal_stress(i, stress, orientation)?;
            let factor = self.transfer.map(damage, sn);
            t2_dyad_t2(&mut dyad, 1.0, &nn, &nn);
            sub_scaled(&mut projection, factor, &dyad);
        }
        Ok(projection)
    }

    fn d_projection_d_stress(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        _slip_rule: &dyn SlipRuleTrait,
        _temperature: f64,
    ) -> Result<Vec<Tensor4>, StrError> {
        self.check(stress, lattice)?;
        let damage = history.get_scalar(DAMAGE_KEY)?;
        let mut result: Vec<Tensor4> = (0..6).map(|_| Tensor4::new(Mandel::Symmetric)).collect();
        let mut dyad = Tensor4::new(Mandel::Symmetric);
        for i in 0..lattice.ntotal() {
            let nn = lattice.normal_tensor(i, orientation)?;
            let sn = lattice.normal_stress(i, stress, orientation)?;
            let d_factor = self.transfer.d_map_d_normal(damage, sn);
            t2_dyad_t2(&mut dyad, 1.0, &nn, &nn);
            // ∂σₙ/∂σ̂ⱼ equals the Mandel component N̂ⱼ
            for j in 0..6 {
                sub_scaled(&mut result[j], d_factor * nn.vector()[j], &dyad);
            }
        }
        Ok(result)
    }

    fn d_projection_d_history(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        _slip_rule: &dyn SlipRuleTrait,
        _temperature: f64,
    ) -> Result<Vec<Tensor4>, StrError> {
        self.check(stress, lattice)?;
        let damage = history.get_scalar(DAMAGE_KEY)?;
        let slot = history.offset(DAMAGE_KEY)?;
        let mut result: Vec<Tensor4> = (0..history.size()).map(|_| Tensor4::new(Mandel::Symmetric)).collect();
        let mut dyad = Tensor4::new(Mandel::Symmetric);
        for i in 0..lattice.ntotal() {
            let nn = lattice.normal_tensor(i, orientation)?;
            let sn = lattice.normal_stress(i, stress, orientation)?;
            let d_factor = self.transfer.d_map_d_damage(damage, sn);
            t2_dyad_t2(&mut dyad, 1.0, &nn, &nn);
            sub_scaled(&mut result[slot], d_factor, &dyad);
        }
        Ok(result)
    }

    fn damage_rate(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        slip_rule: &dyn SlipRuleTrait,
        temperature: f64,
        fixed: &History,
    ) -> Result<History, StrError> {
        self.check(stress, lattice)?;
        let damage = history.get_scalar(DAMAGE_KEY)?;
        let (shears, rates, normal) = self.slip_state(stress, orientation, lattice, slip_rule, temperature, fixed)?;
        let rate = self.kernel.damage_rate(&shears, &rates, normal, damage);
        let mut out = history.clone();
        out.zero();
        out.set_scalar(DAMAGE_KEY, rate)?;
        Ok(out)
    }

    fn d_damage_d_stress(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        slip_rule: &dyn SlipRuleTrait,
        temperature: f64,
        fixed: &History,
    ) -> Result<Matrix, StrError> {
        self.check(stress, lattice)?;
        let n = lattice.ntotal();
        let damage = history.get_scalar(DAMAGE_KEY)?;
        let (shears, rates, normal) = self.slip_state(stress, orientation, lattice, slip_rule, temperature, fixed)?;

        let mut d_shear = Vector::new(n);
        self.kernel.d_damage_rate_d_shear(&shears, &rates, normal, damage, &mut d_shear);
        let mut d_slip = Vector::new(n);
        self.kernel.d_damage_rate_d_slip(&shears, &rates, normal, damage, &mut d_slip);
        let d_normal = self.kernel.d_damage_rate_d_normal(&shears, &rates, normal, damage);

        let mut jj = Matrix::new(history.size(), 6);
        let row = history.offset(DAMAGE_KEY)?;
        for i in 0..n {
            let schmid = lattice.schmid_tensor(i, orientation)?;
            let nn = lattice.normal_tensor(i, orientation)?;
            let d_rate_d_tau = slip_rule.d_slip_rate_d_shear(i, shears[i], fixed, temperature)?;
            let coefficient = d_shear[i] + d_slip[i] * d_rate_d_tau;
            for j in 0..6 {
                let value = jj.get(row, j) + coefficient * schmid.vector()[j] + d_normal * nn.vector()[j] / (n as f64);
                jj.set(row, j, value);
            }
        }
        Ok(jj)
    }

    fn d_damage_d_history(
        &self,
        stress: &Tensor2,
        history: &History,
        orientation: &Orientation,
        lattice: &Lattice,
        slip_rule: &dyn SlipRuleTrait,
        temperature: f64,
        fixed: &History,
    ) -> Result<Matrix, StrError> {
        self.check(stress, lattice)?;
        let damage = history.get_scalar(DAMAGE_KEY)?;
        let (shears, rates, normal) = self.slip_state(stress, orientation, lattice, slip_rule, temperature, fixed)?;
        let mut jj = Matrix::new(history.size(), history.size());
        let slot = history.offset(DAMAGE_KEY)?;
        jj.set(slot, slot, self.kernel.d_damage_rate_d_damage(&shears, &rates, normal, damage));
        Ok(jj)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
