//! Built-in benchmark whose cost scales with the sweep coordinates.
//!
//! The model relaxes a one dimensional diffusion problem whose load is
//! piecewise constant over `ndv` design variables, with
//! `elements_per_state * nstate` unknowns. Differentiation uses forward
//! finite differences (one solve per design variable) with the flag off and a
//! single adjoint solve with the flag on.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scb_core::SweepPoint;
use serde::{Deserialize, Serialize};

use crate::model::{BenchHooks, BenchModel, HookResult, SetupContext};

const FD_STEP: f64 = 1e-6;

/// Hook set building [`SyntheticModel`] instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticBench {
    /// Unknowns per unit of state count.
    pub elements_per_state: usize,
    /// Jacobi sweeps per solve.
    pub relaxation_sweeps: usize,
    /// Gradient steps taken by the optimizer.
    pub opt_iterations: usize,
    /// Gradient step length.
    pub step_size: f64,
}

impl SyntheticBench {
    /// Registry name.
    pub const NAME: &'static str = "synthetic";
}

impl Default for SyntheticBench {
    fn default() -> Self {
        Self {
            elements_per_state: 50,
            relaxation_sweeps: 40,
            opt_iterations: 3,
            step_size: 0.05,
        }
    }
}

/// Diffusion model driven by the harness.
#[derive(Debug, Clone)]
pub struct SyntheticModel {
    point: SweepPoint,
    unknowns: usize,
    sweeps: usize,
    opt_iterations: usize,
    step_size: f64,
    design: Vec<f64>,
    state: Vec<f64>,
    gradient: Vec<f64>,
    objective: f64,
    finalized: bool,
}

impl SyntheticModel {
    /// Mean of the relaxed state after the last evaluation.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Gradient of the objective with respect to the design variables.
    pub fn gradient(&self) -> &[f64] {
        &self.gradient
    }

    /// Relaxed state after the last evaluation.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Current design variables.
    pub fn design(&self) -> &[f64] {
        &self.design
    }

    /// Number of state unknowns.
    pub fn unknowns(&self) -> usize {
        self.unknowns
    }

    fn load(&self, design: &[f64]) -> Vec<f64> {
        let ndv = design.len();
        (0..self.unknowns)
            .map(|i| design[i * ndv / self.unknowns])
            .collect()
    }

    fn relax(&self, rhs: &[f64]) -> Vec<f64> {
        let n = rhs.len();
        let mut current = vec![0.0; n];
        let mut next = vec![0.0; n];
        for _ in 0..self.sweeps {
            for i in 0..n {
                let left = if i > 0 { current[i - 1] } else { 0.0 };
                let right = if i + 1 < n { current[i + 1] } else { 0.0 };
                next[i] = (rhs[i] + left + right) / 3.0;
            }
            std::mem::swap(&mut current, &mut next);
        }
        current
    }

    fn evaluate(&self, design: &[f64]) -> (Vec<f64>, f64) {
        let state = self.relax(&self.load(design));
        let objective = state.iter().sum::<f64>() / state.len() as f64;
        (state, objective)
    }

    fn finite_difference_gradient(&self) -> Vec<f64> {
        let (_, base) = self.evaluate(&self.design);
        let mut design = self.design.clone();
        (0..design.len())
            .map(|j| {
                let saved = design[j];
                design[j] = saved + FD_STEP;
                let (_, perturbed) = self.evaluate(&design);
                design[j] = saved;
                (perturbed - base) / FD_STEP
            })
            .collect()
    }

    // The relaxation operator is symmetric, so the adjoint solve reuses it.
    fn adjoint_gradient(&self) -> Vec<f64> {
        let n = self.unknowns;
        let ndv = self.design.len();
        let adjoint = self.relax(&vec![1.0 / n as f64; n]);
        let mut gradient = vec![0.0; ndv];
        for (i, weight) in adjoint.iter().enumerate() {
            gradient[i * ndv / n] += weight;
        }
        gradient
    }

    fn compute_gradient(&self) -> Vec<f64> {
        if self.point.flag {
            self.adjoint_gradient()
        } else {
            self.finite_difference_gradient()
        }
    }

    fn ensure_finalized(&self) -> HookResult {
        if !self.finalized {
            return Err("model used before finalize".into());
        }
        Ok(())
    }
}

impl BenchModel for SyntheticModel {
    fn finalize(&mut self) -> HookResult {
        if self.unknowns == 0 || self.design.is_empty() {
            return Err(format!("degenerate model for {}", self.point).into());
        }
        self.state = vec![0.0; self.unknowns];
        self.gradient = vec![0.0; self.design.len()];
        self.finalized = true;
        Ok(())
    }

    fn run_primary(&mut self) -> HookResult {
        self.ensure_finalized()?;
        let (state, objective) = self.evaluate(&self.design);
        self.state = state;
        self.objective = objective;
        Ok(())
    }

    fn run_diff(&mut self) -> HookResult {
        self.ensure_finalized()?;
        self.gradient = self.compute_gradient();
        Ok(())
    }

    fn run_optimize(&mut self) -> HookResult {
        self.ensure_finalized()?;
        for _ in 0..self.opt_iterations {
            let gradient = self.compute_gradient();
            for (value, slope) in self.design.iter_mut().zip(&gradient) {
                *value = (*value - self.step_size * slope).max(0.0);
            }
            self.gradient = gradient;
        }
        self.run_primary()
    }
}

impl BenchHooks for SyntheticBench {
    type Model = SyntheticModel;

    fn setup(&self, point: &SweepPoint, _ctx: &SetupContext<'_>) -> HookResult<SyntheticModel> {
        Ok(SyntheticModel {
            point: *point,
            unknowns: self.elements_per_state * point.nstate,
            sweeps: self.relaxation_sweeps,
            opt_iterations: self.opt_iterations,
            step_size: self.step_size,
            design: vec![0.0; point.ndv],
            state: Vec::new(),
            gradient: Vec::new(),
            objective: 0.0,
            finalized: false,
        })
    }

    fn post_setup(&self, model: &mut SyntheticModel, point: &SweepPoint) -> HookResult {
        let seed = ((point.ndv as u64) << 32) ^ ((point.nstate as u64) << 8) ^ point.nproc as u64;
        let mut rng = StdRng::seed_from_u64(seed);
        for value in model.design.iter_mut() {
            *value = rng.gen_range(0.5..1.5);
        }
        Ok(())
    }

    fn post_run(&self, model: &mut SyntheticModel, point: &SweepPoint) -> HookResult {
        if !model.objective.is_finite() || model.gradient.iter().any(|g| !g.is_finite()) {
            return Err(format!("non-finite result at {point}").into());
        }
        Ok(())
    }
}
