//! Maximum likelihood point estimates.
//!
//! The negated log-likelihood is minimised with a Nelder–Mead simplex. The
//! covariance of the estimate is the inverse of a central finite-difference
//! Hessian of the same objective, computed through a symmetric
//! eigendecomposition so that singular or indefinite curvature is detected
//! instead of inverted.

use argmin::{
    core::{CostFunction, Error as SolverError, Executor, State, TerminationReason, TerminationStatus},
    solver::neldermead::NelderMead,
};
use faer::{Mat, Side};
use log::{info, warn};
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::model::LogLikelihood;

/// Settings for the point estimator
#[derive(Debug, Clone, Copy)]
pub struct EstimateSettings {
    /// Iteration budget of the simplex search.
    pub max_iters: u64,
    /// The search stops once the standard deviation of the objective over
    /// the simplex vertices falls below this value.
    pub sd_tolerance: f64,
    /// Edge length of the initial simplex, relative to `max(|x_i|, 1)`.
    pub initial_step: f64,
    /// Finite-difference step for the Hessian, relative to `max(|x_i|, 1)`.
    pub hessian_step: f64,
    /// Eigenvalues of the Hessian below this fraction of the largest one
    /// make it singular.
    pub eigen_tolerance: f64,
}

impl Default for EstimateSettings {
    fn default() -> Self {
        Self {
            max_iters: 5000,
            sd_tolerance: 1e-10,
            initial_step: 0.5,
            hessian_step: 1e-4,
            eigen_tolerance: 1e-10,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    #[error("optimizer did not converge after {iterations} iterations ({reason})")]
    NotConverged {
        iterations: u64,
        reason: String,
        /// Best point visited, usable as a new starting point.
        best: Vec<f64>,
    },
    #[error("initial guess has {found} entries, the model has {expected} coefficients")]
    InitDim { expected: usize, found: usize },
    #[error("optimizer failed: {0}")]
    Backend(String),
}

/// A maximum likelihood estimate.
#[derive(Debug, Clone)]
pub struct Estimate {
    pub params: Vec<f64>,
    pub log_likelihood: f64,
    pub iterations: u64,
    /// `None` if the Hessian at the optimum was singular or not positive
    /// definite.
    pub covariance: Option<Mat<f64>>,
}

impl Estimate {
    pub fn std_errors(&self) -> Option<Vec<f64>> {
        let cov = self.covariance.as_ref()?;
        Some((0..self.params.len()).map(|i| cov[(i, i)].sqrt()).collect())
    }

    pub fn z_values(&self) -> Option<Vec<f64>> {
        let se = self.std_errors()?;
        Some(self.params.iter().zip(se).map(|(b, se)| b / se).collect())
    }

    /// Two-sided p-values under a standard normal reference.
    pub fn p_values(&self) -> Option<Vec<f64>> {
        let normal = Normal::new(0., 1.).expect("Standard normal parameters are valid");
        let z = self.z_values()?;
        Some(z.into_iter().map(|z| 2. * normal.sf(z.abs())).collect())
    }

    pub fn aic(&self) -> f64 {
        2. * self.params.len() as f64 - 2. * self.log_likelihood
    }
}

/// Exposes `-ln L` as an argmin cost.
struct NegLogLikelihood<'a, L: ?Sized> {
    model: &'a L,
}

impl<L: LogLikelihood + ?Sized> NegLogLikelihood<'_, L> {
    fn eval(&self, beta: &[f64]) -> f64 {
        let cost = -self.model.log_likelihood(beta);
        // the simplex ordering cannot handle nan
        if cost.is_nan() {
            f64::INFINITY
        } else {
            cost
        }
    }
}

impl<L: LogLikelihood + ?Sized> CostFunction for NegLogLikelihood<'_, L> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, SolverError> {
        Ok(self.eval(param))
    }
}

fn initial_simplex(init: &[f64], step: f64) -> Vec<Vec<f64>> {
    let mut simplex = Vec::with_capacity(init.len() + 1);
    simplex.push(init.to_vec());
    for i in 0..init.len() {
        let mut vertex = init.to_vec();
        vertex[i] += step * init[i].abs().max(1.);
        simplex.push(vertex);
    }
    simplex
}

/// Maximise the log-likelihood starting from `init`.
pub fn estimate<L: LogLikelihood + ?Sized>(
    model: &L,
    init: &[f64],
    settings: &EstimateSettings,
) -> Result<Estimate, EstimateError> {
    if init.len() != model.dim() {
        return Err(EstimateError::InitDim {
            expected: model.dim(),
            found: init.len(),
        });
    }

    let solver = NelderMead::new(initial_simplex(init, settings.initial_step))
        .with_sd_tolerance(settings.sd_tolerance)
        .map_err(|e| EstimateError::Backend(e.to_string()))?;
    let problem = NegLogLikelihood { model };
    let result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(settings.max_iters))
        .run()
        .map_err(|e| EstimateError::Backend(e.to_string()))?;

    let state = result.state();
    let iterations = state.get_iter();
    let best = state
        .get_best_param()
        .cloned()
        .ok_or_else(|| EstimateError::Backend("optimizer returned no parameters".into()))?;

    match state.get_termination_status() {
        TerminationStatus::Terminated(
            TerminationReason::SolverConverged | TerminationReason::TargetCostReached,
        ) => {}
        status => {
            return Err(EstimateError::NotConverged {
                iterations,
                reason: format!("{status:?}"),
                best,
            })
        }
    }

    let log_likelihood = model.log_likelihood(&best);
    info!("optimizer converged after {iterations} iterations, log-likelihood {log_likelihood:.6}");

    let objective = NegLogLikelihood { model };
    let hessian = finite_diff_hessian(|x| objective.eval(x), &best, settings.hessian_step);
    let covariance = invert_spd(&hessian, settings.eigen_tolerance);
    if covariance.is_none() {
        warn!("hessian at the optimum is singular or indefinite, standard errors unavailable");
    }

    Ok(Estimate {
        params: best,
        log_likelihood,
        iterations,
        covariance,
    })
}

/// Halvings tried before a step that leaves the support is given up on.
const MAX_STEP_HALVINGS: usize = 60;

/// Central finite-difference Hessian of `f` at `x`.
///
/// The step of coordinate `i` is `rel_step * max(|x_i|, 1)`. If `f` is not
/// finite one step away in either direction, the step falls back to
/// `rel_step * |x_i|` and is halved until both neighbours are finite, so
/// optima close to the edge of the support still get their curvature.
pub fn finite_diff_hessian<F: Fn(&[f64]) -> f64>(f: F, x: &[f64], rel_step: f64) -> Mat<f64> {
    let n = x.len();
    let mut point = x.to_vec();
    let mut eval_at = |shifts: &[(usize, f64)]| {
        point.copy_from_slice(x);
        shifts.iter().for_each(|&(i, d)| point[i] += d);
        f(&point)
    };

    let steps: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, xi)| {
            let mut inside =
                |h: f64| eval_at(&[(i, h)]).is_finite() && eval_at(&[(i, -h)]).is_finite();
            let mut h = rel_step * xi.abs().max(1.);
            if inside(h) {
                return h;
            }
            if *xi != 0. {
                h = h.min(rel_step * xi.abs());
            }
            for _ in 0..MAX_STEP_HALVINGS {
                if inside(h) {
                    break;
                }
                h *= 0.5;
            }
            h
        })
        .collect();

    let center = eval_at(&[]);
    let mut hessian = Mat::zeros(n, n);
    for i in 0..n {
        let hi = steps[i];
        let plus = eval_at(&[(i, hi)]);
        let minus = eval_at(&[(i, -hi)]);
        hessian[(i, i)] = (plus - 2. * center + minus) / (hi * hi);
        for j in 0..i {
            let hj = steps[j];
            let pp = eval_at(&[(i, hi), (j, hj)]);
            let pm = eval_at(&[(i, hi), (j, -hj)]);
            let mp = eval_at(&[(i, -hi), (j, hj)]);
            let mm = eval_at(&[(i, -hi), (j, -hj)]);
            let value = (pp - pm - mp + mm) / (4. * hi * hj);
            hessian[(i, j)] = value;
            hessian[(j, i)] = value;
        }
    }
    hessian
}

/// Inverse of a symmetric positive definite matrix, `None` if it has a
/// non-finite entry or an eigenvalue below `rel_tol` times the largest.
pub fn invert_spd(matrix: &Mat<f64>, rel_tol: f64) -> Option<Mat<f64>> {
    let n = matrix.nrows();
    if !(0..matrix.ncols()).all(|j| matrix.col(j).iter().all(|v| v.is_finite())) {
        return None;
    }

    let eig = matrix.self_adjoint_eigen(Side::Lower).ok()?;
    let vals: Vec<f64> = eig.S().column_vector().iter().copied().collect();
    let vecs = eig.U();

    let largest = vals.iter().copied().fold(0f64, f64::max);
    if !(largest > 0.) || vals.iter().any(|&v| v <= rel_tol * largest) {
        return None;
    }

    Some(Mat::from_fn(n, n, |i, j| {
        (0..n).map(|k| vecs[(i, k)] * vecs[(j, k)] / vals[k]).sum()
    }))
}
