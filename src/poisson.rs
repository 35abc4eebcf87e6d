//! Poisson log-likelihoods: a single rate, and a log-link regression.

use itertools::izip;

use crate::{
    data::CountData,
    math::{dot, ln_factorial},
    model::LogLikelihood,
};

/// Linear predictors are clamped to this magnitude before exponentiation,
/// which keeps the rate and the summed log-likelihood finite.
pub const MAX_LINEAR_PREDICTOR: f64 = 300.;

#[inline]
fn clamp_predictor(eta: f64) -> f64 {
    eta.clamp(-MAX_LINEAR_PREDICTOR, MAX_LINEAR_PREDICTOR)
}

/// `y ~ Poisson(lambda)` for every observation, parametrised by `lambda`
/// itself.
pub struct PoissonRate {
    data: CountData,
    sum_counts: f64,
    sum_ln_factorial: f64,
}

impl PoissonRate {
    pub fn new(data: CountData) -> Self {
        let sum_counts = data.counts().iter().map(|&y| y as f64).sum();
        let sum_ln_factorial = data.counts().iter().map(|&y| ln_factorial(y)).sum();
        PoissonRate {
            data,
            sum_counts,
            sum_ln_factorial,
        }
    }

    pub fn data(&self) -> &CountData {
        &self.data
    }

    /// The closed-form maximum likelihood estimate, the sample mean.
    pub fn mle(&self) -> f64 {
        self.data.mean_count()
    }
}

impl LogLikelihood for PoissonRate {
    fn dim(&self) -> usize {
        1
    }

    fn log_likelihood(&self, beta: &[f64]) -> f64 {
        assert!(beta.len() == 1, "single-rate model takes one parameter");
        let lambda = beta[0];
        if !(lambda > 0.) || !lambda.is_finite() {
            return f64::NEG_INFINITY;
        }
        let n = self.data.len() as f64;
        -n * lambda + self.sum_counts * lambda.ln() - self.sum_ln_factorial
    }
}

/// `y_i ~ Poisson(exp(x_i . beta))`.
pub struct PoissonRegression {
    data: CountData,
    ln_factorials: Vec<f64>,
}

impl PoissonRegression {
    pub fn new(data: CountData) -> Self {
        let ln_factorials = data.counts().iter().map(|&y| ln_factorial(y)).collect();
        PoissonRegression {
            data,
            ln_factorials,
        }
    }

    pub fn data(&self) -> &CountData {
        &self.data
    }

    fn check_dim(&self, beta: &[f64]) {
        assert!(
            beta.len() == self.data.num_features(),
            "beta has {} coefficients but the design matrix has {} columns",
            beta.len(),
            self.data.num_features()
        );
    }

    /// Expected count of each observation.
    pub fn rates(&self, beta: &[f64]) -> Vec<f64> {
        self.check_dim(beta);
        self.data
            .rows()
            .map(|x| clamp_predictor(dot(x, beta)).exp())
            .collect()
    }

    /// Average change in the expected count when the indicator in `column`
    /// is switched from 0 to 1 for every observation, all else held fixed.
    ///
    /// # Panics
    ///
    /// If `column` is out of range or `beta` has the wrong length.
    pub fn average_treatment_effect(&self, beta: &[f64], column: usize) -> f64 {
        self.check_dim(beta);
        assert!(column < beta.len(), "column {column} out of range");
        let mut x = vec![0f64; beta.len()];
        let total: f64 = self
            .data
            .rows()
            .map(|row| {
                x.copy_from_slice(row);
                x[column] = 0.;
                let untreated = clamp_predictor(dot(&x, beta)).exp();
                x[column] = 1.;
                let treated = clamp_predictor(dot(&x, beta)).exp();
                treated - untreated
            })
            .sum();
        total / self.data.len() as f64
    }
}

impl LogLikelihood for PoissonRegression {
    fn dim(&self) -> usize {
        self.data.num_features()
    }

    fn log_likelihood(&self, beta: &[f64]) -> f64 {
        self.check_dim(beta);
        izip!(self.data.rows(), self.data.counts(), &self.ln_factorials)
            .map(|(x, &y, ln_fact)| {
                let eta = clamp_predictor(dot(x, beta));
                -eta.exp() + y as f64 * eta - ln_fact
            })
            .sum()
    }
}
