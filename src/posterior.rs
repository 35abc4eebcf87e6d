use std::f64::consts::PI;

use itertools::izip;

use crate::model::{LogLikelihood, LogpFunc, NeverFails};

/// Independent zero-mean normal priors, one variance per coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalPrior {
    variances: Vec<f64>,
}

impl NormalPrior {
    /// # Panics
    ///
    /// If any variance is not strictly positive and finite.
    pub fn new(variances: Vec<f64>) -> Self {
        assert!(
            variances.iter().all(|v| v.is_finite() && *v > 0.),
            "prior variances must be positive and finite"
        );
        NormalPrior { variances }
    }

    /// The same variance for all `dim` coefficients.
    pub fn isotropic(dim: usize, variance: f64) -> Self {
        Self::new(vec![variance; dim])
    }

    pub fn dim(&self) -> usize {
        self.variances.len()
    }

    pub fn variances(&self) -> &[f64] {
        &self.variances
    }

    /// Normalised log density.
    pub fn log_density(&self, beta: &[f64]) -> f64 {
        assert!(
            beta.len() == self.dim(),
            "prior has {} coefficients, got {}",
            self.dim(),
            beta.len()
        );
        izip!(beta, &self.variances)
            .map(|(b, var)| -0.5 * ((2. * PI * var).ln() + b * b / var))
            .sum()
    }
}

/// Log-likelihood plus log-prior, the sampling target of a Bayesian fit.
pub struct LogPosterior<L> {
    likelihood: L,
    prior: NormalPrior,
}

impl<L: LogLikelihood> LogPosterior<L> {
    /// # Panics
    ///
    /// If the prior and the likelihood disagree on the number of coefficients.
    pub fn new(likelihood: L, prior: NormalPrior) -> Self {
        assert!(
            likelihood.dim() == prior.dim(),
            "likelihood has {} coefficients but prior has {}",
            likelihood.dim(),
            prior.dim()
        );
        LogPosterior { likelihood, prior }
    }

    pub fn likelihood(&self) -> &L {
        &self.likelihood
    }

    pub fn prior(&self) -> &NormalPrior {
        &self.prior
    }

    pub fn evaluate(&self, beta: &[f64]) -> f64 {
        self.prior.log_density(beta) + self.likelihood.log_likelihood(beta)
    }
}

impl<L: LogLikelihood> LogpFunc for LogPosterior<L> {
    type LogpError = NeverFails;

    fn logp(&mut self, position: &[f64]) -> Result<f64, NeverFails> {
        Ok(self.evaluate(position))
    }

    fn dim(&self) -> usize {
        self.prior.dim()
    }
}
