//! Core abstractions for the likelihood evaluators and sampling targets.
//!
//! A [`LogLikelihood`] is a pure function of the parameter vector over a fixed
//! observation set and is what the point estimator optimises. A [`LogpFunc`] is
//! an unnormalised log density that the Metropolis sampler explores; it may
//! fail, and its failures are classified through [`LogpError`].

use std::fmt::Debug;

use thiserror::Error;

/// Signed log-likelihood of a discrete-outcome model.
///
/// Implementations never negate: callers that minimise take the negative
/// themselves.
pub trait LogLikelihood {
    /// Number of coefficients.
    fn dim(&self) -> usize;

    /// Evaluate `ln L(beta)`.
    ///
    /// Returns `-inf` for parameters outside the support of the model.
    ///
    /// # Panics
    ///
    /// If `beta.len() != self.dim()`.
    fn log_likelihood(&self, beta: &[f64]) -> f64;
}

impl<L: LogLikelihood + ?Sized> LogLikelihood for &L {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn log_likelihood(&self, beta: &[f64]) -> f64 {
        (**self).log_likelihood(beta)
    }
}

/// Errors that happen when we evaluate a log density.
pub trait LogpError: std::error::Error {
    /// Unrecoverable errors stop sampling, recoverable errors are treated
    /// as a proposal with zero density.
    fn is_recoverable(&self) -> bool;
}

/// Unnormalised log density explored by the sampler.
pub trait LogpFunc {
    type LogpError: Debug + Send + Sync + LogpError + 'static;

    fn logp(&mut self, position: &[f64]) -> Result<f64, Self::LogpError>;
    fn dim(&self) -> usize;
}

/// Error type of log densities that cannot fail.
#[derive(Error, Debug)]
pub enum NeverFails {}

impl LogpError for NeverFails {
    fn is_recoverable(&self) -> bool {
        match *self {}
    }
}

/// Wrap a closure as a log density of fixed dimension.
pub struct FnLogp<F> {
    func: F,
    dim: usize,
}

impl<F: FnMut(&[f64]) -> f64> FnLogp<F> {
    pub fn new(dim: usize, func: F) -> Self {
        FnLogp { func, dim }
    }
}

impl<F: FnMut(&[f64]) -> f64> LogpFunc for FnLogp<F> {
    type LogpError = NeverFails;

    fn logp(&mut self, position: &[f64]) -> Result<f64, NeverFails> {
        assert!(position.len() == self.dim);
        Ok((self.func)(position))
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
