use rand::Rng;
use rand_distr::StandardNormal;
use thiserror::Error;

use crate::model::{LogpError, LogpFunc};

#[derive(Error, Debug)]
pub enum MhError {
    #[error("proposal scale {index} is {value}, scales must be finite and non-negative")]
    InvalidProposal { index: usize, value: f64 },
    #[error("proposal has {found} scales but the density has {expected} dimensions")]
    ProposalDim { expected: usize, found: usize },
    #[error("start point has {found} entries but the density has {expected} dimensions")]
    StartDim { expected: usize, found: usize },
    #[error("chain has no position, call set_position before drawing")]
    Uninitialized,
    #[error("Logp function returned unrecoverable error")]
    LogpFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("at least one chain is required")]
    NoChains,
}

/// Per-coordinate standard deviations of a Gaussian random-walk proposal.
///
/// The proposal is symmetric, so the acceptance ratio needs no correction.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    scales: Box<[f64]>,
}

impl Proposal {
    pub fn new(scales: Vec<f64>) -> Result<Self, MhError> {
        if let Some((index, &value)) = scales
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s < 0.)
        {
            return Err(MhError::InvalidProposal { index, value });
        }
        Ok(Proposal {
            scales: scales.into(),
        })
    }

    pub fn isotropic(dim: usize, scale: f64) -> Result<Self, MhError> {
        Self::new(vec![scale; dim])
    }

    pub fn dim(&self) -> usize {
        self.scales.len()
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    fn propose<R: Rng + ?Sized>(&self, rng: &mut R, current: &[f64], out: &mut [f64]) {
        out.iter_mut()
            .zip(current.iter().zip(self.scales.iter()))
            .for_each(|(out, (&x, &scale))| {
                let z: f64 = rng.sample(StandardNormal);
                *out = x + scale * z;
            });
    }
}

/// Diagnostic information about a single draw.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Progress {
    pub draw: u64,
    pub chain: u64,
    /// Whether the proposal of this iteration replaced the position.
    pub accepted: bool,
    /// Log density at the recorded position.
    pub logp: f64,
}

/// Draw samples from a target density with a Markov chain.
pub trait Chain {
    /// Initialize the chain at a position. This should be called
    /// before calling draw.
    ///
    /// This fails if the logp function returns an unrecoverable error. A
    /// start point with zero density is accepted, the chain moves away from
    /// it at the first proposal with positive density.
    fn set_position(&mut self, position: &[f64]) -> Result<(), MhError>;

    /// Perform one iteration and return the resulting position together
    /// with some diagnostic information.
    ///
    /// The position is returned whether or not the proposal was accepted.
    fn draw(&mut self) -> Result<(Box<[f64]>, Progress), MhError>;

    /// The dimensionality of the posterior.
    fn dim(&self) -> usize;
}

/// Metropolis acceptance test on log densities.
///
/// `nan` is ordered like `-inf`. A proposal with zero density is never
/// accepted; a state with zero density is left for any proposal with
/// positive density.
fn accept(log_u: f64, current: f64, proposed: f64) -> bool {
    let current = if current.is_nan() {
        f64::NEG_INFINITY
    } else {
        current
    };
    let proposed = if proposed.is_nan() {
        f64::NEG_INFINITY
    } else {
        proposed
    };
    if proposed == f64::NEG_INFINITY {
        return false;
    }
    if current == f64::NEG_INFINITY {
        return true;
    }
    log_u < proposed - current
}

fn eval_logp<F: LogpFunc>(
    logp: &mut F,
    position: &[f64],
    recoverable_errors: &mut u64,
) -> Result<f64, MhError> {
    match logp.logp(position) {
        Ok(value) => Ok(value),
        Err(err) if err.is_recoverable() => {
            *recoverable_errors += 1;
            Ok(f64::NEG_INFINITY)
        }
        Err(err) => Err(MhError::LogpFailure(Box::new(err))),
    }
}

/// Random-walk Metropolis chain.
///
/// The log density of the current position is cached, so every iteration
/// evaluates the target exactly once.
pub struct MetropolisChain<F: LogpFunc, R: Rng> {
    logp: F,
    proposal: Proposal,
    rng: R,
    position: Box<[f64]>,
    candidate: Box<[f64]>,
    current_logp: Option<f64>,
    chain: u64,
    draw_count: u64,
    accept_count: u64,
    recoverable_errors: u64,
}

impl<F: LogpFunc, R: Rng> MetropolisChain<F, R> {
    pub fn new(logp: F, proposal: Proposal, rng: R, chain: u64) -> Result<Self, MhError> {
        let dim = logp.dim();
        if proposal.dim() != dim {
            return Err(MhError::ProposalDim {
                expected: dim,
                found: proposal.dim(),
            });
        }
        Ok(MetropolisChain {
            logp,
            proposal,
            rng,
            position: vec![0f64; dim].into(),
            candidate: vec![0f64; dim].into(),
            current_logp: None,
            chain,
            draw_count: 0,
            accept_count: 0,
            recoverable_errors: 0,
        })
    }

    /// Fraction of accepted proposals so far.
    pub fn acceptance_rate(&self) -> f64 {
        if self.draw_count == 0 {
            return 0.;
        }
        self.accept_count as f64 / self.draw_count as f64
    }

    /// Number of proposals whose log density evaluation failed recoverably.
    pub fn recoverable_errors(&self) -> u64 {
        self.recoverable_errors
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }
}

impl<F: LogpFunc, R: Rng> Chain for MetropolisChain<F, R> {
    fn set_position(&mut self, position: &[f64]) -> Result<(), MhError> {
        if position.len() != self.dim() {
            return Err(MhError::StartDim {
                expected: self.dim(),
                found: position.len(),
            });
        }
        let logp = eval_logp(&mut self.logp, position, &mut self.recoverable_errors)?;
        self.position.copy_from_slice(position);
        self.current_logp = Some(logp);
        Ok(())
    }

    fn draw(&mut self) -> Result<(Box<[f64]>, Progress), MhError> {
        let current_logp = self.current_logp.ok_or(MhError::Uninitialized)?;

        self.proposal
            .propose(&mut self.rng, &self.position, &mut self.candidate);
        let proposed_logp =
            eval_logp(&mut self.logp, &self.candidate, &mut self.recoverable_errors)?;

        let u: f64 = self.rng.random();
        let accepted = accept(u.ln(), current_logp, proposed_logp);
        let logp = if accepted {
            std::mem::swap(&mut self.position, &mut self.candidate);
            self.current_logp = Some(proposed_logp);
            self.accept_count += 1;
            proposed_logp
        } else {
            current_logp
        };

        let progress = Progress {
            draw: self.draw_count,
            chain: self.chain,
            accepted,
            logp,
        };
        self.draw_count += 1;
        Ok((self.position.clone(), progress))
    }

    fn dim(&self) -> usize {
        self.logp.dim()
    }
}
