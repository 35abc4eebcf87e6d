use anyhow::{Context, Result};
use log::{debug, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::{
    chain::{Chain, MetropolisChain, MhError, Progress, Proposal},
    model::LogpFunc,
    trace::Trace,
};

/// Settings for the Metropolis sampler
#[derive(Debug, Clone, Copy)]
pub struct MhSettings {
    /// The number of iterations per chain. Every iteration records one draw.
    pub num_draws: u64,
    /// Seed of the random number generator. Chain `i` uses stream `i` of
    /// this seed, so chains are independent and reproducible.
    pub seed: u64,
    /// Number of chains for `sample_parallel`.
    pub num_chains: usize,
}

impl Default for MhSettings {
    fn default() -> Self {
        Self {
            num_draws: 2000,
            seed: 0,
            num_chains: 4,
        }
    }
}

impl MhSettings {
    pub fn new_chain<F: LogpFunc>(
        &self,
        chain: u64,
        logp: F,
        proposal: Proposal,
    ) -> Result<MetropolisChain<F, ChaCha8Rng>, MhError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(chain);
        MetropolisChain::new(logp, proposal, rng, chain)
    }
}

/// Lazily draw `settings.num_draws` positions from a single chain.
pub fn sample_sequentially<F: LogpFunc>(
    logp: F,
    start: &[f64],
    proposal: Proposal,
    settings: &MhSettings,
    chain: u64,
) -> Result<impl Iterator<Item = Result<(Box<[f64]>, Progress), MhError>>, MhError> {
    let mut sampler = settings.new_chain(chain, logp, proposal)?;
    sampler.set_position(start)?;
    Ok((0..settings.num_draws).map(move |_| sampler.draw()))
}

fn run_chain<F: LogpFunc>(
    logp: F,
    start: &[f64],
    proposal: Proposal,
    settings: &MhSettings,
    chain: u64,
) -> Result<Trace, MhError> {
    let mut sampler = settings.new_chain(chain, logp, proposal)?;
    sampler.set_position(start)?;
    debug!("chain {chain}: starting {} draws", settings.num_draws);

    let mut trace = Trace::with_capacity(chain, settings.num_draws as usize);
    for _ in 0..settings.num_draws {
        let (point, progress) = sampler.draw()?;
        trace.append_value(point, &progress);
    }

    debug!(
        "chain {chain}: finished, acceptance rate {:.3}",
        sampler.acceptance_rate()
    );
    if sampler.recoverable_errors() > 0 {
        warn!(
            "chain {chain}: {} proposals were rejected because the density failed to evaluate",
            sampler.recoverable_errors()
        );
    }
    Ok(trace)
}

/// Run a single chain (chain id 0) and record every iteration.
///
/// The trace always has exactly `settings.num_draws` entries.
pub fn sample<F: LogpFunc>(
    logp: F,
    start: &[f64],
    proposal: Proposal,
    settings: &MhSettings,
) -> Result<Trace, MhError> {
    run_chain(logp, start, proposal, settings, 0)
}

/// Run `settings.num_chains` independent chains on the rayon thread pool.
///
/// Every chain gets its own density from `make_logp` and its own random
/// stream. Traces are returned ordered by chain id.
pub fn sample_parallel<F, G>(
    make_logp: G,
    start: &[f64],
    proposal: &Proposal,
    settings: &MhSettings,
) -> Result<Vec<Trace>>
where
    F: LogpFunc,
    G: Fn(u64) -> F + Sync,
{
    if settings.num_chains == 0 {
        return Err(MhError::NoChains.into());
    }
    (0..settings.num_chains as u64)
        .into_par_iter()
        .map(|chain| {
            run_chain(make_logp(chain), start, proposal.clone(), settings, chain)
                .with_context(|| format!("Sampling chain {chain} failed"))
        })
        .collect()
}
