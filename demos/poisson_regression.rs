//! Simulated visit counts with a binary treatment and one covariate.
//!
//! Fits the log-link Poisson regression by maximum likelihood, then samples
//! the posterior under a vague normal prior on four parallel chains and
//! reports the average treatment effect under both fits.

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use mh_rs::{
    estimate, potential_scale_reduction, sample_parallel, summarize, CountData,
    EstimateSettings, EstimateTable, LogPosterior, MhSettings, NormalPrior, PoissonRegression,
    PosteriorTable, Proposal,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson, StandardNormal};

const NAMES: [&str; 3] = ["intercept", "treatment", "age"];
const TRUTH: [f64; 3] = [0.4, 0.35, -0.15];
const NUM_OBS: usize = 2000;
const BURN_IN: usize = 1000;

fn simulate(rng: &mut ChaCha8Rng) -> Result<CountData> {
    let mut rows = Vec::with_capacity(NUM_OBS);
    let mut counts = Vec::with_capacity(NUM_OBS);
    for _ in 0..NUM_OBS {
        let treated = if rng.random_bool(0.5) { 1. } else { 0. };
        let age: f64 = rng.sample(StandardNormal);
        let x = vec![1., treated, age];
        let rate = x.iter().zip(TRUTH).map(|(x, b)| x * b).sum::<f64>().exp();
        let y: f64 = Poisson::new(rate)
            .context("Invalid simulated rate")?
            .sample(rng);
        rows.push(x);
        counts.push(y as u64);
    }
    Ok(CountData::new(rows, counts)?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let data = simulate(&mut rng)?;
    info!(
        "simulated {} observations, mean count {:.3}",
        data.len(),
        data.mean_count()
    );
    let model = PoissonRegression::new(data);

    let mle = estimate(&model, &[0.; 3], &EstimateSettings::default())
        .context("Maximum likelihood estimation failed")?;
    println!("Maximum likelihood\n{}\n", EstimateTable::new(&NAMES, &mle));
    println!(
        "ATE of treatment (MLE): {:.4}\n",
        model.average_treatment_effect(&mle.params, 1)
    );

    let prior = NormalPrior::isotropic(3, 100.);
    let settings = MhSettings {
        num_draws: 6000,
        seed: 7,
        num_chains: 4,
    };
    let proposal = Proposal::isotropic(3, 0.03)?;
    let traces = sample_parallel(
        |_| LogPosterior::new(&model, prior.clone()),
        &[0.; 3],
        &proposal,
        &settings,
    )?;
    for trace in &traces {
        info!(
            "chain {} acceptance rate {:.3}",
            trace.chain(),
            trace.acceptance_rate()
        );
    }

    let chains = traces.iter().map(|t| t.draws()).collect_vec();
    let rhat = potential_scale_reduction(&chains, BURN_IN)?;
    info!("potential scale reduction {rhat:.4?}");

    let pooled = traces
        .iter()
        .flat_map(|t| t.draws()[BURN_IN..].iter().cloned())
        .collect_vec();
    let summary = summarize(&pooled, 0)?;
    println!("Posterior\n{}", PosteriorTable::new(&NAMES, &summary));

    let ate: Vec<f64> = pooled
        .iter()
        .map(|beta| model.average_treatment_effect(beta, 1))
        .collect();
    let ate_summary = summarize(&ate.iter().map(|&v| [v]).collect_vec(), 0)?;
    println!(
        "ATE of treatment (posterior): {:.4} [{:.4}, {:.4}]",
        ate_summary[0].mean, ate_summary[0].lower, ate_summary[0].upper
    );
    Ok(())
}
