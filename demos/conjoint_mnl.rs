//! A simulated conjoint experiment: each respondent task offers three
//! products described by price, brand and quality scores.

use anyhow::{Context, Result};
use log::info;
use mh_rs::{
    choice_probabilities, estimate, sample, simulate_choices, EstimateSettings, EstimateTable,
    LogPosterior, MhSettings, MultinomialLogit, NormalPrior, PosteriorTable, Proposal,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const NAMES: [&str; 3] = ["price", "brand", "quality"];
const TRUTH: [f64; 3] = [-1.2, 0.4, 0.9];

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let data = simulate_choices(&mut rng, &TRUTH, 1500, 3)?;
    info!(
        "{} tasks with {} alternatives",
        data.num_tasks(),
        data.num_alternatives()
    );
    let model = MultinomialLogit::new(data);

    let mle = estimate(&model, &[0.; 3], &EstimateSettings::default())
        .context("Maximum likelihood estimation failed")?;
    println!("Maximum likelihood\n{}\n", EstimateTable::new(&NAMES, &mle));

    let settings = MhSettings {
        num_draws: 8000,
        seed: 3,
        ..Default::default()
    };
    let posterior = LogPosterior::new(&model, NormalPrior::isotropic(3, 25.));
    let trace = sample(posterior, &mle.params, Proposal::isotropic(3, 0.05)?, &settings)?;
    info!("acceptance rate {:.3}", trace.acceptance_rate());

    let summary = trace.summarize(1000)?;
    println!("Posterior\n{}", PosteriorTable::new(&NAMES, &summary));

    // market shares of a cheap, an average and a premium product
    let products = [[-1., 0., -0.5], [0., 0., 0.], [1., 1., 1.]];
    let beta: Vec<f64> = summary.iter().map(|s| s.mean).collect();
    let utilities: Vec<f64> = products
        .iter()
        .map(|x| x.iter().zip(&beta).map(|(x, b)| x * b).sum())
        .collect();
    let shares = choice_probabilities(&utilities);
    println!(
        "\nPredicted shares: cheap {:.3}, average {:.3}, premium {:.3}",
        shares[0], shares[1], shares[2]
    );
    Ok(())
}
