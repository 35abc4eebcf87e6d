use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use mh_rs::{
    sample, simulate_choices, simulate_poisson, FnLogp, LogLikelihood, LogPosterior, MhSettings,
    MultinomialLogit, NormalPrior, PoissonRegression, Proposal,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn normal_logp(dim: usize, mu: f64) -> FnLogp<impl FnMut(&[f64]) -> f64> {
    FnLogp::new(dim, move |x: &[f64]| {
        -0.5 * x.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>()
    })
}

pub fn sample_normal(dim: usize, num_draws: u64) -> f64 {
    let settings = MhSettings {
        num_draws,
        seed: 42,
        ..Default::default()
    };
    let proposal = Proposal::isotropic(dim, 2.4 / (dim as f64).sqrt()).unwrap();
    let init = vec![3.5; dim];
    let trace = sample(normal_logp(dim, 3.), &init, proposal, &settings).unwrap();
    trace.acceptance_rate()
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("sample normal 10", |b| {
        b.iter(|| sample_normal(black_box(10), black_box(1000)))
    });
    c.bench_function("sample normal 1000", |b| {
        b.iter(|| sample_normal(black_box(1000), black_box(100)))
    });

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let poisson = PoissonRegression::new(simulate_poisson(&mut rng, &[0.5, 0.2, -0.1], 10_000).unwrap());
    let beta = [0.4, 0.1, 0.];
    c.bench_function("poisson loglik 10000", |b| {
        b.iter(|| poisson.log_likelihood(black_box(&beta)))
    });

    let logit = MultinomialLogit::new(simulate_choices(&mut rng, &[1., -0.5, 0.8], 3000, 3).unwrap());
    c.bench_function("mnl loglik 3000x3", |b| {
        b.iter(|| logit.log_likelihood(black_box(&beta)))
    });

    let prior = NormalPrior::isotropic(3, 10.);
    let settings = MhSettings {
        num_draws: 200,
        ..Default::default()
    };
    c.bench_function("sample poisson posterior", |b| {
        b.iter_batched(
            || LogPosterior::new(&poisson, prior.clone()),
            |posterior| {
                let proposal = Proposal::isotropic(3, 0.01).unwrap();
                sample(posterior, &[0.5, 0.2, -0.1], proposal, &settings).unwrap()
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
