use anyhow::Result;
use itertools::Itertools;
use mh_rs::{
    potential_scale_reduction, sample, sample_parallel, sample_sequentially, summarize, FnLogp,
    LogpError, LogpFunc, MhError, MhSettings, NormalPrior, Proposal,
};
use pretty_assertions::assert_eq;
use thiserror::Error;

struct NormalLogp<'a> {
    dim: usize,
    mu: &'a [f64],
}

#[derive(Error, Debug)]
enum NormalLogpError {
    #[error("position contains nan")]
    Nan,
}

impl LogpError for NormalLogpError {
    fn is_recoverable(&self) -> bool {
        true
    }
}

impl LogpFunc for NormalLogp<'_> {
    type LogpError = NormalLogpError;

    fn dim(&self) -> usize {
        self.dim
    }

    fn logp(&mut self, position: &[f64]) -> Result<f64, Self::LogpError> {
        if position.iter().any(|x| x.is_nan()) {
            return Err(NormalLogpError::Nan);
        }
        Ok(position
            .iter()
            .zip(self.mu)
            .map(|(&p, &mu)| -(p - mu) * (p - mu) / 2.)
            .sum())
    }
}

#[test]
fn standard_normal_prior_only() -> Result<()> {
    let prior = NormalPrior::isotropic(4, 1.);
    let logp = FnLogp::new(4, move |beta: &[f64]| prior.log_density(beta));
    let settings = MhSettings {
        num_draws: 2000,
        seed: 42,
        ..Default::default()
    };
    let trace = sample(logp, &[0.; 4], Proposal::isotropic(4, 0.5)?, &settings)?;
    assert_eq!(trace.len(), 2000);

    let summary = trace.summarize(200)?;
    assert_eq!(summary.len(), 4);
    assert!(summary.iter().all(|s| s.mean.abs() < 3.));
    assert!(summary.iter().filter(|s| s.covers(0.)).count() >= 3);
    assert!(summary.iter().all(|s| s.sd > 0.2 && s.sd < 2.));
    Ok(())
}

#[test]
fn shifted_normal_with_custom_error() -> Result<()> {
    let mu = [1., -2., 0.5];
    let settings = MhSettings {
        num_draws: 6000,
        seed: 1,
        ..Default::default()
    };
    let logp = NormalLogp { dim: 3, mu: &mu };
    let trace = sample(logp, &[0.; 3], Proposal::isotropic(3, 1.)?, &settings)?;
    let rate = trace.acceptance_rate();
    assert!(rate > 0.2 && rate < 0.8, "acceptance rate {rate}");

    let summary = trace.summarize(1000)?;
    for (s, &mu) in summary.iter().zip(&mu) {
        assert!((s.mean - mu).abs() < 0.2, "mean {} vs {mu}", s.mean);
        assert!(s.covers(mu));
    }
    Ok(())
}

#[test]
fn flat_posterior_always_accepts() -> Result<()> {
    let settings = MhSettings {
        num_draws: 500,
        seed: 9,
        ..Default::default()
    };
    let flat = FnLogp::new(2, |_: &[f64]| 0.);
    let draws = sample_sequentially(flat, &[1., 1.], Proposal::isotropic(2, 3.)?, &settings, 0)?
        .collect::<Result<Vec<_>, _>>()?;
    assert!(draws.iter().all(|(_, progress)| progress.accepted));
    // every accepted draw moved
    assert!(draws.iter().tuple_windows().all(|((a, _), (b, _))| a != b));
    Ok(())
}

#[test]
fn identical_seeds_give_identical_traces() -> Result<()> {
    let mu = [0.3; 5];
    let settings = MhSettings {
        num_draws: 1000,
        seed: 1234,
        ..Default::default()
    };
    let proposal = Proposal::isotropic(5, 0.4)?;
    let run = || sample(NormalLogp { dim: 5, mu: &mu }, &[2.; 5], proposal.clone(), &settings);
    assert_eq!(run()?, run()?);
    Ok(())
}

#[test]
fn parallel_chains_agree() -> Result<()> {
    let mu = [2., -1.];
    let settings = MhSettings {
        num_draws: 4000,
        seed: 5,
        num_chains: 4,
    };
    let proposal = Proposal::isotropic(2, 1.2)?;
    let traces = sample_parallel(
        |_| NormalLogp { dim: 2, mu: &mu },
        &[0., 0.],
        &proposal,
        &settings,
    )?;
    assert_eq!(traces.len(), 4);

    let chains = traces.iter().map(|t| t.draws()).collect_vec();
    let rhat = potential_scale_reduction(&chains, 500)?;
    assert!(rhat.iter().all(|&r| r < 1.05), "rhat {rhat:?}");

    let pooled = traces
        .iter()
        .flat_map(|t| t.draws()[500..].iter().cloned())
        .collect_vec();
    let summary = summarize(&pooled, 0)?;
    assert!((summary[0].mean - 2.).abs() < 0.1);
    assert!((summary[1].mean + 1.).abs() < 0.1);
    Ok(())
}

#[test]
fn start_point_must_match_dimension() -> Result<()> {
    let mu = [0.; 3];
    let err = sample(
        NormalLogp { dim: 3, mu: &mu },
        &[0.; 2],
        Proposal::isotropic(3, 1.)?,
        &MhSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        MhError::StartDim {
            expected: 3,
            found: 2
        }
    ));
    Ok(())
}
