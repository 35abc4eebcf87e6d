//! Posterior summaries of sampled traces.

use thiserror::Error;

use crate::math::quantile;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SummaryError {
    #[error("burn-in of {burn_in} leaves nothing of a trace with {len} draws")]
    BurnIn { burn_in: usize, len: usize },
    #[error("chains have different lengths ({first} and {other})")]
    RaggedChains { first: usize, other: usize },
    #[error("need at least {needed} {what}, got {found}")]
    TooFew {
        what: &'static str,
        needed: usize,
        found: usize,
    },
}

/// Marginal posterior summary of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSummary {
    pub mean: f64,
    /// Sample standard deviation, `nan` if only one draw was retained.
    pub sd: f64,
    /// 2.5th percentile.
    pub lower: f64,
    /// 97.5th percentile.
    pub upper: f64,
}

impl ParamSummary {
    /// Whether `value` lies inside the 95% credible interval.
    pub fn covers(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Streaming mean and variance (Welford).
#[derive(Debug, Clone, Default)]
pub struct RunningMoments {
    mean: f64,
    sum_sq: f64,
    count: u64,
}

impl RunningMoments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        self.count += 1;
        let diff = value - self.mean;
        self.mean += diff / self.count as f64;
        self.sum_sq += diff * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        self.mean
    }

    /// Sample variance with `n - 1` in the denominator.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return f64::NAN;
        }
        self.sum_sq / (self.count - 1) as f64
    }

    pub fn sd(&self) -> f64 {
        self.variance().sqrt()
    }
}

fn retained<D: AsRef<[f64]>>(draws: &[D], burn_in: usize) -> Result<&[D], SummaryError> {
    if burn_in >= draws.len() {
        return Err(SummaryError::BurnIn {
            burn_in,
            len: draws.len(),
        });
    }
    Ok(&draws[burn_in..])
}

/// Summarize every coordinate of `draws` after dropping the first `burn_in`.
///
/// # Panics
///
/// If the draws do not all have the same length.
pub fn summarize<D: AsRef<[f64]>>(
    draws: &[D],
    burn_in: usize,
) -> Result<Vec<ParamSummary>, SummaryError> {
    let kept = retained(draws, burn_in)?;
    let dim = kept[0].as_ref().len();
    assert!(
        kept.iter().all(|d| d.as_ref().len() == dim),
        "draws have inconsistent dimensions"
    );

    let summaries = (0..dim)
        .map(|i| {
            let mut moments = RunningMoments::new();
            let mut values: Vec<f64> = kept
                .iter()
                .map(|d| {
                    let v = d.as_ref()[i];
                    moments.add(v);
                    v
                })
                .collect();
            values.sort_unstable_by(f64::total_cmp);
            ParamSummary {
                mean: moments.mean(),
                sd: moments.sd(),
                lower: quantile(&values, 0.025),
                upper: quantile(&values, 0.975),
            }
        })
        .collect();
    Ok(summaries)
}

/// Gelman–Rubin potential scale reduction factor for every coordinate.
///
/// Values close to one indicate that the chains explore the same
/// distribution.
pub fn potential_scale_reduction<D: AsRef<[f64]>>(
    chains: &[&[D]],
    burn_in: usize,
) -> Result<Vec<f64>, SummaryError> {
    if chains.len() < 2 {
        return Err(SummaryError::TooFew {
            what: "chains",
            needed: 2,
            found: chains.len(),
        });
    }
    let kept = chains
        .iter()
        .map(|draws| retained(draws, burn_in))
        .collect::<Result<Vec<_>, _>>()?;
    let n = kept[0].len();
    if let Some(other) = kept.iter().map(|c| c.len()).find(|&len| len != n) {
        return Err(SummaryError::RaggedChains { first: n, other });
    }
    if n < 2 {
        return Err(SummaryError::TooFew {
            what: "retained draws per chain",
            needed: 2,
            found: n,
        });
    }

    let dim = kept[0][0].as_ref().len();
    let rhat = (0..dim)
        .map(|i| {
            let per_chain: Vec<RunningMoments> = kept
                .iter()
                .map(|draws| {
                    let mut moments = RunningMoments::new();
                    draws.iter().for_each(|d| moments.add(d.as_ref()[i]));
                    moments
                })
                .collect();
            let within =
                per_chain.iter().map(|m| m.variance()).sum::<f64>() / per_chain.len() as f64;
            let mut means = RunningMoments::new();
            per_chain.iter().for_each(|m| means.add(m.mean()));
            let between = n as f64 * means.variance();
            let pooled = (n - 1) as f64 / n as f64 * within + between / n as f64;
            (pooled / within).sqrt()
        })
        .collect();
    Ok(rhat)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, Normal};

    use super::*;

    #[test]
    fn running_moments() {
        let mut m = RunningMoments::new();
        assert!(m.mean().is_nan());
        [2., 4., 4., 4., 5., 5., 7., 9.].into_iter().for_each(|v| m.add(v));
        assert_eq!(m.count(), 8);
        assert_abs_diff_eq!(m.mean(), 5.);
        assert_abs_diff_eq!(m.variance(), 32. / 7., epsilon = 1e-12);
    }

    #[test]
    fn burn_in_is_dropped() {
        let draws = vec![vec![100., -100.], vec![1., 2.], vec![3., 4.]];
        let summary = summarize(&draws, 1).unwrap();
        assert_eq!(summary.len(), 2);
        assert_abs_diff_eq!(summary[0].mean, 2.);
        assert_abs_diff_eq!(summary[1].mean, 3.);
        assert_abs_diff_eq!(summary[0].sd, 2f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(summary[0].lower, 1.05, epsilon = 1e-12);
        assert_abs_diff_eq!(summary[0].upper, 2.95, epsilon = 1e-12);
    }

    #[test]
    fn burn_in_too_long() {
        let draws = vec![vec![1.], vec![2.]];
        assert_eq!(
            summarize(&draws, 2).unwrap_err(),
            SummaryError::BurnIn { burn_in: 2, len: 2 }
        );
        let empty: Vec<Vec<f64>> = Vec::new();
        assert!(summarize(&empty, 0).is_err());
    }

    #[test]
    fn single_retained_draw() {
        let draws = vec![vec![1.], vec![2.]];
        let summary = summarize(&draws, 1).unwrap();
        assert_eq!(summary[0].mean, 2.);
        assert!(summary[0].sd.is_nan());
        assert_eq!(summary[0].lower, 2.);
    }

    #[test]
    fn interval_coverage() {
        // a posterior N(x, sd) around an observation x ~ N(truth, sd)
        // covers the truth in 95% of repetitions
        let truth = 1.5;
        let sd = 2.;
        let noise = Normal::new(0., sd).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let runs = 1000;
        let covered = (0..runs)
            .filter(|_| {
                let center = truth + noise.sample(&mut rng);
                let draws: Vec<Vec<f64>> = (0..400)
                    .map(|_| vec![center + noise.sample(&mut rng)])
                    .collect();
                summarize(&draws, 0).unwrap()[0].covers(truth)
            })
            .count();
        let rate = covered as f64 / runs as f64;
        assert!((0.92..=0.975).contains(&rate), "coverage {rate}");
    }

    #[test]
    fn rhat_of_identical_distributions() {
        let normal = Normal::new(0., 1.).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let chains: Vec<Vec<Vec<f64>>> = (0..4)
            .map(|_| (0..2000).map(|_| vec![normal.sample(&mut rng)]).collect())
            .collect();
        let refs: Vec<&[Vec<f64>]> = chains.iter().map(|c| c.as_slice()).collect();
        let rhat = potential_scale_reduction(&refs, 100).unwrap();
        assert!((rhat[0] - 1.).abs() < 0.01, "rhat {}", rhat[0]);
    }

    #[test]
    fn rhat_detects_separated_chains() {
        let chains: Vec<Vec<Vec<f64>>> = (0..2)
            .map(|c| {
                (0..100)
                    .map(|i| vec![c as f64 * 10. + (i % 7) as f64 * 0.1])
                    .collect()
            })
            .collect();
        let refs: Vec<&[Vec<f64>]> = chains.iter().map(|c| c.as_slice()).collect();
        let rhat = potential_scale_reduction(&refs, 0).unwrap();
        assert!(rhat[0] > 5.);

        let single = [refs[0]];
        assert!(matches!(
            potential_scale_reduction(&single, 0),
            Err(SummaryError::TooFew { needed: 2, .. })
        ));
        let short = [&refs[0][..50], refs[1]];
        assert_eq!(
            potential_scale_reduction(&short, 0).unwrap_err(),
            SummaryError::RaggedChains {
                first: 50,
                other: 100
            }
        );
    }
}
