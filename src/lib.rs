//! Random-walk Metropolis sampling and maximum likelihood estimation for
//! Poisson and multinomial logit models.
//!
//! A model implements [`LogLikelihood`]. Maximum likelihood estimates with
//! standard errors come from [`estimate`]; for a Bayesian fit the model is
//! combined with a [`NormalPrior`] into a [`LogPosterior`] and explored with
//! [`sample`] or [`sample_parallel`]. Traces are summarised with
//! [`summarize`] and [`potential_scale_reduction`].
//!
//! ```
//! use mh_rs::{sample, summarize, FnLogp, MhSettings, Proposal};
//!
//! let logp = FnLogp::new(2, |x: &[f64]| -0.5 * x.iter().map(|v| v * v).sum::<f64>());
//! let settings = MhSettings {
//!     num_draws: 500,
//!     ..Default::default()
//! };
//! let proposal = Proposal::isotropic(2, 1.).unwrap();
//! let trace = sample(logp, &[0., 0.], proposal, &settings).unwrap();
//! assert_eq!(trace.len(), 500);
//! let summary = summarize(trace.draws(), 100).unwrap();
//! assert_eq!(summary.len(), 2);
//! ```

pub(crate) mod chain;
pub(crate) mod data;
pub(crate) mod estimate;
pub(crate) mod logit;
pub(crate) mod math;
pub(crate) mod model;
pub(crate) mod poisson;
pub(crate) mod posterior;
pub(crate) mod report;
pub(crate) mod sampler;
pub(crate) mod summary;
pub(crate) mod trace;

pub use chain::{Chain, MetropolisChain, MhError, Progress, Proposal};
pub use data::{simulate_choices, simulate_poisson, ChoiceData, CountData, DataError};
pub use estimate::{
    estimate, finite_diff_hessian, invert_spd, Estimate, EstimateError, EstimateSettings,
};
pub use logit::{choice_probabilities, MultinomialLogit, PROBABILITY_FLOOR};
pub use math::quantile;
pub use model::{FnLogp, LogLikelihood, LogpError, LogpFunc, NeverFails};
pub use poisson::{PoissonRate, PoissonRegression, MAX_LINEAR_PREDICTOR};
pub use posterior::{LogPosterior, NormalPrior};
pub use report::{EstimateTable, PosteriorTable};
pub use sampler::{sample, sample_parallel, sample_sequentially, MhSettings};
pub use summary::{potential_scale_reduction, summarize, ParamSummary, RunningMoments, SummaryError};
pub use trace::Trace;
