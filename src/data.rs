//! Observation sets consumed by the likelihood evaluators.
//!
//! Both containers store their design matrix row-major in one flat buffer
//! and are immutable after construction. Construction validates shapes, so
//! evaluators can rely on `features.len() == num_rows * num_features`.

use rand::Rng;
use rand_distr::{Distribution, Gumbel, Poisson, StandardNormal};
use thiserror::Error;

use crate::math::dot;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("observation set is empty")]
    Empty,
    #[error("row {row} has {found} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{rows} feature rows but {responses} responses")]
    ResponseCount { rows: usize, responses: usize },
    #[error("{rows} rows cannot be split into tasks of {num_alternatives} alternatives")]
    TaskSize { rows: usize, num_alternatives: usize },
    #[error("task {task} has {chosen} chosen alternatives, expected exactly one")]
    ChosenCount { task: usize, chosen: usize },
    #[error("a choice task needs at least two alternatives, got {0}")]
    TooFewAlternatives(usize),
    #[error("invalid poisson rate {rate} for observation {row}")]
    InvalidRate { row: usize, rate: f64 },
}

fn flatten_rows(rows: Vec<Vec<f64>>) -> Result<(Vec<f64>, usize), DataError> {
    let num_features = rows.first().ok_or(DataError::Empty)?.len();
    let mut features = Vec::with_capacity(rows.len() * num_features);
    for (row, values) in rows.into_iter().enumerate() {
        if values.len() != num_features {
            return Err(DataError::RaggedRow {
                row,
                expected: num_features,
                found: values.len(),
            });
        }
        features.extend(values);
    }
    Ok((features, num_features))
}

/// Count responses with one feature row per observation.
#[derive(Debug, Clone, PartialEq)]
pub struct CountData {
    features: Vec<f64>,
    counts: Vec<u64>,
    num_features: usize,
}

impl CountData {
    pub fn new(rows: Vec<Vec<f64>>, counts: Vec<u64>) -> Result<Self, DataError> {
        if rows.len() != counts.len() {
            return Err(DataError::ResponseCount {
                rows: rows.len(),
                responses: counts.len(),
            });
        }
        let (features, num_features) = flatten_rows(rows)?;
        Ok(CountData {
            features,
            counts,
            num_features,
        })
    }

    /// Counts without covariates, for the single-rate model.
    pub fn from_counts(counts: Vec<u64>) -> Result<Self, DataError> {
        let rows = vec![Vec::new(); counts.len()];
        Self::new(rows, counts)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.num_features;
        &self.features[start..start + self.num_features]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.len()).map(|i| self.row(i))
    }

    pub fn mean_count(&self) -> f64 {
        self.counts.iter().map(|&y| y as f64).sum::<f64>() / self.len() as f64
    }
}

/// Choice tasks, each with exactly `num_alternatives` consecutive rows
/// and exactly one chosen row.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceData {
    features: Vec<f64>,
    chosen: Vec<usize>,
    num_features: usize,
    num_alternatives: usize,
}

impl ChoiceData {
    /// Build from one row per alternative and a per-row choice indicator.
    ///
    /// Rows of a task must be adjacent and in the same order as their
    /// indicators.
    pub fn new(
        num_alternatives: usize,
        rows: Vec<Vec<f64>>,
        chosen: Vec<bool>,
    ) -> Result<Self, DataError> {
        if num_alternatives < 2 {
            return Err(DataError::TooFewAlternatives(num_alternatives));
        }
        if rows.len() != chosen.len() {
            return Err(DataError::ResponseCount {
                rows: rows.len(),
                responses: chosen.len(),
            });
        }
        if rows.len() % num_alternatives != 0 {
            return Err(DataError::TaskSize {
                rows: rows.len(),
                num_alternatives,
            });
        }
        let (features, num_features) = flatten_rows(rows)?;

        let chosen = chosen
            .chunks_exact(num_alternatives)
            .enumerate()
            .map(|(task, flags)| {
                let count = flags.iter().filter(|&&c| c).count();
                if count != 1 {
                    return Err(DataError::ChosenCount {
                        task,
                        chosen: count,
                    });
                }
                Ok(flags.iter().position(|&c| c).unwrap_or_default())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ChoiceData {
            features,
            chosen,
            num_features,
            num_alternatives,
        })
    }

    pub fn num_tasks(&self) -> usize {
        self.chosen.len()
    }

    pub fn num_alternatives(&self) -> usize {
        self.num_alternatives
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Index of the chosen alternative within each task.
    pub fn chosen(&self) -> &[usize] {
        &self.chosen
    }

    /// Feature rows of one task, `num_alternatives * num_features` values.
    pub fn task(&self, task: usize) -> &[f64] {
        let width = self.num_alternatives * self.num_features;
        &self.features[task * width..(task + 1) * width]
    }
}

/// Simulate a log-link Poisson regression.
///
/// The first column is an intercept, the remaining `beta.len() - 1`
/// columns are standard normal.
pub fn simulate_poisson<R: Rng + ?Sized>(
    rng: &mut R,
    beta: &[f64],
    num_obs: usize,
) -> Result<CountData, DataError> {
    assert!(!beta.is_empty(), "beta needs at least an intercept");
    let mut rows = Vec::with_capacity(num_obs);
    let mut counts = Vec::with_capacity(num_obs);
    for row in 0..num_obs {
        let mut x = Vec::with_capacity(beta.len());
        x.push(1.);
        x.extend((1..beta.len()).map(|_| -> f64 { rng.sample(StandardNormal) }));
        let rate = dot(&x, beta).exp();
        let dist = Poisson::new(rate).map_err(|_| DataError::InvalidRate { row, rate })?;
        let y: f64 = dist.sample(rng);
        rows.push(x);
        counts.push(y as u64);
    }
    CountData::new(rows, counts)
}

/// Simulate a choice experiment under a multinomial logit.
///
/// Attributes are standard normal; the chosen alternative maximises the
/// utility plus standard Gumbel noise.
pub fn simulate_choices<R: Rng + ?Sized>(
    rng: &mut R,
    beta: &[f64],
    num_tasks: usize,
    num_alternatives: usize,
) -> Result<ChoiceData, DataError> {
    let gumbel = Gumbel::new(0f64, 1f64).expect("Standard Gumbel parameters are valid");
    let mut rows = Vec::with_capacity(num_tasks * num_alternatives);
    let mut chosen = Vec::with_capacity(num_tasks * num_alternatives);
    for _ in 0..num_tasks {
        let mut best = (0, f64::NEG_INFINITY);
        for alt in 0..num_alternatives {
            let x: Vec<f64> = (0..beta.len()).map(|_| rng.sample(StandardNormal)).collect();
            let utility = dot(&x, beta) + gumbel.sample(rng);
            if utility > best.1 {
                best = (alt, utility);
            }
            rows.push(x);
        }
        chosen.extend((0..num_alternatives).map(|alt| alt == best.0));
    }
    ChoiceData::new(num_alternatives, rows, chosen)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn count_data_shapes() {
        let data = CountData::new(vec![vec![1., 0.5], vec![1., -0.5]], vec![3, 1]).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.num_features(), 2);
        assert_eq!(data.row(1), &[1., -0.5]);
        assert_eq!(data.mean_count(), 2.);

        let err = CountData::new(vec![vec![1., 0.5], vec![1.]], vec![3, 1]).unwrap_err();
        assert_eq!(
            err,
            DataError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
        let err = CountData::new(vec![vec![1.]], vec![3, 1]).unwrap_err();
        assert_eq!(err, DataError::ResponseCount { rows: 1, responses: 2 });
        assert_eq!(CountData::from_counts(vec![]).unwrap_err(), DataError::Empty);
    }

    #[test]
    fn choice_data_groups_tasks() {
        let rows = vec![vec![1.], vec![2.], vec![3.], vec![4.], vec![5.], vec![6.]];
        let chosen = vec![false, true, false, true, false, false];
        let data = ChoiceData::new(3, rows, chosen).unwrap();
        assert_eq!(data.num_tasks(), 2);
        assert_eq!(data.chosen(), &[1, 0]);
        assert_eq!(data.task(1), &[4., 5., 6.]);
    }

    #[test]
    fn choice_data_rejects_bad_tasks() {
        let rows = vec![vec![1.]; 4];
        let err = ChoiceData::new(3, rows.clone(), vec![true; 4]).unwrap_err();
        assert_eq!(
            err,
            DataError::TaskSize {
                rows: 4,
                num_alternatives: 3
            }
        );
        let err = ChoiceData::new(2, rows.clone(), vec![true, true, false, true]).unwrap_err();
        assert_eq!(err, DataError::ChosenCount { task: 0, chosen: 2 });
        let err = ChoiceData::new(2, rows, vec![true, false, false, false]).unwrap_err();
        assert_eq!(err, DataError::ChosenCount { task: 1, chosen: 0 });
        let err = ChoiceData::new(1, vec![vec![1.]], vec![true]).unwrap_err();
        assert_eq!(err, DataError::TooFewAlternatives(1));
    }

    #[test]
    fn simulation_is_reproducible() {
        let beta = [0.5, 0.2, -0.3];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let a = simulate_poisson(&mut rng, &beta, 50).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let b = simulate_poisson(&mut rng, &beta, 50).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.num_features(), 3);
        assert!(a.rows().all(|row| row[0] == 1.));

        let choices = simulate_choices(&mut rng, &beta, 20, 3).unwrap();
        assert_eq!(choices.num_tasks(), 20);
        assert!(choices.chosen().iter().all(|&c| c < 3));
    }
}
