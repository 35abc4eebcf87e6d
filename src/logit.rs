//! Multinomial logit over choice tasks.

use crate::{
    data::ChoiceData,
    math::dot,
    model::LogLikelihood,
};

/// Floor added to probabilities before taking the logarithm.
pub const PROBABILITY_FLOOR: f64 = 1e-12;

/// Softmax of one task's utilities.
///
/// Weights are taken relative to the largest utility and then divided by
/// their sum, so arbitrarily large finite utilities neither overflow nor
/// lose ties to rounding.
pub fn choice_probabilities(utilities: &[f64]) -> Vec<f64> {
    let max = utilities
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let mut probs: Vec<f64> = utilities.iter().map(|&u| (u - max).exp()).collect();
    let total: f64 = probs.iter().sum();
    probs.iter_mut().for_each(|p| *p /= total);
    probs
}

pub struct MultinomialLogit {
    data: ChoiceData,
}

impl MultinomialLogit {
    pub fn new(data: ChoiceData) -> Self {
        MultinomialLogit { data }
    }

    pub fn data(&self) -> &ChoiceData {
        &self.data
    }

    fn utilities(&self, task: usize, beta: &[f64], out: &mut [f64]) {
        let rows = self.data.task(task).chunks_exact(self.data.num_features());
        out.iter_mut()
            .zip(rows)
            .for_each(|(u, x)| *u = dot(x, beta));
    }

    fn check_dim(&self, beta: &[f64]) {
        assert!(
            beta.len() == self.data.num_features(),
            "beta has {} coefficients but alternatives have {} attributes",
            beta.len(),
            self.data.num_features()
        );
    }

    /// Choice probabilities of every alternative, one vector per task.
    pub fn task_probabilities(&self, beta: &[f64]) -> Vec<Vec<f64>> {
        self.check_dim(beta);
        let mut utilities = vec![0f64; self.data.num_alternatives()];
        (0..self.data.num_tasks())
            .map(|task| {
                self.utilities(task, beta, &mut utilities);
                choice_probabilities(&utilities)
            })
            .collect()
    }
}

impl LogLikelihood for MultinomialLogit {
    fn dim(&self) -> usize {
        self.data.num_features()
    }

    fn log_likelihood(&self, beta: &[f64]) -> f64 {
        self.check_dim(beta);
        let mut utilities = vec![0f64; self.data.num_alternatives()];
        self.data
            .chosen()
            .iter()
            .enumerate()
            .map(|(task, &chosen)| {
                self.utilities(task, beta, &mut utilities);
                let probs = choice_probabilities(&utilities);
                (probs[chosen] + PROBABILITY_FLOOR).ln()
            })
            .sum()
    }
}
