use crate::{
    chain::Progress,
    summary::{summarize, ParamSummary, SummaryError},
};

/// The recorded output of one chain: one position per iteration, plus the
/// acceptance decision and log density of that iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    chain: u64,
    draws: Vec<Box<[f64]>>,
    accepted: Vec<bool>,
    logp: Vec<f64>,
}

impl Trace {
    pub fn with_capacity(chain: u64, capacity: usize) -> Self {
        Trace {
            chain,
            draws: Vec::with_capacity(capacity),
            accepted: Vec::with_capacity(capacity),
            logp: Vec::with_capacity(capacity),
        }
    }

    pub fn append_value(&mut self, point: Box<[f64]>, progress: &Progress) {
        self.draws.push(point);
        self.accepted.push(progress.accepted);
        self.logp.push(progress.logp);
    }

    pub fn chain(&self) -> u64 {
        self.chain
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn draws(&self) -> &[Box<[f64]>] {
        &self.draws
    }

    pub fn accepted(&self) -> &[bool] {
        &self.accepted
    }

    pub fn logp(&self) -> &[f64] {
        &self.logp
    }

    /// All values of one coordinate in draw order.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.draws.iter().map(|draw| draw[index]).collect()
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.is_empty() {
            return 0.;
        }
        self.accepted.iter().filter(|&&a| a).count() as f64 / self.len() as f64
    }

    pub fn summarize(&self, burn_in: usize) -> Result<Vec<ParamSummary>, SummaryError> {
        summarize(&self.draws, burn_in)
    }
}
