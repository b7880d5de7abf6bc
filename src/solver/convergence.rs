use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::grid2d::ScalarField2D;

/// How the change between two vorticity iterates is reduced to one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceCriterion {
    /// `max(new - previous)`, signed. A field that only decreases reports a
    /// negative error and counts as converged.
    #[default]
    SignedMax,
    /// `max |new - previous|`.
    AbsoluteMax,
}

impl ConvergenceCriterion {
    pub fn measure(&self, current: &ScalarField2D, previous: &ScalarField2D) -> f64 {
        assert_eq!(current.shape(), previous.shape(), "Iterate shapes differ");
        let diffs = current.iter().zip(previous.iter()).map(|(c, p)| c - p);
        match self {
            ConvergenceCriterion::SignedMax => diffs.fold(f64::NEG_INFINITY, f64::max),
            ConvergenceCriterion::AbsoluteMax => diffs.map(f64::abs).fold(0.0, f64::max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConvergenceSample {
    pub iteration: usize,
    pub error: f64,
}

/// Per-iteration error values recorded after the warm-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConvergenceHistory {
    samples: Vec<ConvergenceSample>,
}

impl ConvergenceHistory {
    pub fn push(&mut self, iteration: usize, error: f64) {
        self.samples.push(ConvergenceSample { iteration, error });
    }

    pub fn samples(&self) -> &[ConvergenceSample] {
        &self.samples
    }

    pub fn first(&self) -> Option<&ConvergenceSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&ConvergenceSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Every `stride`-th sample plus the last one. A stride of 0 keeps only the last.
    pub fn sampled(&self, stride: usize) -> Vec<ConvergenceSample> {
        let last = self.samples.len().saturating_sub(1);
        self.samples
            .iter()
            .enumerate()
            .filter(|(k, _)| *k == last || (stride > 0 && k % stride == 0))
            .map(|(_, s)| *s)
            .collect()
    }
}

/// Decides when the outer iteration has reached steady state.
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    criterion: ConvergenceCriterion,
    tolerance: f64,
    warmup: usize,
    history: ConvergenceHistory,
}

impl ConvergenceMonitor {
    pub fn new(criterion: ConvergenceCriterion, tolerance: f64, warmup: usize) -> Self {
        Self {
            criterion,
            tolerance,
            warmup,
            history: ConvergenceHistory::default(),
        }
    }

    /// Measures iteration `iteration` (1-based). Returns `None` while
    /// `iteration <= warmup`, otherwise the error, which is also recorded.
    pub fn observe(
        &mut self,
        iteration: usize,
        current: &ScalarField2D,
        previous: &ScalarField2D,
    ) -> Option<f64> {
        if iteration <= self.warmup {
            return None;
        }
        let error = self.criterion.measure(current, previous);
        self.history.push(iteration, error);
        debug!(iteration, error, "convergence check");
        Some(error)
    }

    pub fn is_converged(&self, error: f64) -> bool {
        error < self.tolerance
    }

    pub fn history(&self) -> &ConvergenceHistory {
        &self.history
    }

    pub fn last_error(&self) -> Option<f64> {
        self.history.last().map(|s| s.error)
    }
}
