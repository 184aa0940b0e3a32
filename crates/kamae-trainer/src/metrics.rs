//! Validation metrics.

use kamae_core::Stance;
use serde::Serialize;

/// Precision, recall and F1 for one stance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub stance: Stance,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Loss and classification quality over a labelled set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalReport {
    pub loss: f64,
    pub accuracy: f64,
    pub macro_f1: f64,
    pub per_class: Vec<ClassMetrics>,
    pub examples: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl EvalReport {
    /// Builds the report from predicted and gold label ids.
    ///
    /// Ids outside the stance codec are counted as wrong.
    pub fn from_predictions(loss: f64, predictions: &[usize], targets: &[usize]) -> Self {
        let n = Stance::NUM_LABELS;
        let mut confusion = vec![vec![0usize; n]; n];
        let mut correct = 0;
        for (&p, &t) in predictions.iter().zip(targets) {
            if p == t {
                correct += 1;
            }
            if p < n && t < n {
                confusion[t][p] += 1;
            }
        }

        let per_class: Vec<ClassMetrics> = Stance::all()
            .iter()
            .map(|&stance| {
                let k = stance.label();
                let tp = confusion[k][k];
                let predicted: usize = (0..n).map(|t| confusion[t][k]).sum();
                let support = targets.iter().filter(|&&t| t == k).count();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    stance,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let macro_f1 = per_class.iter().map(|c| c.f1).sum::<f64>() / n as f64;

        Self {
            loss,
            accuracy: ratio(correct, targets.len()),
            macro_f1,
            per_class,
            examples: targets.len(),
        }
    }

    pub fn class(&self, stance: Stance) -> &ClassMetrics {
        &self.per_class[stance.label()]
    }
}
