// ============================================================
// Layer 5 — Multi-Label Evaluation
// ============================================================
// Scores a model on held-out batches:
//
//   p = sigmoid(logits);  predicted label ⇔ p >= threshold
//
//   precision = TP / (TP + FP)      summed over ALL classes
//   recall    = TP / (TP + FN)      (micro averaging)
//   f1        = 2PR / (P + R)
//   accuracy  = samples whose whole predicted label set equals
//               the target set / samples   (exact match)
//
// A zero denominator yields 0.0 rather than NaN.

use anyhow::Result;
use burn::{prelude::*, tensor::activation::sigmoid};

use crate::data::batcher::ImageBatch;
use crate::ml::model::MultiLabelVit;

/// Confusion counts accumulated across batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MultiLabelCounts {
    pub true_pos:      usize,
    pub false_pos:     usize,
    pub false_neg:     usize,
    pub exact_matches: usize,
    pub samples:       usize,
}

impl MultiLabelCounts {
    /// Add a batch of row-major `[samples, num_classes]` probabilities and
    /// 0/1 targets.
    pub fn update(&mut self, probs: &[f32], targets: &[f32], num_classes: usize, threshold: f32) {
        if num_classes == 0 {
            return;
        }
        for (prob_row, target_row) in probs
            .chunks_exact(num_classes)
            .zip(targets.chunks_exact(num_classes))
        {
            let mut row_exact = true;
            for (&p, &t) in prob_row.iter().zip(target_row) {
                let predicted = p >= threshold;
                let actual    = t > 0.5;
                match (predicted, actual) {
                    (true,  true)  => self.true_pos  += 1,
                    (true,  false) => self.false_pos += 1,
                    (false, true)  => self.false_neg += 1,
                    (false, false) => {}
                }
                row_exact &= predicted == actual;
            }
            if row_exact {
                self.exact_matches += 1;
            }
            self.samples += 1;
        }
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_pos)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_neg)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.exact_matches, self.samples)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Result of one pass over a held-out set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Sample-weighted mean BCE loss
    pub loss:      f64,
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub samples:   usize,
}

/// Run `model` over `batches` without touching its weights.
///
/// Call with a model on a non-autodiff backend (`model.valid()`),
/// so no gradient graph is recorded.
pub fn evaluate<B: Backend>(
    model:     &MultiLabelVit<B>,
    batches:   impl IntoIterator<Item = ImageBatch<B>>,
    threshold: f32,
) -> Result<Evaluation> {
    let mut counts   = MultiLabelCounts::default();
    let mut loss_sum = 0.0f64;

    for batch in batches {
        let [batch_size, num_classes] = batch.targets.dims();

        let logits = model.forward(batch.images);
        let loss: f64 = model
            .loss(logits.clone(), batch.targets.clone())
            .into_scalar()
            .elem::<f64>();
        loss_sum += loss * batch_size as f64;

        let probs   = host_values(sigmoid(logits))?;
        let targets = host_values(batch.targets.float())?;
        counts.update(&probs, &targets, num_classes, threshold);
    }

    Ok(Evaluation {
        loss:      if counts.samples > 0 { loss_sum / counts.samples as f64 } else { f64::NAN },
        accuracy:  counts.accuracy(),
        precision: counts.precision(),
        recall:    counts.recall(),
        f1:        counts.f1(),
        samples:   counts.samples,
    })
}

/// Copy a float tensor back to the host as f32, whatever the backend's float type.
fn host_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read tensor data: {e:?}"))
}
