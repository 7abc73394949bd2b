// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records per-epoch metrics to a CSV file next to the weights.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: sample-weighted mean BCE on the training set
//   - val_loss:   sample-weighted mean BCE on the test set
//   - accuracy:   exact-match (subset) accuracy on the test set
//   - precision / recall / f1: micro-averaged on the test set
//
// Output file: <output_dir>/metrics.csv, rewritten each run
//
//   epoch,train_loss,val_loss,accuracy,precision,recall,f1
//   1,0.693100,0.688200,0.000000,0.310000,0.420000,0.356712
//   ...

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::ml::evaluator::Evaluation;

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    pub train_loss: f64,
    pub val_loss:   f64,
    pub accuracy:   f64,
    pub precision:  f64,
    pub recall:     f64,
    pub f1:         f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, eval: &Evaluation) -> Self {
        Self {
            epoch,
            train_loss,
            val_loss:  eval.loss,
            accuracy:  eval.accuracy,
            precision: eval.precision,
            recall:    eval.recall,
            f1:        eval.f1,
        }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the CSV with a fresh header, replacing any earlier run's file.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,val_loss,accuracy,precision,recall,f1")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.accuracy,
            m.precision,
            m.recall,
            m.f1,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn eval(loss: f64) -> Evaluation {
        Evaluation { loss, accuracy: 0.5, precision: 0.6, recall: 0.4, f1: 0.48, samples: 10 }
    }

    #[test]
    fn test_log_writes_header_and_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 0.7, &eval(0.69))).unwrap();
        logger.log(&EpochMetrics::new(2, 0.6, &eval(0.65))).unwrap();

        let csv   = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,train_loss,val_loss,accuracy,precision,recall,f1");
        assert!(lines[2].starts_with("2,0.600000,0.650000,0.500000"));
    }

    #[test]
    fn test_new_run_replaces_old_file() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::new(dir.path()).unwrap()
            .log(&EpochMetrics::new(1, 1.0, &eval(1.0))).unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        let csv    = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
