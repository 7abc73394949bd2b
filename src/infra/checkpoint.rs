// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves the trained weights and the run configuration, and
// loads pretrained backbone weights before fine-tuning.
//
// Files in the output directory:
//   model.mpk.gz       ← final weights (CompactRecorder)
//   train_config.json  ← the resolved TrainConfig for this run
//
// Burn's CompactRecorder:
//   - Serialises module records to MessagePack, gzip-compressed
//   - Loading fails if the record does not match the module
//
// There is no per-epoch checkpointing and no resume: only the
// weights at the end of the last epoch are written. A previous
// run's model.mpk.gz can seed the backbone of a new run.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{MultiLabelVit, MultiLabelVitRecord, VitBackbone};

const MODEL_FILE:  &str = "model";
const CONFIG_FILE: &str = "train_config.json";
const RECORD_EXT:  &str = ".mpk.gz";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the output directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path of the weights file without extension (the recorder adds `.mpk.gz`).
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    /// Write the full model's weights.
    pub fn save_model<B: Backend>(&self, model: &MultiLabelVit<B>) -> Result<PathBuf> {
        let path = self.model_path();

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        tracing::info!("Saved model weights to '{}'", path.display());
        Ok(path)
    }

    /// Load pretrained weights into a freshly initialised backbone.
    ///
    /// Accepts either a full model written by `save_model` (any head width,
    /// only its backbone is kept) or a backbone-only record. The path may
    /// name the file with or without its `.mpk.gz` extension. The backbone
    /// architecture (d_model, layers, patch size, ...) must match the one
    /// the weights were recorded from.
    pub fn load_backbone<B: Backend>(
        &self,
        backbone: VitBackbone<B>,
        path:     impl AsRef<Path>,
        device:   &B::Device,
    ) -> Result<VitBackbone<B>> {
        let path = recorder_path(path.as_ref());
        tracing::info!("Loading pretrained backbone from '{}'", path.display());

        let recorder = CompactRecorder::new();
        let full: Result<MultiLabelVitRecord<B>, _> =
            Recorder::<B>::load(&recorder, path.clone(), device);
        let record = match full {
            Ok(model_record) => model_record.backbone,
            Err(full_err) => {
                tracing::debug!("Not a full model record ({full_err:?}), trying backbone-only");
                recorder.load(path.clone(), device).with_context(|| {
                    format!(
                        "Cannot load pretrained backbone '{}'. Does its architecture match the configured one?",
                        path.display()
                    )
                })?
            }
        };

        Ok(backbone.load_record(record))
    }

    /// Save the run configuration as pretty JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}

/// The recorder appends its own extension, so drop one the caller supplied.
fn recorder_path(path: &Path) -> PathBuf {
    match path.to_str().and_then(|p| p.strip_suffix(RECORD_EXT)) {
        Some(stem) => PathBuf::from(stem),
        None       => path.to_path_buf(),
    }
}
