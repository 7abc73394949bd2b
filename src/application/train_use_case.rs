// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full fine-tuning pipeline in order:
//
//   Step 1: Load and group users          (Layer 4 - data)
//   Step 2: Build interest vocabulary     (Layer 3 - domain)
//   Step 3: Split users 80/20             (Layer 4 - data)
//   Step 4: Flatten to per-image records  (Layer 4 - data)
//   Step 5: Load tensors + encode labels  (Layer 4 - data)
//   Step 6: Save run config               (Layer 6 - infra)
//   Step 7: Run training loop             (Layer 5 - ml)
//   Step 8: Report accuracy + charts      (Layer 6 - infra)
//
// State flows through return values: nothing is global, and
// the vocabulary and split are never touched after step 4.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use trueno_viz::prelude::Rgba;

use crate::data::{
    dataset::ImageDataset,
    loader::JsonManifestLoader,
    splitter::split_users,
    tensor_store::SafetensorsStore,
};
use crate::domain::traits::ManifestSource;
use crate::domain::vocabulary::InterestVocabulary;
use crate::infra::{
    charts::{side_by_side, LineChart, Series},
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::trainer::{run_training, TrainingReport};

/// Where the tensors live for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// GPU through WGPU
    Wgpu,
    /// CPU through ndarray
    Cpu,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Every path and hyperparameter for a run. Saved next to the
// weights so a run can be reproduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub manifest:      String,
    pub images_dir:    String,
    pub tensor_name:   String,
    pub output_dir:    String,
    pub pretrained:    Option<String>,
    pub epochs:        usize,
    pub batch_size:    usize,
    pub lr:            f64,
    pub test_fraction: f64,
    pub seed:          u64,
    pub threshold:     f32,
    pub channels:      usize,
    pub image_size:    usize,
    pub patch_size:    usize,
    pub d_model:       usize,
    pub num_heads:     usize,
    pub num_layers:    usize,
    pub d_ff:          usize,
    pub dropout:       f64,
    pub device:        DeviceKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            manifest:      "data/users.json".to_string(),
            images_dir:    "data/image_tensors".to_string(),
            tensor_name:   "pixel_values".to_string(),
            output_dir:    "artifacts".to_string(),
            pretrained:    None,
            epochs:        10,
            batch_size:    16,
            lr:            2e-5,
            test_fraction: 0.2,
            seed:          42,
            threshold:     0.5,
            channels:      3,
            image_size:    224,
            patch_size:    16,
            d_model:       768,
            num_heads:     12,
            num_layers:    12,
            d_ff:          3072,
            dropout:       0.1,
            device:        DeviceKind::Wgpu,
        }
    }
}

impl TrainConfig {
    /// Reject settings that would fail deep inside Burn, before any work starts.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.epochs > 0, "epochs must be at least 1");
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(self.lr > 0.0, "learning rate must be positive");
        ensure!(
            self.test_fraction > 0.0 && self.test_fraction < 1.0,
            "test_fraction must be in (0, 1), got {}",
            self.test_fraction
        );
        ensure!(
            self.threshold > 0.0 && self.threshold < 1.0,
            "threshold must be in (0, 1), got {}",
            self.threshold
        );
        ensure!(self.channels > 0, "channels must be at least 1");
        ensure!(
            self.patch_size > 0 && self.image_size % self.patch_size == 0,
            "image_size ({}) must be a multiple of patch_size ({})",
            self.image_size,
            self.patch_size
        );
        ensure!(
            self.num_heads > 0 && self.d_model % self.num_heads == 0,
            "d_model ({}) must be divisible by num_heads ({})",
            self.d_model,
            self.num_heads
        );
        ensure!((0.0..1.0).contains(&self.dropout), "dropout must be in [0, 1)");
        Ok(())
    }

    /// Expected shape of each stored image tensor.
    pub fn image_shape(&self) -> [usize; 3] {
        [self.channels, self.image_size, self.image_size]
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load users ────────────────────────────────────────────────
        let users = JsonManifestLoader::new(&cfg.manifest).load_users()?;

        // ── Step 2: Vocabulary from ALL users, before the split ───────────────
        let vocab = InterestVocabulary::from_users(&users);
        ensure!(!vocab.is_empty(), "Manifest '{}' contains no interests", cfg.manifest);
        tracing::info!("Interest vocabulary: {} tags", vocab.len());
        for (idx, tag) in vocab.iter() {
            tracing::debug!("  class {:>4} = {}", idx, tag);
        }

        // ── Step 3: Split users ───────────────────────────────────────────────
        let split = split_users(users, cfg.test_fraction, cfg.seed);

        // ── Step 4: Flatten to images ─────────────────────────────────────────
        let train_records = split.train_images();
        let test_records  = split.test_images();
        tracing::info!(
            "Split: {} train users / {} images, {} test users / {} images",
            split.train.len(),
            train_records.len(),
            split.test.len(),
            test_records.len(),
        );
        ensure!(!train_records.is_empty(), "Training split has no images");
        ensure!(!test_records.is_empty(),  "Test split has no images");

        // ── Step 5: Load tensors and encode labels ────────────────────────────
        let store = SafetensorsStore::new(&cfg.images_dir, &cfg.tensor_name, cfg.image_shape());
        let train_dataset = ImageDataset::build(&train_records, &vocab, &store)?;
        let test_dataset  = ImageDataset::build(&test_records,  &vocab, &store)?;
        tracing::info!(
            "Datasets ready: {} train / {} test samples, {:.2} tags per training image",
            train_dataset.sample_count(),
            test_dataset.sample_count(),
            train_dataset.mean_active_labels(),
        );

        // ── Step 6: Save config next to the weights ───────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.output_dir)?;
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.output_dir)?;

        // ── Step 7: Train ─────────────────────────────────────────────────────
        let report = run_training(
            cfg,
            vocab.len(),
            train_dataset,
            test_dataset,
            &ckpt_manager,
            &metrics,
        )?;

        // ── Step 8: Report ────────────────────────────────────────────────────
        println!("\nTest accuracy (exact match): {:.2}%", report.final_eval.accuracy * 100.0);
        println!("{}", render_charts(&report.history)?);
        println!("Metrics written to '{}'", metrics.csv_path().display());

        Ok(report)
    }
}

const CHART_WIDTH:  u32 = 60;
const CHART_HEIGHT: u32 = 24;

/// Loss curves on the left, test metrics on the right; x = epoch 1..N.
pub fn render_charts(history: &[EpochMetrics]) -> Result<String> {
    let column = |f: fn(&EpochMetrics) -> f64| history.iter().map(f).collect::<Vec<f64>>();

    let loss = LineChart::new("Loss", CHART_WIDTH, CHART_HEIGHT)
        .with_series(Series::new("train", Rgba::rgb(66, 133, 244), column(|m| m.train_loss)))
        .with_series(Series::new("val",   Rgba::rgb(255, 128, 0),  column(|m| m.val_loss)));

    let scores = LineChart::new("Test metrics", CHART_WIDTH, CHART_HEIGHT)
        .higher_is_better()
        .with_series(Series::new("accuracy",  Rgba::rgb(52, 168, 83),  column(|m| m.accuracy)))
        .with_series(Series::new("precision", Rgba::rgb(66, 133, 244), column(|m| m.precision)))
        .with_series(Series::new("recall",    Rgba::rgb(255, 128, 0),  column(|m| m.recall)))
        .with_series(Series::new("f1",        Rgba::rgb(234, 67, 53),  column(|m| m.f1)));

    Ok(side_by_side(&loss.render()?, &scores.render()?, 4))
}
