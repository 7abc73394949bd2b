// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fixed-epoch fine-tuning with Burn's DataLoader and Adam.
//
// Per epoch:
//   1. Training pass on Autodiff<B>:
//        forward → BCE-with-logits → backward → Adam step
//      train_loss = Σ(batch_loss × batch_size) / samples
//   2. Evaluation pass on the inner backend (model.valid()),
//      so no gradient graph is built and dropout is off.
//
// After the last epoch the weights are saved and the test set
// is scored once more for the final report.
//
// Errors (unreadable pretrained weights, recorder failures)
// abort the run; there is no retry or resume.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{DeviceKind, TrainConfig};
use crate::data::{batcher::ImageBatcher, dataset::ImageDataset};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::evaluator::{evaluate, Evaluation};
use crate::ml::model::{MultiLabelVit, VitConfig};

type WgpuBackend    = burn::backend::Wgpu;
type NdArrayBackend = burn::backend::NdArray;

/// Everything the reporter needs once training is over.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub history: Vec<EpochMetrics>,
    /// Fresh pass over the full test set with the final weights
    pub final_eval: Evaluation,
}

/// Pick the backend once, from configuration, and train on it.
pub fn run_training(
    cfg:           &TrainConfig,
    num_classes:   usize,
    train_dataset: ImageDataset,
    test_dataset:  ImageDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
) -> Result<TrainingReport> {
    match cfg.device {
        DeviceKind::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<burn::backend::Autodiff<WgpuBackend>>(
                cfg, num_classes, train_dataset, test_dataset, ckpt_manager, metrics, device,
            )
        }
        DeviceKind::Cpu => {
            let device = burn::backend::ndarray::NdArrayDevice::Cpu;
            tracing::info!("Using CPU (ndarray) device");
            train_loop::<burn::backend::Autodiff<NdArrayBackend>>(
                cfg, num_classes, train_dataset, test_dataset, ckpt_manager, metrics, device,
            )
        }
    }
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    num_classes:   usize,
    train_dataset: ImageDataset,
    test_dataset:  ImageDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        B::Device,
) -> Result<TrainingReport> {

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = VitConfig::new(
        num_classes, cfg.channels, cfg.image_size, cfg.patch_size,
        cfg.d_model, cfg.num_heads, cfg.num_layers, cfg.d_ff, cfg.dropout,
    );
    let mut model: MultiLabelVit<B> = model_cfg.init(&device);
    if let Some(path) = &cfg.pretrained {
        model.backbone = ckpt_manager.load_backbone(model.backbone, path, &device)?;
    }
    tracing::info!(
        "Model ready: {} layers, d_model={}, {} patches, {} classes",
        cfg.num_layers, cfg.d_model, model_cfg.num_patches(), num_classes,
    );

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = ImageBatcher::<B>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Test data loader (InnerBackend: no autodiff overhead) ────────────────
    let test_batcher = ImageBatcher::<B::InnerBackend>::new(device.clone());
    let test_loader  = DataLoaderBuilder::new(test_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(test_dataset);

    let mut history = Vec::with_capacity(cfg.epochs);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_samples  = 0usize;

        for batch in train_loader.iter() {
            let batch_size = batch.images.dims()[0];
            let (loss, _) = model.forward_loss(batch.images, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val * batch_size as f64;
            train_samples  += batch_size;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_samples > 0 {
            train_loss_sum / train_samples as f64
        } else { f64::NAN };

        // ── Evaluation phase ──────────────────────────────────────────────────
        let eval = evaluate(&model.valid(), test_loader.iter(), cfg.threshold)?;
        let row  = EpochMetrics::new(epoch, avg_train_loss, &eval);

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | acc={:.1}% | P={:.3} R={:.3} F1={:.3}",
            epoch, cfg.epochs, row.train_loss, row.val_loss,
            row.accuracy * 100.0, row.precision, row.recall, row.f1,
        );

        metrics.log(&row)?;
        history.push(row);
    }

    ckpt_manager.save_model(&model)?;

    // ── Final score with the saved weights ────────────────────────────────────
    let final_eval = evaluate(&model.valid(), test_loader.iter(), cfg.threshold)?;
    tracing::info!("Training complete!");

    Ok(TrainingReport { history, final_eval })
}
