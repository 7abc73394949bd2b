// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack ImageSamples into
// device tensors.
//
//   Input:  Vec of N samples, each [C, H, W] pixels + K labels
//   Output: images  [N, C, H, W]   (float)
//           targets [N, K]         (int 0/1, what BCE expects)
//
// Every sample has the same shape: the tensor store rejects
// anything that does not match the configured model input.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ImageSample;

/// A batch ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Pixel tensors, shape [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,

    /// Multi-hot targets, shape [batch_size, num_classes]
    pub targets: Tensor<B, 2, Int>,
}

/// Holds the target device so tensors are created on the
/// device chosen at startup.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ImageSample, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageSample>) -> ImageBatch<B> {
        let batch_size  = items.len();
        let [c, h, w]   = items[0].shape;
        let num_classes = items[0].labels.len();

        // ── Flatten pixels: Vec<Vec<f32>> → Vec<f32> ──────────────────────────
        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.pixels.iter().copied())
            .collect();

        // ── Flatten labels as ints (Burn's BCE takes Int targets) ─────────────
        let labels: Vec<i32> = items
            .iter()
            .flat_map(|s| s.labels.iter().map(|&v| if v > 0.5 { 1 } else { 0 }))
            .collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, c, h, w]);

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device)
            .reshape([batch_size, num_classes]);

        ImageBatch { images, targets }
    }
}
