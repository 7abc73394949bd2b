use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        conv::{Conv2d, Conv2dConfig},
        loss::BinaryCrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally, do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct VitConfig {
    /// Width of the multi-label head (vocabulary size)
    pub num_classes: usize,
    pub channels:    usize,
    pub image_size:  usize,
    pub patch_size:  usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
}

impl VitConfig {
    pub fn num_patches(&self) -> usize {
        let per_side = self.image_size / self.patch_size;
        per_side * per_side
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> MultiLabelVit<B> {
        let backbone = self.init_backbone(device);
        let head     = LinearConfig::new(self.d_model, self.num_classes).init(device);
        MultiLabelVit { backbone, head }
    }

    pub fn init_backbone<B: Backend>(&self, device: &B::Device) -> VitBackbone<B> {
        // Non-overlapping patches: kernel == stride == patch_size
        let patch_embedding = Conv2dConfig::new(
            [self.channels, self.d_model],
            [self.patch_size, self.patch_size],
        )
        .with_stride([self.patch_size, self.patch_size])
        .init(device);

        let cls_embedding      = EmbeddingConfig::new(1, self.d_model).init(device);
        // +1 for the [CLS] position
        let position_embedding = EmbeddingConfig::new(self.num_patches() + 1, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        VitBackbone {
            patch_embedding, cls_embedding, position_embedding,
            layers, final_norm, dropout,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let attn_output = self.self_attn.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// Everything except the classification head. This is the part a
/// pretrained weight file initialises.
#[derive(Module, Debug)]
pub struct VitBackbone<B: Backend> {
    pub patch_embedding:    Conv2d<B>,
    pub cls_embedding:      Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> VitBackbone<B> {
    /// images: [batch, C, H, W] → pooled [CLS] features: [batch, d_model]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let batch_size = images.dims()[0];
        let device     = images.device();

        let patches = self.patch_embedding.forward(images); // [batch, d_model, gh, gw]
        let [_, d_model, grid_h, grid_w] = patches.dims();
        let num_patches = grid_h * grid_w;
        let patches = patches
            .reshape([batch_size, d_model, num_patches])
            .swap_dims(1, 2); // [batch, num_patches, d_model]

        // A single learned row, looked up once per sample.
        let cls_ids = Tensor::<B, 2, Int>::zeros([batch_size, 1], &device);
        let cls     = self.cls_embedding.forward(cls_ids); // [batch, 1, d_model]

        let seq_len = num_patches + 1;
        let x = Tensor::cat(vec![cls, patches], 1);

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(x + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x);
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]

        x.slice([0..batch_size, 0..1, 0..d_model])
            .reshape([batch_size, d_model])
    }
}

#[derive(Module, Debug)]
pub struct MultiLabelVit<B: Backend> {
    pub backbone: VitBackbone<B>,
    pub head:     Linear<B>,
}

impl<B: Backend> MultiLabelVit<B> {
    /// images: [batch, C, H, W] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.head.forward(self.backbone.forward(images))
    }

    /// Mean binary cross-entropy over every (sample, class) cell.
    /// Sigmoid is applied inside the loss, so pass raw logits.
    pub fn loss(&self, logits: Tensor<B, 2>, targets: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device())
            .forward(logits, targets)
    }

    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(images);
        let loss   = self.loss(logits.clone(), targets);
        (loss, logits)
    }
}
