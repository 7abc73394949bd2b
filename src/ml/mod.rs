// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model math lives here: the ViT forward pass, the BCE
// loss, the optimiser loop and the multi-label scoring.
//
//   model.rs      Vision transformer for multi-label tagging
//                 • Conv2d patch embedding (kernel = stride = patch)
//                 • Learned [CLS] + position embeddings
//                 • Post-norm encoder blocks (MHA + GELU FFN)
//                 • Linear head → one logit per interest
//
//   trainer.rs    Fixed-epoch loop: forward, BCE-with-logits,
//                 backward, Adam step, then a test pass
//
//   evaluator.rs  Loss and micro precision / recall / F1 plus
//                 exact-match accuracy at a sigmoid threshold
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Dosovitskiy et al. (2021) An Image is Worth 16x16 Words

/// Vision transformer backbone and classification head
pub mod model;

/// Training loop, one evaluation per epoch
pub mod trainer;

/// Multi-label metrics over a batch iterator
pub mod evaluator;
