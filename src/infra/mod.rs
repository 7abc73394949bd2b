// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that no single business layer owns:
//
//   checkpoint.rs   Final weights via Burn's CompactRecorder,
//                   pretrained backbone loading, and the run's
//                   TrainConfig as JSON
//
//   metrics.rs      One CSV row per epoch (losses + scores)
//
//   charts.rs       Text line charts for loss and test metrics,
//                   rendered side by side in the terminal

/// Model weight saving and backbone loading
pub mod checkpoint;

/// Per-epoch metrics CSV logger
pub mod metrics;

/// Terminal line charts
pub mod charts;
