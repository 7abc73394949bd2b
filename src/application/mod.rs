// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor math, no clap types,
// no direct file parsing. Each use case wires the other layers
// together for one goal.

// Full fine-tuning run: manifest → split → train → report
pub mod train_use_case;

// Dry run of the label pipeline: vocabulary and user split
pub mod inspect_use_case;
