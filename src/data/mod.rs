// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the manifest file and device-ready
// tensor batches:
//
//   users.json
//       │
//       ▼
//   JsonManifestLoader → users grouped by id
//       │
//       ▼
//   InterestVocabulary → built from ALL users (domain layer)
//       │
//       ▼
//   split_users        → seeded 80/20 split of USERS
//       │
//       ▼
//   flatten_images     → one record per image, owner's tags attached
//       │
//       ▼
//   SafetensorsStore   → precomputed pixel tensor per image
//   encode_multi_hot   → tags → K-length target vector
//       │
//       ▼
//   ImageDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher       → stacks samples into tensor batches
//
// Each module does exactly one step and is tested on its own.

/// Reads and groups the user manifest JSON
pub mod loader;

/// Reads precomputed image tensors from safetensors files
pub mod tensor_store;

/// Seeded user-level train/test split and per-image flattening
pub mod splitter;

/// Interest tags → multi-hot vectors
pub mod encoder;

/// Implements Burn's Dataset trait for loaded image samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
