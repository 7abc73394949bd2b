// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types for the things this tool reasons about:
// users, their images, the interest vocabulary, and the
// precomputed pixel tensors behind each image.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs and the traits other layers implement

/// Users and the per-image records flattened out of them
pub mod user;

/// Shared interest-tag index (tag string <-> class position)
pub mod vocabulary;

/// Decoded pixel data for one image
pub mod image;

/// Abstractions implemented by the data layer
pub mod traits;
