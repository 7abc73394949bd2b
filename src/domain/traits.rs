// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits, never to the
// concrete JSON / safetensors readers. Tests swap in
// in-memory implementations.

use anyhow::Result;

use crate::domain::image::ImageTensor;
use crate::domain::user::UserRecord;

// ─── ManifestSource ───────────────────────────────────────────────────────────
/// Anything that can produce the grouped list of users.
///
/// Implementations:
///   - JsonManifestLoader → reads the user manifest JSON file
pub trait ManifestSource {
    /// Users in order of first appearance, one record per distinct id.
    fn load_users(&self) -> Result<Vec<UserRecord>>;
}

// ─── TensorSource ─────────────────────────────────────────────────────────────
/// Anything that can resolve an image reference to its pixel tensor.
///
/// Implementations:
///   - SafetensorsStore → reads precomputed `.safetensors` files
pub trait TensorSource {
    fn load_image(&self, url: &str) -> Result<ImageTensor>;
}
