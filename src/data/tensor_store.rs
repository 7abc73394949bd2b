// ============================================================
// Layer 4 — Precomputed Image Tensor Store
// ============================================================
// Images are not decoded here. Each image was preprocessed
// ahead of time into a `.safetensors` file holding a single
// f32 tensor (default name "pixel_values") in [C, H, W] or
// [1, C, H, W] layout.
//
// Image reference → file:
//   "https://cdn.example/u1/photo_01.jpg?sz=large"
//       └── final segment "photo_01.jpg"
//             └── "photo_01.safetensors" inside the images dir
//
// A missing file, a non-f32 dtype, or a shape that does not
// match the configured model input is an error.

use anyhow::{bail, Context, Result};
use safetensors::{tensor::Dtype, SafeTensors};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::image::ImageTensor;
use crate::domain::traits::TensorSource;

pub const TENSOR_EXTENSION: &str = "safetensors";

pub struct SafetensorsStore {
    dir:         PathBuf,
    tensor_name: String,
    /// Expected [C, H, W]
    expected:    [usize; 3],
}

impl SafetensorsStore {
    pub fn new(
        dir:         impl Into<PathBuf>,
        tensor_name: impl Into<String>,
        expected:    [usize; 3],
    ) -> Self {
        Self {
            dir:         dir.into(),
            tensor_name: tensor_name.into(),
            expected,
        }
    }

    /// Full path of the tensor file backing an image reference.
    pub fn tensor_path(&self, url: &str) -> Result<PathBuf> {
        Ok(self.dir.join(tensor_file_name(url)?))
    }

    fn read_file(&self, path: &Path) -> Result<ImageTensor> {
        let bytes = fs::read(path)
            .with_context(|| format!("Cannot read image tensor '{}'", path.display()))?;

        let tensors = SafeTensors::deserialize(&bytes)
            .map_err(|e| anyhow::anyhow!("safetensors parse error in '{}': {e:?}", path.display()))?;

        let view = tensors.tensor(&self.tensor_name).map_err(|e| {
            anyhow::anyhow!(
                "'{}' has no tensor named '{}': {e:?}",
                path.display(),
                self.tensor_name
            )
        })?;

        if view.dtype() != Dtype::F32 {
            bail!(
                "'{}': expected F32 tensor, found {:?}",
                path.display(),
                view.dtype()
            );
        }

        let shape = chw_shape(view.shape())
            .with_context(|| format!("'{}': unsupported tensor rank", path.display()))?;
        if shape != self.expected {
            bail!(
                "'{}': tensor shape {:?} does not match expected {:?}",
                path.display(),
                shape,
                self.expected
            );
        }

        // Data offsets are not guaranteed to be 4-byte aligned, so decode bytewise.
        let values: Vec<f32> = view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        ImageTensor::new(shape, values)
            .with_context(|| format!("'{}': truncated tensor data", path.display()))
    }
}

impl TensorSource for SafetensorsStore {
    fn load_image(&self, url: &str) -> Result<ImageTensor> {
        let path = self.tensor_path(url)?;
        self.read_file(&path)
    }
}

/// Map an image reference (URL or path) to its tensor file name.
pub fn tensor_file_name(url: &str) -> Result<String> {
    let without_query = url
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let segment = without_query
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    if segment.is_empty() {
        bail!("Image reference '{url}' has no file name");
    }

    let stem = Path::new(segment)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(segment);
    Ok(format!("{stem}.{TENSOR_EXTENSION}"))
}

/// Accept [C, H, W] or a leading singleton batch dimension.
fn chw_shape(shape: &[usize]) -> Option<[usize; 3]> {
    match *shape {
        [c, h, w]    => Some([c, h, w]),
        [1, c, h, w] => Some([c, h, w]),
        _            => None,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use safetensors::tensor::TensorView;

    /// Write a single-tensor safetensors file, as the preprocessing step would.
    pub(crate) fn write_tensor(path: &Path, name: &str, shape: &[usize], values: &[f32]) {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = TensorView::new(Dtype::F32, shape.to_vec(), &bytes).unwrap();
        let encoded = safetensors::serialize(vec![(name, view)], None).unwrap();
        fs::write(path, encoded).unwrap();
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            tensor_file_name("https://cdn.example/u1/photo_01.jpg?sz=large").unwrap(),
            "photo_01.safetensors"
        );
        assert_eq!(tensor_file_name("local/a.b.png").unwrap(), "a.b.safetensors");
        assert_eq!(tensor_file_name("plain").unwrap(), "plain.safetensors");
    }

    #[test]
    fn test_url_without_file_name_is_error() {
        assert!(tensor_file_name("https://cdn.example/dir/").is_err());
        assert!(tensor_file_name("").is_err());
    }

    #[test]
    fn test_loads_chw_tensor() {
        let dir = tempfile::tempdir().unwrap();
        let values: Vec<f32> = (0..12).map(|v| v as f32 * 0.5).collect();
        write_tensor(&dir.path().join("img.safetensors"), "pixel_values", &[3, 2, 2], &values);

        let store = SafetensorsStore::new(dir.path(), "pixel_values", [3, 2, 2]);
        let image = store.load_image("https://x/img.jpg").unwrap();

        assert_eq!(image.shape, [3, 2, 2]);
        assert_eq!(image.values, values);
    }

    #[test]
    fn test_accepts_leading_batch_dim() {
        let dir = tempfile::tempdir().unwrap();
        write_tensor(&dir.path().join("b.safetensors"), "pixel_values", &[1, 1, 2, 2], &[1.0; 4]);

        let store = SafetensorsStore::new(dir.path(), "pixel_values", [1, 2, 2]);
        assert_eq!(store.load_image("b.png").unwrap().shape, [1, 2, 2]);
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let dir = tempfile::tempdir().unwrap();
        write_tensor(&dir.path().join("c.safetensors"), "pixel_values", &[3, 2, 2], &[0.0; 12]);

        let store = SafetensorsStore::new(dir.path(), "pixel_values", [3, 4, 4]);
        assert!(store.load_image("c.jpg").is_err());
    }

    #[test]
    fn test_missing_file_and_wrong_name_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_tensor(&dir.path().join("d.safetensors"), "other", &[3, 2, 2], &[0.0; 12]);

        let store = SafetensorsStore::new(dir.path(), "pixel_values", [3, 2, 2]);
        assert!(store.load_image("d.jpg").is_err());
        assert!(store.load_image("missing.jpg").is_err());
    }
}
