use anyhow::{Context, Result};
use burn::data::dataset::Dataset;

use crate::data::encoder::encode_multi_hot;
use crate::domain::traits::TensorSource;
use crate::domain::user::ImageRecord;
use crate::domain::vocabulary::InterestVocabulary;

/// One image with its pixels loaded and its labels encoded.
#[derive(Debug, Clone)]
pub struct ImageSample {
    /// [C, H, W]
    pub shape:  [usize; 3],
    pub pixels: Vec<f32>,
    /// Multi-hot, length = vocabulary size
    pub labels: Vec<f32>,
}

impl ImageSample {
    pub fn active_labels(&self) -> usize {
        self.labels.iter().filter(|&&v| v > 0.5).count()
    }
}

pub struct ImageDataset {
    samples: Vec<ImageSample>,
}

impl ImageDataset {
    pub fn new(samples: Vec<ImageSample>) -> Self { Self { samples } }

    /// Load every record's tensor and encode its tags.
    /// The first unreadable tensor aborts the whole build.
    pub fn build(
        records: &[ImageRecord],
        vocab:   &InterestVocabulary,
        source:  &dyn TensorSource,
    ) -> Result<Self> {
        let samples = records
            .iter()
            .map(|record| {
                let image = source.load_image(&record.url).with_context(|| {
                    format!("Loading image '{}' of user '{}'", record.url, record.user_id)
                })?;
                Ok(ImageSample {
                    shape:  image.shape,
                    pixels: image.values,
                    labels: encode_multi_hot(&record.interests, vocab),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(samples))
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Average number of positive labels per sample (0.0 when empty).
    pub fn mean_active_labels(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: usize = self.samples.iter().map(ImageSample::active_labels).sum();
        total as f64 / self.samples.len() as f64
    }
}

impl Dataset<ImageSample> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::ImageTensor;
    use anyhow::bail;
    use std::collections::HashMap;

    /// In-memory stand-in for the safetensors directory.
    struct MapSource(HashMap<String, ImageTensor>);

    impl TensorSource for MapSource {
        fn load_image(&self, url: &str) -> Result<ImageTensor> {
            match self.0.get(url) {
                Some(t) => Ok(t.clone()),
                None    => bail!("no tensor for '{url}'"),
            }
        }
    }

    fn record(url: &str, tags: &[&str]) -> ImageRecord {
        ImageRecord {
            user_id:   "u".into(),
            url:       url.into(),
            interests: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn tensor(fill: f32) -> ImageTensor {
        ImageTensor::new([1, 2, 2], vec![fill; 4]).unwrap()
    }

    #[test]
    fn test_build_encodes_labels() {
        let vocab  = InterestVocabulary::from_tags(["art", "food", "music"]);
        let source = MapSource(HashMap::from([
            ("a.jpg".to_string(), tensor(0.1)),
            ("b.jpg".to_string(), tensor(0.2)),
        ]));
        let records = vec![record("a.jpg", &["music"]), record("b.jpg", &["art", "zzz"])];

        let ds = ImageDataset::build(&records, &vocab, &source).unwrap();

        assert_eq!(ds.len(), 2);
        let first = ds.get(0).unwrap();
        assert_eq!(first.labels, vec![0.0, 0.0, 1.0]);
        assert_eq!(first.pixels, vec![0.1; 4]);
        assert_eq!(ds.get(1).unwrap().active_labels(), 1);
        assert!(ds.get(2).is_none());
        assert_eq!(ds.sample_count(), 2);
        assert!((ds.mean_active_labels() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_tensor_aborts_build() {
        let vocab   = InterestVocabulary::from_tags(["art"]);
        let source  = MapSource(HashMap::new());
        let records = vec![record("gone.jpg", &["art"])];

        assert!(ImageDataset::build(&records, &vocab, &source).is_err());
    }
}
