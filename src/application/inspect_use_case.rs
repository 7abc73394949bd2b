// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Runs the label side of the pipeline without a model:
// load users, build the vocabulary, split, flatten, encode.
// Prints what training WOULD see, so a manifest and seed can
// be checked before spending GPU time on them.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::data::{encoder::encode_multi_hot, splitter::split_users};
use crate::domain::traits::ManifestSource;
use crate::domain::user::UserRecord;
use crate::domain::vocabulary::InterestVocabulary;

/// Partition and vocabulary summary for one manifest + seed.
#[derive(Debug, Clone, Serialize)]
pub struct InspectSummary {
    pub vocabulary:   Vec<String>,
    pub train_users:  Vec<String>,
    pub test_users:   Vec<String>,
    pub train_images: usize,
    pub test_images:  usize,
    /// Distinct lengths of the encoded label vectors; `[K]` when sound
    pub label_widths: Vec<usize>,
    /// Images per class position across both splits
    pub label_counts: Vec<usize>,
}

pub struct InspectUseCase<S: ManifestSource> {
    source:        S,
    test_fraction: f64,
    seed:          u64,
}

impl<S: ManifestSource> InspectUseCase<S> {
    pub fn new(source: S, test_fraction: f64, seed: u64) -> Self {
        Self { source, test_fraction, seed }
    }

    pub fn execute(&self) -> Result<InspectSummary> {
        let users = self.source.load_users()?;
        Ok(summarise(users, self.test_fraction, self.seed))
    }
}

/// Build the vocabulary, split users and encode every image's labels.
pub fn summarise(users: Vec<UserRecord>, test_fraction: f64, seed: u64) -> InspectSummary {
    let vocab = InterestVocabulary::from_users(&users);
    let split = split_users(users, test_fraction, seed);

    let train_records = split.train_images();
    let test_records  = split.test_images();

    let mut label_counts = vec![0usize; vocab.len()];
    let mut label_widths = BTreeSet::new();
    for record in train_records.iter().chain(&test_records) {
        let encoded = encode_multi_hot(&record.interests, &vocab);
        label_widths.insert(encoded.len());
        for (slot, &v) in label_counts.iter_mut().zip(&encoded) {
            if v > 0.5 {
                *slot += 1;
            }
        }
    }

    InspectSummary {
        vocabulary:   (0..vocab.len()).filter_map(|i| vocab.interest(i)).map(str::to_string).collect(),
        train_users:  split.train.iter().map(|u| u.user_id.clone()).collect(),
        test_users:   split.test.iter().map(|u| u.user_id.clone()).collect(),
        train_images: train_records.len(),
        test_images:  test_records.len(),
        label_widths: label_widths.into_iter().collect(),
        label_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<UserRecord>);

    impl ManifestSource for Fixed {
        fn load_users(&self) -> Result<Vec<UserRecord>> {
            Ok(self.0.clone())
        }
    }

    fn user(id: &str, images: usize, tags: &[&str]) -> UserRecord {
        UserRecord::new(
            id,
            (0..images).map(|i| format!("{id}_{i}.jpg")).collect(),
            tags.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_two_user_scenario() {
        let users = vec![
            user("alice", 5, &["art", "food", "music"]),
            user("bob",   5, &["sport", "travel"]),
        ];
        let summary = InspectUseCase::new(Fixed(users), 0.2, 42).execute().unwrap();

        assert_eq!(summary.vocabulary.len(), 5);
        // every one of the 10 label vectors has length 5
        assert_eq!(summary.label_widths, vec![5]);
        assert_eq!(summary.train_users.len(), 1);
        assert_eq!(summary.test_users.len(),  1);
        assert_ne!(summary.train_users, summary.test_users);
        assert_eq!(summary.train_images, 5);
        assert_eq!(summary.test_images,  5);
        // every tag belongs to exactly one user with 5 images
        assert_eq!(summary.label_counts, vec![5; 5]);
    }

    #[test]
    fn test_summary_is_reproducible() {
        let users: Vec<UserRecord> = (0..12).map(|i| user(&format!("u{i}"), 2, &["a"])).collect();
        let a = summarise(users.clone(), 0.2, 9);
        let b = summarise(users, 0.2, 9);
        assert_eq!(a.train_users, b.train_users);
        assert_eq!(a.test_users,  b.test_users);
    }

    #[test]
    fn test_empty_manifest() {
        let summary = summarise(Vec::new(), 0.2, 1);
        assert!(summary.vocabulary.is_empty());
        assert_eq!(summary.train_images + summary.test_images, 0);
        assert!(summary.label_widths.is_empty());
    }
}
