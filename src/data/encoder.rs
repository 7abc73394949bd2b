// ============================================================
// Layer 4 — Multi-Hot Label Encoder
// ============================================================
// Turns a tag list into a fixed-length target vector:
//
//   vocabulary: [art, food, music, travel]
//   tags:       ["travel", "art", "skydiving"]
//   encoded:    [1.0, 0.0, 0.0, 1.0]
//
// Tags missing from the vocabulary ("skydiving") are dropped
// without error. Duplicate tags set the same slot twice,
// which is harmless, so encoding is idempotent.

use crate::domain::vocabulary::InterestVocabulary;

/// Encode `tags` as a multi-hot vector of length `vocab.len()`.
pub fn encode_multi_hot<S: AsRef<str>>(tags: &[S], vocab: &InterestVocabulary) -> Vec<f32> {
    let mut encoded = vec![0.0f32; vocab.len()];
    for tag in tags {
        if let Some(idx) = vocab.index_of(tag.as_ref()) {
            encoded[idx] = 1.0;
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> InterestVocabulary {
        InterestVocabulary::from_tags(["art", "food", "music", "travel"])
    }

    #[test]
    fn test_sets_known_tags_only() {
        let v = vocab();
        let encoded = encode_multi_hot(&["travel", "art", "skydiving"], &v);
        assert_eq!(encoded, vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_ones_match_tags_in_vocabulary() {
        let v    = vocab();
        let tags = ["food", "music", "unknown"];
        let encoded = encode_multi_hot(&tags, &v);

        for (i, tag) in v.iter() {
            let expected = if tags.contains(&tag) { 1.0 } else { 0.0 };
            assert_eq!(encoded[i], expected, "slot {i} ({tag})");
        }
    }

    #[test]
    fn test_encoding_is_idempotent() {
        let v    = vocab();
        let tags = vec!["music".to_string(), "music".to_string(), "art".to_string()];
        assert_eq!(encode_multi_hot(&tags, &v), encode_multi_hot(&tags, &v));
        assert_eq!(encode_multi_hot(&tags, &v), vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_empty_tags_and_empty_vocab() {
        let empty: [&str; 0] = [];
        assert_eq!(encode_multi_hot(&empty, &vocab()), vec![0.0; 4]);
        assert!(encode_multi_hot(&["art"], &InterestVocabulary::from_tags(empty)).is_empty());
    }
}
