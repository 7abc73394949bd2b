// ============================================================
// Layer 3 — Interest Vocabulary
// ============================================================
// Every distinct interest tag seen across ALL users, each
// assigned a class position 0..K-1. The vocabulary is built
// once, before users are split, so train and test labels are
// encoded into the same index space.
//
// Tags are indexed in sorted order. Building from a hash set
// would make positions depend on hash iteration order, and a
// saved model's output columns would not line up between runs.

use std::collections::{BTreeSet, HashMap};

use crate::domain::user::UserRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestVocabulary {
    /// position → tag
    interests: Vec<String>,
    /// tag → position
    index: HashMap<String, usize>,
}

impl InterestVocabulary {
    /// Collect the distinct interests of all users.
    pub fn from_users(users: &[UserRecord]) -> Self {
        let distinct: BTreeSet<&str> = users
            .iter()
            .flat_map(|u| u.interests.iter().map(String::as_str))
            .collect();
        Self::from_sorted(distinct.into_iter().map(str::to_string).collect())
    }

    /// Build from arbitrary tags; duplicates collapse and order is normalised.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let distinct: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        Self::from_sorted(distinct.into_iter().collect())
    }

    fn from_sorted(interests: Vec<String>) -> Self {
        let index = interests
            .iter()
            .enumerate()
            .map(|(i, tag)| (tag.clone(), i))
            .collect();
        Self { interests, index }
    }

    /// Class position of a tag, if the tag is known.
    pub fn index_of(&self, tag: &str) -> Option<usize> {
        self.index.get(tag).copied()
    }

    /// Tag at a class position.
    pub fn interest(&self, idx: usize) -> Option<&str> {
        self.interests.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.interests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interests.is_empty()
    }

    /// (position, tag) pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.interests.iter().map(String::as_str).enumerate()
    }
}
