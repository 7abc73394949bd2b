// ============================================================
// Layer 3 — User and Image Records
// ============================================================
// A user owns a list of image references and a list of
// interest tags. Labels live on the user, not on the image:
// when users are flattened into per-image records, every
// image inherits its owner's complete interest list.
//
// Example:
//   User "u1", interests ["art", "travel"], images [a.jpg, b.jpg]
//     → ImageRecord { user "u1", a.jpg, ["art", "travel"] }
//     → ImageRecord { user "u1", b.jpg, ["art", "travel"] }

use serde::{Deserialize, Serialize};

/// One user after manifest grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Normalised identifier (numbers in the manifest become strings)
    pub user_id: String,

    /// Image references in manifest order
    pub images: Vec<String>,

    /// Interest tags, first occurrence order, no duplicates
    pub interests: Vec<String>,
}

impl UserRecord {
    pub fn new(
        user_id:   impl Into<String>,
        images:    Vec<String>,
        interests: Vec<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            images,
            interests,
        }
    }

    /// Fold another manifest entry for the same user into this one.
    /// Images are appended; interests are unioned keeping first-seen order.
    pub fn absorb(&mut self, images: Vec<String>, interests: Vec<String>) {
        self.images.extend(images);
        for interest in interests {
            if !self.interests.contains(&interest) {
                self.interests.push(interest);
            }
        }
    }

    /// One record per image, each carrying the full interest list.
    pub fn image_records(&self) -> impl Iterator<Item = ImageRecord> + '_ {
        self.images.iter().map(move |url| ImageRecord {
            user_id:   self.user_id.clone(),
            url:       url.clone(),
            interests: self.interests.clone(),
        })
    }
}

/// A single image, labelled with its owner's interests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub user_id:   String,
    pub url:       String,
    pub interests: Vec<String>,
}
