// ============================================================
// Layer 4 — Manifest Loader
// ============================================================
// Reads the user manifest, a JSON array of user objects:
//
//   [
//     {
//       "user_id":   "u1",            ← string or number
//       "images":    [ { "url": "https://cdn/x/p1.jpg" }, ... ],
//       "interests": [ "art", "travel" ]
//     },
//     ...
//   ]
//
// Entries are grouped by user_id. A user listed twice is merged
// into one record, so the partitioner can never place the same
// person on both sides of the train/test boundary.
//
// Malformed JSON is an error; there is no partial recovery.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fmt, fs, path::PathBuf};

use crate::domain::traits::ManifestSource;
use crate::domain::user::UserRecord;

/// Loads users from a manifest file on disk.
pub struct JsonManifestLoader {
    path: PathBuf,
}

impl JsonManifestLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ManifestSource for JsonManifestLoader {
    fn load_users(&self) -> Result<Vec<UserRecord>> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read manifest '{}'", self.path.display()))?;

        let users = parse_manifest(&json)
            .with_context(|| format!("Invalid manifest '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded {} users ({} image references) from '{}'",
            users.len(),
            users.iter().map(|u| u.images.len()).sum::<usize>(),
            self.path.display()
        );

        let imageless = users.iter().filter(|u| u.images.is_empty()).count();
        if imageless > 0 {
            tracing::warn!("{} users have no images and contribute no samples", imageless);
        }
        Ok(users)
    }
}

// ─── Raw manifest shape ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawUser {
    user_id: RawUserId,
    #[serde(default)]
    images: Vec<RawImage>,
    #[serde(default)]
    interests: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    url: String,
}

/// Manifests in the wild carry both `"user_id": 17` and `"user_id": "17"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Text(String),
    Integer(i64),
    Unsigned(u64),
}

impl fmt::Display for RawUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawUserId::Text(s)     => f.write_str(s),
            RawUserId::Integer(n)  => write!(f, "{n}"),
            RawUserId::Unsigned(n) => write!(f, "{n}"),
        }
    }
}

/// Parse manifest JSON and group entries by user id.
pub fn parse_manifest(json: &str) -> Result<Vec<UserRecord>> {
    let raw: Vec<RawUser> = serde_json::from_str(json)?;

    let mut users: Vec<UserRecord>       = Vec::new();
    let mut seen:  HashMap<String, usize> = HashMap::new();

    for entry in raw {
        let user_id = entry.user_id.to_string();
        let images: Vec<String> = entry.images.into_iter().map(|i| i.url).collect();

        match seen.get(&user_id) {
            Some(&pos) => {
                tracing::debug!("Merging repeated manifest entry for user '{}'", user_id);
                users[pos].absorb(images, entry.interests);
            }
            None => {
                seen.insert(user_id.clone(), users.len());
                // absorb() also drops duplicate tags within a single entry
                let mut user = UserRecord::new(user_id, Vec::new(), Vec::new());
                user.absorb(images, entry.interests);
                users.push(user);
            }
        }
    }

    Ok(users)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parses_users_in_order() {
        let json = r#"[
            {"user_id": "a", "images": [{"url": "x/1.jpg"}, {"url": "x/2.jpg"}], "interests": ["art"]},
            {"user_id": "b", "images": [{"url": "x/3.jpg"}], "interests": ["food", "music"]}
        ]"#;
        let users = parse_manifest(json).unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, "a");
        assert_eq!(users[0].images, vec!["x/1.jpg", "x/2.jpg"]);
        assert_eq!(users[1].interests, vec!["food", "music"]);
    }

    #[test]
    fn test_numeric_ids_become_strings() {
        let json = r#"[{"user_id": 42, "images": [], "interests": []}]"#;
        let users = parse_manifest(json).unwrap();
        assert_eq!(users[0].user_id, "42");
    }

    #[test]
    fn test_repeated_user_is_merged() {
        let json = r#"[
            {"user_id": 7, "images": [{"url": "a.jpg"}], "interests": ["art"]},
            {"user_id": "x", "images": [{"url": "b.jpg"}], "interests": ["food"]},
            {"user_id": "7", "images": [{"url": "c.jpg"}], "interests": ["art", "travel"]}
        ]"#;
        let users = parse_manifest(json).unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, "7");
        assert_eq!(users[0].images, vec!["a.jpg", "c.jpg"]);
        assert_eq!(users[0].interests, vec!["art", "travel"]);
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let users = parse_manifest(r#"[{"user_id": "solo"}]"#).unwrap();
        assert!(users[0].images.is_empty());
        assert!(users[0].interests.is_empty());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(parse_manifest("{not json").is_err());
        assert!(parse_manifest(r#"[{"images": []}]"#).is_err());
    }

    #[test]
    fn test_loader_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"user_id": "u", "images": [{{"url": "p.jpg"}}], "interests": ["a"]}}]"#)
            .unwrap();

        let users = JsonManifestLoader::new(file.path()).load_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].images, vec!["p.jpg"]);
    }

    #[test]
    fn test_missing_file_is_error() {
        let loader = JsonManifestLoader::new("/definitely/not/here.json");
        assert!(loader.load_users().is_err());
    }
}
