// ============================================================
// Layer 4 — User-Level Train/Test Splitter
// ============================================================
// Splits USERS, not images, into train and test sets, then
// flattens each side into per-image records.
//
// Why split by user?
//   Every image of a user carries the same label set. If one
//   user's photos landed on both sides, the test set would be
//   full of near-duplicates of training examples and the
//   reported accuracy would measure memorisation of people,
//   not generalisation to new ones.
//
// Sizing:
//   n_test  = ceil(n_users * test_fraction), clamped to n_users
//   n_train = n_users - n_test
//   With 2 users and 0.2 → 1 train user, 1 test user.
//
// The user list is shuffled with a seeded StdRng before the
// cut, so a given (manifest, seed) always yields the same split.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::user::{ImageRecord, UserRecord};

/// Users on each side of the split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSplit {
    pub train: Vec<UserRecord>,
    pub test:  Vec<UserRecord>,
}

impl UserSplit {
    /// Training side flattened to one record per image.
    pub fn train_images(&self) -> Vec<ImageRecord> {
        flatten_images(&self.train)
    }

    /// Test side flattened to one record per image.
    pub fn test_images(&self) -> Vec<ImageRecord> {
        flatten_images(&self.test)
    }
}

/// Shuffle `users` with a seeded RNG and cut into (train, test).
///
/// # Arguments
/// * `users`         - All grouped users (consumed by this function)
/// * `test_fraction` - Share of users held out, e.g. 0.2 = 20%
/// * `seed`          - Fixed seed; same seed + same input = same split
pub fn split_users(mut users: Vec<UserRecord>, test_fraction: f64, seed: u64) -> UserSplit {
    let mut rng = StdRng::seed_from_u64(seed);
    users.shuffle(&mut rng);

    let total  = users.len();
    let n_test = test_count(total, test_fraction);

    // split_off(n) leaves [0..n] in `users` and returns [n..total]
    let test = users.split_off(total - n_test);

    tracing::debug!(
        "User split: {} train, {} test (seed {})",
        users.len(),
        test.len(),
        seed,
    );

    UserSplit { train: users, test }
}

/// Number of users held out for testing.
pub fn test_count(total: usize, test_fraction: f64) -> usize {
    let n = (total as f64 * test_fraction).ceil();
    if n <= 0.0 {
        0
    } else {
        (n as usize).min(total)
    }
}

/// One record per image, each tagged with its owner's interests.
pub fn flatten_images(users: &[UserRecord]) -> Vec<ImageRecord> {
    users.iter().flat_map(|u| u.image_records()).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn users(n: usize, images_each: usize) -> Vec<UserRecord> {
        (0..n)
            .map(|i| {
                UserRecord::new(
                    format!("u{i}"),
                    (0..images_each).map(|j| format!("u{i}_{j}.jpg")).collect(),
                    vec![format!("tag{}", i % 3)],
                )
            })
            .collect()
    }

    fn ids(side: &[UserRecord]) -> HashSet<String> {
        side.iter().map(|u| u.user_id.clone()).collect()
    }

    #[test]
    fn test_correct_split_sizes() {
        let split = split_users(users(100, 1), 0.2, 42);
        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(),  20);
    }

    #[test]
    fn test_two_users_put_one_in_test() {
        let split = split_users(users(2, 5), 0.2, 42);
        assert_eq!(split.train.len(), 1);
        assert_eq!(split.test.len(),  1);
    }

    #[test]
    fn test_every_user_in_exactly_one_side() {
        let all   = users(37, 2);
        let split = split_users(all.clone(), 0.2, 7);

        let train = ids(&split.train);
        let test  = ids(&split.test);
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), all.len());
        assert_eq!(&train | &test, ids(&all));
    }

    #[test]
    fn test_images_never_cross_boundary() {
        let split = split_users(users(10, 4), 0.2, 3);
        let train_users: HashSet<String> = split.train_images().into_iter().map(|r| r.user_id).collect();
        let test_users:  HashSet<String> = split.test_images().into_iter().map(|r| r.user_id).collect();

        assert!(train_users.is_disjoint(&test_users));
        assert_eq!(split.train_images().len() + split.test_images().len(), 40);
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_users(users(25, 1), 0.2, 1234);
        let b = split_users(users(25, 1), 0.2, 1234);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input() {
        let split = split_users(Vec::new(), 0.2, 42);
        assert!(split.train.is_empty());
        assert!(split.test.is_empty());
    }

    #[test]
    fn test_test_count_rounds_up() {
        assert_eq!(test_count(10, 0.2), 2);
        assert_eq!(test_count(11, 0.2), 3);
        assert_eq!(test_count(1,  0.2), 1);
        assert_eq!(test_count(0,  0.2), 0);
        assert_eq!(test_count(5,  1.5), 5);
    }
}
