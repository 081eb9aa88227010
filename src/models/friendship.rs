use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::cmp::Ordering;
use uuid::Uuid;

/// Undirected friendship edge as stored: `user_low_id < user_high_id`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Friendship {
    pub user_low_id: Uuid,
    pub user_high_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Canonical (low, high) ordering of two user ids.
///
/// Uuid ordering is bytewise, which matches both the lexicographic order of
/// the lowercase hyphenated form and Postgres' `uuid` comparison, so the pair
/// built here always satisfies the table's check constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FriendPair {
    low: Uuid,
    high: Uuid,
}

impl FriendPair {
    /// Returns `None` for a self-edge
    pub fn new(a: Uuid, b: Uuid) -> Option<Self> {
        match a.cmp(&b) {
            Ordering::Less => Some(Self { low: a, high: b }),
            Ordering::Greater => Some(Self { low: b, high: a }),
            Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_ordered_regardless_of_argument_order() {
        let a = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
        let b = Uuid::parse_str("ffffffff-0000-0000-0000-000000000000").unwrap();

        let forward = FriendPair::new(a, b).unwrap();
        let reverse = FriendPair::new(b, a).unwrap();

        assert_eq!(forward, reverse);
        assert_eq!(forward.low(), a);
        assert_eq!(forward.high(), b);
    }

    #[test]
    fn test_self_pair_is_rejected() {
        let a = Uuid::new_v4();
        assert!(FriendPair::new(a, a).is_none());
    }

    #[test]
    fn test_low_never_exceeds_high_for_random_ids() {
        for _ in 0..200 {
            let a = Uuid::new_v4();
            let b = Uuid::new_v4();
            if let Some(pair) = FriendPair::new(a, b) {
                assert!(pair.low() < pair.high());
                assert_eq!((pair.low(), pair.high()), (a.min(b), a.max(b)));
            }
        }
    }

    #[test]
    fn test_uuid_order_matches_string_order() {
        for _ in 0..200 {
            let a = Uuid::new_v4();
            let b = Uuid::new_v4();
            assert_eq!(a.cmp(&b), a.to_string().cmp(&b.to_string()));
        }
    }
}
