//! Visitor Bucket Model

use serde::{Deserialize, Serialize};

/// 每小时访客桶 (一个整点区间内的在店人数)
///
/// `bucket_time` 为整点 UTC Unix millis，唯一；`amount` 永不为负。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VisitorBucket {
    pub id: i64,
    pub bucket_time: i64,
    pub amount: i64,
}

impl VisitorBucket {
    /// Apply a signed delta with the floor-at-zero policy.
    ///
    /// Returns `false` (and leaves the amount untouched) when the delta would
    /// take the count below zero.
    pub fn apply_delta(&mut self, delta: i64) -> bool {
        match self.amount.checked_add(delta) {
            Some(next) if next >= 0 => {
                self.amount = next;
                true
            }
            _ => false,
        }
    }
}
