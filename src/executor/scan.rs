//! Scan rows and the store-side scan collaborator trait

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compiler::LeafScanSpec;

use super::errors::ScanResult;

/// One row coming back from a leaf scan: the record timestamp and the
/// record identity. Ordering is (timestamp, identity), so merged sets stay
/// time-sorted with the identity as a deterministic tiebreak.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RowRecord {
    pub timestamp_us: u64,
    pub identity: Uuid,
}

impl RowRecord {
    pub fn new(timestamp_us: u64, identity: Uuid) -> Self {
        Self {
            timestamp_us,
            identity,
        }
    }
}

/// Store-side scan collaborator. The executor owns fan-out and merging;
/// the service owns actually reading the column family.
///
/// `scan` returns a boxed future so implementations stay object-safe and
/// the executor can hold `Arc<dyn ScanService>`.
pub trait ScanService: Send + Sync {
    fn scan(&self, leaf: LeafScanSpec) -> BoxFuture<'static, ScanResult<Vec<RowRecord>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_time_then_identity() {
        let a = RowRecord::new(10, Uuid::from_u128(5));
        let b = RowRecord::new(10, Uuid::from_u128(9));
        let c = RowRecord::new(11, Uuid::from_u128(1));
        assert!(a < b);
        assert!(b < c);
    }
}
