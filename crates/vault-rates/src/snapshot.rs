//! redemption-rate snapshots as produced by the indexer

use crate::fixed::decimal_u128;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// a vault's redemption rate (assets per share, wad) at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateSnapshot {
    #[serde(with = "decimal_u128")]
    pub rate: u128,
    /// unix seconds
    pub timestamp: u64,
}

impl RateSnapshot {
    pub fn new(rate: u128, timestamp: u64) -> Self {
        Self { rate, timestamp }
    }
}

/// where snapshots come from (subgraph, cache, fixtures)
pub trait SnapshotSource {
    /// snapshots for a vault share token, in any order
    fn snapshots(&self, share_token: &str) -> Result<Vec<RateSnapshot>>;
}

/// a fixed set of snapshots, regardless of share token
impl SnapshotSource for [RateSnapshot] {
    fn snapshots(&self, _share_token: &str) -> Result<Vec<RateSnapshot>> {
        Ok(self.to_vec())
    }
}

impl SnapshotSource for Vec<RateSnapshot> {
    fn snapshots(&self, share_token: &str) -> Result<Vec<RateSnapshot>> {
        self.as_slice().snapshots(share_token)
    }
}

/// sort newest first. equal timestamps are ordered by rate so the result
/// does not depend on the order the producer handed them over in.
pub fn normalize(snapshots: &mut [RateSnapshot]) {
    snapshots.sort_unstable_by_key(|s| (Reverse(s.timestamp), Reverse(s.rate)));
}

/// parse a json array of `{ "rate": "<decimal>", "timestamp": <secs> }`
pub fn parse_snapshots_json(json: &str) -> Result<Vec<RateSnapshot>> {
    let snapshots: Vec<RateSnapshot> = serde_json::from_str(json)?;
    if let Some(bad) = snapshots.iter().find(|s| s.timestamp == 0) {
        return Err(Error::InvalidSnapshot(format!(
            "snapshot with rate {} has no timestamp",
            bad.rate
        )));
    }
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_newest_first() {
        let mut snaps = vec![
            RateSnapshot::new(1, 10),
            RateSnapshot::new(3, 30),
            RateSnapshot::new(2, 20),
        ];
        normalize(&mut snaps);
        let ts: Vec<u64> = snaps.iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![30, 20, 10]);
    }

    #[test]
    fn test_normalize_ties_are_stable_across_input_order() {
        let mut a = vec![RateSnapshot::new(5, 10), RateSnapshot::new(7, 10)];
        let mut b = vec![RateSnapshot::new(7, 10), RateSnapshot::new(5, 10)];
        normalize(&mut a);
        normalize(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"[
            {"rate": "1000000000000000000", "timestamp": 1700000000},
            {"rate": 5, "timestamp": 1700000100}
        ]"#;
        let snaps = parse_snapshots_json(json).unwrap();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].rate, 1_000_000_000_000_000_000);
        assert_eq!(snaps[1].rate, 5);
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        assert!(parse_snapshots_json(r#"[{"rate": "abc", "timestamp": 1}]"#).is_err());
        assert!(parse_snapshots_json(r#"[{"rate": "1", "timestamp": 0}]"#).is_err());
    }

    #[test]
    fn test_slice_source() {
        let snaps = vec![RateSnapshot::new(1, 1)];
        assert_eq!(snaps.snapshots("0xshare").unwrap(), snaps);
    }
}
