//! trailing-window apy from redemption-rate snapshots
//!
//! the latest snapshot is compared against an anchor at least
//! [`ANCHOR_LOOKBACK_SECS`] old (or the oldest one available) and the
//! change is extrapolated linearly to a year. sparse or noisy series can
//! produce absurd values over short windows, so the result is clamped to
//! ±[`APY_CLAMP`].

use crate::fixed::{clamp_to_i128, format_units, WAD};
use crate::snapshot::{normalize, RateSnapshot, SnapshotSource};
use crate::{Result, ANCHOR_LOOKBACK_SECS, APY_CLAMP, SECONDS_PER_YEAR};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// which rate the annualized change is divided by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Denominator {
    /// return relative to the anchor rate; rendered as a percentage
    #[default]
    Anchor,
    /// return relative to the latest rate; rendered as a ratio
    Latest,
}

/// annualized yield over a snapshot window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApyEstimate {
    /// signed, wad-scaled (0.08e18 = 8%), |apy_scaled| <= APY_CLAMP
    pub apy_scaled: i128,
    /// percentage for `Anchor`, plain ratio for `Latest`
    pub apy_string: String,
    /// seconds between anchor and latest snapshot
    pub window_seconds: u64,
    pub denominator: Denominator,
}

impl ApyEstimate {
    /// "8" for 8%
    pub fn percent_string(&self) -> String {
        format_units(self.apy_scaled * 100, 18)
    }

    /// "0.08" for 8%
    pub fn ratio_string(&self) -> String {
        format_units(self.apy_scaled, 18)
    }

    /// lossy, for display and charting only
    pub fn as_f64(&self) -> f64 {
        self.apy_scaled as f64 / WAD as f64
    }
}

/// pick `(latest, anchor)` out of a snapshot series.
///
/// `None` when there are fewer than two snapshots or both ends share a
/// timestamp.
pub fn select_window(snapshots: &[RateSnapshot], now: u64) -> Option<(RateSnapshot, RateSnapshot)> {
    if snapshots.len() < 2 {
        return None;
    }

    let mut sorted = snapshots.to_vec();
    normalize(&mut sorted);

    let latest = sorted[0];
    let cutoff = now.saturating_sub(ANCHOR_LOOKBACK_SECS);

    // newest first, so the first one at or before the cutoff is the
    // closest to it; otherwise fall back to the oldest we have
    let anchor = sorted
        .iter()
        .find(|s| s.timestamp <= cutoff)
        .or_else(|| sorted.last())
        .copied()?;

    if anchor.timestamp == latest.timestamp {
        return None;
    }
    Some((latest, anchor))
}

/// annualized yield over the trailing window ending at the latest snapshot.
///
/// `now` defaults to the wall clock. returns `None` rather than an error
/// for any series that cannot define a window: empty, single snapshot,
/// zero anchor rate, or a non-positive elapsed time.
pub fn estimate_apy(
    snapshots: &[RateSnapshot],
    now: Option<u64>,
    denominator: Denominator,
) -> Option<ApyEstimate> {
    let now = now.unwrap_or_else(unix_now);
    let (latest, anchor) = select_window(snapshots, now)?;

    if anchor.rate == 0 || latest.timestamp <= anchor.timestamp {
        return None;
    }

    let elapsed = latest.timestamp - anchor.timestamp;
    let r0 = BigInt::from(anchor.rate);
    let r1 = BigInt::from(latest.rate);
    let wad = BigInt::from(WAD);
    let year = BigInt::from(SECONDS_PER_YEAR);
    let window = BigInt::from(elapsed);
    let delta = &r1 - &r0;

    let raw = match denominator {
        Denominator::Anchor => {
            let simple_return = delta * &wad / &r0;
            simple_return * year / window
        }
        Denominator::Latest => {
            // r1 > 0 is implied unless the vault was wiped out
            if latest.rate == 0 {
                return None;
            }
            let per_second = delta * &wad / window;
            per_second * year / &r1
        }
    };

    let apy_scaled = clamp_to_i128(&raw, APY_CLAMP);
    let apy_string = match denominator {
        Denominator::Anchor => format_units(apy_scaled * 100, 18),
        Denominator::Latest => format_units(apy_scaled, 18),
    };

    Some(ApyEstimate {
        apy_scaled,
        apy_string,
        window_seconds: elapsed,
        denominator,
    })
}

/// [`estimate_apy`] over whatever a snapshot source has for a share token
pub fn estimate_from_source<S: SnapshotSource + ?Sized>(
    source: &S,
    share_token: &str,
    now: Option<u64>,
    denominator: Denominator,
) -> Result<Option<ApyEstimate>> {
    let snapshots = source.snapshots(share_token)?;
    Ok(estimate_apy(&snapshots, now, denominator))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T0: u64 = 1_700_000_000;

    fn pair(r0: u128, r1: u128, elapsed: u64) -> Vec<RateSnapshot> {
        vec![RateSnapshot::new(r0, T0), RateSnapshot::new(r1, T0 + elapsed)]
    }

    #[test]
    fn test_one_year_eight_percent() {
        let snaps = pair(WAD, 108 * WAD / 100, SECONDS_PER_YEAR);
        let now = Some(T0 + SECONDS_PER_YEAR);

        let anchor = estimate_apy(&snaps, now, Denominator::Anchor).unwrap();
        assert_eq!(anchor.apy_scaled, 8 * WAD as i128 / 100);
        assert_eq!(anchor.apy_string, "8");
        assert_eq!(anchor.ratio_string(), "0.08");
        assert_eq!(anchor.window_seconds, SECONDS_PER_YEAR);

        // relative to the latest rate the same change is 0.08 / 1.08
        let latest = estimate_apy(&snaps, now, Denominator::Latest).unwrap();
        assert!((latest.as_f64() - 0.08 / 1.08).abs() < 1e-9);
        assert!(latest.apy_string.starts_with("0.0740740"));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(estimate_apy(&[], Some(T0), Denominator::Anchor).is_none());
        assert!(estimate_apy(&[RateSnapshot::new(WAD, T0)], Some(T0), Denominator::Anchor).is_none());

        // same timestamp on both ends
        let same = vec![RateSnapshot::new(WAD, T0), RateSnapshot::new(2 * WAD, T0)];
        assert!(estimate_apy(&same, Some(T0), Denominator::Anchor).is_none());
        assert!(estimate_apy(&same, Some(T0), Denominator::Latest).is_none());

        // zero anchor rate
        let zero = pair(0, WAD, 3600);
        assert!(estimate_apy(&zero, Some(T0 + 3600), Denominator::Anchor).is_none());
    }

    #[test]
    fn test_zero_change_is_exactly_zero() {
        let snaps = pair(WAD, WAD, 86_400);
        for denominator in [Denominator::Anchor, Denominator::Latest] {
            let apy = estimate_apy(&snaps, Some(T0 + 86_400), denominator).unwrap();
            assert_eq!(apy.apy_scaled, 0);
            assert_eq!(apy.apy_string, "0");
        }
    }

    #[test]
    fn test_sign_follows_rate_direction() {
        let up = estimate_apy(&pair(WAD, WAD + WAD / 1000, 86_400), Some(T0), Denominator::Anchor).unwrap();
        assert!(up.apy_scaled > 0);

        let down = estimate_apy(&pair(WAD, WAD - WAD / 1000, 86_400), Some(T0), Denominator::Anchor).unwrap();
        assert!(down.apy_scaled < 0);
        assert!(down.apy_string.starts_with('-'));
    }

    #[test]
    fn test_clamped_at_bound() {
        // 1e12x in an hour
        let up = estimate_apy(&pair(WAD, WAD * 1_000_000_000_000, 3600), Some(T0 + 3600), Denominator::Anchor).unwrap();
        assert_eq!(up.apy_scaled, APY_CLAMP);
        assert_eq!(up.apy_string, "100000");

        // total loss in an hour annualizes far below -100000%
        let down = estimate_apy(&pair(WAD, 1, 3600), Some(T0 + 3600), Denominator::Anchor).unwrap();
        assert_eq!(down.apy_scaled, -APY_CLAMP);

        let latest = estimate_apy(&pair(1, WAD, 3600), Some(T0 + 3600), Denominator::Latest).unwrap();
        assert_eq!(latest.apy_scaled, APY_CLAMP);
    }

    #[test]
    fn test_anchor_prefers_snapshot_before_cutoff() {
        let day = 86_400;
        let now = T0 + 10 * day;
        let snaps = vec![
            RateSnapshot::new(WAD, T0),                          // 10 days old
            RateSnapshot::new(WAD + WAD / 100, T0 + 6 * day),    // 4 days old, newest before cutoff
            RateSnapshot::new(WAD + 2 * WAD / 100, T0 + 9 * day), // 1 day old
            RateSnapshot::new(WAD + 3 * WAD / 100, now),
        ];

        let (latest, anchor) = select_window(&snaps, now).unwrap();
        assert_eq!(latest.timestamp, now);
        assert_eq!(anchor.timestamp, T0 + 6 * day);

        let apy = estimate_apy(&snaps, Some(now), Denominator::Anchor).unwrap();
        assert_eq!(apy.window_seconds, 4 * day);
    }

    #[test]
    fn test_anchor_falls_back_to_oldest() {
        let now = T0 + 3600;
        let snaps = vec![
            RateSnapshot::new(WAD, T0 + 1800),
            RateSnapshot::new(WAD, T0),
            RateSnapshot::new(WAD, now),
        ];
        let (_, anchor) = select_window(&snaps, now).unwrap();
        assert_eq!(anchor.timestamp, T0);
    }

    #[test]
    fn test_from_source() {
        let snaps = pair(WAD, 108 * WAD / 100, SECONDS_PER_YEAR);
        let apy = estimate_from_source(&snaps, "0xshare", Some(T0 + SECONDS_PER_YEAR), Denominator::Anchor)
            .unwrap()
            .unwrap();
        assert_eq!(apy.apy_string, "8");
    }

    fn snapshot_strategy() -> impl Strategy<Value = RateSnapshot> {
        (1u128..=10 * WAD, T0..T0 + 30 * 86_400).prop_map(|(rate, ts)| RateSnapshot::new(rate, ts))
    }

    proptest! {
        #[test]
        fn prop_order_invariant(snaps in prop::collection::vec(snapshot_strategy(), 0..12), now_offset in 0u64..40 * 86_400) {
            let now = Some(T0 + now_offset);
            let mut reversed = snaps.clone();
            reversed.reverse();
            for denominator in [Denominator::Anchor, Denominator::Latest] {
                prop_assert_eq!(
                    estimate_apy(&snaps, now, denominator),
                    estimate_apy(&reversed, now, denominator)
                );
            }
        }

        #[test]
        fn prop_always_within_clamp(snaps in prop::collection::vec(snapshot_strategy(), 0..12)) {
            for denominator in [Denominator::Anchor, Denominator::Latest] {
                if let Some(apy) = estimate_apy(&snaps, Some(T0), denominator) {
                    prop_assert!(apy.apy_scaled.abs() <= APY_CLAMP);
                    prop_assert!(apy.window_seconds > 0);
                }
            }
        }
    }
}
