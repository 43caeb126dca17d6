//! # vault-rates
//!
//! estimates derived from a vault's on-chain redemption rate (assets per share).
//!
//! - [`apy`]: annualized yield from a series of rate snapshots, linear
//!   extrapolation over a trailing window
//! - [`position`]: pluggable valuation of a share position into p&l figures
//! - [`fixed`]: 1e18 fixed-point helpers shared by both
//!
//! all arithmetic is integer. rates, cost basis and yields are carried at
//! 18 decimals (wad) and only rendered to strings at the edge.
//!
//! ```rust
//! use vault_rates::{estimate_apy, Denominator, RateSnapshot, WAD};
//!
//! let snapshots = [
//!     RateSnapshot::new(WAD, 1_000),
//!     RateSnapshot::new(108 * WAD / 100, 1_000 + 31_536_000),
//! ];
//! let apy = estimate_apy(&snapshots, Some(1_000 + 31_536_000), Denominator::Anchor).unwrap();
//! assert_eq!(apy.apy_string, "8");
//! ```

pub mod apy;
pub mod error;
pub mod fixed;
pub mod position;
pub mod snapshot;

pub use apy::{estimate_apy, estimate_from_source, select_window, ApyEstimate, Denominator};
pub use error::{Error, Result};
pub use fixed::{format_unsigned_units, format_units, SECONDS_PER_YEAR, WAD};
pub use position::{Position, PositionInput, PositionValuator, PositionValue, RateValuator};
pub use snapshot::{normalize, parse_snapshots_json, RateSnapshot, SnapshotSource};

/// trailing window the anchor snapshot must be older than
pub const ANCHOR_LOOKBACK_SECS: u64 = 3 * 24 * 60 * 60;

/// magnitude bound on a wad-scaled apy (±100000%)
pub const APY_CLAMP: i128 = 1_000_000_000_000_000_000_000;
