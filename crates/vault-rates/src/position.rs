//! position valuation
//!
//! callers only rely on the [`PositionValuator`] contract: pure,
//! deterministic, unrealized p&l may go negative, every output in the
//! asset's own decimals. [`RateValuator`] is the default plug-in.

use crate::fixed::{pow10, saturate_i128, saturate_u128, WAD};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// a wallet's holding in one vault, as recorded by deposit/withdraw events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// share-token smallest unit
    pub share_balance: u128,
    /// asset cost of the shares still held, 18-decimal normalized
    pub cost_basis: u128,
    /// p&l already booked by withdrawals, 18-decimal normalized
    pub realized_pnl: i128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionInput {
    pub share_balance: u128,
    pub cost_basis: u128,
    pub realized_pnl: i128,
    /// assets per share, wad
    pub rate: u128,
    pub asset_decimals: u8,
}

impl PositionInput {
    pub fn new(position: &Position, rate: u128, asset_decimals: u8) -> Self {
        Self {
            share_balance: position.share_balance,
            cost_basis: position.cost_basis,
            realized_pnl: position.realized_pnl,
            rate,
            asset_decimals,
        }
    }
}

/// valuation in asset units (asset decimals)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionValue {
    pub underlying_value: u128,
    pub unrealized_pnl: i128,
    pub cost_basis: u128,
    pub total_pnl: i128,
}

pub trait PositionValuator {
    fn value(&self, input: &PositionInput) -> PositionValue;
}

/// marks shares at the current rate against the recorded cost basis
#[derive(Debug, Clone, Copy, Default)]
pub struct RateValuator;

impl PositionValuator for RateValuator {
    fn value(&self, input: &PositionInput) -> PositionValue {
        let underlying = BigInt::from(input.share_balance) * BigInt::from(input.rate) / BigInt::from(WAD);
        let cost = BigInt::from(input.cost_basis);
        let unrealized = &underlying - &cost;

        let underlying = to_asset_units(underlying, input.asset_decimals);
        let cost = to_asset_units(cost, input.asset_decimals);
        let unrealized = to_asset_units(unrealized, input.asset_decimals);
        let realized = to_asset_units(BigInt::from(input.realized_pnl), input.asset_decimals);
        let total = &realized + &unrealized;

        PositionValue {
            underlying_value: saturate_u128(&underlying),
            unrealized_pnl: saturate_i128(&unrealized),
            cost_basis: saturate_u128(&cost),
            total_pnl: saturate_i128(&total),
        }
    }
}

/// rescale an 18-decimal amount to `decimals`, truncating toward zero
fn to_asset_units(value: BigInt, decimals: u8) -> BigInt {
    let decimals = decimals as u32;
    if decimals < 18 {
        value / pow10(18 - decimals)
    } else {
        value * pow10(decimals - 18)
    }
}
