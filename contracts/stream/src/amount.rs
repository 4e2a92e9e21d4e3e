//! Fixed-point helpers for normalized ledger amounts.
//!
//! Every token amount inside the ledger carries 20 fractional digits,
//! whatever the token's native precision. A token with `d` decimals is
//! normalized by multiplying raw units by `10^(20 - d)`; leaving the ledger
//! divides by the same factor and truncates toward zero.

use crate::error::ContractError;

/// Fractional digits of every normalized amount.
pub const PRECISION_DECIMALS: u32 = 20;

/// Per-token conversion factor between raw token units and ledger units.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Scale(i128);

impl Scale {
    /// Derive the factor from a token's `decimals()`.
    pub fn from_decimals(decimals: u32) -> Result<Self, ContractError> {
        if decimals > PRECISION_DECIMALS {
            return Err(ContractError::InvalidTokenDecimals);
        }
        10i128
            .checked_pow(PRECISION_DECIMALS - decimals)
            .map(Scale)
            .ok_or(ContractError::Overflow)
    }

    /// Rebuild a factor previously stored in a pool record.
    pub fn from_stored(factor: i128) -> Self {
        Scale(factor)
    }

    pub fn factor(self) -> i128 {
        self.0
    }

    /// Raw token units -> ledger units.
    pub fn normalize(self, raw: i128) -> Result<i128, ContractError> {
        raw.checked_mul(self.0).ok_or(ContractError::Overflow)
    }

    /// Ledger units -> raw token units, floor.
    pub fn denormalize(self, amount: i128) -> i128 {
        amount / self.0
    }

    /// Largest multiple of the factor not above `amount`: the part of a ledger
    /// amount that survives a round trip out of the contract.
    pub fn truncate(self, amount: i128) -> i128 {
        amount - amount % self.0
    }
}

/// `seconds × rate`, the value a stream (or a pool's rate sum) streams over
/// an interval.
pub fn streamed(seconds: u64, rate: i128) -> Result<i128, ContractError> {
    rate.checked_mul(seconds as i128).ok_or(ContractError::Overflow)
}

pub fn checked_add(a: i128, b: i128) -> Result<i128, ContractError> {
    a.checked_add(b).ok_or(ContractError::Overflow)
}

pub fn checked_sub(a: i128, b: i128) -> Result<i128, ContractError> {
    a.checked_sub(b).ok_or(ContractError::Overflow)
}
