use soroban_sdk::contracterror;

/// Error codes surfaced by every fallible entry point.
///
/// Discriminants are part of the contract ABI; append new variants, never
/// renumber.
#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    // Unknown entity
    StreamNotFound = 1,
    PoolNotFound = 2,

    // Authorization
    Unauthorized = 3,

    // Invalid parameters
    InvalidAddress = 4,
    InvalidWindow = 5,
    InvalidRate = 6,
    InvalidAmount = 7,
    InvalidEnd = 8,
    InvalidTokenDecimals = 9,

    // Insufficient funds
    InsufficientBalance = 10,
    InsufficientRedeemable = 11,
    ExceedsDebt = 12,

    // Invalid state transition
    StreamActive = 13,
    StreamInactive = 14,
    WindowClosed = 15,
    PayerInDebt = 16,
    OutstandingBalance = 17,

    Overflow = 18,

    // Ledger invariant
    RateUnderflow = 19,
}
