use soroban_sdk::contracttype;

use crate::amount;
use crate::debt;
use crate::error::ContractError;
use crate::pool::TokenPool;
use crate::stream::{Stream, StreamBalances};

/// Read-only preview of a stream at the current ledger time.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdrawable {
    /// Pool clock after settlement; trails `now` while the payer is in debt.
    pub last_update: u64,
    /// Recorded debt plus what a stop checkpoint would record right now.
    pub debt: i128,
    /// Redeemable after settlement, in normalized units.
    pub withdrawable_amount: i128,
}

/// Run pool and stream settlement on copies of the stored records.
///
/// The mutating paths use the very same functions, so the preview at a
/// given instant is what a settling call at that instant produces.
pub fn project(
    pool: &TokenPool,
    stream: &Stream,
    balances: &StreamBalances,
    now: u64,
) -> Result<Withdrawable, ContractError> {
    let mut pool = pool.clone();
    let mut stream = stream.clone();
    let mut balances = balances.clone();

    pool.settle(now)?;
    stream.settle(pool.clock, &mut balances)?;
    let pending = debt::unfunded_gap(&stream, &pool, now)?;

    Ok(Withdrawable {
        last_update: pool.clock,
        debt: amount::checked_add(balances.debt, pending)?,
        withdrawable_amount: balances.redeemable,
    })
}
