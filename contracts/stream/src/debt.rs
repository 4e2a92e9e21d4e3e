//! Debt bookkeeping.
//!
//! Debt never accrues on its own. It is written only at an explicit
//! checkpoint (stopping or re-rating a stream) for the part of the stream's
//! window the pool has not been able to fund, and drained by repayment
//! against whatever balance the pool holds at that moment.

use core::cmp;

use crate::amount;
use crate::error::ContractError;
use crate::pool::TokenPool;
use crate::stream::{Stream, StreamBalances};

/// Payee amount the pool owes `stream` for the interval between the pool
/// clock and `now`, clipped to the stream's accrual window.
///
/// Both records must already be settled to `now`.
pub fn unfunded_gap(stream: &Stream, pool: &TokenPool, now: u64) -> Result<i128, ContractError> {
    if !stream.is_active() || !pool.is_behind(now) {
        return Ok(0);
    }
    let from = cmp::max(pool.clock, stream.accrues_from);
    let to = cmp::min(now, stream.ends);
    if to <= from {
        return Ok(0);
    }
    amount::streamed(to - from, stream.amount_per_sec)
}

/// Checkpoint: add the current unfunded gap to the stream's debt.
pub fn record(
    stream: &Stream,
    pool: &TokenPool,
    balances: &mut StreamBalances,
    now: u64,
) -> Result<i128, ContractError> {
    let gap = unfunded_gap(stream, pool, now)?;
    balances.debt = amount::checked_add(balances.debt, gap)?;
    Ok(gap)
}

/// Move `amount` from the pool balance to the stream's redeemable, clearing
/// as much debt.
pub fn repay(
    pool: &mut TokenPool,
    balances: &mut StreamBalances,
    amount: i128,
) -> Result<(), ContractError> {
    if amount <= 0 {
        return Err(ContractError::InvalidAmount);
    }
    if amount > balances.debt {
        return Err(ContractError::ExceedsDebt);
    }
    pool.debit(amount)?;
    balances.debt -= amount;
    balances.redeemable = amount::checked_add(balances.redeemable, amount)?;
    Ok(())
}

/// Repay as much debt as the pool balance covers. Returns the amount repaid.
pub fn repay_all(
    pool: &mut TokenPool,
    balances: &mut StreamBalances,
) -> Result<i128, ContractError> {
    let amount = cmp::min(balances.debt, pool.balance);
    if amount > 0 {
        repay(pool, balances, amount)?;
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::{testutils::Address as _, Address, Env, Map};

    fn running(env: &Env, settled: u64, accrues_from: u64, ends: u64) -> Stream {
        Stream {
            stream_id: 0,
            token: Address::generate(env),
            amount_per_sec: 4,
            withheld_per_sec: 1,
            starts: 0,
            ends,
            accrues_from,
            settled_up_to: Some(settled),
        }
    }

    fn pool(env: &Env, balance: i128, clock: u64) -> TokenPool {
        TokenPool {
            balance,
            total_rate: 5,
            scale: 1,
            clock,
            rate_changes: Map::new(env),
        }
    }

    #[test]
    fn gap_is_rate_times_lag() {
        let env = Env::default();
        let s = running(&env, 40, 0, 1_000);
        assert_eq!(unfunded_gap(&s, &pool(&env, 0, 40), 100), Ok(60 * 4));
    }

    #[test]
    fn gap_is_zero_when_pool_is_current() {
        let env = Env::default();
        let s = running(&env, 100, 0, 1_000);
        assert_eq!(unfunded_gap(&s, &pool(&env, 0, 100), 100), Ok(0));
    }

    #[test]
    fn gap_is_clipped_to_window() {
        let env = Env::default();
        // window closes at 80, accrual starts at 60
        let s = running(&env, 40, 60, 80);
        assert_eq!(unfunded_gap(&s, &pool(&env, 0, 40), 100), Ok(20 * 4));

        let not_started = running(&env, 40, 200, 300);
        assert_eq!(unfunded_gap(&not_started, &pool(&env, 0, 40), 100), Ok(0));
    }

    #[test]
    fn record_accumulates() {
        let env = Env::default();
        let s = running(&env, 40, 0, 1_000);
        let p = pool(&env, 0, 40);
        let mut b = StreamBalances {
            redeemable: 0,
            debt: 8,
            withheld: 0,
        };
        assert_eq!(record(&s, &p, &mut b, 50), Ok(40));
        assert_eq!(b.debt, 48);
    }

    #[test]
    fn repay_moves_balance_to_redeemable() {
        let env = Env::default();
        let mut p = pool(&env, 100, 0);
        let mut b = StreamBalances {
            redeemable: 5,
            debt: 60,
            withheld: 0,
        };

        repay(&mut p, &mut b, 40).unwrap();

        assert_eq!(p.balance, 60);
        assert_eq!(b.debt, 20);
        assert_eq!(b.redeemable, 45);
    }

    #[test]
    fn repay_rejects_more_than_debt_or_balance() {
        let env = Env::default();
        let mut p = pool(&env, 10, 0);
        let mut b = StreamBalances {
            redeemable: 0,
            debt: 20,
            withheld: 0,
        };
        assert_eq!(repay(&mut p, &mut b, 21), Err(ContractError::ExceedsDebt));
        assert_eq!(
            repay(&mut p, &mut b, 15),
            Err(ContractError::InsufficientBalance)
        );
        assert_eq!(repay(&mut p, &mut b, 0), Err(ContractError::InvalidAmount));
    }

    #[test]
    fn repay_all_is_bounded_by_balance() {
        let env = Env::default();
        let mut p = pool(&env, 10, 0);
        let mut b = StreamBalances {
            redeemable: 0,
            debt: 25,
            withheld: 0,
        };

        assert_eq!(repay_all(&mut p, &mut b), Ok(10));
        assert_eq!(b.debt, 15);
        assert_eq!(b.redeemable, 10);
        assert_eq!(p.balance, 0);

        assert_eq!(repay_all(&mut p, &mut b), Ok(0));
    }
}
