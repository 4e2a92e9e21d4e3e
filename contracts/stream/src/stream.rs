use core::cmp;

use soroban_sdk::{contracttype, Address};

use crate::amount;
use crate::error::ContractError;
use crate::pool::TokenPool;

/// One issued claim's payment schedule.
///
/// `settled_up_to` is the pool clock this stream was last reconciled
/// against, or `None` while the stream is stopped or finished.
/// `accrues_from` is the instant before which the stream earns nothing:
/// `starts` at creation, moved forward when the stream is resumed or
/// re-rated.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stream {
    pub stream_id: u64,
    pub token: Address,
    pub amount_per_sec: i128,
    pub withheld_per_sec: i128,
    pub starts: u64,
    pub ends: u64,
    pub accrues_from: u64,
    pub settled_up_to: Option<u64>,
}

/// Per-stream ledgers, in normalized units.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StreamBalances {
    /// Settled and withdrawable by the claim holder.
    pub redeemable: i128,
    /// Promised at a checkpoint but not covered by the pool.
    pub debt: i128,
    /// Accrued at the withheld rate, releasable by the payer only.
    pub withheld: i128,
}

/// Where a stream stands relative to its pool's clock.
///
/// Variants are listed, and evaluated, in priority order: a stream whose
/// whole window has passed without it ever having started must be handled
/// before the generic "ended" case or the start-to-end window would be
/// credited twice.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SettlementCase {
    /// Stopped or finished; nothing moves.
    Inactive,
    /// Window opened and closed since the last settlement.
    ExpiredBeforeStart,
    /// Window opened since the last settlement and is still open.
    Started,
    /// Window closed since the last settlement.
    Ended,
    /// Window not open yet at the pool clock.
    Pending,
    /// Window open at both the last settlement and the pool clock.
    Running,
}

/// Value moved by one settlement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Settlement {
    pub case: SettlementCase,
    /// Added to `redeemable`.
    pub credited: i128,
    /// Added to `withheld`.
    pub withheld: i128,
}

impl Settlement {
    fn idle(case: SettlementCase) -> Self {
        Settlement {
            case,
            credited: 0,
            withheld: 0,
        }
    }
}

impl Stream {
    pub fn is_active(&self) -> bool {
        self.settled_up_to.is_some()
    }

    /// Rate the stream draws from its pool.
    pub fn pool_rate(&self) -> Result<i128, ContractError> {
        amount::checked_add(self.amount_per_sec, self.withheld_per_sec)
    }

    pub fn classify(&self, clock: u64) -> SettlementCase {
        match self.settled_up_to {
            None => SettlementCase::Inactive,
            Some(settled) => self.classify_active(settled, clock),
        }
    }

    fn classify_active(&self, settled: u64, clock: u64) -> SettlementCase {
        let start = self.accrues_from;
        if start > settled && clock >= self.ends {
            SettlementCase::ExpiredBeforeStart
        } else if clock >= start && start > settled {
            SettlementCase::Started
        } else if clock >= self.ends {
            SettlementCase::Ended
        } else if start > clock {
            SettlementCase::Pending
        } else {
            SettlementCase::Running
        }
    }

    /// Reconcile the stream against a pool clock the pool has already
    /// settled to.
    ///
    /// The pool only pays for seconds inside `[accrues_from, ends)`, so the
    /// seconds credited here are exactly the ones it paid for. A stream
    /// whose window has closed is deactivated; its draw already left the
    /// pool when the clock crossed `ends`.
    pub fn settle(
        &mut self,
        clock: u64,
        balances: &mut StreamBalances,
    ) -> Result<Settlement, ContractError> {
        let Some(settled) = self.settled_up_to else {
            return Ok(Settlement::idle(SettlementCase::Inactive));
        };
        let start = self.accrues_from;
        let ends = self.ends;

        let case = self.classify_active(settled, clock);
        let (credit_secs, stays_active) = match case {
            SettlementCase::Inactive => return Ok(Settlement::idle(case)),
            SettlementCase::ExpiredBeforeStart => (ends - start, false),
            SettlementCase::Started => (clock - start, true),
            SettlementCase::Ended => (ends - settled, false),
            SettlementCase::Pending => (0, true),
            SettlementCase::Running => (clock - settled, true),
        };

        let settlement = Settlement {
            case,
            credited: amount::streamed(credit_secs, self.amount_per_sec)?,
            withheld: amount::streamed(credit_secs, self.withheld_per_sec)?,
        };
        balances.redeemable = amount::checked_add(balances.redeemable, settlement.credited)?;
        balances.withheld = amount::checked_add(balances.withheld, settlement.withheld)?;

        self.settled_up_to = if stays_active { Some(clock) } else { None };
        Ok(settlement)
    }

    /// Re-open accrual at `now` against a pool whose clock reads `clock`.
    pub fn restart(&mut self, clock: u64, now: u64) {
        self.settled_up_to = Some(clock);
        self.accrues_from = cmp::max(self.starts, now);
    }

    /// Register the stream's draw on `pool` from `accrues_from` to `ends`.
    pub fn join_pool(&self, pool: &mut TokenPool) -> Result<(), ContractError> {
        pool.join(self.accrues_from, self.ends, self.pool_rate()?)
    }

    /// Withdraw whatever part of the stream's draw the pool has not yet paid.
    pub fn leave_pool(&self, pool: &mut TokenPool) -> Result<(), ContractError> {
        pool.leave(self.accrues_from, self.ends, self.pool_rate()?)
    }
}
