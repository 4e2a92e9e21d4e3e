use core::cmp;

use soroban_sdk::{contracttype, Env, Map};

use crate::amount::{self, Scale};
use crate::error::ContractError;

/// The payer's pooled balance for one token.
///
/// `clock` is the instant up to which `balance` has already paid every
/// accruing stream on the token. It never passes the ledger time; when it
/// trails it, the payer is in debt to every stream sharing the pool.
///
/// `total_rate` is the draw at `clock`. Streams whose window opens or
/// closes later register the change in `rate_changes`, keyed by the instant
/// it takes effect, so the pool only ever pays for seconds a stream earns.
/// Every key is strictly after `clock`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenPool {
    pub balance: i128,
    pub total_rate: i128,
    pub scale: i128,
    pub clock: u64,
    pub rate_changes: Map<u64, i128>,
}

impl TokenPool {
    pub fn new(env: &Env, scale: Scale, now: u64) -> Self {
        TokenPool {
            balance: 0,
            total_rate: 0,
            scale: scale.factor(),
            clock: now,
            rate_changes: Map::new(env),
        }
    }

    pub fn scale(&self) -> Scale {
        Scale::from_stored(self.scale)
    }

    /// True while the pool has not been able to fund every second up to `now`.
    pub fn is_behind(&self, now: u64) -> bool {
        self.clock < now
    }

    /// Advance `clock` toward `now` by as much as `balance` can fund.
    ///
    /// Scheduled rate changes are applied as the clock reaches them. A
    /// shortfall advances the clock by whole seconds only and keeps the
    /// sub-second remainder in `balance` for the next top-up.
    pub fn settle(&mut self, now: u64) -> Result<(), ContractError> {
        while self.clock < now {
            let next = self
                .rate_changes
                .iter()
                .next()
                .filter(|(at, _)| *at <= now);
            let until = next.as_ref().map_or(now, |(at, _)| *at);
            if !self.fund_until(until) {
                return Ok(());
            }
            if let Some((at, delta)) = next {
                self.apply_rate_change(delta)?;
                self.rate_changes.remove(at);
            }
        }
        Ok(())
    }

    /// Pay `total_rate` from `clock` to `until`. Returns false when the
    /// balance ran out first.
    fn fund_until(&mut self, until: u64) -> bool {
        if self.total_rate == 0 {
            self.clock = until;
            return true;
        }

        let elapsed = until - self.clock;
        match amount::streamed(elapsed, self.total_rate) {
            Ok(owed) if self.balance >= owed => {
                self.balance -= owed;
                self.clock = until;
                true
            }
            // Overflowing `owed` is unaffordable by definition.
            _ => {
                let funded_secs = self.balance / self.total_rate;
                self.clock += funded_secs as u64;
                self.balance %= self.total_rate;
                false
            }
        }
    }

    pub fn credit(&mut self, amount: i128) -> Result<(), ContractError> {
        self.balance = amount::checked_add(self.balance, amount)?;
        Ok(())
    }

    pub fn debit(&mut self, amount: i128) -> Result<(), ContractError> {
        if amount > self.balance {
            return Err(ContractError::InsufficientBalance);
        }
        self.balance -= amount;
        Ok(())
    }

    /// Draw `rate` over `[from, until)`, clipped to what is still ahead of
    /// the clock.
    pub fn join(&mut self, from: u64, until: u64, rate: i128) -> Result<(), ContractError> {
        if until <= self.clock {
            return Ok(());
        }
        self.shift_rate(cmp::max(from, self.clock), rate)?;
        self.shift_rate(until, -rate)
    }

    /// Undo the part of a `join` over `[from, until)` that lies ahead of the
    /// clock.
    pub fn leave(&mut self, from: u64, until: u64, rate: i128) -> Result<(), ContractError> {
        if until <= self.clock {
            return Ok(());
        }
        self.shift_rate(cmp::max(from, self.clock), -rate)?;
        self.shift_rate(until, rate)
    }

    fn shift_rate(&mut self, at: u64, delta: i128) -> Result<(), ContractError> {
        if at <= self.clock {
            return self.apply_rate_change(delta);
        }
        let pending = self.rate_changes.get(at).unwrap_or(0);
        let pending = amount::checked_add(pending, delta)?;
        if pending == 0 {
            self.rate_changes.remove(at);
        } else {
            self.rate_changes.set(at, pending);
        }
        Ok(())
    }

    fn apply_rate_change(&mut self, delta: i128) -> Result<(), ContractError> {
        let total_rate = amount::checked_add(self.total_rate, delta)?;
        if total_rate < 0 {
            return Err(ContractError::RateUnderflow);
        }
        self.total_rate = total_rate;
        Ok(())
    }
}
