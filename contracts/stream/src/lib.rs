#![no_std]

mod access;
mod amount;
mod claim;
mod debt;
mod error;
mod events;
mod pool;
mod projection;
mod storage;
mod stream;

use core::cmp;

use soroban_sdk::{contract, contractimpl, contracttype, log, token, Address, Env, String};

use crate::amount::Scale;

pub use crate::error::ContractError;
pub use crate::events::{StreamCreated, StreamEvent, StreamModified, StreamState};
pub use crate::pool::TokenPool;
pub use crate::projection::Withdrawable;
pub use crate::storage::Config;
pub use crate::stream::{Settlement, SettlementCase, Stream, StreamBalances};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Full set of stream creation parameters, including the optional reason and
/// withheld rate.
#[contracttype]
#[derive(Clone, Debug)]
pub struct CreateStreamParams {
    pub token: Address,
    pub recipient: Address,
    pub amount_per_sec: i128,
    pub withheld_per_sec: i128,
    pub starts: u64,
    pub ends: u64,
    pub reason: Option<String>,
}

/// A stream and its pool after both have been settled to the current time.
struct Settled {
    stream: Stream,
    pool: TokenPool,
    balances: StreamBalances,
}

// ---------------------------------------------------------------------------
// Internal Helpers
// ---------------------------------------------------------------------------

impl PooledStream {
    fn require_owner(env: &Env) -> Address {
        let owner = storage::get_owner(env);
        owner.require_auth();
        owner
    }

    /// Owner or payer-whitelisted delegate.
    fn require_payer(env: &Env, caller: &Address) -> Result<(), ContractError> {
        caller.require_auth();
        if *caller == storage::get_owner(env) || access::is_payer_whitelisted(env, caller) {
            Ok(())
        } else {
            Err(ContractError::Unauthorized)
        }
    }

    /// Current claim holder, which must be `caller`.
    fn require_holder(
        env: &Env,
        caller: &Address,
        stream_id: u64,
    ) -> Result<Address, ContractError> {
        caller.require_auth();
        let holder = claim::owner_of(env, stream_id)?;
        if holder != *caller {
            return Err(ContractError::Unauthorized);
        }
        Ok(holder)
    }

    /// Claim holder, payer, or a delegate the holder whitelisted. Returns the
    /// holder.
    fn require_withdrawer(
        env: &Env,
        caller: &Address,
        stream_id: u64,
    ) -> Result<Address, ContractError> {
        caller.require_auth();
        let holder = claim::owner_of(env, stream_id)?;
        if *caller == holder
            || *caller == storage::get_owner(env)
            || access::is_stream_whitelisted(env, stream_id, &holder, caller)
        {
            Ok(holder)
        } else {
            Err(ContractError::Unauthorized)
        }
    }

    fn settle_pool(env: &Env, pool: &mut TokenPool, now: u64) -> Result<(), ContractError> {
        pool.settle(now)?;
        if pool.is_behind(now) {
            log!(env, "pool behind ledger time", pool.clock, now, pool.balance);
        }
        Ok(())
    }

    /// Load the token's pool, creating it on first touch, and settle it.
    fn open_pool(env: &Env, token: &Address, now: u64) -> Result<TokenPool, ContractError> {
        let mut pool = match storage::try_load_pool(env, token) {
            Some(pool) => pool,
            None => {
                let decimals = token::Client::new(env, token).decimals();
                TokenPool::new(env, Scale::from_decimals(decimals)?, now)
            }
        };
        Self::settle_pool(env, &mut pool, now)?;
        Ok(pool)
    }

    /// Settle the stream's pool, then the stream against the pool's new clock.
    fn settle(env: &Env, stream_id: u64, now: u64) -> Result<Settled, ContractError> {
        let mut stream = storage::load_stream(env, stream_id)?;
        let mut pool = storage::load_pool(env, &stream.token)?;
        let mut balances = storage::load_balances(env, stream_id);

        Self::settle_pool(env, &mut pool, now)?;
        stream.settle(pool.clock, &mut balances)?;

        Ok(Settled {
            stream,
            pool,
            balances,
        })
    }

    fn state_of(settled: &Settled) -> StreamState {
        StreamState {
            stream_id: settled.stream.stream_id,
            redeemable: settled.balances.redeemable,
            debt: settled.balances.debt,
            withheld: settled.balances.withheld,
            total_rate: settled.pool.total_rate,
        }
    }

    fn commit(env: &Env, settled: &Settled) {
        storage::save_pool(env, &settled.stream.token, &settled.pool);
        storage::save_stream(env, &settled.stream);
        storage::save_balances(env, settled.stream.stream_id, &settled.balances);
    }

    /// Checkpoint debt for the unfunded gap, if asked to.
    fn checkpoint(
        env: &Env,
        settled: &mut Settled,
        record_debt: bool,
        now: u64,
    ) -> Result<(), ContractError> {
        if !record_debt {
            return Ok(());
        }
        let recorded =
            debt::record(&settled.stream, &settled.pool, &mut settled.balances, now)?;
        if recorded > 0 {
            log!(env, "debt recorded", settled.stream.stream_id, recorded);
            events::debt_recorded(env, settled.stream.stream_id, recorded);
        }
        Ok(())
    }

    fn pay_out(env: &Env, token: &Address, to: &Address, raw: i128) {
        if raw > 0 {
            token::Client::new(env, token).transfer(&env.current_contract_address(), to, &raw);
        }
    }

    fn validate_stream_params(
        env: &Env,
        params: &CreateStreamParams,
    ) -> Result<(), ContractError> {
        if params.amount_per_sec <= 0 || params.withheld_per_sec < 0 {
            return Err(ContractError::InvalidRate);
        }
        if params.starts >= params.ends {
            return Err(ContractError::InvalidWindow);
        }
        if params.recipient == env.current_contract_address() {
            return Err(ContractError::InvalidAddress);
        }
        Ok(())
    }

    fn open_stream(
        env: &Env,
        caller: &Address,
        params: CreateStreamParams,
    ) -> Result<u64, ContractError> {
        Self::require_payer(env, caller)?;
        Self::validate_stream_params(env, &params)?;

        let now = env.ledger().timestamp();
        let mut pool = Self::open_pool(env, &params.token, now)?;
        if pool.is_behind(now) {
            return Err(ContractError::PayerInDebt);
        }

        let stream_id = storage::next_stream_id(env);
        let mut stream = Stream {
            stream_id,
            token: params.token.clone(),
            amount_per_sec: params.amount_per_sec,
            withheld_per_sec: params.withheld_per_sec,
            starts: params.starts,
            ends: params.ends,
            accrues_from: params.starts,
            settled_up_to: None,
        };
        let mut balances = StreamBalances::default();

        // Part of the window already behind us is owed immediately; whatever
        // the pool cannot cover becomes debt. Withheld accrual is only taken
        // from what is left after the payee.
        let owed_until = cmp::min(now, params.ends);
        if owed_until > params.starts {
            let secs = owed_until - params.starts;
            let owed = amount::streamed(secs, params.amount_per_sec)?;
            let covered = cmp::min(owed, pool.balance);
            pool.debit(covered)?;
            balances.redeemable = covered;
            balances.debt = owed - covered;

            let withheld = cmp::min(
                amount::streamed(secs, params.withheld_per_sec)?,
                pool.balance,
            );
            pool.debit(withheld)?;
            balances.withheld = withheld;
        }

        if params.ends > now {
            stream.restart(now, now);
            stream.join_pool(&mut pool)?;
        }

        storage::save_pool(env, &params.token, &pool);
        storage::save_stream(env, &stream);
        storage::save_balances(env, stream_id, &balances);
        claim::mint(env, stream_id, &params.recipient);

        events::created(
            env,
            stream_id,
            StreamCreated {
                token: params.token,
                recipient: params.recipient,
                amount_per_sec: params.amount_per_sec,
                withheld_per_sec: params.withheld_per_sec,
                starts: params.starts,
                ends: params.ends,
                redeemable: balances.redeemable,
                debt: balances.debt,
                reason: params.reason,
            },
        );

        Ok(stream_id)
    }

    /// Settle, debit `amount` (everything when `None`) from the stream's
    /// redeemable and send it to `to`. State is persisted before the transfer.
    fn pay_stream(
        env: &Env,
        stream_id: u64,
        amount: Option<i128>,
        to: &Address,
    ) -> Result<i128, ContractError> {
        if matches!(amount, Some(a) if a <= 0) {
            return Err(ContractError::InvalidAmount);
        }
        let now = env.ledger().timestamp();
        let mut settled = Self::settle(env, stream_id, now)?;

        // Withdrawing everything leaves sub-unit dust in place.
        let amount = amount
            .unwrap_or_else(|| settled.pool.scale().truncate(settled.balances.redeemable));
        if amount > settled.balances.redeemable {
            return Err(ContractError::InsufficientRedeemable);
        }
        settled.balances.redeemable -= amount;
        Self::commit(env, &settled);

        if amount == 0 {
            return Ok(0);
        }
        let raw = settled.pool.scale().denormalize(amount);
        Self::pay_out(env, &settled.stream.token, to, raw);
        events::withdrew(env, stream_id, to, amount, raw);
        Ok(raw)
    }
}

// ---------------------------------------------------------------------------
// Contract Implementation
// ---------------------------------------------------------------------------

#[contract]
pub struct PooledStream;

#[contractimpl]
impl PooledStream {
    /// Initialise the contract for a single payer.
    ///
    /// # Panics
    /// - If called more than once (contract already initialised)
    pub fn init(env: Env, owner: Address) {
        if storage::has_config(&env) {
            panic!("already initialised");
        }
        storage::set_config(&env, &Config { owner });
    }

    pub fn get_config(env: Env) -> Config {
        storage::get_config(&env)
    }

    // -- Pool funding -------------------------------------------------------

    /// Fund the payer's pool for `token`.
    ///
    /// Anyone may fund on the payer's behalf. The first deposit of a token
    /// fixes its scale from the token's `decimals()`.
    ///
    /// # Parameters
    /// - `from`: Address the tokens are pulled from (must authorize)
    /// - `amount`: Raw token units, must be positive
    ///
    /// # Errors
    /// - `InvalidAmount` for a non-positive amount
    /// - `InvalidTokenDecimals` if the token has more than 20 decimals
    pub fn deposit(
        env: Env,
        from: Address,
        token: Address,
        amount: i128,
    ) -> Result<(), ContractError> {
        from.require_auth();
        if amount <= 0 {
            return Err(ContractError::InvalidAmount);
        }

        let now = env.ledger().timestamp();
        let mut pool = Self::open_pool(&env, &token, now)?;
        pool.credit(pool.scale().normalize(amount)?)?;

        // If the transfer fails the whole call is rolled back.
        token::Client::new(&env, &token).transfer(&from, &env.current_contract_address(), &amount);

        storage::save_pool(&env, &token, &pool);
        events::deposited(&env, &token, &from, amount, pool.balance);
        Ok(())
    }

    /// Withdraw raw `amount` of unstreamed balance back to the payer, or to
    /// `to` when given.
    ///
    /// The pool is settled first, so funds already streamed to active
    /// streams can never be taken back.
    ///
    /// # Errors
    /// - `InvalidAmount` for a non-positive amount
    /// - `PoolNotFound` if the token was never funded
    /// - `InsufficientBalance` if the settled balance does not cover `amount`
    pub fn withdraw_payer(
        env: Env,
        token: Address,
        amount: i128,
        to: Option<Address>,
    ) -> Result<(), ContractError> {
        let owner = Self::require_owner(&env);
        if amount <= 0 {
            return Err(ContractError::InvalidAmount);
        }

        let now = env.ledger().timestamp();
        let mut pool = storage::load_pool(&env, &token)?;
        Self::settle_pool(&env, &mut pool, now)?;
        pool.debit(pool.scale().normalize(amount)?)?;
        storage::save_pool(&env, &token, &pool);

        let to = to.unwrap_or(owner);
        Self::pay_out(&env, &token, &to, amount);
        events::payer_withdrew(&env, &token, &to, amount, pool.balance);
        Ok(())
    }

    /// Withdraw every whole raw unit of the settled pool balance. Returns the
    /// raw amount sent.
    pub fn withdraw_payer_all(
        env: Env,
        token: Address,
        to: Option<Address>,
    ) -> Result<i128, ContractError> {
        let owner = Self::require_owner(&env);

        let now = env.ledger().timestamp();
        let mut pool = storage::load_pool(&env, &token)?;
        Self::settle_pool(&env, &mut pool, now)?;
        let scale = pool.scale();
        let raw = scale.denormalize(pool.balance);
        pool.debit(scale.truncate(pool.balance))?;
        storage::save_pool(&env, &token, &pool);

        let to = to.unwrap_or(owner);
        Self::pay_out(&env, &token, &to, raw);
        events::payer_withdrew(&env, &token, &to, raw, pool.balance);
        Ok(raw)
    }

    // -- Stream lifecycle ---------------------------------------------------

    /// Create a stream paying `amount_per_sec` (normalized units) to
    /// `recipient` over `[starts, ends)`, funded from the payer's pool for
    /// `token`. Mints the claim to `recipient` and returns its id.
    ///
    /// # Authorization
    /// - `caller` must be the payer or payer-whitelisted
    ///
    /// # Behaviour
    /// - `starts` in the past: the elapsed part of the window is owed at
    ///   once, paid from the pool balance into the stream's redeemable, with
    ///   any shortfall recorded as debt
    /// - `ends` in the past: the stream is created already finished, owing
    ///   the whole window, and never joins the pool's rate sum
    /// - otherwise the stream's draw is scheduled on the pool from `starts`
    ///   (or now, if later) until `ends`
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` may not act as payer
    /// - `InvalidRate` if `amount_per_sec` is not positive
    /// - `InvalidWindow` if `starts >= ends`
    /// - `InvalidAddress` if `recipient` is this contract
    /// - `PayerInDebt` if the pool cannot fund every second up to now
    pub fn create_stream(
        env: Env,
        caller: Address,
        token: Address,
        recipient: Address,
        amount_per_sec: i128,
        starts: u64,
        ends: u64,
    ) -> Result<u64, ContractError> {
        Self::open_stream(
            &env,
            &caller,
            CreateStreamParams {
                token,
                recipient,
                amount_per_sec,
                withheld_per_sec: 0,
                starts,
                ends,
                reason: None,
            },
        )
    }

    /// `create_stream` with a withheld rate and an indexer-visible reason.
    ///
    /// The withheld rate is drawn from the pool alongside `amount_per_sec`
    /// but accrues to the stream's withheld ledger, which only the payer can
    /// release.
    pub fn create_stream_with(
        env: Env,
        caller: Address,
        params: CreateStreamParams,
    ) -> Result<u64, ContractError> {
        Self::open_stream(&env, &caller, params)
    }

    /// Change a running stream's rate and end.
    ///
    /// The stream is settled at its old rate first. If the pool is behind and
    /// `record_debt` is set, the unfunded gap at the old rate becomes debt;
    /// without it the payee forfeits the gap. Accrual restarts at the new
    /// rate from now.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` may not act as payer
    /// - `InvalidRate` if `new_amount_per_sec` is not positive
    /// - `StreamInactive` if the stream is stopped or finished
    /// - `InvalidEnd` if `new_ends` is not after both now and the window start
    pub fn modify_stream(
        env: Env,
        caller: Address,
        stream_id: u64,
        new_amount_per_sec: i128,
        new_ends: u64,
        record_debt: bool,
    ) -> Result<(), ContractError> {
        Self::require_payer(&env, &caller)?;
        if new_amount_per_sec <= 0 {
            return Err(ContractError::InvalidRate);
        }

        let now = env.ledger().timestamp();
        let mut settled = Self::settle(&env, stream_id, now)?;
        if !settled.stream.is_active() {
            return Err(ContractError::StreamInactive);
        }
        if new_ends <= cmp::max(now, settled.stream.starts) {
            return Err(ContractError::InvalidEnd);
        }

        Self::checkpoint(&env, &mut settled, record_debt, now)?;

        let old = settled.stream.clone();
        old.leave_pool(&mut settled.pool)?;
        settled.stream.amount_per_sec = new_amount_per_sec;
        settled.stream.ends = new_ends;
        settled.stream.restart(settled.pool.clock, now);
        settled.stream.join_pool(&mut settled.pool)?;

        Self::commit(&env, &settled);
        events::modified(
            &env,
            stream_id,
            StreamModified {
                old_amount_per_sec: old.amount_per_sec,
                new_amount_per_sec,
                old_ends: old.ends,
                new_ends,
                redeemable: settled.balances.redeemable,
                debt: settled.balances.debt,
                total_rate: settled.pool.total_rate,
            },
        );
        Ok(())
    }

    /// Stop an active stream. It keeps its redeemable and debt and can be
    /// resumed before its window closes.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` may not act as payer
    /// - `StreamInactive` if the stream is already stopped or finished
    pub fn stop_stream(
        env: Env,
        caller: Address,
        stream_id: u64,
        record_debt: bool,
    ) -> Result<(), ContractError> {
        Self::require_payer(&env, &caller)?;

        let now = env.ledger().timestamp();
        let mut settled = Self::settle(&env, stream_id, now)?;
        if !settled.stream.is_active() {
            return Err(ContractError::StreamInactive);
        }

        Self::checkpoint(&env, &mut settled, record_debt, now)?;
        settled.stream.leave_pool(&mut settled.pool)?;
        settled.stream.settled_up_to = None;

        Self::commit(&env, &settled);
        events::stopped(&env, Self::state_of(&settled));
        Ok(())
    }

    /// Resume a stopped stream from now.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` may not act as payer
    /// - `StreamActive` if the stream is running
    /// - `WindowClosed` if the stream's window has ended
    /// - `PayerInDebt` if the pool cannot fund every second up to now
    pub fn resume_stream(env: Env, caller: Address, stream_id: u64) -> Result<(), ContractError> {
        Self::require_payer(&env, &caller)?;

        let now = env.ledger().timestamp();
        let mut settled = Self::settle(&env, stream_id, now)?;
        if settled.stream.is_active() {
            return Err(ContractError::StreamActive);
        }
        if now >= settled.stream.ends {
            return Err(ContractError::WindowClosed);
        }
        if settled.pool.is_behind(now) {
            return Err(ContractError::PayerInDebt);
        }

        settled.stream.restart(settled.pool.clock, now);
        settled.stream.join_pool(&mut settled.pool)?;

        Self::commit(&env, &settled);
        events::resumed(&env, Self::state_of(&settled));
        Ok(())
    }

    /// Destroy a finished stream and its claim.
    ///
    /// Unreleased withheld amounts return to the pool balance.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` holds the claim
    /// - `StreamActive` if the stream is still running
    /// - `OutstandingBalance` while redeemable or debt is non-zero
    pub fn burn_stream(env: Env, caller: Address, stream_id: u64) -> Result<(), ContractError> {
        Self::require_holder(&env, &caller, stream_id)?;

        let now = env.ledger().timestamp();
        let mut settled = Self::settle(&env, stream_id, now)?;
        if settled.stream.is_active() {
            return Err(ContractError::StreamActive);
        }
        if settled.balances.redeemable != 0 || settled.balances.debt != 0 {
            return Err(ContractError::OutstandingBalance);
        }

        settled.pool.credit(settled.balances.withheld)?;
        storage::save_pool(&env, &settled.stream.token, &settled.pool);
        storage::remove_stream(&env, stream_id);
        claim::burn(&env, stream_id);

        events::burned(&env, stream_id);
        Ok(())
    }

    /// Settle the token's pool without touching any stream.
    pub fn update_token(env: Env, token: Address) -> Result<TokenPool, ContractError> {
        let now = env.ledger().timestamp();
        let mut pool = storage::load_pool(&env, &token)?;
        Self::settle_pool(&env, &mut pool, now)?;
        storage::save_pool(&env, &token, &pool);
        events::pool_settled(&env, &token, &pool);
        Ok(pool)
    }

    /// Settle a stream (and its pool) to now. Calling it twice at the same
    /// ledger time changes nothing the second time.
    pub fn update_stream(env: Env, stream_id: u64) -> Result<StreamBalances, ContractError> {
        let now = env.ledger().timestamp();
        let settled = Self::settle(&env, stream_id, now)?;
        Self::commit(&env, &settled);
        events::settled(&env, settled.pool.clock, Self::state_of(&settled));
        Ok(settled.balances)
    }

    // -- Payee withdrawals --------------------------------------------------

    /// Withdraw `amount` (normalized units) of the stream's redeemable to the
    /// claim holder, or to the holder's redirect address if one is set.
    /// Returns the raw token amount sent.
    ///
    /// # Authorization
    /// - `caller` must be the claim holder, the payer, or whitelisted by the
    ///   holder for this stream
    ///
    /// # Errors
    /// - `StreamNotFound` if the claim does not exist
    /// - `Unauthorized` if `caller` may not withdraw
    /// - `InvalidAmount` for a non-positive amount
    /// - `InsufficientRedeemable` if `amount` exceeds the settled redeemable
    pub fn withdraw(
        env: Env,
        caller: Address,
        stream_id: u64,
        amount: i128,
    ) -> Result<i128, ContractError> {
        let holder = Self::require_withdrawer(&env, &caller, stream_id)?;
        let to = access::redirect_of(&env, stream_id).unwrap_or(holder);
        Self::pay_stream(&env, stream_id, Some(amount), &to)
    }

    /// Withdraw every whole raw unit of the settled redeemable. Returns 0
    /// without a transfer when there is nothing to withdraw.
    pub fn withdraw_all(env: Env, caller: Address, stream_id: u64) -> Result<i128, ContractError> {
        let holder = Self::require_withdrawer(&env, &caller, stream_id)?;
        let to = access::redirect_of(&env, stream_id).unwrap_or(holder);
        Self::pay_stream(&env, stream_id, None, &to)
    }

    /// Claim holder withdraws `amount` to an explicit destination, bypassing
    /// any stored redirect.
    pub fn withdraw_to(
        env: Env,
        caller: Address,
        stream_id: u64,
        amount: i128,
        to: Address,
    ) -> Result<i128, ContractError> {
        Self::require_holder(&env, &caller, stream_id)?;
        Self::pay_stream(&env, stream_id, Some(amount), &to)
    }

    /// Payer releases every whole raw unit of the stream's withheld
    /// accrual. Returns the raw amount sent; sub-unit dust stays withheld.
    pub fn withdraw_withheld(
        env: Env,
        stream_id: u64,
        to: Option<Address>,
    ) -> Result<i128, ContractError> {
        let owner = Self::require_owner(&env);

        let now = env.ledger().timestamp();
        let mut settled = Self::settle(&env, stream_id, now)?;
        let scale = settled.pool.scale();
        let amount = scale.truncate(settled.balances.withheld);
        if amount == 0 {
            return Ok(0);
        }
        settled.balances.withheld -= amount;
        Self::commit(&env, &settled);

        let to = to.unwrap_or(owner);
        let raw = scale.denormalize(amount);
        Self::pay_out(&env, &settled.stream.token, &to, raw);
        events::withheld_released(&env, stream_id, &to, raw);
        Ok(raw)
    }

    // -- Debt -----------------------------------------------------------------

    /// Pay `amount` of the stream's debt out of the pool balance into its
    /// redeemable.
    ///
    /// # Errors
    /// - `InvalidAmount` for a non-positive amount
    /// - `ExceedsDebt` if `amount` is more than the recorded debt
    /// - `InsufficientBalance` if the settled pool balance cannot cover it
    pub fn repay_debt(env: Env, stream_id: u64, amount: i128) -> Result<(), ContractError> {
        let now = env.ledger().timestamp();
        let mut settled = Self::settle(&env, stream_id, now)?;
        debt::repay(&mut settled.pool, &mut settled.balances, amount)?;
        Self::commit(&env, &settled);
        events::repaid(&env, stream_id, amount, settled.balances.debt);
        Ok(())
    }

    /// Repay as much debt as the pool balance covers. Returns the amount
    /// repaid; any remainder stays recorded.
    pub fn repay_all_debt(env: Env, stream_id: u64) -> Result<i128, ContractError> {
        let now = env.ledger().timestamp();
        let mut settled = Self::settle(&env, stream_id, now)?;
        let repaid = debt::repay_all(&mut settled.pool, &mut settled.balances)?;
        Self::commit(&env, &settled);
        if repaid > 0 {
            events::repaid(&env, stream_id, repaid, settled.balances.debt);
        }
        Ok(repaid)
    }

    // -- Access control -------------------------------------------------------

    pub fn add_payer_whitelist(env: Env, who: Address) -> Result<(), ContractError> {
        let owner = Self::require_owner(&env);
        if who == owner {
            return Err(ContractError::InvalidAddress);
        }
        access::add_payer_whitelist(&env, &who);
        events::payer_whitelist_changed(&env, &who, true);
        Ok(())
    }

    pub fn remove_payer_whitelist(env: Env, who: Address) {
        Self::require_owner(&env);
        access::remove_payer_whitelist(&env, &who);
        events::payer_whitelist_changed(&env, &who, false);
    }

    pub fn is_payer_whitelisted(env: Env, who: Address) -> bool {
        access::is_payer_whitelisted(&env, &who)
    }

    /// Send future withdrawals of this stream to `to` instead of the holder.
    pub fn add_redirect_stream(
        env: Env,
        caller: Address,
        stream_id: u64,
        to: Address,
    ) -> Result<(), ContractError> {
        let holder = Self::require_holder(&env, &caller, stream_id)?;
        if to == holder {
            return Err(ContractError::InvalidAddress);
        }
        access::set_redirect(&env, stream_id, &to);
        events::redirect_changed(&env, stream_id, Some(to));
        Ok(())
    }

    pub fn remove_redirect_stream(
        env: Env,
        caller: Address,
        stream_id: u64,
    ) -> Result<(), ContractError> {
        Self::require_holder(&env, &caller, stream_id)?;
        access::remove_redirect(&env, stream_id);
        events::redirect_changed(&env, stream_id, None);
        Ok(())
    }

    pub fn redirect_of(env: Env, stream_id: u64) -> Option<Address> {
        access::redirect_of(&env, stream_id)
    }

    /// Let `who` withdraw on the holder's behalf for as long as the holder
    /// keeps the claim.
    pub fn add_stream_whitelist(
        env: Env,
        caller: Address,
        stream_id: u64,
        who: Address,
    ) -> Result<(), ContractError> {
        let holder = Self::require_holder(&env, &caller, stream_id)?;
        if who == holder {
            return Err(ContractError::InvalidAddress);
        }
        access::add_stream_whitelist(&env, stream_id, &holder, &who);
        events::stream_whitelist_changed(&env, stream_id, &who, true);
        Ok(())
    }

    pub fn remove_stream_whitelist(
        env: Env,
        caller: Address,
        stream_id: u64,
        who: Address,
    ) -> Result<(), ContractError> {
        Self::require_holder(&env, &caller, stream_id)?;
        access::remove_stream_whitelist(&env, stream_id, &who);
        events::stream_whitelist_changed(&env, stream_id, &who, false);
        Ok(())
    }

    pub fn is_stream_whitelisted(env: Env, stream_id: u64, who: Address) -> bool {
        match claim::owner_of(&env, stream_id) {
            Ok(holder) => access::is_stream_whitelisted(&env, stream_id, &holder, &who),
            Err(_) => false,
        }
    }

    // -- Claims ---------------------------------------------------------------

    pub fn owner_of(env: Env, stream_id: u64) -> Result<Address, ContractError> {
        claim::owner_of(&env, stream_id)
    }

    /// Transfer the claim. The stream's redirect is cleared and the previous
    /// holder's whitelist stops applying.
    pub fn transfer_claim(
        env: Env,
        from: Address,
        to: Address,
        stream_id: u64,
    ) -> Result<(), ContractError> {
        from.require_auth();
        claim::transfer(&env, stream_id, &from, &to)?;
        events::claim_transferred(&env, stream_id, &from, &to);
        Ok(())
    }

    // -- Views ----------------------------------------------------------------

    /// Preview the stream at the current ledger time without writing state.
    ///
    /// Returns the pool's virtual clock, the debt a stop checkpoint would
    /// leave recorded right now, and the amount withdrawable after
    /// settlement (normalized units).
    pub fn withdrawable(env: Env, stream_id: u64) -> Result<Withdrawable, ContractError> {
        let stream = storage::load_stream(&env, stream_id)?;
        let pool = storage::load_pool(&env, &stream.token)?;
        let balances = storage::load_balances(&env, stream_id);
        projection::project(&pool, &stream, &balances, env.ledger().timestamp())
    }

    pub fn get_stream(env: Env, stream_id: u64) -> Result<Stream, ContractError> {
        storage::load_stream(&env, stream_id)
    }

    pub fn get_token_pool(env: Env, token: Address) -> Result<TokenPool, ContractError> {
        storage::load_pool(&env, &token)
    }

    /// Stored balances, as of the stream's last settlement.
    pub fn get_balances(env: Env, stream_id: u64) -> Result<StreamBalances, ContractError> {
        storage::load_stream(&env, stream_id)?;
        Ok(storage::load_balances(&env, stream_id))
    }

    pub fn redeemable(env: Env, stream_id: u64) -> Result<i128, ContractError> {
        Ok(Self::get_balances(env, stream_id)?.redeemable)
    }

    pub fn debt(env: Env, stream_id: u64) -> Result<i128, ContractError> {
        Ok(Self::get_balances(env, stream_id)?.debt)
    }
}
