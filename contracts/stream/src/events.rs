//! Events for off-chain indexers.
//!
//! Topics are `(name, key)` where the key is the stream id or the token /
//! account the event concerns. Amounts are normalized unless named `raw`.

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

use crate::pool::TokenPool;

/// A stream's settled amounts and its pool's draw right after a change.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamState {
    pub stream_id: u64,
    pub redeemable: i128,
    pub debt: i128,
    pub withheld: i128,
    /// Pool rate sum at the pool clock.
    pub total_rate: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreamEvent {
    Stopped(StreamState),
    Resumed(StreamState),
    Burned(u64),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamCreated {
    pub token: Address,
    pub recipient: Address,
    pub amount_per_sec: i128,
    pub withheld_per_sec: i128,
    pub starts: u64,
    pub ends: u64,
    /// Owed at creation for a window that opened in the past and was covered.
    pub redeemable: i128,
    /// Owed at creation but not covered by the pool.
    pub debt: i128,
    pub reason: Option<String>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamModified {
    pub old_amount_per_sec: i128,
    pub new_amount_per_sec: i128,
    pub old_ends: u64,
    pub new_ends: u64,
    pub redeemable: i128,
    pub debt: i128,
    pub total_rate: i128,
}

pub fn deposited(env: &Env, token: &Address, from: &Address, raw: i128, balance: i128) {
    env.events().publish(
        (symbol_short!("deposit"), token.clone()),
        (from.clone(), raw, balance),
    );
}

pub fn payer_withdrew(env: &Env, token: &Address, to: &Address, raw: i128, balance: i128) {
    env.events().publish(
        (symbol_short!("pay_wd"), token.clone()),
        (to.clone(), raw, balance),
    );
}

pub fn created(env: &Env, stream_id: u64, data: StreamCreated) {
    env.events()
        .publish((symbol_short!("created"), stream_id), data);
}

pub fn modified(env: &Env, stream_id: u64, data: StreamModified) {
    env.events()
        .publish((symbol_short!("modified"), stream_id), data);
}

pub fn debt_recorded(env: &Env, stream_id: u64, amount: i128) {
    env.events()
        .publish((symbol_short!("debt"), stream_id), amount);
}

pub fn stopped(env: &Env, state: StreamState) {
    env.events().publish(
        (symbol_short!("stopped"), state.stream_id),
        StreamEvent::Stopped(state),
    );
}

pub fn resumed(env: &Env, state: StreamState) {
    env.events().publish(
        (symbol_short!("resumed"), state.stream_id),
        StreamEvent::Resumed(state),
    );
}

pub fn settled(env: &Env, clock: u64, state: StreamState) {
    env.events()
        .publish((symbol_short!("settled"), state.stream_id), (clock, state));
}

pub fn pool_settled(env: &Env, token: &Address, pool: &TokenPool) {
    env.events().publish(
        (symbol_short!("pool_upd"), token.clone()),
        (pool.clock, pool.balance, pool.total_rate),
    );
}

pub fn burned(env: &Env, stream_id: u64) {
    env.events().publish(
        (symbol_short!("burned"), stream_id),
        StreamEvent::Burned(stream_id),
    );
}

pub fn withdrew(env: &Env, stream_id: u64, to: &Address, amount: i128, raw: i128) {
    env.events().publish(
        (symbol_short!("withdrew"), stream_id),
        (to.clone(), amount, raw),
    );
}

pub fn repaid(env: &Env, stream_id: u64, amount: i128, debt_left: i128) {
    env.events()
        .publish((symbol_short!("repaid"), stream_id), (amount, debt_left));
}

pub fn withheld_released(env: &Env, stream_id: u64, to: &Address, raw: i128) {
    env.events()
        .publish((symbol_short!("withheld"), stream_id), (to.clone(), raw));
}

pub fn claim_transferred(env: &Env, stream_id: u64, from: &Address, to: &Address) {
    env.events().publish(
        (symbol_short!("claim_tx"), stream_id),
        (from.clone(), to.clone()),
    );
}

pub fn payer_whitelist_changed(env: &Env, who: &Address, allowed: bool) {
    env.events()
        .publish((symbol_short!("payer_wl"), who.clone()), allowed);
}

pub fn stream_whitelist_changed(env: &Env, stream_id: u64, who: &Address, allowed: bool) {
    env.events().publish(
        (symbol_short!("stream_wl"), stream_id),
        (who.clone(), allowed),
    );
}

pub fn redirect_changed(env: &Env, stream_id: u64, to: Option<Address>) {
    env.events()
        .publish((symbol_short!("redirect"), stream_id), to);
}
