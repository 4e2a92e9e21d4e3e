use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::error::ContractError;
use crate::pool::TokenPool;
use crate::stream::{Stream, StreamBalances};

// Entries are bumped to the extend-to horizon whenever their remaining TTL
// drops below the threshold.
pub const TTL_THRESHOLD: u32 = 17_280;
pub const TTL_EXTEND_TO: u32 = 120_960;

/// Contract configuration, written once by `init`.
#[contracttype]
#[derive(Clone, Debug)]
pub struct Config {
    /// The payer funding every stream of this contract.
    pub owner: Address,
}

/// Namespace for all contract storage keys.
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,                        // Instance: owner.
    NextStreamId,                  // Instance: auto-incrementing id counter.
    Pool(Address),                 // Persistent: TokenPool per funding token.
    Stream(u64),                   // Persistent: Stream per claim id.
    Balances(u64),                 // Persistent: redeemable / debt / withheld per claim id.
    ClaimOwner(u64),               // Persistent: current claim holder.
    PayerWhitelist(Address),       // Persistent: may act as payer.
    Redirect(u64),                 // Persistent: withdrawal destination override.
    StreamWhitelist(u64, Address), // Persistent: may withdraw for the holder.
    StreamDelegates(u64),          // Persistent: every address with a StreamWhitelist entry.
}

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> Config {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .expect("contract not initialised: missing config")
}

pub fn set_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
    env.storage().instance().set(&DataKey::NextStreamId, &0u64);
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn get_owner(env: &Env) -> Address {
    get_config(env).owner
}

/// Hand out the next stream id.
pub fn next_stream_id(env: &Env) -> u64 {
    let id: u64 = env
        .storage()
        .instance()
        .get(&DataKey::NextStreamId)
        .unwrap_or(0u64);
    env.storage().instance().set(&DataKey::NextStreamId, &(id + 1));
    id
}

pub fn load_pool(env: &Env, token: &Address) -> Result<TokenPool, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Pool(token.clone()))
        .ok_or(ContractError::PoolNotFound)
}

pub fn try_load_pool(env: &Env, token: &Address) -> Option<TokenPool> {
    env.storage().persistent().get(&DataKey::Pool(token.clone()))
}

pub fn save_pool(env: &Env, token: &Address, pool: &TokenPool) {
    persist(env, &DataKey::Pool(token.clone()), pool);
}

pub fn load_stream(env: &Env, stream_id: u64) -> Result<Stream, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Stream(stream_id))
        .ok_or(ContractError::StreamNotFound)
}

pub fn save_stream(env: &Env, stream: &Stream) {
    persist(env, &DataKey::Stream(stream.stream_id), stream);
}

pub fn load_balances(env: &Env, stream_id: u64) -> StreamBalances {
    env.storage()
        .persistent()
        .get(&DataKey::Balances(stream_id))
        .unwrap_or_default()
}

pub fn save_balances(env: &Env, stream_id: u64, balances: &StreamBalances) {
    persist(env, &DataKey::Balances(stream_id), balances);
}

pub fn load_delegates(env: &Env, stream_id: u64) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::StreamDelegates(stream_id))
        .unwrap_or_else(|| Vec::new(env))
}

pub fn save_delegates(env: &Env, stream_id: u64, delegates: &Vec<Address>) {
    let key = DataKey::StreamDelegates(stream_id);
    if delegates.is_empty() {
        env.storage().persistent().remove(&key);
    } else {
        persist(env, &key, delegates);
    }
}

/// Drop every record keyed by the stream id.
pub fn remove_stream(env: &Env, stream_id: u64) {
    let storage = env.storage().persistent();
    for who in load_delegates(env, stream_id).iter() {
        storage.remove(&DataKey::StreamWhitelist(stream_id, who));
    }
    storage.remove(&DataKey::StreamDelegates(stream_id));
    storage.remove(&DataKey::Stream(stream_id));
    storage.remove(&DataKey::Balances(stream_id));
    storage.remove(&DataKey::Redirect(stream_id));
}

pub fn persist<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    env.storage()
        .persistent()
        .extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
}
