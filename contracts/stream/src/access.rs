//! Whitelists and redirects consulted by the ledger.
//!
//! Stream whitelist entries remember the holder that granted them and only
//! count while that holder still owns the claim, so a claim transfer revokes
//! every delegate at once.

use soroban_sdk::{Address, Env};

use crate::storage::{self, persist, DataKey};

pub fn is_payer_whitelisted(env: &Env, who: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::PayerWhitelist(who.clone()))
        .unwrap_or(false)
}

pub fn add_payer_whitelist(env: &Env, who: &Address) {
    persist(env, &DataKey::PayerWhitelist(who.clone()), &true);
}

pub fn remove_payer_whitelist(env: &Env, who: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::PayerWhitelist(who.clone()));
}

pub fn redirect_of(env: &Env, stream_id: u64) -> Option<Address> {
    env.storage().persistent().get(&DataKey::Redirect(stream_id))
}

pub fn set_redirect(env: &Env, stream_id: u64, to: &Address) {
    persist(env, &DataKey::Redirect(stream_id), to);
}

pub fn remove_redirect(env: &Env, stream_id: u64) {
    env.storage().persistent().remove(&DataKey::Redirect(stream_id));
}

pub fn is_stream_whitelisted(env: &Env, stream_id: u64, holder: &Address, who: &Address) -> bool {
    let granted_by: Option<Address> = env
        .storage()
        .persistent()
        .get(&DataKey::StreamWhitelist(stream_id, who.clone()));
    granted_by.as_ref() == Some(holder)
}

pub fn add_stream_whitelist(env: &Env, stream_id: u64, holder: &Address, who: &Address) {
    persist(env, &DataKey::StreamWhitelist(stream_id, who.clone()), holder);
    let mut delegates = storage::load_delegates(env, stream_id);
    if !delegates.contains(who) {
        delegates.push_back(who.clone());
        storage::save_delegates(env, stream_id, &delegates);
    }
}

pub fn remove_stream_whitelist(env: &Env, stream_id: u64, who: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::StreamWhitelist(stream_id, who.clone()));
    let mut delegates = storage::load_delegates(env, stream_id);
    if let Some(index) = delegates.first_index_of(who) {
        delegates.remove(index);
        storage::save_delegates(env, stream_id, &delegates);
    }
}
