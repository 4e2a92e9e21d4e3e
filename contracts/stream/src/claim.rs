//! Ownership of the transferable claim issued for each stream.

use soroban_sdk::{Address, Env};

use crate::access;
use crate::error::ContractError;
use crate::storage::{persist, DataKey};

pub fn owner_of(env: &Env, stream_id: u64) -> Result<Address, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::ClaimOwner(stream_id))
        .ok_or(ContractError::StreamNotFound)
}

pub fn mint(env: &Env, stream_id: u64, to: &Address) {
    persist(env, &DataKey::ClaimOwner(stream_id), to);
}

pub fn burn(env: &Env, stream_id: u64) {
    env.storage()
        .persistent()
        .remove(&DataKey::ClaimOwner(stream_id));
}

/// Move the claim to `to`. The previous holder's redirect goes with them.
pub fn transfer(
    env: &Env,
    stream_id: u64,
    from: &Address,
    to: &Address,
) -> Result<(), ContractError> {
    let holder = owner_of(env, stream_id)?;
    if holder != *from {
        return Err(ContractError::Unauthorized);
    }
    if from == to {
        return Err(ContractError::InvalidAddress);
    }
    access::remove_redirect(env, stream_id);
    persist(env, &DataKey::ClaimOwner(stream_id), to);
    Ok(())
}
