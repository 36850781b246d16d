use soroban_sdk::{contracttype, panic_with_error, Address, Env};

use crate::error::Error;

#[contracttype]
pub enum DataKey {
    Initialized,
    Admin,
    Comptroller,
    StableToken,
    Treasury, // TreasuryData
    Locked,   // bool, held for the duration of mint/repay/liquidate
}

const TTL_THRESHOLD: u32 = 100_000;
const TTL_EXTEND_TO: u32 = 200_000;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreasuryData {
    pub guardian: Address,
    pub address: Address,
    pub percent: u128, // 1e18 mantissa of every mint
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().persistent().has(&DataKey::Initialized)
}

pub fn admin(env: &Env) -> Result<Address, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

pub fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    if admin(env)? != *caller {
        return Err(Error::Unauthorized);
    }
    bump_core_ttl(env);
    caller.require_auth();
    Ok(())
}

pub fn comptroller(env: &Env) -> Result<Address, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Comptroller)
        .ok_or(Error::NotInitialized)
}

pub fn stable_token(env: &Env) -> Result<Address, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::StableToken)
        .ok_or(Error::NotInitialized)
}

pub fn treasury(env: &Env) -> Option<TreasuryData> {
    env.storage().persistent().get(&DataKey::Treasury)
}

pub fn set_treasury(env: &Env, data: &TreasuryData) {
    env.storage().persistent().set(&DataKey::Treasury, data);
}

pub fn is_locked(env: &Env) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Locked)
        .unwrap_or(false)
}

/// Takes the lock; entering while it is held is fatal. An error return
/// rolls the lock back together with the rest of the invocation.
pub fn lock(env: &Env) {
    if is_locked(env) {
        panic_with_error!(env, Error::ReentrancyError);
    }
    env.storage().persistent().set(&DataKey::Locked, &true);
}

pub fn unlock(env: &Env) {
    env.storage().persistent().set(&DataKey::Locked, &false);
}

pub fn bump_core_ttl(env: &Env) {
    let persistent = env.storage().persistent();
    for key in [
        DataKey::Initialized,
        DataKey::Admin,
        DataKey::Comptroller,
        DataKey::StableToken,
        DataKey::Treasury,
    ]
    .iter()
    {
        if persistent.has(key) {
            persistent.extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
        }
    }
}
