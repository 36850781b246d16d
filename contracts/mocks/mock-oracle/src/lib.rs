#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env};

#[contracttype]
enum DataKey {
    Price(Address),
}

/// Price feed returning whatever was last set for a market; 0 when unset.
#[contract]
pub struct MockOracle;

#[contractimpl]
impl MockOracle {
    pub fn set_underlying_price(env: Env, market: Address, price: u128) {
        env.storage()
            .persistent()
            .set(&DataKey::Price(market), &price);
    }

    pub fn get_underlying_price(env: Env, market: Address) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::Price(market))
            .unwrap_or(0)
    }
}
