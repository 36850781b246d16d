#![no_std]
use soroban_sdk::{contract, contractevent, contractimpl, contracttype, Address, Env, String};
use stellar_tokens::fungible::burnable::emit_burn;
use stellar_tokens::fungible::Base as TokenBase;

#[contracttype]
pub enum DataKey {
    Admin,
    Minter, // stablecoin controller
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MinterUpdated {
    #[topic]
    pub minter: Address,
}

/// Stablecoin issued against collateral. Only the minter creates supply;
/// holders burn their own balance when repaying. Transfers and approvals are
/// authorised inside the token base.
#[contract]
pub struct StableToken;

#[contractimpl]
impl StableToken {
    pub fn initialize(
        env: Env,
        name: String,
        symbol: String,
        decimals: u32,
        admin: Address,
        minter: Address,
    ) {
        if env
            .storage()
            .persistent()
            .get::<_, Address>(&DataKey::Admin)
            .is_some()
        {
            panic!("already initialized");
        }
        admin.require_auth();
        TokenBase::set_metadata(&env, decimals, name, symbol);
        env.storage().persistent().set(&DataKey::Admin, &admin);
        env.storage().persistent().set(&DataKey::Minter, &minter);
        MinterUpdated { minter }.publish(&env);
    }

    pub fn name(env: Env) -> String {
        TokenBase::name(&env)
    }

    pub fn symbol(env: Env) -> String {
        TokenBase::symbol(&env)
    }

    pub fn decimals(env: Env) -> u32 {
        TokenBase::decimals(&env)
    }

    pub fn total_supply(env: Env) -> i128 {
        TokenBase::total_supply(&env)
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        TokenBase::balance(&env, &id)
    }

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        TokenBase::allowance(&env, &from, &spender)
    }

    pub fn approve(env: Env, from: Address, spender: Address, amount: i128, live_until_ledger: u32) {
        if amount < 0 {
            panic!("bad amount");
        }
        TokenBase::approve(&env, &from, &spender, amount, live_until_ledger);
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        if amount <= 0 {
            panic!("bad amount");
        }
        TokenBase::transfer(&env, &from, &to, amount);
    }

    pub fn transfer_from(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        if amount <= 0 {
            panic!("bad amount");
        }
        TokenBase::transfer_from(&env, &spender, &from, &to, amount);
    }

    pub fn mint(env: Env, to: Address, amount: i128) {
        require_minter(&env);
        if amount <= 0 {
            panic!("bad amount");
        }
        TokenBase::mint(&env, &to, amount);
    }

    pub fn burn(env: Env, from: Address, amount: i128) {
        from.require_auth();
        if amount <= 0 {
            panic!("bad amount");
        }
        let current = TokenBase::balance(&env, &from);
        if current < amount {
            panic!("insufficient balance");
        }
        TokenBase::update(&env, Some(&from), None, amount);
        emit_burn(&env, &from, amount);
    }

    pub fn minter(env: Env) -> Address {
        env.storage()
            .persistent()
            .get(&DataKey::Minter)
            .expect("no minter")
    }

    pub fn set_minter(env: Env, minter: Address) {
        require_admin(&env);
        env.storage().persistent().set(&DataKey::Minter, &minter);
        MinterUpdated { minter }.publish(&env);
    }

    pub fn set_admin(env: Env, new_admin: Address) {
        require_admin(&env);
        env.storage().persistent().set(&DataKey::Admin, &new_admin);
    }
}

fn require_admin(env: &Env) {
    let admin: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Admin)
        .expect("no admin");
    admin.require_auth();
}

fn require_minter(env: &Env) {
    let minter: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Minter)
        .expect("no minter");
    minter.require_auth();
}

mod test;
