use soroban_sdk::{contractclient, contracttype, Address, Env, Vec};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountSnapshot {
    pub token_balance: u128,
    pub borrow_balance: u128,
    pub exchange_rate: u128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountHint {
    pub account: Address,
    pub token_balance: u128,
    pub borrow_balance: u128,
}

/// Calling-market state accepted by the comptroller's gates. The controller
/// is not a market and always passes `None`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketHint {
    pub market: Address,
    pub comptroller: Address,
    pub exchange_rate: u128,
    pub total_supply: u128,
    pub total_borrows: u128,
    pub borrow_index: u128,
    pub accounts: Vec<AccountHint>,
}

#[allow(dead_code)]
#[contractclient(name = "ComptrollerClient")]
pub trait Comptroller {
    fn get_assets_in(env: Env, account: Address) -> Vec<Address>;
    fn oracle(env: Env) -> Option<Address>;
    fn protocol_paused(env: Env) -> bool;
    fn stablecoin_mint_rate(env: Env) -> u128;
    fn minted_stablecoin_of(env: Env, owner: Address) -> u128;
    fn set_minted_stablecoin_of(env: Env, owner: Address, amount: u128);
    fn liquidate_borrow_allowed(
        env: Env,
        borrowed: Address,
        collateral: Address,
        liquidator: Address,
        borrower: Address,
        repay_amount: u128,
        hint: Option<MarketHint>,
    );
    fn seize_allowed(
        env: Env,
        collateral: Address,
        borrowed: Address,
        liquidator: Address,
        borrower: Address,
        seize_tokens: u128,
        hint: Option<MarketHint>,
    );
    fn stablecoin_seize_tokens(env: Env, collateral: Address, repay_amount: u128) -> u128;
}

#[allow(dead_code)]
#[contractclient(name = "MarketClient")]
pub trait Market {
    fn get_account_snapshot(env: Env, account: Address) -> AccountSnapshot;
    fn balance_of(env: Env, account: Address) -> u128;
    fn accrue_interest(env: Env);
    fn seize(env: Env, liquidator: Address, borrower: Address, seize_tokens: u128);
}

#[allow(dead_code)]
#[contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    fn get_underlying_price(env: Env, market: Address) -> u128;
}

#[allow(dead_code)]
#[contractclient(name = "StableTokenClient")]
pub trait StableToken {
    fn mint(env: Env, to: Address, amount: i128);
    fn burn(env: Env, from: Address, amount: i128);
    fn balance(env: Env, id: Address) -> i128;
}
