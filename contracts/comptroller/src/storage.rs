use fixed_point::U256 as RawU256;
use soroban_sdk::{contracttype, Address, Env, Vec, U256};

use crate::constants::*;
use crate::error::Error;

#[contracttype]
pub enum DataKey {
    Initialized,
    Admin,
    Oracle,
    PauseGuardian,
    BorrowCapGuardian,
    CloseFactor,          // u128 mantissa
    LiquidationIncentive, // u128 mantissa
    Policy,               // PolicyConfig
    AllMarkets,           // Vec<Address>
    Market(Address),      // Market
    // (market, account) -> bool, mirror of AccountAssets
    Membership(Address, Address),
    AccountAssets(Address), // Vec<Address>
    BorrowCap(Address),     // u128, 0 = unlimited
    ProtocolPaused,
    MintPaused(Address),
    BorrowPaused(Address),
    TransferPaused,
    SeizePaused,
    // Rewards
    RewardToken,
    SupplySpeed(Address),
    BorrowSpeed(Address),
    SupplyState(Address),             // RewardMarketState
    BorrowState(Address),             // RewardMarketState
    SupplierIndex(Address, Address),  // (market, account) -> U256
    BorrowerIndex(Address, Address),  // (market, account) -> U256
    RewardAccrued(Address),           // u128
    // Stablecoin sub-ledger
    StablecoinController,
    StablecoinMintRate, // u128 bps of MINT_RATE_DENOMINATOR
    MintedStablecoin(Address),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Market {
    pub listed: bool,
    pub collateral_factor: u128,
    pub reward_eligible: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardMarketState {
    pub index: U256,
    pub block: u32,
}

/// Toggles covering the behavioural differences between policy generations.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PolicyConfig {
    pub enforce_max_assets_cap: bool,
    pub max_assets: u32,
    pub enforce_close_factor_bounds: bool,
    pub reward_all_markets_by_default: bool,
}

impl PolicyConfig {
    pub fn latest() -> Self {
        Self {
            enforce_max_assets_cap: false,
            max_assets: DEFAULT_MAX_ASSETS,
            enforce_close_factor_bounds: true,
            reward_all_markets_by_default: true,
        }
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PauseScope {
    Protocol,
    Mint(Address),
    Borrow(Address),
    Transfer,
    Seize,
}

/// In-memory view of a reward index track.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct IndexState {
    pub index: RawU256,
    pub block: u32,
}

pub(crate) fn to_host_u256(env: &Env, value: &RawU256) -> U256 {
    let words = value.0;
    U256::from_parts(env, words[3], words[2], words[1], words[0])
}

pub(crate) fn from_host_u256(value: &U256) -> RawU256 {
    let mut buf = [0u8; 32];
    value.to_be_bytes().copy_into_slice(&mut buf);
    RawU256::from_big_endian(&buf)
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

/// Caller must be the stored admin and must have signed.
pub fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    let admin = admin(env)?;
    if admin != *caller {
        return Err(Error::Unauthorized);
    }
    bump_core_ttl(env);
    caller.require_auth();
    Ok(())
}

/// Caller must be the admin or the given guardian.
pub fn require_admin_or(
    env: &Env,
    caller: &Address,
    guardian: Option<Address>,
) -> Result<bool, Error> {
    let admin = admin(env)?;
    let is_admin = admin == *caller;
    let is_guardian = guardian.map(|g| g == *caller).unwrap_or(false);
    if !is_admin && !is_guardian {
        return Err(Error::Unauthorized);
    }
    bump_core_ttl(env);
    caller.require_auth();
    Ok(is_admin)
}

pub fn oracle(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&DataKey::Oracle)
}

pub fn pause_guardian(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&DataKey::PauseGuardian)
}

pub fn borrow_cap_guardian(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&DataKey::BorrowCapGuardian)
}

pub fn close_factor(env: &Env) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::CloseFactor)
        .unwrap_or(DEFAULT_CLOSE_FACTOR_MANTISSA)
}

pub fn liquidation_incentive(env: &Env) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::LiquidationIncentive)
        .unwrap_or(DEFAULT_LIQUIDATION_INCENTIVE_MANTISSA)
}

pub fn policy(env: &Env) -> PolicyConfig {
    env.storage()
        .persistent()
        .get(&DataKey::Policy)
        .unwrap_or(PolicyConfig::latest())
}

pub fn all_markets(env: &Env) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::AllMarkets)
        .unwrap_or(Vec::new(env))
}

pub fn market(env: &Env, market: &Address) -> Option<Market> {
    env.storage()
        .persistent()
        .get(&DataKey::Market(market.clone()))
}

pub fn set_market(env: &Env, market: &Address, config: &Market) {
    env.storage()
        .persistent()
        .set(&DataKey::Market(market.clone()), config);
}

/// Listed market config or `MarketNotListed`.
pub fn listed_market(env: &Env, market: &Address) -> Result<Market, Error> {
    match self::market(env, market) {
        Some(config) if config.listed => Ok(config),
        _ => Err(Error::MarketNotListed),
    }
}

pub fn is_member(env: &Env, market: &Address, account: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Membership(market.clone(), account.clone()))
        .unwrap_or(false)
}

pub fn set_member(env: &Env, market: &Address, account: &Address, member: bool) {
    let key = DataKey::Membership(market.clone(), account.clone());
    if member {
        env.storage().persistent().set(&key, &true);
    } else {
        env.storage().persistent().remove(&key);
    }
}

pub fn account_assets(env: &Env, account: &Address) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::AccountAssets(account.clone()))
        .unwrap_or(Vec::new(env))
}

pub fn set_account_assets(env: &Env, account: &Address, assets: &Vec<Address>) {
    env.storage()
        .persistent()
        .set(&DataKey::AccountAssets(account.clone()), assets);
}

pub fn borrow_cap(env: &Env, market: &Address) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::BorrowCap(market.clone()))
        .unwrap_or(0u128)
}

fn pause_key(scope: &PauseScope) -> DataKey {
    match scope {
        PauseScope::Protocol => DataKey::ProtocolPaused,
        PauseScope::Mint(market) => DataKey::MintPaused(market.clone()),
        PauseScope::Borrow(market) => DataKey::BorrowPaused(market.clone()),
        PauseScope::Transfer => DataKey::TransferPaused,
        PauseScope::Seize => DataKey::SeizePaused,
    }
}

pub fn is_paused(env: &Env, scope: &PauseScope) -> bool {
    env.storage()
        .persistent()
        .get(&pause_key(scope))
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, scope: &PauseScope, paused: bool) {
    env.storage().persistent().set(&pause_key(scope), &paused);
}

pub fn reward_token(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&DataKey::RewardToken)
}

pub fn supply_speed(env: &Env, market: &Address) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::SupplySpeed(market.clone()))
        .unwrap_or(0u128)
}

pub fn borrow_speed(env: &Env, market: &Address) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::BorrowSpeed(market.clone()))
        .unwrap_or(0u128)
}

pub fn set_supply_speed(env: &Env, market: &Address, speed: u128) {
    env.storage()
        .persistent()
        .set(&DataKey::SupplySpeed(market.clone()), &speed);
}

pub fn set_borrow_speed(env: &Env, market: &Address, speed: u128) {
    env.storage()
        .persistent()
        .set(&DataKey::BorrowSpeed(market.clone()), &speed);
}

fn read_state(env: &Env, key: &DataKey) -> IndexState {
    match env.storage().persistent().get::<_, RewardMarketState>(key) {
        Some(state) => IndexState {
            index: from_host_u256(&state.index),
            block: state.block,
        },
        None => IndexState {
            index: RawU256::zero(),
            block: 0,
        },
    }
}

fn write_state(env: &Env, key: &DataKey, state: &IndexState) {
    let stored = RewardMarketState {
        index: to_host_u256(env, &state.index),
        block: state.block,
    };
    env.storage().persistent().set(key, &stored);
}

pub(crate) fn supply_state(env: &Env, market: &Address) -> IndexState {
    read_state(env, &DataKey::SupplyState(market.clone()))
}

pub(crate) fn set_supply_state(env: &Env, market: &Address, state: &IndexState) {
    write_state(env, &DataKey::SupplyState(market.clone()), state);
}

pub(crate) fn borrow_state(env: &Env, market: &Address) -> IndexState {
    read_state(env, &DataKey::BorrowState(market.clone()))
}

pub(crate) fn set_borrow_state(env: &Env, market: &Address, state: &IndexState) {
    write_state(env, &DataKey::BorrowState(market.clone()), state);
}

pub(crate) fn supplier_index(env: &Env, market: &Address, account: &Address) -> RawU256 {
    env.storage()
        .persistent()
        .get::<_, U256>(&DataKey::SupplierIndex(market.clone(), account.clone()))
        .map(|v| from_host_u256(&v))
        .unwrap_or(RawU256::zero())
}

pub(crate) fn set_supplier_index(env: &Env, market: &Address, account: &Address, index: &RawU256) {
    env.storage().persistent().set(
        &DataKey::SupplierIndex(market.clone(), account.clone()),
        &to_host_u256(env, index),
    );
}

pub(crate) fn borrower_index(env: &Env, market: &Address, account: &Address) -> RawU256 {
    env.storage()
        .persistent()
        .get::<_, U256>(&DataKey::BorrowerIndex(market.clone(), account.clone()))
        .map(|v| from_host_u256(&v))
        .unwrap_or(RawU256::zero())
}

pub(crate) fn set_borrower_index(env: &Env, market: &Address, account: &Address, index: &RawU256) {
    env.storage().persistent().set(
        &DataKey::BorrowerIndex(market.clone(), account.clone()),
        &to_host_u256(env, index),
    );
}

pub fn reward_accrued(env: &Env, account: &Address) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::RewardAccrued(account.clone()))
        .unwrap_or(0u128)
}

pub fn set_reward_accrued(env: &Env, account: &Address, amount: u128) {
    env.storage()
        .persistent()
        .set(&DataKey::RewardAccrued(account.clone()), &amount);
}

pub fn stablecoin_controller(env: &Env) -> Option<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::StablecoinController)
}

pub fn stablecoin_mint_rate(env: &Env) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::StablecoinMintRate)
        .unwrap_or(0u128)
}

pub fn minted_stablecoin(env: &Env, account: &Address) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::MintedStablecoin(account.clone()))
        .unwrap_or(0u128)
}

pub fn set_minted_stablecoin(env: &Env, account: &Address, amount: u128) {
    let key = DataKey::MintedStablecoin(account.clone());
    if amount == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &amount);
    }
}

pub fn is_stablecoin_controller(env: &Env, candidate: &Address) -> bool {
    stablecoin_controller(env)
        .map(|c| c == *candidate)
        .unwrap_or(false)
}

pub fn bump_core_ttl(env: &Env) {
    let persistent = env.storage().persistent();
    let core = [
        DataKey::Initialized,
        DataKey::Admin,
        DataKey::Oracle,
        DataKey::CloseFactor,
        DataKey::LiquidationIncentive,
        DataKey::Policy,
        DataKey::AllMarkets,
        DataKey::RewardToken,
        DataKey::StablecoinController,
        DataKey::StablecoinMintRate,
    ];
    for key in core.iter() {
        if persistent.has(key) {
            persistent.extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
        }
    }
}
