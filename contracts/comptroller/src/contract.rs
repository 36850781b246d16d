use soroban_sdk::{contract, contractimpl, Address, BytesN, Env, Vec, U256};

use crate::constants::*;
use crate::error::Error;
use crate::events::*;
use crate::flywheel;
use crate::interfaces::{MarketClient, MarketHint, MarketReader};
use crate::liquidity;
use crate::membership;
use crate::policy;
use crate::storage::{self, DataKey, Market, PauseScope, PolicyConfig, RewardMarketState};

/// Risk ledger for a set of lending markets.
///
/// Markets ask the comptroller before every balance change through the
/// `*_allowed` gates; a gate that returns `Ok(())` has also brought the
/// market's reward indices current and paid the involved accounts up to them.
#[contract]
pub struct Comptroller;

#[contractimpl]
impl Comptroller {
    pub fn initialize(
        env: Env,
        admin: Address,
        oracle: Address,
        policy: PolicyConfig,
    ) -> Result<(), Error> {
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        let persistent = env.storage().persistent();
        persistent.set(&DataKey::Admin, &admin);
        persistent.set(&DataKey::Oracle, &oracle);
        persistent.set(&DataKey::CloseFactor, &DEFAULT_CLOSE_FACTOR_MANTISSA);
        persistent.set(
            &DataKey::LiquidationIncentive,
            &DEFAULT_LIQUIDATION_INCENTIVE_MANTISSA,
        );
        persistent.set(&DataKey::Policy, &policy);
        persistent.set(&DataKey::AllMarkets, &Vec::<Address>::new(&env));
        persistent.set(&DataKey::Initialized, &true);
        storage::bump_core_ttl(&env);

        AdminUpdated { admin }.publish(&env);
        OracleUpdated { oracle }.publish(&env);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Administration

    pub fn set_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage().persistent().set(&DataKey::Admin, &new_admin);
        AdminUpdated { admin: new_admin }.publish(&env);
        Ok(())
    }

    pub fn set_price_oracle(env: Env, caller: Address, oracle: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage().persistent().set(&DataKey::Oracle, &oracle);
        OracleUpdated { oracle }.publish(&env);
        Ok(())
    }

    pub fn set_pause_guardian(env: Env, caller: Address, guardian: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage()
            .persistent()
            .set(&DataKey::PauseGuardian, &guardian);
        PauseGuardianUpdated { guardian }.publish(&env);
        Ok(())
    }

    pub fn set_borrow_cap_guardian(
        env: Env,
        caller: Address,
        guardian: Address,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage()
            .persistent()
            .set(&DataKey::BorrowCapGuardian, &guardian);
        BorrowCapGuardianUpdated { guardian }.publish(&env);
        Ok(())
    }

    pub fn set_close_factor(env: Env, caller: Address, new_mantissa: u128) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        if storage::policy(&env).enforce_close_factor_bounds
            && (new_mantissa < CLOSE_FACTOR_MIN_MANTISSA
                || new_mantissa > CLOSE_FACTOR_MAX_MANTISSA)
        {
            return Err(Error::InvalidCloseFactor);
        }
        let old_mantissa = storage::close_factor(&env);
        env.storage()
            .persistent()
            .set(&DataKey::CloseFactor, &new_mantissa);
        CloseFactorUpdated {
            old_mantissa,
            new_mantissa,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_liquidation_incentive(
        env: Env,
        caller: Address,
        new_mantissa: u128,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        if storage::policy(&env).enforce_close_factor_bounds
            && (new_mantissa < LIQUIDATION_INCENTIVE_MIN_MANTISSA
                || new_mantissa > LIQUIDATION_INCENTIVE_MAX_MANTISSA)
        {
            return Err(Error::InvalidLiquidationIncentive);
        }
        let old_mantissa = storage::liquidation_incentive(&env);
        env.storage()
            .persistent()
            .set(&DataKey::LiquidationIncentive, &new_mantissa);
        LiquidationIncentiveUpdated {
            old_mantissa,
            new_mantissa,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_policy(env: Env, caller: Address, policy: PolicyConfig) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage().persistent().set(&DataKey::Policy, &policy);
        PolicyUpdated { policy }.publish(&env);
        Ok(())
    }

    pub fn set_max_assets(env: Env, caller: Address, max_assets: u32) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        let mut policy = storage::policy(&env);
        policy.max_assets = max_assets;
        env.storage().persistent().set(&DataKey::Policy, &policy);
        PolicyUpdated { policy }.publish(&env);
        Ok(())
    }

    /// Lists `market`. The address must answer `is_market() == true`.
    pub fn support_market(env: Env, caller: Address, market: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        if storage::market(&env, &market).is_some() {
            return Err(Error::MarketAlreadyListed);
        }
        match MarketClient::new(&env, &market).try_is_market() {
            Ok(Ok(true)) => {}
            _ => return Err(Error::InvalidMarket),
        }

        let config = Market {
            listed: true,
            collateral_factor: 0,
            reward_eligible: storage::policy(&env).reward_all_markets_by_default,
        };
        storage::set_market(&env, &market, &config);

        let mut markets = storage::all_markets(&env);
        markets.push_back(market.clone());
        env.storage()
            .persistent()
            .set(&DataKey::AllMarkets, &markets);

        flywheel::seed_market_states(&env, &market)?;

        MarketListed { market }.publish(&env);
        Ok(())
    }

    pub fn set_collateral_factor(
        env: Env,
        caller: Address,
        market: Address,
        new_mantissa: u128,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        let mut config = storage::listed_market(&env, &market)?;
        if new_mantissa > COLLATERAL_FACTOR_MAX_MANTISSA {
            return Err(Error::InvalidCollateralFactor);
        }
        if new_mantissa != 0 {
            crate::interfaces::underlying_price(&env, &market)?;
        }

        let old_mantissa = config.collateral_factor;
        config.collateral_factor = new_mantissa;
        storage::set_market(&env, &market, &config);

        CollateralFactorUpdated {
            market,
            old_mantissa,
            new_mantissa,
        }
        .publish(&env);
        Ok(())
    }

    /// Borrow caps per market; 0 removes the cap.
    pub fn set_market_borrow_caps(
        env: Env,
        caller: Address,
        markets: Vec<Address>,
        caps: Vec<u128>,
    ) -> Result<(), Error> {
        storage::require_admin_or(&env, &caller, storage::borrow_cap_guardian(&env))?;
        if markets.is_empty() || markets.len() != caps.len() {
            return Err(Error::InvalidInput);
        }
        for (market, cap) in markets.iter().zip(caps.iter()) {
            env.storage()
                .persistent()
                .set(&DataKey::BorrowCap(market.clone()), &cap);
            BorrowCapUpdated { market, cap }.publish(&env);
        }
        Ok(())
    }

    /// Guardians may pause; lifting a pause needs the admin.
    pub fn set_pause(
        env: Env,
        caller: Address,
        scope: PauseScope,
        paused: bool,
    ) -> Result<(), Error> {
        let is_admin = storage::require_admin_or(&env, &caller, storage::pause_guardian(&env))?;
        if !is_admin && !paused {
            return Err(Error::Unauthorized);
        }
        match &scope {
            PauseScope::Mint(market) | PauseScope::Borrow(market) => {
                storage::listed_market(&env, market)?;
            }
            _ => {}
        }
        storage::set_paused(&env, &scope, paused);
        ActionPaused { scope, paused }.publish(&env);
        Ok(())
    }

    pub fn set_stablecoin_controller(
        env: Env,
        caller: Address,
        controller: Address,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage()
            .persistent()
            .set(&DataKey::StablecoinController, &controller);
        StablecoinControllerUpdated { controller }.publish(&env);
        Ok(())
    }

    /// Share of collateral value that may back stablecoin debt, in basis points.
    pub fn set_stablecoin_mint_rate(env: Env, caller: Address, new_rate: u128) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        if new_rate > MINT_RATE_DENOMINATOR {
            return Err(Error::InvalidMintRate);
        }
        let old_rate = storage::stablecoin_mint_rate(&env);
        env.storage()
            .persistent()
            .set(&DataKey::StablecoinMintRate, &new_rate);
        StablecoinMintRateUpdated { old_rate, new_rate }.publish(&env);
        Ok(())
    }

    /// Written by the stablecoin controller after every mint, repay and
    /// liquidation.
    pub fn set_minted_stablecoin_of(env: Env, owner: Address, amount: u128) -> Result<(), Error> {
        let controller = storage::stablecoin_controller(&env).ok_or(Error::Unauthorized)?;
        controller.require_auth();
        if storage::is_paused(&env, &PauseScope::Protocol) {
            return Err(Error::ProtocolPaused);
        }
        storage::set_minted_stablecoin(&env, &owner, amount);
        MintedStablecoinUpdated { owner, amount }.publish(&env);
        Ok(())
    }

    pub fn upgrade(env: Env, caller: Address, new_wasm_hash: BytesN<32>) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reward administration

    pub fn set_reward_token(env: Env, caller: Address, token: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage().persistent().set(&DataKey::RewardToken, &token);
        RewardTokenUpdated { token }.publish(&env);
        Ok(())
    }

    /// Sets per-block emission for both sides of `market`. Indices are brought
    /// current at the old speed first.
    pub fn set_reward_speeds(
        env: Env,
        caller: Address,
        market: Address,
        supply_speed: u128,
        borrow_speed: u128,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        let config = storage::listed_market(&env, &market)?;
        if (supply_speed != 0 || borrow_speed != 0) && !config.reward_eligible {
            return Err(Error::MarketNotRewardEligible);
        }

        let reader = MarketReader::direct();
        if storage::supply_speed(&env, &market) != supply_speed {
            flywheel::update_supply_index(&env, &reader, &market)?;
            storage::set_supply_speed(&env, &market, supply_speed);
        }
        if storage::borrow_speed(&env, &market) != borrow_speed {
            let borrow_index = flywheel::market_borrow_index(&env, &reader, &market);
            flywheel::update_borrow_index(&env, &reader, &market, borrow_index)?;
            storage::set_borrow_speed(&env, &market, borrow_speed);
        }
        flywheel::seed_market_states(&env, &market)?;

        RewardSpeedsUpdated {
            market,
            supply_speed,
            borrow_speed,
        }
        .publish(&env);
        Ok(())
    }

    pub fn add_reward_markets(
        env: Env,
        caller: Address,
        markets: Vec<Address>,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        for market in markets.iter() {
            let mut config = storage::listed_market(&env, &market)?;
            if config.reward_eligible {
                continue;
            }
            config.reward_eligible = true;
            storage::set_market(&env, &market, &config);
            flywheel::seed_market_states(&env, &market)?;
            RewardMarketUpdated {
                market,
                eligible: true,
            }
            .publish(&env);
        }
        Ok(())
    }

    /// Stops emissions on `market`. Accrued rewards stay claimable.
    pub fn drop_reward_market(env: Env, caller: Address, market: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        let mut config = storage::listed_market(&env, &market)?;
        if !config.reward_eligible {
            return Err(Error::MarketNotRewardEligible);
        }

        let reader = MarketReader::direct();
        flywheel::update_supply_index(&env, &reader, &market)?;
        let borrow_index = flywheel::market_borrow_index(&env, &reader, &market);
        flywheel::update_borrow_index(&env, &reader, &market, borrow_index)?;
        storage::set_supply_speed(&env, &market, 0);
        storage::set_borrow_speed(&env, &market, 0);

        config.reward_eligible = false;
        storage::set_market(&env, &market, &config);

        RewardSpeedsUpdated {
            market: market.clone(),
            supply_speed: 0,
            borrow_speed: 0,
        }
        .publish(&env);
        RewardMarketUpdated {
            market,
            eligible: false,
        }
        .publish(&env);
        Ok(())
    }

    /// Transfers reward tokens out of the treasury. Either the full amount
    /// moves or nothing does.
    pub fn grant_reward(
        env: Env,
        caller: Address,
        recipient: Address,
        amount: u128,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        if flywheel::grant_reward_internal(&env, &recipient, amount)? != 0 {
            return Err(Error::InsufficientRewardBalance);
        }
        RewardGranted { recipient, amount }.publish(&env);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Membership

    /// Enters every market in `markets`; fails as a whole if any entry fails.
    pub fn enter_markets(env: Env, account: Address, markets: Vec<Address>) -> Result<(), Error> {
        account.require_auth();
        for market in markets.iter() {
            membership::add_to_market(&env, &market, &account)?;
        }
        Ok(())
    }

    pub fn exit_market(env: Env, account: Address, market: Address) -> Result<(), Error> {
        account.require_auth();
        membership::exit_market(&env, &market, &account)
    }

    // ---------------------------------------------------------------------
    // Policy gates
    //
    // A market calling a gate passes its own state as `hint` and must list
    // every account the gate reads. Callers that are not the market pass
    // `None` and the market is queried directly.

    pub fn mint_allowed(
        env: Env,
        market: Address,
        minter: Address,
        mint_amount: u128,
        hint: Option<MarketHint>,
    ) -> Result<(), Error> {
        policy::mint_allowed(&env, &market, &minter, mint_amount, hint)
    }

    pub fn redeem_allowed(
        env: Env,
        market: Address,
        redeemer: Address,
        redeem_tokens: u128,
        hint: Option<MarketHint>,
    ) -> Result<(), Error> {
        policy::redeem_allowed(&env, &market, &redeemer, redeem_tokens, hint)
    }

    /// Non-members are entered automatically, which requires `market` to
    /// authorise the call.
    pub fn borrow_allowed(
        env: Env,
        market: Address,
        borrower: Address,
        borrow_amount: u128,
        hint: Option<MarketHint>,
    ) -> Result<(), Error> {
        policy::borrow_allowed(&env, &market, &borrower, borrow_amount, hint)
    }

    pub fn repay_borrow_allowed(
        env: Env,
        market: Address,
        payer: Address,
        borrower: Address,
        repay_amount: u128,
        hint: Option<MarketHint>,
    ) -> Result<(), Error> {
        policy::repay_borrow_allowed(&env, &market, &payer, &borrower, repay_amount, hint)
    }

    /// `hint` describes `borrowed`.
    pub fn liquidate_borrow_allowed(
        env: Env,
        borrowed: Address,
        collateral: Address,
        liquidator: Address,
        borrower: Address,
        repay_amount: u128,
        hint: Option<MarketHint>,
    ) -> Result<(), Error> {
        policy::liquidate_borrow_allowed(
            &env,
            &borrowed,
            &collateral,
            &liquidator,
            &borrower,
            repay_amount,
            hint,
        )
    }

    /// Called by the borrowed market before it asks `collateral` to seize;
    /// `hint` describes `borrowed`.
    pub fn seize_allowed(
        env: Env,
        collateral: Address,
        borrowed: Address,
        liquidator: Address,
        borrower: Address,
        seize_tokens: u128,
        hint: Option<MarketHint>,
    ) -> Result<(), Error> {
        policy::seize_allowed(
            &env,
            &collateral,
            &borrowed,
            &liquidator,
            &borrower,
            seize_tokens,
            hint,
        )
    }

    pub fn transfer_allowed(
        env: Env,
        market: Address,
        src: Address,
        dst: Address,
        transfer_tokens: u128,
        hint: Option<MarketHint>,
    ) -> Result<(), Error> {
        policy::transfer_allowed(&env, &market, &src, &dst, transfer_tokens, hint)
    }

    // Post-action hooks. Only redeem has a rule to check.

    pub fn mint_verify(
        _env: Env,
        _market: Address,
        _minter: Address,
        _mint_amount: u128,
        _mint_tokens: u128,
    ) {
    }

    pub fn redeem_verify(
        _env: Env,
        _market: Address,
        _redeemer: Address,
        redeem_amount: u128,
        redeem_tokens: u128,
    ) {
        policy::redeem_verify(redeem_amount, redeem_tokens);
    }

    pub fn borrow_verify(_env: Env, _market: Address, _borrower: Address, _borrow_amount: u128) {}

    pub fn repay_borrow_verify(
        _env: Env,
        _market: Address,
        _payer: Address,
        _borrower: Address,
        _repay_amount: u128,
        _borrower_index: u128,
    ) {
    }

    pub fn liquidate_borrow_verify(
        _env: Env,
        _borrowed: Address,
        _collateral: Address,
        _liquidator: Address,
        _borrower: Address,
        _repay_amount: u128,
        _seize_tokens: u128,
    ) {
    }

    pub fn seize_verify(
        _env: Env,
        _collateral: Address,
        _borrowed: Address,
        _liquidator: Address,
        _borrower: Address,
        _seize_tokens: u128,
    ) {
    }

    pub fn transfer_verify(
        _env: Env,
        _market: Address,
        _src: Address,
        _dst: Address,
        _transfer_tokens: u128,
    ) {
    }

    // ---------------------------------------------------------------------
    // Liquidity

    /// `(liquidity, shortfall)` of `account` at current prices.
    pub fn get_account_liquidity(env: Env, account: Address) -> Result<(u128, u128), Error> {
        liquidity::account_liquidity(&env, &MarketReader::direct(), &account)
    }

    pub fn get_hypothetical_liquidity(
        env: Env,
        account: Address,
        market: Address,
        redeem_tokens: u128,
        borrow_amount: u128,
    ) -> Result<(u128, u128), Error> {
        liquidity::hypothetical_account_liquidity(
            &env,
            &MarketReader::direct(),
            &account,
            Some(&market),
            redeem_tokens,
            borrow_amount,
        )
    }

    pub fn liquidate_calculate_seize_tokens(
        env: Env,
        borrowed: Address,
        collateral: Address,
        repay_amount: u128,
    ) -> Result<u128, Error> {
        policy::liquidate_calculate_seize_tokens(&env, &borrowed, &collateral, repay_amount)
    }

    pub fn stablecoin_seize_tokens(
        env: Env,
        collateral: Address,
        repay_amount: u128,
    ) -> Result<u128, Error> {
        policy::liquidate_stablecoin_calculate_seize_tokens(&env, &collateral, repay_amount)
    }

    // ---------------------------------------------------------------------
    // Rewards

    /// Returns what each holder is still owed after the payout attempt.
    pub fn claim_rewards(
        env: Env,
        holders: Vec<Address>,
        markets: Vec<Address>,
        borrowers: bool,
        suppliers: bool,
    ) -> Result<Vec<u128>, Error> {
        flywheel::claim_rewards(&env, &holders, &markets, borrowers, suppliers)
    }

    /// Claims both sides of every listed market for `holder`.
    pub fn claim_rewards_all(env: Env, holder: Address) -> Result<u128, Error> {
        let mut holders = Vec::new(&env);
        holders.push_back(holder);
        let markets = storage::all_markets(&env);
        let owed = flywheel::claim_rewards(&env, &holders, &markets, true, true)?;
        Ok(owed.get(0).unwrap_or(0))
    }

    // ---------------------------------------------------------------------
    // Views

    pub fn admin(env: Env) -> Result<Address, Error> {
        storage::admin(&env)
    }

    pub fn oracle(env: Env) -> Option<Address> {
        storage::oracle(&env)
    }

    pub fn pause_guardian(env: Env) -> Option<Address> {
        storage::pause_guardian(&env)
    }

    pub fn borrow_cap_guardian(env: Env) -> Option<Address> {
        storage::borrow_cap_guardian(&env)
    }

    pub fn close_factor(env: Env) -> u128 {
        storage::close_factor(&env)
    }

    pub fn liquidation_incentive(env: Env) -> u128 {
        storage::liquidation_incentive(&env)
    }

    pub fn policy(env: Env) -> PolicyConfig {
        storage::policy(&env)
    }

    pub fn is_paused(env: Env, scope: PauseScope) -> bool {
        storage::is_paused(&env, &scope)
    }

    pub fn protocol_paused(env: Env) -> bool {
        storage::is_paused(&env, &PauseScope::Protocol)
    }

    pub fn borrow_cap(env: Env, market: Address) -> u128 {
        storage::borrow_cap(&env, &market)
    }

    pub fn market_info(env: Env, market: Address) -> Option<Market> {
        storage::market(&env, &market)
    }

    pub fn get_all_markets(env: Env) -> Vec<Address> {
        storage::all_markets(&env)
    }

    pub fn get_assets_in(env: Env, account: Address) -> Vec<Address> {
        storage::account_assets(&env, &account)
    }

    pub fn check_membership(env: Env, account: Address, market: Address) -> bool {
        storage::is_member(&env, &market, &account)
    }

    pub fn check_membership_consistency(env: Env, account: Address) -> bool {
        membership::membership_consistent(&env, &account)
    }

    pub fn reward_token(env: Env) -> Option<Address> {
        storage::reward_token(&env)
    }

    /// `(supply_speed, borrow_speed)` per block.
    pub fn reward_speeds(env: Env, market: Address) -> (u128, u128) {
        (
            storage::supply_speed(&env, &market),
            storage::borrow_speed(&env, &market),
        )
    }

    pub fn reward_supply_state(env: Env, market: Address) -> RewardMarketState {
        let state = storage::supply_state(&env, &market);
        RewardMarketState {
            index: storage::to_host_u256(&env, &state.index),
            block: state.block,
        }
    }

    pub fn reward_borrow_state(env: Env, market: Address) -> RewardMarketState {
        let state = storage::borrow_state(&env, &market);
        RewardMarketState {
            index: storage::to_host_u256(&env, &state.index),
            block: state.block,
        }
    }

    pub fn reward_supplier_index(env: Env, market: Address, account: Address) -> U256 {
        storage::to_host_u256(&env, &storage::supplier_index(&env, &market, &account))
    }

    pub fn reward_borrower_index(env: Env, market: Address, account: Address) -> U256 {
        storage::to_host_u256(&env, &storage::borrower_index(&env, &market, &account))
    }

    pub fn reward_accrued(env: Env, account: Address) -> u128 {
        storage::reward_accrued(&env, &account)
    }

    pub fn stablecoin_controller(env: Env) -> Option<Address> {
        storage::stablecoin_controller(&env)
    }

    pub fn stablecoin_mint_rate(env: Env) -> u128 {
        storage::stablecoin_mint_rate(&env)
    }

    pub fn minted_stablecoin_of(env: Env, owner: Address) -> u128 {
        storage::minted_stablecoin(&env, &owner)
    }
}
