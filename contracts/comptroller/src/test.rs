#![cfg(test)]
use super::*;
use mock_market::{MockMarket, MockMarketClient};
use mock_oracle::{MockOracle, MockOracleClient};
use soroban_sdk::testutils::Ledger;
use soroban_sdk::{testutils::Address as _, token, vec, Address, Env, Vec, U256};

const E18: u128 = 1_000_000_000_000_000_000;
const E36: u128 = E18 * E18;

struct Ctx<'a> {
    env: &'a Env,
    admin: Address,
    comp: ComptrollerClient<'a>,
    oracle: MockOracleClient<'a>,
}

fn setup_with_policy(env: &Env, policy: PolicyConfig) -> Ctx<'_> {
    env.mock_all_auths();
    env.ledger().set_sequence_number(100);

    let admin = Address::generate(env);
    let oracle_id = env.register(MockOracle, ());
    let comp_id = env.register(Comptroller, ());
    let comp = ComptrollerClient::new(env, &comp_id);
    comp.initialize(&admin, &oracle_id, &policy);

    Ctx {
        env,
        admin,
        comp,
        oracle: MockOracleClient::new(env, &oracle_id),
    }
}

fn setup(env: &Env) -> Ctx<'_> {
    setup_with_policy(env, PolicyConfig::latest())
}

impl<'a> Ctx<'a> {
    /// Lists a fresh market at `price` with collateral factor `cf`.
    fn list(&self, price: u128, cf: u128) -> MockMarketClient<'a> {
        let id = self.env.register(MockMarket, ());
        let market = MockMarketClient::new(self.env, &id);
        market.initialize(&self.comp.address);
        self.comp.support_market(&self.admin, &id);
        self.oracle.set_underlying_price(&id, &price);
        if cf > 0 {
            self.comp.set_collateral_factor(&self.admin, &id, &cf);
        }
        market
    }

    fn roll_to(&self, block: u32) {
        self.env.ledger().set_sequence_number(block);
    }
}

fn u256(env: &Env, v: u128) -> U256 {
    U256::from_u128(env, v)
}

// ---------------------------------------------------------------------------
// Liquidity

#[test]
fn test_collateral_minus_hypothetical_borrow() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(100 * E18, E18 / 2);
    let b = ctx.list(E18, 0);
    a.set_account(&user, &10, &0);
    ctx.comp
        .enter_markets(&user, &vec![&env, a.address.clone(), b.address.clone()]);

    // 10 tokens * 1.0 * $100 * 0.5 = 500
    assert_eq!(ctx.comp.get_account_liquidity(&user), (500, 0));
    assert_eq!(
        ctx.comp.get_hypothetical_liquidity(&user, &b.address, &0, &400),
        (100, 0)
    );
    assert_eq!(
        ctx.comp.get_hypothetical_liquidity(&user, &b.address, &0, &450),
        (50, 0)
    );
    assert_eq!(
        ctx.comp.get_hypothetical_liquidity(&user, &b.address, &0, &600),
        (0, 100)
    );

    assert_eq!(
        ctx.comp.try_borrow_allowed(&b.address, &user, &600, &None),
        Err(Ok(Error::InsufficientLiquidity))
    );
    ctx.comp.borrow_allowed(&b.address, &user, &450, &None);
}

#[test]
fn test_redeem_effect_counts_against_collateral() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(100 * E18, E18 / 2);
    let b = ctx.list(E18, 0);
    a.set_account(&user, &10, &0);
    b.set_account(&user, &0, &300);
    ctx.comp
        .enter_markets(&user, &vec![&env, a.address.clone(), b.address.clone()]);

    assert_eq!(ctx.comp.get_account_liquidity(&user), (200, 0));
    // Each token backs 50 of borrowing power.
    assert_eq!(
        ctx.comp.get_hypothetical_liquidity(&user, &a.address, &4, &0),
        (0, 0)
    );
    assert_eq!(
        ctx.comp.get_hypothetical_liquidity(&user, &a.address, &5, &0),
        (0, 50)
    );
    ctx.comp.redeem_allowed(&a.address, &user, &4, &None);
    assert_eq!(
        ctx.comp.try_redeem_allowed(&a.address, &user, &5, &None),
        Err(Ok(Error::InsufficientLiquidity))
    );
    assert_eq!(
        ctx.comp.try_transfer_allowed(&a.address, &user, &ctx.admin, &5, &None),
        Err(Ok(Error::InsufficientLiquidity))
    );
}

#[test]
fn test_liquidity_and_shortfall_are_exclusive() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(3 * E18, 3 * E18 / 4);
    let b = ctx.list(7 * E18, 0);
    a.set_account(&user, &1_000, &0);
    ctx.comp
        .enter_markets(&user, &vec![&env, a.address.clone(), b.address.clone()]);

    for borrows in [0u128, 100, 321, 322, 323, 1_000] {
        b.set_account(&user, &0, &borrows);
        let (liquidity, shortfall) = ctx.comp.get_account_liquidity(&user);
        assert!(liquidity == 0 || shortfall == 0);
    }
}

#[test]
fn test_non_member_supply_does_not_count() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    a.set_account(&user, &1_000, &0);
    assert_eq!(ctx.comp.get_account_liquidity(&user), (0, 0));
    // Not a member, so redeeming everything is fine.
    ctx.comp.redeem_allowed(&a.address, &user, &1_000, &None);
}

#[test]
fn test_snapshot_failure_aborts_liquidity() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, E18 / 2);
    a.set_account(&user, &100, &0);
    ctx.comp
        .enter_markets(&user, &vec![&env, a.address.clone(), b.address.clone()]);

    b.set_snapshot_fails(&true);
    assert_eq!(
        ctx.comp.try_get_account_liquidity(&user),
        Err(Ok(Error::SnapshotError))
    );
}

#[test]
fn test_missing_price_aborts_liquidity() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    a.set_account(&user, &100, &0);
    ctx.comp.enter_markets(&user, &vec![&env, a.address.clone()]);

    ctx.oracle.set_underlying_price(&a.address, &0);
    assert_eq!(
        ctx.comp.try_get_account_liquidity(&user),
        Err(Ok(Error::PriceUnavailable))
    );
}

#[test]
fn test_stablecoin_debt_counts_at_par() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);
    let controller = Address::generate(&env);

    assert_eq!(
        ctx.comp.try_set_minted_stablecoin_of(&user, &100),
        Err(Ok(Error::Unauthorized))
    );

    let a = ctx.list(E18, E18 / 2);
    a.set_account(&user, &1_000, &0);
    ctx.comp.enter_markets(&user, &vec![&env, a.address.clone()]);
    ctx.comp.set_stablecoin_controller(&ctx.admin, &controller);

    ctx.comp.set_minted_stablecoin_of(&user, &100);
    assert_eq!(ctx.comp.minted_stablecoin_of(&user), 100);
    assert_eq!(ctx.comp.get_account_liquidity(&user), (400, 0));

    ctx.comp.set_minted_stablecoin_of(&user, &600);
    assert_eq!(ctx.comp.get_account_liquidity(&user), (0, 100));
}

// ---------------------------------------------------------------------------
// Registry and administration

#[test]
fn test_support_market_rules() {
    let env = Env::default();
    let ctx = setup(&env);

    let a = ctx.list(E18, 0);
    assert_eq!(
        ctx.comp.try_support_market(&ctx.admin, &a.address),
        Err(Ok(Error::MarketAlreadyListed))
    );

    let fake_id = env.register(MockMarket, ());
    let fake = MockMarketClient::new(&env, &fake_id);
    fake.initialize(&ctx.comp.address);
    fake.set_is_market(&false);
    assert_eq!(
        ctx.comp.try_support_market(&ctx.admin, &fake_id),
        Err(Ok(Error::InvalidMarket))
    );

    let stranger = Address::generate(&env);
    let other_id = env.register(MockMarket, ());
    assert_eq!(
        ctx.comp.try_support_market(&stranger, &other_id),
        Err(Ok(Error::Unauthorized))
    );

    assert_eq!(ctx.comp.get_all_markets(), vec![&env, a.address.clone()]);
    let info = ctx.comp.market_info(&a.address).unwrap();
    assert!(info.listed);
    assert!(info.reward_eligible);
    assert_eq!(info.collateral_factor, 0);
}

#[test]
fn test_collateral_factor_validation() {
    let env = Env::default();
    let ctx = setup(&env);

    let a = ctx.list(E18, 0);
    assert_eq!(
        ctx.comp
            .try_set_collateral_factor(&ctx.admin, &a.address, &(9 * E18 / 10 + 1)),
        Err(Ok(Error::InvalidCollateralFactor))
    );
    ctx.comp
        .set_collateral_factor(&ctx.admin, &a.address, &(9 * E18 / 10));

    ctx.oracle.set_underlying_price(&a.address, &0);
    assert_eq!(
        ctx.comp
            .try_set_collateral_factor(&ctx.admin, &a.address, &(E18 / 2)),
        Err(Ok(Error::PriceUnavailable))
    );
    // Zeroing needs no price.
    ctx.comp.set_collateral_factor(&ctx.admin, &a.address, &0);

    let unlisted = Address::generate(&env);
    assert_eq!(
        ctx.comp
            .try_set_collateral_factor(&ctx.admin, &unlisted, &(E18 / 2)),
        Err(Ok(Error::MarketNotListed))
    );
}

#[test]
fn test_close_factor_and_incentive_bounds() {
    let env = Env::default();
    let ctx = setup(&env);

    assert_eq!(ctx.comp.close_factor(), E18 / 2);
    assert_eq!(
        ctx.comp.try_set_close_factor(&ctx.admin, &(E18 / 100)),
        Err(Ok(Error::InvalidCloseFactor))
    );
    assert_eq!(
        ctx.comp.try_set_close_factor(&ctx.admin, &E18),
        Err(Ok(Error::InvalidCloseFactor))
    );
    ctx.comp.set_close_factor(&ctx.admin, &(E18 / 4));
    assert_eq!(ctx.comp.close_factor(), E18 / 4);

    assert_eq!(
        ctx.comp.try_set_liquidation_incentive(&ctx.admin, &(E18 * 2)),
        Err(Ok(Error::InvalidLiquidationIncentive))
    );
    ctx.comp
        .set_liquidation_incentive(&ctx.admin, &(E18 * 11 / 10));
    assert_eq!(ctx.comp.liquidation_incentive(), E18 * 11 / 10);

    let stranger = Address::generate(&env);
    assert_eq!(
        ctx.comp.try_set_close_factor(&stranger, &(E18 / 4)),
        Err(Ok(Error::Unauthorized))
    );
}

#[test]
fn test_close_factor_unbounded_when_policy_allows() {
    let env = Env::default();
    let mut policy = PolicyConfig::latest();
    policy.enforce_close_factor_bounds = false;
    let ctx = setup_with_policy(&env, policy);

    ctx.comp.set_close_factor(&ctx.admin, &E18);
    assert_eq!(ctx.comp.close_factor(), E18);
}

#[test]
fn test_guardian_pauses_admin_unpauses() {
    let env = Env::default();
    let ctx = setup(&env);
    let guardian = Address::generate(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    ctx.comp.set_pause_guardian(&ctx.admin, &guardian);

    let scope = PauseScope::Mint(a.address.clone());
    ctx.comp.set_pause(&guardian, &scope, &true);
    assert!(ctx.comp.is_paused(&scope));
    assert_eq!(
        ctx.comp.try_mint_allowed(&a.address, &user, &1, &None),
        Err(Ok(Error::MintPaused))
    );

    assert_eq!(
        ctx.comp.try_set_pause(&guardian, &scope, &false),
        Err(Ok(Error::Unauthorized))
    );
    ctx.comp.set_pause(&ctx.admin, &scope, &false);
    ctx.comp.mint_allowed(&a.address, &user, &1, &None);

    let stranger = Address::generate(&env);
    assert_eq!(
        ctx.comp.try_set_pause(&stranger, &PauseScope::Protocol, &true),
        Err(Ok(Error::Unauthorized))
    );
}

#[test]
fn test_pause_scopes_gate_their_hooks() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);
    let liquidator = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, E18 / 2);

    ctx.comp
        .set_pause(&ctx.admin, &PauseScope::Borrow(b.address.clone()), &true);
    assert_eq!(
        ctx.comp.try_borrow_allowed(&b.address, &user, &1, &None),
        Err(Ok(Error::BorrowPaused))
    );

    ctx.comp.set_pause(&ctx.admin, &PauseScope::Transfer, &true);
    assert_eq!(
        ctx.comp.try_transfer_allowed(&a.address, &user, &liquidator, &1, &None),
        Err(Ok(Error::TransferPaused))
    );

    ctx.comp.set_pause(&ctx.admin, &PauseScope::Seize, &true);
    assert_eq!(
        ctx.comp
            .try_seize_allowed(&a.address, &b.address, &liquidator, &user, &1, &None),
        Err(Ok(Error::SeizePaused))
    );

    ctx.comp.set_pause(&ctx.admin, &PauseScope::Protocol, &true);
    assert!(ctx.comp.protocol_paused());
    assert_eq!(
        ctx.comp.try_mint_allowed(&a.address, &user, &1, &None),
        Err(Ok(Error::ProtocolPaused))
    );
    assert_eq!(
        ctx.comp.try_repay_borrow_allowed(&a.address, &user, &user, &1, &None),
        Err(Ok(Error::ProtocolPaused))
    );

    let unlisted = Address::generate(&env);
    assert_eq!(
        ctx.comp
            .try_set_pause(&ctx.admin, &PauseScope::Mint(unlisted), &true),
        Err(Ok(Error::MarketNotListed))
    );
}

#[test]
fn test_borrow_cap() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);
    let other = Address::generate(&env);
    let cap_guardian = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, 0);
    a.set_account(&user, &10_000, &0);
    b.set_account(&other, &0, &900);
    ctx.comp.enter_markets(&user, &vec![&env, a.address.clone()]);

    ctx.comp.set_borrow_cap_guardian(&ctx.admin, &cap_guardian);
    assert_eq!(
        ctx.comp.try_set_market_borrow_caps(
            &cap_guardian,
            &vec![&env, b.address.clone()],
            &vec![&env]
        ),
        Err(Ok(Error::InvalidInput))
    );
    ctx.comp.set_market_borrow_caps(
        &cap_guardian,
        &vec![&env, b.address.clone()],
        &vec![&env, 1_000u128],
    );
    assert_eq!(ctx.comp.borrow_cap(&b.address), 1_000);

    assert_eq!(
        ctx.comp.try_borrow_allowed(&b.address, &user, &100, &None),
        Err(Ok(Error::BorrowCapReached))
    );
    ctx.comp.borrow_allowed(&b.address, &user, &99, &None);

    ctx.comp.set_market_borrow_caps(
        &ctx.admin,
        &vec![&env, b.address.clone()],
        &vec![&env, 0u128],
    );
    ctx.comp.borrow_allowed(&b.address, &user, &1_000, &None);
}

#[test]
fn test_borrow_requires_price() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, 0);
    a.set_account(&user, &1_000, &0);
    ctx.comp.enter_markets(&user, &vec![&env, a.address.clone()]);

    ctx.oracle.set_underlying_price(&b.address, &0);
    assert_eq!(
        ctx.comp.try_borrow_allowed(&b.address, &user, &1, &None),
        Err(Ok(Error::PriceUnavailable))
    );
}

// ---------------------------------------------------------------------------
// Membership

#[test]
fn test_enter_exit_round_trip() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, E18 / 2);
    let c = ctx.list(E18, E18 / 2);

    ctx.comp.enter_markets(
        &user,
        &vec![&env, a.address.clone(), b.address.clone(), c.address.clone()],
    );
    // Entering again changes nothing.
    ctx.comp.enter_markets(&user, &vec![&env, a.address.clone()]);
    assert_eq!(ctx.comp.get_assets_in(&user).len(), 3);
    assert!(ctx.comp.check_membership_consistency(&user));

    ctx.comp.exit_market(&user, &a.address);
    // Last entry moved into the vacated slot.
    assert_eq!(
        ctx.comp.get_assets_in(&user),
        vec![&env, c.address.clone(), b.address.clone()]
    );
    assert!(!ctx.comp.check_membership(&user, &a.address));
    assert!(ctx.comp.check_membership_consistency(&user));

    ctx.comp.exit_market(&user, &b.address);
    ctx.comp.exit_market(&user, &c.address);
    assert_eq!(ctx.comp.get_assets_in(&user).len(), 0);
    assert!(ctx.comp.check_membership_consistency(&user));

    // Exiting a market the account is not in is a no-op.
    ctx.comp.exit_market(&user, &a.address);
}

#[test]
fn test_exit_market_rules() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, 0);
    a.set_account(&user, &1_000, &0);
    b.set_account(&user, &0, &400);
    ctx.comp
        .enter_markets(&user, &vec![&env, a.address.clone(), b.address.clone()]);

    assert_eq!(
        ctx.comp.try_exit_market(&user, &b.address),
        Err(Ok(Error::NonzeroBorrowBalance))
    );
    assert_eq!(
        ctx.comp.try_exit_market(&user, &a.address),
        Err(Ok(Error::InsufficientLiquidity))
    );
    assert_eq!(ctx.comp.get_assets_in(&user).len(), 2);

    b.set_account(&user, &0, &0);
    ctx.comp.exit_market(&user, &a.address);
    assert_eq!(ctx.comp.get_assets_in(&user), vec![&env, b.address.clone()]);

    let unlisted = Address::generate(&env);
    assert_eq!(
        ctx.comp
            .try_enter_markets(&user, &vec![&env, a.address.clone(), unlisted]),
        Err(Ok(Error::MarketNotListed))
    );
    // The failed batch left nothing behind.
    assert!(!ctx.comp.check_membership(&user, &a.address));
}

#[test]
fn test_max_assets_cap() {
    let env = Env::default();
    let mut policy = PolicyConfig::latest();
    policy.enforce_max_assets_cap = true;
    policy.max_assets = 2;
    let ctx = setup_with_policy(&env, policy);
    let user = Address::generate(&env);

    let a = ctx.list(E18, 0);
    let b = ctx.list(E18, 0);
    let c = ctx.list(E18, 0);
    ctx.comp
        .enter_markets(&user, &vec![&env, a.address.clone(), b.address.clone()]);
    assert_eq!(
        ctx.comp.try_enter_markets(&user, &vec![&env, c.address.clone()]),
        Err(Ok(Error::TooManyAssets))
    );

    ctx.comp.set_max_assets(&ctx.admin, &3);
    ctx.comp.enter_markets(&user, &vec![&env, c.address.clone()]);
    assert_eq!(ctx.comp.policy().max_assets, 3);
}

#[test]
fn test_borrow_enters_market_automatically() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, 0);
    a.set_account(&user, &1_000, &0);
    ctx.comp.enter_markets(&user, &vec![&env, a.address.clone()]);

    ctx.comp.borrow_allowed(&b.address, &user, &100, &None);
    assert!(ctx.comp.check_membership(&user, &b.address));
    assert!(ctx.comp.check_membership_consistency(&user));
}

// ---------------------------------------------------------------------------
// Liquidation

#[test]
fn test_liquidation_requires_shortfall() {
    let env = Env::default();
    let ctx = setup(&env);
    let borrower = Address::generate(&env);
    let liquidator = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, 0);
    a.set_account(&borrower, &1_000, &0);
    b.set_account(&borrower, &0, &400);
    ctx.comp
        .enter_markets(&borrower, &vec![&env, a.address.clone(), b.address.clone()]);

    assert_eq!(
        ctx.comp.try_liquidate_borrow_allowed(
            &b.address,
            &a.address,
            &liquidator,
            &borrower,
            &100,
            &None
        ),
        Err(Ok(Error::InsufficientShortfall))
    );
    assert_eq!(ctx.comp.get_account_liquidity(&borrower), (100, 0));
    assert_eq!(ctx.comp.reward_accrued(&borrower), 0);
}

#[test]
fn test_liquidation_respects_close_factor() {
    let env = Env::default();
    let ctx = setup(&env);
    let borrower = Address::generate(&env);
    let liquidator = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, 0);
    a.set_account(&borrower, &1_000, &0);
    b.set_account(&borrower, &0, &1_000);
    ctx.comp
        .enter_markets(&borrower, &vec![&env, a.address.clone(), b.address.clone()]);
    assert_eq!(ctx.comp.get_account_liquidity(&borrower), (0, 500));

    assert_eq!(
        ctx.comp.try_liquidate_borrow_allowed(
            &b.address,
            &a.address,
            &liquidator,
            &borrower,
            &600,
            &None
        ),
        Err(Ok(Error::TooMuchRepay))
    );
    ctx.comp
        .liquidate_borrow_allowed(&b.address, &a.address, &liquidator, &borrower, &500, &None);

    let unlisted = Address::generate(&env);
    assert_eq!(
        ctx.comp
            .try_liquidate_borrow_allowed(&unlisted, &a.address, &liquidator, &borrower, &1, &None),
        Err(Ok(Error::MarketNotListed))
    );
}

#[test]
fn test_stablecoin_controller_stands_in_for_borrowed_market() {
    let env = Env::default();
    let ctx = setup(&env);
    let borrower = Address::generate(&env);
    let liquidator = Address::generate(&env);
    let controller = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    a.set_account(&borrower, &1_000, &0);
    ctx.comp.enter_markets(&borrower, &vec![&env, a.address.clone()]);
    ctx.comp.set_stablecoin_controller(&ctx.admin, &controller);
    ctx.comp.set_minted_stablecoin_of(&borrower, &1_000);

    assert_eq!(
        ctx.comp.try_liquidate_borrow_allowed(
            &controller,
            &a.address,
            &liquidator,
            &borrower,
            &501,
            &None
        ),
        Err(Ok(Error::TooMuchRepay))
    );
    ctx.comp
        .liquidate_borrow_allowed(&controller, &a.address, &liquidator, &borrower, &500, &None);
    // No comptroller comparison against the controller.
    ctx.comp
        .seize_allowed(&a.address, &controller, &liquidator, &borrower, &10, &None);
}

#[test]
fn test_seize_requires_same_comptroller() {
    let env = Env::default();
    let ctx = setup(&env);
    let borrower = Address::generate(&env);
    let liquidator = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, 0);
    ctx.comp
        .seize_allowed(&a.address, &b.address, &liquidator, &borrower, &1, &None);

    b.set_comptroller(&Address::generate(&env));
    assert_eq!(
        ctx.comp
            .try_seize_allowed(&a.address, &b.address, &liquidator, &borrower, &1, &None),
        Err(Ok(Error::ComptrollerMismatch))
    );
}

#[test]
fn test_seize_token_calculation() {
    let env = Env::default();
    let ctx = setup(&env);

    let collateral = ctx.list(2 * E18, E18 / 2);
    let borrowed = ctx.list(E18, 0);
    ctx.comp
        .set_liquidation_incentive(&ctx.admin, &(E18 * 11 / 10));

    // 1.1 * $1 / ($2 * 1.0) * 100 = 55
    assert_eq!(
        ctx.comp
            .liquidate_calculate_seize_tokens(&borrowed.address, &collateral.address, &100),
        55
    );
    // Exchange rate 2.0 halves the tokens.
    collateral.set_exchange_rate(&(2 * E18));
    assert_eq!(
        ctx.comp
            .liquidate_calculate_seize_tokens(&borrowed.address, &collateral.address, &100),
        27
    );
    assert_eq!(
        ctx.comp.stablecoin_seize_tokens(&collateral.address, &100),
        27
    );

    ctx.oracle.set_underlying_price(&borrowed.address, &0);
    assert_eq!(
        ctx.comp.try_liquidate_calculate_seize_tokens(
            &borrowed.address,
            &collateral.address,
            &100
        ),
        Err(Ok(Error::PriceUnavailable))
    );
}

#[test]
#[should_panic]
fn test_redeem_verify_rejects_zero_tokens() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);
    let a = ctx.list(E18, 0);

    ctx.comp.redeem_verify(&a.address, &user, &0, &0);
    ctx.comp.redeem_verify(&a.address, &user, &5, &0);
}

// ---------------------------------------------------------------------------
// Rewards

#[test]
fn test_supply_index_skips_empty_pool_then_accrues() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    ctx.comp.set_reward_speeds(&ctx.admin, &a.address, &10, &0);

    // Five blocks over an empty pool: block advances, index does not.
    ctx.roll_to(105);
    ctx.comp
        .claim_rewards(&vec![&env], &vec![&env, a.address.clone()], &false, &true);
    let state = ctx.comp.reward_supply_state(&a.address);
    assert_eq!(state.index, u256(&env, E36));
    assert_eq!(state.block, 105);

    a.set_account(&user, &100, &0);
    ctx.roll_to(106);
    ctx.comp.mint_allowed(&a.address, &user, &0, &None);

    // 10 / 100 = 0.1 added to the index
    let state = ctx.comp.reward_supply_state(&a.address);
    assert_eq!(state.index, u256(&env, E36 + E36 / 10));
    assert_eq!(state.block, 106);
    assert_eq!(
        ctx.comp.reward_supplier_index(&a.address, &user),
        u256(&env, E36 + E36 / 10)
    );
    assert_eq!(ctx.comp.reward_accrued(&user), 10);
}

#[test]
fn test_index_update_is_idempotent_within_block() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    a.set_account(&user, &100, &0);
    ctx.comp.set_reward_speeds(&ctx.admin, &a.address, &10, &0);

    ctx.roll_to(110);
    ctx.comp.mint_allowed(&a.address, &user, &0, &None);
    let first = ctx.comp.reward_supply_state(&a.address);
    let accrued = ctx.comp.reward_accrued(&user);
    assert_eq!(accrued, 100);

    ctx.comp.mint_allowed(&a.address, &user, &0, &None);
    ctx.comp.redeem_allowed(&a.address, &user, &0, &None);
    assert_eq!(ctx.comp.reward_supply_state(&a.address), first);
    assert_eq!(ctx.comp.reward_accrued(&user), accrued);

    // Monotone over time.
    ctx.roll_to(111);
    ctx.comp.mint_allowed(&a.address, &user, &0, &None);
    let second = ctx.comp.reward_supply_state(&a.address);
    assert!(second.index > first.index);
}

#[test]
fn test_zero_speed_only_moves_block() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    a.set_account(&user, &100, &0);
    ctx.roll_to(120);
    ctx.comp.mint_allowed(&a.address, &user, &0, &None);

    let state = ctx.comp.reward_supply_state(&a.address);
    assert_eq!(state.index, u256(&env, E36));
    assert_eq!(state.block, 120);
    assert_eq!(ctx.comp.reward_accrued(&user), 0);
}

#[test]
fn test_borrower_needs_checkpoint_before_earning() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, 0);
    a.set_account(&user, &0, &100);
    ctx.comp.set_reward_speeds(&ctx.admin, &a.address, &0, &10);

    ctx.roll_to(101);
    ctx.comp.repay_borrow_allowed(&a.address, &user, &user, &0, &None);
    assert_eq!(
        ctx.comp.reward_borrow_state(&a.address).index,
        u256(&env, E36 + E36 / 10)
    );
    assert_eq!(ctx.comp.reward_accrued(&user), 0);

    ctx.roll_to(102);
    ctx.comp.repay_borrow_allowed(&a.address, &user, &user, &0, &None);
    assert_eq!(ctx.comp.reward_accrued(&user), 10);

    // Principal is measured against the market's interest index.
    a.set_borrow_index(&(2 * E18));
    ctx.roll_to(103);
    ctx.comp.repay_borrow_allowed(&a.address, &user, &user, &0, &None);
    // pool = 100 / 2.0 = 50, ratio = 10 / 50 = 0.2, share = 50 * 0.2 = 10
    assert_eq!(ctx.comp.reward_accrued(&user), 20);
}

#[test]
fn test_claim_pays_nothing_when_treasury_short() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let token_admin = Address::generate(&env);
    let reward = env
        .register_stellar_asset_contract_v2(token_admin.clone())
        .address();
    let reward_admin = token::StellarAssetClient::new(&env, &reward);
    let reward_token = token::Client::new(&env, &reward);
    ctx.comp.set_reward_token(&ctx.admin, &reward);
    reward_admin.mint(&ctx.comp.address, &5);

    let a = ctx.list(E18, E18 / 2);
    a.set_account(&user, &100, &0);
    ctx.comp.set_reward_speeds(&ctx.admin, &a.address, &10, &0);
    ctx.roll_to(101);

    let markets = vec![&env, a.address.clone()];
    let owed = ctx
        .comp
        .claim_rewards(&vec![&env, user.clone()], &markets, &false, &true);
    assert_eq!(owed, vec![&env, 10u128]);
    assert_eq!(ctx.comp.reward_accrued(&user), 10);
    assert_eq!(reward_token.balance(&user), 0);
    assert_eq!(reward_token.balance(&ctx.comp.address), 5);

    reward_admin.mint(&ctx.comp.address, &15);
    let owed = ctx
        .comp
        .claim_rewards(&vec![&env, user.clone()], &markets, &false, &true);
    assert_eq!(owed, vec![&env, 0u128]);
    assert_eq!(ctx.comp.reward_accrued(&user), 0);
    assert_eq!(reward_token.balance(&user), 10);

    // Everything in one call.
    ctx.roll_to(102);
    assert_eq!(ctx.comp.claim_rewards_all(&user), 0);
    assert_eq!(reward_token.balance(&user), 20);
}

#[test]
fn test_grant_reward_all_or_nothing() {
    let env = Env::default();
    let ctx = setup(&env);
    let recipient = Address::generate(&env);

    let token_admin = Address::generate(&env);
    let reward = env
        .register_stellar_asset_contract_v2(token_admin.clone())
        .address();
    ctx.comp.set_reward_token(&ctx.admin, &reward);
    token::StellarAssetClient::new(&env, &reward).mint(&ctx.comp.address, &50);

    assert_eq!(
        ctx.comp.try_grant_reward(&ctx.admin, &recipient, &51),
        Err(Ok(Error::InsufficientRewardBalance))
    );
    ctx.comp.grant_reward(&ctx.admin, &recipient, &50);
    assert_eq!(token::Client::new(&env, &reward).balance(&recipient), 50);
}

#[test]
fn test_reward_market_eligibility() {
    let env = Env::default();
    let mut policy = PolicyConfig::latest();
    policy.reward_all_markets_by_default = false;
    let ctx = setup_with_policy(&env, policy);

    let a = ctx.list(E18, 0);
    assert_eq!(
        ctx.comp.try_set_reward_speeds(&ctx.admin, &a.address, &1, &1),
        Err(Ok(Error::MarketNotRewardEligible))
    );

    ctx.comp
        .add_reward_markets(&ctx.admin, &vec![&env, a.address.clone()]);
    ctx.comp.set_reward_speeds(&ctx.admin, &a.address, &3, &4);
    assert_eq!(ctx.comp.reward_speeds(&a.address), (3, 4));

    ctx.comp.drop_reward_market(&ctx.admin, &a.address);
    assert_eq!(ctx.comp.reward_speeds(&a.address), (0, 0));
    assert!(!ctx.comp.market_info(&a.address).unwrap().reward_eligible);
    assert!(ctx.comp.market_info(&a.address).unwrap().listed);
}

#[test]
fn test_speed_change_settles_at_old_speed() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, 0);
    a.set_account(&user, &100, &0);
    ctx.comp.set_reward_speeds(&ctx.admin, &a.address, &10, &0);

    ctx.roll_to(102);
    ctx.comp.set_reward_speeds(&ctx.admin, &a.address, &50, &0);
    // Two blocks at 10 per block over 100 tokens.
    assert_eq!(
        ctx.comp.reward_supply_state(&a.address).index,
        u256(&env, E36 + E36 / 5)
    );
}

#[test]
fn test_transfer_and_seize_distribute_to_both_sides() {
    let env = Env::default();
    let ctx = setup(&env);
    let src = Address::generate(&env);
    let dst = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, 0);
    a.set_account(&src, &60, &0);
    a.set_account(&dst, &40, &0);
    ctx.comp.set_reward_speeds(&ctx.admin, &a.address, &10, &0);

    ctx.roll_to(110);
    ctx.comp.transfer_allowed(&a.address, &src, &dst, &10, &None);
    // 100 reward over 100 tokens: 1 per token
    assert_eq!(ctx.comp.reward_accrued(&src), 60);
    assert_eq!(ctx.comp.reward_accrued(&dst), 40);

    ctx.roll_to(120);
    ctx.comp.seize_allowed(&a.address, &b.address, &dst, &src, &1, &None);
    assert_eq!(ctx.comp.reward_accrued(&src), 120);
    assert_eq!(ctx.comp.reward_accrued(&dst), 80);
}

// ---------------------------------------------------------------------------
// Gates invoked by the market itself

#[test]
fn test_market_drives_every_gate() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);
    let other = Address::generate(&env);
    let liquidator = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, E18 / 2);
    ctx.comp.set_reward_speeds(&ctx.admin, &a.address, &10, &0);
    ctx.comp.enter_markets(&user, &vec![&env, a.address.clone()]);

    a.mint(&user, &1_000);
    assert_eq!(a.balance_of(&user), 1_000);

    // Entered into `b` by the market on the way.
    b.borrow(&user, &300);
    assert!(ctx.comp.check_membership(&user, &b.address));
    assert_eq!(ctx.comp.get_account_liquidity(&user), (200, 0));

    // Supply index moves on the hinted total supply of 1000.
    ctx.roll_to(110);
    a.redeem(&user, &100);
    assert_eq!(ctx.comp.reward_accrued(&user), 100);
    assert_eq!(ctx.comp.get_account_liquidity(&user), (150, 0));

    a.transfer(&user, &other, &100);
    b.repay_borrow(&user, &user, &100);
    assert_eq!(a.balance_of(&other), 100);
    assert_eq!(ctx.comp.get_account_liquidity(&user), (200, 0));

    // 800 * 0.4 * 0.5 = 160 against 200
    ctx.oracle.set_underlying_price(&a.address, &(E18 * 2 / 5));
    assert_eq!(ctx.comp.get_account_liquidity(&user), (0, 40));

    // 100 at $1 for tokens at $0.4
    let seized = b.liquidate_borrow(&liquidator, &user, &100, &a.address);
    assert_eq!(seized, 250);
    assert_eq!(a.balance_of(&user), 550);
    assert_eq!(a.balance_of(&liquidator), 250);
    assert_eq!(b.borrow_balance_stored(&user), 100);
    assert_eq!(ctx.comp.get_account_liquidity(&user), (10, 0));
}

#[test]
fn test_market_gate_rejection_leaves_balances() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let b = ctx.list(E18, 0);
    ctx.comp.enter_markets(&user, &vec![&env, a.address.clone()]);
    a.mint(&user, &100);

    ctx.comp
        .set_pause(&ctx.admin, &PauseScope::Mint(a.address.clone()), &true);
    assert!(a.try_mint(&user, &1).is_err());
    assert_eq!(a.balance_of(&user), 100);

    // 100 * 0.5 = 50 of borrowing power
    assert!(b.try_borrow(&user, &51).is_err());
    assert_eq!(b.borrow_balance_stored(&user), 0);
    assert!(!ctx.comp.check_membership(&user, &b.address));
}

#[test]
fn test_only_the_market_may_auto_enter() {
    let env = Env::default();
    let ctx = setup(&env);
    let outsider = Address::generate(&env);

    let b = ctx.list(E18, 0);
    env.set_auths(&[]);

    assert!(ctx
        .comp
        .try_borrow_allowed(&b.address, &outsider, &0, &None)
        .is_err());
    assert!(!ctx.comp.check_membership(&outsider, &b.address));

    // The market is the invoker, so no signature is needed.
    b.borrow(&outsider, &0);
    assert!(ctx.comp.check_membership(&outsider, &b.address));
}

#[test]
fn test_hint_must_cover_accounts_read() {
    let env = Env::default();
    let ctx = setup(&env);
    let user = Address::generate(&env);

    let a = ctx.list(E18, E18 / 2);
    let hint = MarketHint {
        market: a.address.clone(),
        comptroller: ctx.comp.address.clone(),
        exchange_rate: E18,
        total_supply: 0,
        total_borrows: 0,
        borrow_index: E18,
        accounts: Vec::new(&env),
    };
    assert_eq!(
        ctx.comp
            .try_mint_allowed(&a.address, &user, &1, &Some(hint.clone())),
        Err(Ok(Error::IncompleteMarketHint))
    );

    let mut hint = hint;
    hint.accounts.push_back(AccountHint {
        account: user.clone(),
        token_balance: 0,
        borrow_balance: 0,
    });
    ctx.comp.mint_allowed(&a.address, &user, &1, &Some(hint));
}
