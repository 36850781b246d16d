//! Action gates. Each gate checks pauses, then listing, then the action's
//! own rule, and only then touches reward indices. A rejected gate returns
//! before any write so the invocation leaves no trace.
//!
//! Markets call the gates before they move balances and pass their own state
//! as a [`MarketHint`]; everything about the calling market is read from it.
//! `seize_allowed` is called by the borrowed market (or the stablecoin
//! controller) before it asks the collateral market to seize.

use fixed_point::{add_u128, Exp, TryDiv, TryMul, MANTISSA_ONE};
use soroban_sdk::{Address, Env};

use crate::error::Error;
use crate::flywheel::{
    distribute_borrower, distribute_supplier, market_borrow_index, update_borrow_index,
    update_supply_index,
};
use crate::interfaces::{underlying_price, MarketClient, MarketHint, MarketReader};
use crate::liquidity::{account_liquidity, hypothetical_account_liquidity};
use crate::membership::add_to_market;
use crate::storage::{self, PauseScope};

fn ensure_not_paused(env: &Env, scope: PauseScope, err: Error) -> Result<(), Error> {
    if storage::is_paused(env, &scope) {
        return Err(err);
    }
    Ok(())
}

fn ensure_protocol_active(env: &Env) -> Result<(), Error> {
    ensure_not_paused(env, PauseScope::Protocol, Error::ProtocolPaused)
}

/// Listed market, or the stablecoin controller standing in for one.
fn ensure_listed_or_controller(env: &Env, market: &Address) -> Result<(), Error> {
    if storage::is_stablecoin_controller(env, market) {
        return Ok(());
    }
    storage::listed_market(env, market).map(|_| ())
}

pub(crate) fn mint_allowed(
    env: &Env,
    market: &Address,
    minter: &Address,
    _mint_amount: u128,
    hint: Option<MarketHint>,
) -> Result<(), Error> {
    ensure_protocol_active(env)?;
    ensure_not_paused(env, PauseScope::Mint(market.clone()), Error::MintPaused)?;
    storage::listed_market(env, market)?;

    let reader = MarketReader::hinted(hint);
    update_supply_index(env, &reader, market)?;
    distribute_supplier(env, &reader, market, minter)
}

/// Redeem rule shared by redeem, transfer and exit: accounts not in the
/// market are free to move tokens; members must stay solvent.
pub(crate) fn redeem_allowed_internal(
    env: &Env,
    reader: &MarketReader,
    market: &Address,
    redeemer: &Address,
    redeem_tokens: u128,
) -> Result<(), Error> {
    storage::listed_market(env, market)?;
    if !storage::is_member(env, market, redeemer) {
        return Ok(());
    }
    let (_, shortfall) =
        hypothetical_account_liquidity(env, reader, redeemer, Some(market), redeem_tokens, 0)?;
    if shortfall > 0 {
        return Err(Error::InsufficientLiquidity);
    }
    Ok(())
}

pub(crate) fn redeem_allowed(
    env: &Env,
    market: &Address,
    redeemer: &Address,
    redeem_tokens: u128,
    hint: Option<MarketHint>,
) -> Result<(), Error> {
    ensure_protocol_active(env)?;
    let reader = MarketReader::hinted(hint);
    redeem_allowed_internal(env, &reader, market, redeemer, redeem_tokens)?;

    update_supply_index(env, &reader, market)?;
    distribute_supplier(env, &reader, market, redeemer)
}

pub(crate) fn borrow_allowed(
    env: &Env,
    market: &Address,
    borrower: &Address,
    borrow_amount: u128,
    hint: Option<MarketHint>,
) -> Result<(), Error> {
    ensure_protocol_active(env)?;
    ensure_not_paused(env, PauseScope::Borrow(market.clone()), Error::BorrowPaused)?;
    storage::listed_market(env, market)?;

    let reader = MarketReader::hinted(hint);
    if !storage::is_member(env, market, borrower) {
        // Only the market itself may enter a borrower on its behalf.
        if !reader.authorised(market) {
            market.require_auth();
        }
        add_to_market(env, market, borrower)?;
    }

    underlying_price(env, market)?;

    let cap = storage::borrow_cap(env, market);
    if cap != 0 {
        let total_borrows = reader.total_borrows(env, market);
        let next_total_borrows = add_u128(total_borrows, borrow_amount)?;
        if next_total_borrows >= cap {
            return Err(Error::BorrowCapReached);
        }
    }

    let (_, shortfall) =
        hypothetical_account_liquidity(env, &reader, borrower, Some(market), 0, borrow_amount)?;
    if shortfall > 0 {
        return Err(Error::InsufficientLiquidity);
    }

    let borrow_index = market_borrow_index(env, &reader, market);
    update_borrow_index(env, &reader, market, borrow_index)?;
    distribute_borrower(env, &reader, market, borrower, borrow_index)
}

pub(crate) fn repay_borrow_allowed(
    env: &Env,
    market: &Address,
    _payer: &Address,
    borrower: &Address,
    _repay_amount: u128,
    hint: Option<MarketHint>,
) -> Result<(), Error> {
    ensure_protocol_active(env)?;
    storage::listed_market(env, market)?;

    let reader = MarketReader::hinted(hint);
    let borrow_index = market_borrow_index(env, &reader, market);
    update_borrow_index(env, &reader, market, borrow_index)?;
    distribute_borrower(env, &reader, market, borrower, borrow_index)
}

pub(crate) fn liquidate_borrow_allowed(
    env: &Env,
    borrowed: &Address,
    collateral: &Address,
    _liquidator: &Address,
    borrower: &Address,
    repay_amount: u128,
    hint: Option<MarketHint>,
) -> Result<(), Error> {
    ensure_protocol_active(env)?;
    ensure_listed_or_controller(env, borrowed)?;
    storage::listed_market(env, collateral)?;

    let reader = MarketReader::hinted(hint);
    let (_, shortfall) = account_liquidity(env, &reader, borrower)?;
    if shortfall == 0 {
        return Err(Error::InsufficientShortfall);
    }

    let borrow_balance = if storage::is_stablecoin_controller(env, borrowed) {
        storage::minted_stablecoin(env, borrower)
    } else {
        reader.borrow_balance(env, borrowed, borrower)?
    };
    let max_close =
        Exp::from_mantissa(storage::close_factor(env)).mul_scalar_truncate(borrow_balance)?;
    if repay_amount > max_close {
        return Err(Error::TooMuchRepay);
    }
    Ok(())
}

pub(crate) fn seize_allowed(
    env: &Env,
    collateral: &Address,
    borrowed: &Address,
    liquidator: &Address,
    borrower: &Address,
    _seize_tokens: u128,
    hint: Option<MarketHint>,
) -> Result<(), Error> {
    ensure_protocol_active(env)?;
    ensure_not_paused(env, PauseScope::Seize, Error::SeizePaused)?;
    storage::listed_market(env, collateral)?;
    ensure_listed_or_controller(env, borrowed)?;

    let reader = MarketReader::hinted(hint);
    if !storage::is_stablecoin_controller(env, borrowed) {
        let collateral_comptroller = reader.comptroller(env, collateral);
        let borrowed_comptroller = reader.comptroller(env, borrowed);
        if collateral_comptroller != borrowed_comptroller {
            return Err(Error::ComptrollerMismatch);
        }
    }

    update_supply_index(env, &reader, collateral)?;
    distribute_supplier(env, &reader, collateral, borrower)?;
    distribute_supplier(env, &reader, collateral, liquidator)
}

pub(crate) fn transfer_allowed(
    env: &Env,
    market: &Address,
    src: &Address,
    dst: &Address,
    transfer_tokens: u128,
    hint: Option<MarketHint>,
) -> Result<(), Error> {
    ensure_protocol_active(env)?;
    ensure_not_paused(env, PauseScope::Transfer, Error::TransferPaused)?;
    let reader = MarketReader::hinted(hint);
    redeem_allowed_internal(env, &reader, market, src, transfer_tokens)?;

    update_supply_index(env, &reader, market)?;
    distribute_supplier(env, &reader, market, src)?;
    distribute_supplier(env, &reader, market, dst)
}

fn seize_tokens_at(
    env: &Env,
    price_borrowed: u128,
    collateral: &Address,
    repay_amount: u128,
) -> Result<u128, Error> {
    let price_collateral = underlying_price(env, collateral)?;
    let exchange_rate = MarketClient::new(env, collateral).exchange_rate_stored();

    let numerator = Exp::from_mantissa(storage::liquidation_incentive(env))
        .try_mul(Exp::from_mantissa(price_borrowed))?;
    let denominator =
        Exp::from_mantissa(price_collateral).try_mul(Exp::from_mantissa(exchange_rate))?;
    let ratio = numerator.try_div(denominator)?;
    Ok(ratio.mul_scalar_truncate(repay_amount)?)
}

/// Collateral tokens to seize for repaying `repay_amount` of `borrowed`.
pub(crate) fn liquidate_calculate_seize_tokens(
    env: &Env,
    borrowed: &Address,
    collateral: &Address,
    repay_amount: u128,
) -> Result<u128, Error> {
    let price_borrowed = underlying_price(env, borrowed)?;
    seize_tokens_at(env, price_borrowed, collateral, repay_amount)
}

/// Same as above with the borrowed asset being the stablecoin at 1.0.
pub(crate) fn liquidate_stablecoin_calculate_seize_tokens(
    env: &Env,
    collateral: &Address,
    repay_amount: u128,
) -> Result<u128, Error> {
    seize_tokens_at(env, MANTISSA_ONE, collateral, repay_amount)
}

pub(crate) fn redeem_verify(redeem_amount: u128, redeem_tokens: u128) {
    if redeem_tokens == 0 && redeem_amount > 0 {
        panic!("redeem tokens zero");
    }
}
