//! Reward index bookkeeping.
//!
//! Each listed market carries a supply-side and a borrow-side index that grows
//! by `speed * blocks / pool` every time it is brought current. Accounts keep a
//! checkpoint of the index they were last paid up to; the difference times
//! their balance is what they earned in between.

use fixed_point::{
    add_u128, div_u128_exp, fraction, mul_u128, mul_u128_double, safe224, safe32, Double, Exp,
    TryAdd, TrySub, U256 as RawU256,
};
use soroban_sdk::{token, Address, Env, Vec};

use crate::constants::INITIAL_INDEX;
use crate::error::Error;
use crate::events::{DistributedBorrowerReward, DistributedSupplierReward};
use crate::interfaces::MarketReader;
use crate::storage::{self, IndexState};

fn current_block(env: &Env) -> u64 {
    env.ledger().sequence() as u64
}

fn advance(
    state: IndexState,
    speed: u128,
    pool: impl FnOnce() -> Result<u128, Error>,
    now: u64,
) -> Result<Option<IndexState>, Error> {
    let delta_blocks = now.saturating_sub(state.block as u64);
    if delta_blocks == 0 {
        return Ok(None);
    }
    let block = safe32(now)?;
    if speed == 0 {
        return Ok(Some(IndexState {
            index: state.index,
            block,
        }));
    }
    let accrued = mul_u128(speed, delta_blocks as u128)?;
    let pool = pool()?;
    let ratio = if pool > 0 {
        fraction(accrued, pool)?
    } else {
        Double::zero()
    };
    let index = Double::from_raw(state.index).try_add(ratio)?;
    Ok(Some(IndexState {
        index: safe224(index.mantissa)?,
        block,
    }))
}

/// Brings the supply index of `market` up to the current block.
pub(crate) fn update_supply_index(
    env: &Env,
    reader: &MarketReader,
    market: &Address,
) -> Result<(), Error> {
    let state = storage::supply_state(env, market);
    let speed = storage::supply_speed(env, market);
    let pool = || -> Result<u128, Error> { Ok(reader.total_supply(env, market)) };
    if let Some(next) = advance(state, speed, pool, current_block(env))? {
        storage::set_supply_state(env, market, &next);
    }
    Ok(())
}

/// Brings the borrow index of `market` up to the current block. Borrows are
/// measured in principal, i.e. divided by the market's interest index.
pub(crate) fn update_borrow_index(
    env: &Env,
    reader: &MarketReader,
    market: &Address,
    market_borrow_index: Exp,
) -> Result<(), Error> {
    let state = storage::borrow_state(env, market);
    let speed = storage::borrow_speed(env, market);
    let pool = || -> Result<u128, Error> {
        let total_borrows = reader.total_borrows(env, market);
        Ok(div_u128_exp(total_borrows, market_borrow_index)?)
    };
    if let Some(next) = advance(state, speed, pool, current_block(env))? {
        storage::set_borrow_state(env, market, &next);
    }
    Ok(())
}

pub(crate) fn market_borrow_index(env: &Env, reader: &MarketReader, market: &Address) -> Exp {
    Exp::from_mantissa(reader.borrow_index(env, market))
}

/// Credits `supplier` for supply-side rewards earned since its checkpoint.
pub(crate) fn distribute_supplier(
    env: &Env,
    reader: &MarketReader,
    market: &Address,
    supplier: &Address,
) -> Result<(), Error> {
    let supply_index = storage::supply_state(env, market).index;
    let mut supplier_index = storage::supplier_index(env, market, supplier);
    storage::set_supplier_index(env, market, supplier, &supply_index);

    if supplier_index.is_zero() && !supply_index.is_zero() {
        // Supplied before rewards were tracked for this market.
        supplier_index = RawU256::from(INITIAL_INDEX);
    }

    let delta_index = Double::from_raw(supply_index).try_sub(Double::from_raw(supplier_index))?;
    let supplier_tokens = reader.balance_of(env, market, supplier)?;
    let delta = mul_u128_double(supplier_tokens, delta_index)?;
    let accrued = add_u128(storage::reward_accrued(env, supplier), delta)?;
    storage::set_reward_accrued(env, supplier, accrued);

    DistributedSupplierReward {
        market: market.clone(),
        supplier: supplier.clone(),
        delta,
        supply_index: storage::to_host_u256(env, &supply_index),
    }
    .publish(env);
    Ok(())
}

/// Credits `borrower` for borrow-side rewards. Nothing is earned until the
/// borrower has a checkpoint.
pub(crate) fn distribute_borrower(
    env: &Env,
    reader: &MarketReader,
    market: &Address,
    borrower: &Address,
    market_borrow_index: Exp,
) -> Result<(), Error> {
    let borrow_index = storage::borrow_state(env, market).index;
    let borrower_index = storage::borrower_index(env, market, borrower);
    storage::set_borrower_index(env, market, borrower, &borrow_index);

    if borrower_index.is_zero() {
        return Ok(());
    }

    let delta_index = Double::from_raw(borrow_index).try_sub(Double::from_raw(borrower_index))?;
    let borrow_balance = reader.borrow_balance(env, market, borrower)?;
    let borrower_amount = div_u128_exp(borrow_balance, market_borrow_index)?;
    let delta = mul_u128_double(borrower_amount, delta_index)?;
    let accrued = add_u128(storage::reward_accrued(env, borrower), delta)?;
    storage::set_reward_accrued(env, borrower, accrued);

    DistributedBorrowerReward {
        market: market.clone(),
        borrower: borrower.clone(),
        delta,
        borrow_index: storage::to_host_u256(env, &borrow_index),
    }
    .publish(env);
    Ok(())
}

/// Seeds both index tracks of a market that has none yet.
pub(crate) fn seed_market_states(env: &Env, market: &Address) -> Result<(), Error> {
    let block = safe32(current_block(env))?;
    let initial = IndexState {
        index: RawU256::from(INITIAL_INDEX),
        block,
    };
    if storage::supply_state(env, market).index.is_zero() {
        storage::set_supply_state(env, market, &initial);
    }
    if storage::borrow_state(env, market).index.is_zero() {
        storage::set_borrow_state(env, market, &initial);
    }
    Ok(())
}

/// Pays `amount` out of the treasury. Returns what is still owed: 0 on
/// success, the whole amount when the treasury cannot cover it.
pub(crate) fn grant_reward_internal(
    env: &Env,
    recipient: &Address,
    amount: u128,
) -> Result<u128, Error> {
    if amount == 0 {
        return Ok(0);
    }
    let token_id = match storage::reward_token(env) {
        Some(token_id) => token_id,
        None => return Ok(amount),
    };
    let token = token::Client::new(env, &token_id);
    let treasury = env.current_contract_address();
    let balance = token.balance(&treasury);
    let amount_i128 = i128::try_from(amount).map_err(|_| Error::ArithmeticOverflow)?;
    if amount_i128 > balance {
        return Ok(amount);
    }
    token.transfer(&treasury, recipient, &amount_i128);
    Ok(0)
}

/// Updates and distributes the requested sides for every holder in every
/// market, then pays each holder in full. Returns the amount still owed per
/// holder, in `holders` order.
pub(crate) fn claim_rewards(
    env: &Env,
    holders: &Vec<Address>,
    markets: &Vec<Address>,
    borrowers: bool,
    suppliers: bool,
) -> Result<Vec<u128>, Error> {
    let reader = MarketReader::direct();
    for market in markets.iter() {
        storage::listed_market(env, &market)?;
        if borrowers {
            let borrow_index = market_borrow_index(env, &reader, &market);
            update_borrow_index(env, &reader, &market, borrow_index)?;
            for holder in holders.iter() {
                distribute_borrower(env, &reader, &market, &holder, borrow_index)?;
            }
        }
        if suppliers {
            update_supply_index(env, &reader, &market)?;
            for holder in holders.iter() {
                distribute_supplier(env, &reader, &market, &holder)?;
            }
        }
    }

    let mut owed = Vec::new(env);
    for holder in holders.iter() {
        let accrued = storage::reward_accrued(env, &holder);
        let remaining = grant_reward_internal(env, &holder, accrued)?;
        storage::set_reward_accrued(env, &holder, remaining);
        owed.push_back(remaining);
    }
    Ok(owed)
}
