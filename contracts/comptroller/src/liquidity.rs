use fixed_point::{add_u128, Exp, TryMul};
use soroban_sdk::{Address, Env};

use crate::error::Error;
use crate::interfaces::{underlying_price, MarketReader};
use crate::storage;

/// Account value as if `redeem_tokens` of `market` were redeemed and
/// `borrow_amount` of it borrowed. Returns `(liquidity, shortfall)`; at most
/// one side is non-zero.
///
/// Markets the account has not entered do not contribute collateral, so a
/// hypothetical market outside the account's assets only counts if the caller
/// entered it first.
pub(crate) fn hypothetical_account_liquidity(
    env: &Env,
    reader: &MarketReader,
    account: &Address,
    market: Option<&Address>,
    redeem_tokens: u128,
    borrow_amount: u128,
) -> Result<(u128, u128), Error> {
    let mut sum_collateral: u128 = 0;
    let mut sum_borrow_plus_effects: u128 = 0;

    for asset in storage::account_assets(env, account).iter() {
        let snapshot = reader.snapshot(env, &asset, account)?;
        let config = storage::listed_market(env, &asset)?;
        let price = Exp::from_mantissa(underlying_price(env, &asset)?);

        let tokens_to_denom = Exp::from_mantissa(config.collateral_factor)
            .try_mul(Exp::from_mantissa(snapshot.exchange_rate))?
            .try_mul(price)?;

        sum_collateral =
            tokens_to_denom.mul_scalar_truncate_add(snapshot.token_balance, sum_collateral)?;
        sum_borrow_plus_effects =
            price.mul_scalar_truncate_add(snapshot.borrow_balance, sum_borrow_plus_effects)?;

        if market == Some(&asset) {
            // Redeeming removes collateral; count it on the debt side.
            sum_borrow_plus_effects =
                tokens_to_denom.mul_scalar_truncate_add(redeem_tokens, sum_borrow_plus_effects)?;
            sum_borrow_plus_effects =
                price.mul_scalar_truncate_add(borrow_amount, sum_borrow_plus_effects)?;
        }
    }

    // Stablecoin debt is valued at 1.0.
    sum_borrow_plus_effects = add_u128(
        sum_borrow_plus_effects,
        storage::minted_stablecoin(env, account),
    )?;

    if sum_collateral > sum_borrow_plus_effects {
        Ok((sum_collateral - sum_borrow_plus_effects, 0))
    } else {
        Ok((0, sum_borrow_plus_effects - sum_collateral))
    }
}

pub(crate) fn account_liquidity(
    env: &Env,
    reader: &MarketReader,
    account: &Address,
) -> Result<(u128, u128), Error> {
    hypothetical_account_liquidity(env, reader, account, None, 0, 0)
}
