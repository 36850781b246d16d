use fixed_point::{add_u128, mul_u128, Exp, TryMul};
use soroban_sdk::{Address, Env};

use crate::error::Error;
use crate::interfaces::{ComptrollerClient, MarketClient, PriceOracleClient};

/// Basis-point denominator of the comptroller's mint rate.
const MINT_RATE_DENOMINATOR: u128 = 10_000;

/// How much more stablecoin `account` may mint: its supplied value scaled by
/// the mint rate, less everything it already owes (market borrows and prior
/// stablecoin mints). Collateral factors are not applied here.
pub(crate) fn mintable_stablecoin(
    env: &Env,
    comptroller: &Address,
    account: &Address,
) -> Result<u128, Error> {
    let comptroller = ComptrollerClient::new(env, comptroller);
    let oracle = comptroller.oracle().ok_or(Error::PriceUnavailable)?;
    let oracle = PriceOracleClient::new(env, &oracle);

    let mut account_amount: u128 = 0;
    let mut sum_borrow_plus_effects: u128 = 0;

    for market in comptroller.get_assets_in(account).iter() {
        let snapshot = match MarketClient::new(env, &market).try_get_account_snapshot(account) {
            Ok(Ok(snapshot)) => snapshot,
            _ => return Err(Error::SnapshotError),
        };
        let price = match oracle.try_get_underlying_price(&market) {
            Ok(Ok(price)) if price > 0 => Exp::from_mantissa(price),
            _ => return Err(Error::PriceUnavailable),
        };

        let tokens_to_denom = Exp::from_mantissa(snapshot.exchange_rate).try_mul(price)?;
        account_amount = tokens_to_denom.mul_scalar_truncate_add(snapshot.token_balance, account_amount)?;
        sum_borrow_plus_effects =
            price.mul_scalar_truncate_add(snapshot.borrow_balance, sum_borrow_plus_effects)?;
    }

    sum_borrow_plus_effects = add_u128(
        sum_borrow_plus_effects,
        comptroller.minted_stablecoin_of(account),
    )?;

    let capacity =
        mul_u128(account_amount, comptroller.stablecoin_mint_rate())? / MINT_RATE_DENOMINATOR;
    Ok(capacity.saturating_sub(sum_borrow_plus_effects))
}
