use soroban_sdk::{panic_with_error, Address, Env};

use crate::error::Error;
use crate::events::{MarketEntered, MarketExited};
use crate::interfaces::MarketReader;
use crate::policy::redeem_allowed_internal;
use crate::storage;

/// Adds `market` to the account's assets. Entering twice is a no-op.
pub(crate) fn add_to_market(env: &Env, market: &Address, account: &Address) -> Result<(), Error> {
    storage::listed_market(env, market)?;
    if storage::is_member(env, market, account) {
        return Ok(());
    }

    let mut assets = storage::account_assets(env, account);
    let policy = storage::policy(env);
    if policy.enforce_max_assets_cap && assets.len() >= policy.max_assets {
        return Err(Error::TooManyAssets);
    }

    // List and flag are written together.
    assets.push_back(market.clone());
    storage::set_account_assets(env, account, &assets);
    storage::set_member(env, market, account, true);

    MarketEntered {
        market: market.clone(),
        account: account.clone(),
    }
    .publish(env);
    Ok(())
}

/// Removes `market` from the account's assets once it holds no debt there
/// and its supply is not backing anything else.
pub(crate) fn exit_market(env: &Env, market: &Address, account: &Address) -> Result<(), Error> {
    let reader = MarketReader::direct();
    let snapshot = reader.snapshot(env, market, account)?;
    if snapshot.borrow_balance != 0 {
        return Err(Error::NonzeroBorrowBalance);
    }

    redeem_allowed_internal(env, &reader, market, account, snapshot.token_balance)?;

    if !storage::is_member(env, market, account) {
        return Ok(());
    }

    let mut assets = storage::account_assets(env, account);
    let index = match assets.first_index_of(market.clone()) {
        Some(index) => index,
        None => panic_with_error!(env, Error::MembershipCorrupted),
    };
    let last = assets.len() - 1;
    if index != last {
        let tail = assets.get_unchecked(last);
        assets.set(index, tail);
    }
    assets.pop_back();

    storage::set_account_assets(env, account, &assets);
    storage::set_member(env, market, account, false);

    MarketExited {
        market: market.clone(),
        account: account.clone(),
    }
    .publish(env);
    Ok(())
}

/// True when every entry in the asset list has its membership flag set and
/// no flag is set for a listed market missing from the list.
pub(crate) fn membership_consistent(env: &Env, account: &Address) -> bool {
    let assets = storage::account_assets(env, account);
    for asset in assets.iter() {
        if !storage::is_member(env, &asset, account) {
            return false;
        }
    }
    for market in storage::all_markets(env).iter() {
        if storage::is_member(env, &market, account) && !assets.contains(&market) {
            return false;
        }
    }
    true
}
