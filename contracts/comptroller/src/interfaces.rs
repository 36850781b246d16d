use soroban_sdk::{contractclient, contracttype, Address, Env, Vec};

use crate::error::Error;

/// Account position as reported by a market.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountSnapshot {
    pub token_balance: u128,
    pub borrow_balance: u128,
    pub exchange_rate: u128,
}

#[allow(dead_code)]
#[contractclient(name = "MarketClient")]
pub trait MarketContract {
    fn get_account_snapshot(env: Env, account: Address) -> AccountSnapshot;
    fn total_supply(env: Env) -> u128;
    fn total_borrows(env: Env) -> u128;
    fn borrow_index(env: Env) -> u128;
    fn balance_of(env: Env, account: Address) -> u128;
    fn borrow_balance_stored(env: Env, account: Address) -> u128;
    fn exchange_rate_stored(env: Env) -> u128;
    fn accrue_interest(env: Env);
    fn seize(env: Env, liquidator: Address, borrower: Address, seize_tokens: u128);
    fn comptroller(env: Env) -> Address;
    fn is_market(env: Env) -> bool;
}

#[allow(dead_code)]
#[contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    /// Price of one unit of the market's underlying, 1e18 scaled; 0 = unavailable.
    fn get_underlying_price(env: Env, market: Address) -> u128;
}

/// One account's position in the calling market.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountHint {
    pub account: Address,
    pub token_balance: u128,
    pub borrow_balance: u128,
}

/// State a market hands over when it calls a gate. Contracts cannot be
/// re-entered, so the comptroller reads the calling market from here and
/// only calls out to the other markets.
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

/// Market state source for one gate invocation.
pub(crate) struct MarketReader {
    hint: Option<MarketHint>,
}

impl MarketReader {
    /// Reads every market through its contract interface.
    pub(crate) fn direct() -> Self {
        Self { hint: None }
    }

    /// Serves the hinted market from `hint`. The hint is trusted only when
    /// the market it names authorises the call.
    pub(crate) fn hinted(hint: Option<MarketHint>) -> Self {
        if let Some(hint) = &hint {
            hint.market.require_auth();
        }
        Self { hint }
    }

    fn hint_for(&self, market: &Address) -> Option<&MarketHint> {
        self.hint.as_ref().filter(|hint| &hint.market == market)
    }

    /// True when `market` already authorised this invocation.
    pub(crate) fn authorised(&self, market: &Address) -> bool {
        self.hint_for(market).is_some()
    }

    fn account_hint(hint: &MarketHint, account: &Address) -> Result<AccountHint, Error> {
        hint.accounts
            .iter()
            .find(|entry| &entry.account == account)
            .ok_or(Error::IncompleteMarketHint)
    }

    pub(crate) fn snapshot(
        &self,
        env: &Env,
        market: &Address,
        account: &Address,
    ) -> Result<AccountSnapshot, Error> {
        if let Some(hint) = self.hint_for(market) {
            let entry = Self::account_hint(hint, account)?;
            return Ok(AccountSnapshot {
                token_balance: entry.token_balance,
                borrow_balance: entry.borrow_balance,
                exchange_rate: hint.exchange_rate,
            });
        }
        match MarketClient::new(env, market).try_get_account_snapshot(account) {
            Ok(Ok(snapshot)) => Ok(snapshot),
            _ => Err(Error::SnapshotError),
        }
    }

    pub(crate) fn balance_of(
        &self,
        env: &Env,
        market: &Address,
        account: &Address,
    ) -> Result<u128, Error> {
        match self.hint_for(market) {
            Some(hint) => Ok(Self::account_hint(hint, account)?.token_balance),
            None => Ok(MarketClient::new(env, market).balance_of(account)),
        }
    }

    pub(crate) fn borrow_balance(
        &self,
        env: &Env,
        market: &Address,
        account: &Address,
    ) -> Result<u128, Error> {
        match self.hint_for(market) {
            Some(hint) => Ok(Self::account_hint(hint, account)?.borrow_balance),
            None => Ok(MarketClient::new(env, market).borrow_balance_stored(account)),
        }
    }

    pub(crate) fn total_supply(&self, env: &Env, market: &Address) -> u128 {
        match self.hint_for(market) {
            Some(hint) => hint.total_supply,
            None => MarketClient::new(env, market).total_supply(),
        }
    }

    pub(crate) fn total_borrows(&self, env: &Env, market: &Address) -> u128 {
        match self.hint_for(market) {
            Some(hint) => hint.total_borrows,
            None => MarketClient::new(env, market).total_borrows(),
        }
    }

    pub(crate) fn borrow_index(&self, env: &Env, market: &Address) -> u128 {
        match self.hint_for(market) {
            Some(hint) => hint.borrow_index,
            None => MarketClient::new(env, market).borrow_index(),
        }
    }

    pub(crate) fn comptroller(&self, env: &Env, market: &Address) -> Address {
        match self.hint_for(market) {
            Some(hint) => hint.comptroller.clone(),
            None => MarketClient::new(env, market).comptroller(),
        }
    }
}

/// Non-zero price for the market's underlying.
pub(crate) fn underlying_price(env: &Env, market: &Address) -> Result<u128, Error> {
    let oracle = crate::storage::oracle(env).ok_or(Error::PriceUnavailable)?;
    match PriceOracleClient::new(env, &oracle).try_get_underlying_price(market) {
        Ok(Ok(price)) if price > 0 => Ok(price),
        _ => Err(Error::PriceUnavailable),
    }
}

