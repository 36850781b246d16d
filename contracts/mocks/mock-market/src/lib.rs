#![no_std]
use soroban_sdk::{contract, contractclient, contractimpl, contracttype, vec, Address, Env, Vec};

const ONE: u128 = 1_000_000_000_000_000_000;

#[contracttype]
enum DataKey {
    Comptroller,
    IsMarket,
    ExchangeRate,
    BorrowIndex,
    TotalSupply,
    TotalBorrows,
    SnapshotFails,
    Balance(Address),
    Borrow(Address),
}

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
#[contractclient(name = "GateClient")]
trait Gates {
    fn mint_allowed(
        env: Env,
        market: Address,
        minter: Address,
        mint_amount: u128,
        hint: Option<MarketHint>,
    );
    fn redeem_allowed(
        env: Env,
        market: Address,
        redeemer: Address,
        redeem_tokens: u128,
        hint: Option<MarketHint>,
    );
    fn borrow_allowed(
        env: Env,
        market: Address,
        borrower: Address,
        borrow_amount: u128,
        hint: Option<MarketHint>,
    );
    fn repay_borrow_allowed(
        env: Env,
        market: Address,
        payer: Address,
        borrower: Address,
        repay_amount: u128,
        hint: Option<MarketHint>,
    );
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
    fn transfer_allowed(
        env: Env,
        market: Address,
        src: Address,
        dst: Address,
        transfer_tokens: u128,
        hint: Option<MarketHint>,
    );
    fn liquidate_calculate_seize_tokens(
        env: Env,
        borrowed: Address,
        collateral: Address,
        repay_amount: u128,
    ) -> u128;
}

/// Lending market stand-in whose positions are written directly by tests.
/// The action entry points call the comptroller as the market would, passing
/// their own state along, and then apply the change.
#[contract]
pub struct MockMarket;

#[contractimpl]
impl MockMarket {
    pub fn initialize(env: Env, comptroller: Address) {
        if env.storage().persistent().has(&DataKey::Comptroller) {
            panic!("already initialized");
        }
        let s = env.storage().persistent();
        s.set(&DataKey::Comptroller, &comptroller);
        s.set(&DataKey::IsMarket, &true);
        s.set(&DataKey::ExchangeRate, &ONE);
        s.set(&DataKey::BorrowIndex, &ONE);
    }

    /// Overwrites an account's position and keeps the totals in step.
    pub fn set_account(env: Env, account: Address, token_balance: u128, borrow_balance: u128) {
        let old_tokens = Self::balance_of(env.clone(), account.clone());
        let old_borrows = Self::borrow_balance_stored(env.clone(), account.clone());
        let total_supply = Self::total_supply(env.clone()) - old_tokens + token_balance;
        let total_borrows = Self::total_borrows(env.clone()) - old_borrows + borrow_balance;
        let s = env.storage().persistent();
        s.set(&DataKey::Balance(account.clone()), &token_balance);
        s.set(&DataKey::Borrow(account), &borrow_balance);
        s.set(&DataKey::TotalSupply, &total_supply);
        s.set(&DataKey::TotalBorrows, &total_borrows);
    }

    pub fn set_exchange_rate(env: Env, rate: u128) {
        env.storage().persistent().set(&DataKey::ExchangeRate, &rate);
    }

    pub fn set_borrow_index(env: Env, index: u128) {
        env.storage().persistent().set(&DataKey::BorrowIndex, &index);
    }

    pub fn set_total_borrows(env: Env, total: u128) {
        env.storage().persistent().set(&DataKey::TotalBorrows, &total);
    }

    pub fn set_snapshot_fails(env: Env, fails: bool) {
        env.storage().persistent().set(&DataKey::SnapshotFails, &fails);
    }

    pub fn set_is_market(env: Env, is_market: bool) {
        env.storage().persistent().set(&DataKey::IsMarket, &is_market);
    }

    pub fn set_comptroller(env: Env, comptroller: Address) {
        env.storage()
            .persistent()
            .set(&DataKey::Comptroller, &comptroller);
    }

    pub fn get_account_snapshot(env: Env, account: Address) -> AccountSnapshot {
        let fails: bool = env
            .storage()
            .persistent()
            .get(&DataKey::SnapshotFails)
            .unwrap_or(false);
        if fails {
            panic!("snapshot unavailable");
        }
        AccountSnapshot {
            token_balance: Self::balance_of(env.clone(), account.clone()),
            borrow_balance: Self::borrow_balance_stored(env.clone(), account),
            exchange_rate: Self::exchange_rate_stored(env),
        }
    }

    pub fn total_supply(env: Env) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0)
    }

    pub fn total_borrows(env: Env) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::TotalBorrows)
            .unwrap_or(0)
    }

    pub fn borrow_index(env: Env) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::BorrowIndex)
            .unwrap_or(ONE)
    }

    pub fn balance_of(env: Env, account: Address) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(account))
            .unwrap_or(0)
    }

    pub fn borrow_balance_stored(env: Env, account: Address) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::Borrow(account))
            .unwrap_or(0)
    }

    pub fn exchange_rate_stored(env: Env) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::ExchangeRate)
            .unwrap_or(ONE)
    }

    pub fn accrue_interest(_env: Env) {}

    /// Moves collateral tokens from `borrower` to `liquidator`.
    pub fn seize(env: Env, liquidator: Address, borrower: Address, seize_tokens: u128) {
        let borrower_tokens = Self::balance_of(env.clone(), borrower.clone());
        if seize_tokens > borrower_tokens {
            panic!("seize exceeds balance");
        }
        let liquidator_tokens = Self::balance_of(env.clone(), liquidator.clone());
        let s = env.storage().persistent();
        s.set(
            &DataKey::Balance(borrower),
            &(borrower_tokens - seize_tokens),
        );
        s.set(
            &DataKey::Balance(liquidator),
            &(liquidator_tokens + seize_tokens),
        );
    }

    pub fn mint(env: Env, minter: Address, tokens: u128) {
        let hint = Self::hint(&env, vec![&env, minter.clone()]);
        Self::gates(&env).mint_allowed(
            &env.current_contract_address(),
            &minter,
            &tokens,
            &Some(hint),
        );
        Self::move_tokens(&env, None, Some(&minter), tokens);
    }

    pub fn redeem(env: Env, redeemer: Address, tokens: u128) {
        let hint = Self::hint(&env, vec![&env, redeemer.clone()]);
        Self::gates(&env).redeem_allowed(
            &env.current_contract_address(),
            &redeemer,
            &tokens,
            &Some(hint),
        );
        Self::move_tokens(&env, Some(&redeemer), None, tokens);
    }

    pub fn transfer(env: Env, src: Address, dst: Address, tokens: u128) {
        let hint = Self::hint(&env, vec![&env, src.clone(), dst.clone()]);
        Self::gates(&env).transfer_allowed(
            &env.current_contract_address(),
            &src,
            &dst,
            &tokens,
            &Some(hint),
        );
        Self::move_tokens(&env, Some(&src), Some(&dst), tokens);
    }

    pub fn borrow(env: Env, borrower: Address, amount: u128) {
        let hint = Self::hint(&env, vec![&env, borrower.clone()]);
        Self::gates(&env).borrow_allowed(
            &env.current_contract_address(),
            &borrower,
            &amount,
            &Some(hint),
        );
        let debt = Self::borrow_balance_stored(env.clone(), borrower.clone()) + amount;
        Self::set_debt(&env, &borrower, debt);
    }

    pub fn repay_borrow(env: Env, payer: Address, borrower: Address, amount: u128) {
        let hint = Self::hint(&env, vec![&env, borrower.clone()]);
        Self::gates(&env).repay_borrow_allowed(
            &env.current_contract_address(),
            &payer,
            &borrower,
            &amount,
            &Some(hint),
        );
        let debt = Self::borrow_balance_stored(env.clone(), borrower.clone()) - amount;
        Self::set_debt(&env, &borrower, debt);
    }

    /// Repays `repay_amount` of `borrower`'s debt and has `collateral` hand
    /// over the seized tokens. Returns the seized amount.
    pub fn liquidate_borrow(
        env: Env,
        liquidator: Address,
        borrower: Address,
        repay_amount: u128,
        collateral: Address,
    ) -> u128 {
        let this = env.current_contract_address();
        let gates = Self::gates(&env);
        let hint = Self::hint(&env, vec![&env, borrower.clone()]);
        gates.liquidate_borrow_allowed(
            &this,
            &collateral,
            &liquidator,
            &borrower,
            &repay_amount,
            &Some(hint),
        );
        let debt = Self::borrow_balance_stored(env.clone(), borrower.clone()) - repay_amount;
        Self::set_debt(&env, &borrower, debt);

        let seize_tokens =
            gates.liquidate_calculate_seize_tokens(&this, &collateral, &repay_amount);
        let hint = Self::hint(&env, vec![&env, borrower.clone(), liquidator.clone()]);
        gates.seize_allowed(
            &collateral,
            &this,
            &liquidator,
            &borrower,
            &seize_tokens,
            &Some(hint),
        );
        if collateral == this {
            Self::seize(env.clone(), liquidator, borrower, seize_tokens);
        } else {
            MockMarketClient::new(&env, &collateral).seize(&liquidator, &borrower, &seize_tokens);
        }
        seize_tokens
    }

    pub fn comptroller(env: Env) -> Address {
        env.storage()
            .persistent()
            .get(&DataKey::Comptroller)
            .expect("comptroller not set")
    }

    pub fn is_market(env: Env) -> bool {
        env.storage()
            .persistent()
            .get(&DataKey::IsMarket)
            .unwrap_or(false)
    }
}

impl MockMarket {
    fn gates(env: &Env) -> GateClient<'_> {
        GateClient::new(env, &Self::comptroller(env.clone()))
    }

    fn hint(env: &Env, accounts: Vec<Address>) -> MarketHint {
        let mut entries = Vec::new(env);
        for account in accounts.iter() {
            entries.push_back(AccountHint {
                token_balance: Self::balance_of(env.clone(), account.clone()),
                borrow_balance: Self::borrow_balance_stored(env.clone(), account.clone()),
                account,
            });
        }
        MarketHint {
            market: env.current_contract_address(),
            comptroller: Self::comptroller(env.clone()),
            exchange_rate: Self::exchange_rate_stored(env.clone()),
            total_supply: Self::total_supply(env.clone()),
            total_borrows: Self::total_borrows(env.clone()),
            borrow_index: Self::borrow_index(env.clone()),
            accounts: entries,
        }
    }

    fn move_tokens(env: &Env, from: Option<&Address>, to: Option<&Address>, tokens: u128) {
        let s = env.storage().persistent();
        let mut total_supply = Self::total_supply(env.clone());
        if let Some(from) = from {
            let balance = Self::balance_of(env.clone(), from.clone()) - tokens;
            s.set(&DataKey::Balance(from.clone()), &balance);
            total_supply -= tokens;
        }
        if let Some(to) = to {
            let balance = Self::balance_of(env.clone(), to.clone()) + tokens;
            s.set(&DataKey::Balance(to.clone()), &balance);
            total_supply += tokens;
        }
        s.set(&DataKey::TotalSupply, &total_supply);
    }

    fn set_debt(env: &Env, account: &Address, debt: u128) {
        let old = Self::borrow_balance_stored(env.clone(), account.clone());
        let total_borrows = Self::total_borrows(env.clone()) - old + debt;
        let s = env.storage().persistent();
        s.set(&DataKey::Borrow(account.clone()), &debt);
        s.set(&DataKey::TotalBorrows, &total_borrows);
    }
}
