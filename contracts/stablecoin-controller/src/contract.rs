use fixed_point::{add_u128, mul_u128_exp, sub_u128, Exp, MANTISSA_ONE};
use soroban_sdk::{contract, contractimpl, Address, BytesN, Env};

use crate::error::Error;
use crate::events::*;
use crate::interfaces::{ComptrollerClient, MarketClient, StableTokenClient};
use crate::mintable::mintable_stablecoin;
use crate::storage::{self, DataKey, TreasuryData};

/// Issues the stablecoin against collateral held in comptroller markets and
/// keeps the comptroller's per-account stablecoin debt in step.
#[contract]
pub struct StablecoinController;

fn to_token_amount(amount: u128) -> Result<i128, Error> {
    i128::try_from(amount).map_err(|_| Error::ArithmeticOverflow)
}

fn ensure_protocol_active(comptroller: &ComptrollerClient) -> Result<(), Error> {
    if comptroller.protocol_paused() {
        return Err(Error::ProtocolPaused);
    }
    Ok(())
}

/// Burns up to `amount` from `payer` against `borrower`'s debt.
fn repay_fresh(
    env: &Env,
    comptroller: &ComptrollerClient,
    payer: &Address,
    borrower: &Address,
    amount: u128,
) -> Result<u128, Error> {
    let debt = comptroller.minted_stablecoin_of(borrower);
    let actual = amount.min(debt);
    if actual > 0 {
        let token = StableTokenClient::new(env, &storage::stable_token(env)?);
        token.burn(payer, &to_token_amount(actual)?);
        comptroller.set_minted_stablecoin_of(borrower, &sub_u128(debt, actual)?);
    }
    RepayStablecoin {
        payer: payer.clone(),
        borrower: borrower.clone(),
        amount: actual,
    }
    .publish(env);
    Ok(actual)
}

#[contractimpl]
impl StablecoinController {
    pub fn initialize(
        env: Env,
        admin: Address,
        comptroller: Address,
        stable_token: Address,
    ) -> Result<(), Error> {
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        let persistent = env.storage().persistent();
        persistent.set(&DataKey::Admin, &admin);
        persistent.set(&DataKey::Comptroller, &comptroller);
        persistent.set(&DataKey::StableToken, &stable_token);
        persistent.set(&DataKey::Initialized, &true);
        storage::bump_core_ttl(&env);
        AdminUpdated { admin }.publish(&env);
        Ok(())
    }

    pub fn set_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage().persistent().set(&DataKey::Admin, &new_admin);
        AdminUpdated { admin: new_admin }.publish(&env);
        Ok(())
    }

    /// Admin or current treasury guardian. `percent` is a 1e18 mantissa
    /// strictly below 1.0.
    pub fn set_treasury_data(
        env: Env,
        caller: Address,
        guardian: Address,
        address: Address,
        percent: u128,
    ) -> Result<(), Error> {
        let admin = storage::admin(&env)?;
        let current_guardian = storage::treasury(&env).map(|t| t.guardian);
        if caller != admin && current_guardian != Some(caller.clone()) {
            return Err(Error::Unauthorized);
        }
        caller.require_auth();
        if percent >= MANTISSA_ONE {
            return Err(Error::InvalidTreasuryPercent);
        }

        let data = TreasuryData {
            guardian: guardian.clone(),
            address: address.clone(),
            percent,
        };
        storage::set_treasury(&env, &data);
        storage::bump_core_ttl(&env);
        TreasuryDataUpdated {
            guardian,
            address,
            percent,
        }
        .publish(&env);
        Ok(())
    }

    pub fn upgrade(env: Env, caller: Address, new_wasm_hash: BytesN<32>) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    /// Mints `amount` against the minter's collateral. The treasury share is
    /// minted to the treasury, the rest to the minter; the full amount is
    /// recorded as debt.
    pub fn mint_stablecoin(env: Env, minter: Address, amount: u128) -> Result<(), Error> {
        minter.require_auth();
        storage::lock(&env);

        let comptroller_id = storage::comptroller(&env)?;
        let comptroller = ComptrollerClient::new(&env, &comptroller_id);
        ensure_protocol_active(&comptroller)?;
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let mintable = mintable_stablecoin(&env, &comptroller_id, &minter)?;
        if amount > mintable {
            return Err(Error::InsufficientMintCapacity);
        }

        let debt = comptroller.minted_stablecoin_of(&minter);
        let new_debt = add_u128(debt, amount)?;
        comptroller.set_minted_stablecoin_of(&minter, &new_debt);

        let token = StableTokenClient::new(&env, &storage::stable_token(&env)?);
        let mut remaining = amount;
        if let Some(treasury) = storage::treasury(&env) {
            let fee = mul_u128_exp(amount, Exp::from_mantissa(treasury.percent))?;
            if fee > 0 {
                token.mint(&treasury.address, &to_token_amount(fee)?);
                remaining = sub_u128(amount, fee)?;
                MintFee {
                    minter: minter.clone(),
                    fee,
                }
                .publish(&env);
            }
        }
        if remaining > 0 {
            token.mint(&minter, &to_token_amount(remaining)?);
        }

        MintStablecoin { minter, amount }.publish(&env);
        storage::unlock(&env);
        Ok(())
    }

    /// Repays `borrower`'s debt with `payer`'s tokens. Returns the amount
    /// actually burned, which is capped at the outstanding debt.
    pub fn repay_stablecoin(
        env: Env,
        payer: Address,
        borrower: Address,
        amount: u128,
    ) -> Result<u128, Error> {
        payer.require_auth();
        storage::lock(&env);

        let comptroller = ComptrollerClient::new(&env, &storage::comptroller(&env)?);
        ensure_protocol_active(&comptroller)?;
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let repaid = repay_fresh(&env, &comptroller, &payer, &borrower, amount)?;

        storage::unlock(&env);
        Ok(repaid)
    }

    /// Repays part of an underwater borrower's stablecoin debt and takes
    /// `collateral` market tokens in return. Returns the seized tokens.
    pub fn liquidate_stablecoin(
        env: Env,
        liquidator: Address,
        borrower: Address,
        repay_amount: u128,
        collateral: Address,
    ) -> Result<u128, Error> {
        liquidator.require_auth();
        storage::lock(&env);

        let this = env.current_contract_address();
        let comptroller = ComptrollerClient::new(&env, &storage::comptroller(&env)?);
        let market = MarketClient::new(&env, &collateral);
        market.accrue_interest();

        match comptroller.try_liquidate_borrow_allowed(
            &this,
            &collateral,
            &liquidator,
            &borrower,
            &repay_amount,
            &None,
        ) {
            Ok(Ok(())) => {}
            _ => return Err(Error::ComptrollerRejection),
        }
        if borrower == liquidator {
            return Err(Error::LiquidatorIsBorrower);
        }
        if repay_amount == 0 {
            return Err(Error::InvalidAmount);
        }

        let actual_repay = repay_fresh(&env, &comptroller, &liquidator, &borrower, repay_amount)?;

        let seize_tokens = match comptroller.try_stablecoin_seize_tokens(&collateral, &actual_repay)
        {
            Ok(Ok(tokens)) => tokens,
            _ => return Err(Error::ComptrollerRejection),
        };
        if seize_tokens > market.balance_of(&borrower) {
            return Err(Error::SeizeTooMuch);
        }

        match comptroller.try_seize_allowed(
            &collateral,
            &this,
            &liquidator,
            &borrower,
            &seize_tokens,
            &None,
        ) {
            Ok(Ok(())) => {}
            _ => return Err(Error::ComptrollerRejection),
        }
        market.seize(&liquidator, &borrower, &seize_tokens);

        LiquidateStablecoin {
            liquidator,
            borrower,
            repay_amount: actual_repay,
            collateral,
            seize_tokens,
        }
        .publish(&env);
        storage::unlock(&env);
        Ok(seize_tokens)
    }

    pub fn get_mintable_stablecoin(env: Env, account: Address) -> Result<u128, Error> {
        mintable_stablecoin(&env, &storage::comptroller(&env)?, &account)
    }

    pub fn is_locked(env: Env) -> bool {
        storage::is_locked(&env)
    }

    pub fn admin(env: Env) -> Result<Address, Error> {
        storage::admin(&env)
    }

    pub fn comptroller(env: Env) -> Result<Address, Error> {
        storage::comptroller(&env)
    }

    pub fn stable_token(env: Env) -> Result<Address, Error> {
        storage::stable_token(&env)
    }

    pub fn treasury_data(env: Env) -> Option<TreasuryData> {
        storage::treasury(&env)
    }
}
