use soroban_sdk::{contractevent, Address};

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminUpdated {
    #[topic]
    pub admin: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreasuryDataUpdated {
    pub guardian: Address,
    pub address: Address,
    pub percent: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintStablecoin {
    #[topic]
    pub minter: Address,
    pub amount: u128,
}

/// Portion of a mint routed to the treasury.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintFee {
    #[topic]
    pub minter: Address,
    pub fee: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RepayStablecoin {
    #[topic]
    pub payer: Address,
    #[topic]
    pub borrower: Address,
    pub amount: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiquidateStablecoin {
    #[topic]
    pub liquidator: Address,
    #[topic]
    pub borrower: Address,
    pub repay_amount: u128,
    pub collateral: Address,
    pub seize_tokens: u128,
}
