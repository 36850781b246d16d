use soroban_sdk::{contractevent, Address};

use crate::storage::{PauseScope, PolicyConfig};

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminUpdated {
    #[topic]
    pub admin: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleUpdated {
    #[topic]
    pub oracle: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PauseGuardianUpdated {
    #[topic]
    pub guardian: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BorrowCapGuardianUpdated {
    #[topic]
    pub guardian: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CloseFactorUpdated {
    pub old_mantissa: u128,
    pub new_mantissa: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiquidationIncentiveUpdated {
    pub old_mantissa: u128,
    pub new_mantissa: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PolicyUpdated {
    pub policy: PolicyConfig,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketListed {
    #[topic]
    pub market: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollateralFactorUpdated {
    #[topic]
    pub market: Address,
    pub old_mantissa: u128,
    pub new_mantissa: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BorrowCapUpdated {
    #[topic]
    pub market: Address,
    pub cap: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionPaused {
    pub scope: PauseScope,
    pub paused: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketEntered {
    #[topic]
    pub market: Address,
    #[topic]
    pub account: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketExited {
    #[topic]
    pub market: Address,
    #[topic]
    pub account: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardTokenUpdated {
    #[topic]
    pub token: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardSpeedsUpdated {
    #[topic]
    pub market: Address,
    pub supply_speed: u128,
    pub borrow_speed: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardMarketUpdated {
    #[topic]
    pub market: Address,
    pub eligible: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributedSupplierReward {
    #[topic]
    pub market: Address,
    #[topic]
    pub supplier: Address,
    pub delta: u128,
    pub supply_index: soroban_sdk::U256,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributedBorrowerReward {
    #[topic]
    pub market: Address,
    #[topic]
    pub borrower: Address,
    pub delta: u128,
    pub borrow_index: soroban_sdk::U256,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardGranted {
    #[topic]
    pub recipient: Address,
    pub amount: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StablecoinControllerUpdated {
    #[topic]
    pub controller: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StablecoinMintRateUpdated {
    pub old_rate: u128,
    pub new_rate: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintedStablecoinUpdated {
    #[topic]
    pub owner: Address,
    pub amount: u128,
}
