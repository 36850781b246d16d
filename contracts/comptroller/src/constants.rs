pub const MANTISSA_ONE: u128 = 1_000_000_000_000_000_000u128; // 1e18

// Collateral factor may not exceed 0.9
pub const COLLATERAL_FACTOR_MAX_MANTISSA: u128 = 900_000_000_000_000_000u128;
// Close factor must lie in [0.05, 0.9] when bounds are enforced
pub const CLOSE_FACTOR_MIN_MANTISSA: u128 = 50_000_000_000_000_000u128;
pub const CLOSE_FACTOR_MAX_MANTISSA: u128 = 900_000_000_000_000_000u128;
// Liquidation incentive in [1.0, 1.5]
pub const LIQUIDATION_INCENTIVE_MIN_MANTISSA: u128 = MANTISSA_ONE;
pub const LIQUIDATION_INCENTIVE_MAX_MANTISSA: u128 = 1_500_000_000_000_000_000u128;

pub const DEFAULT_CLOSE_FACTOR_MANTISSA: u128 = 500_000_000_000_000_000u128;
pub const DEFAULT_LIQUIDATION_INCENTIVE_MANTISSA: u128 = MANTISSA_ONE;
pub const DEFAULT_MAX_ASSETS: u32 = 20;

// Reward indices are Double (1e36) values; fresh checkpoints start here
pub const INITIAL_INDEX: u128 = 1_000_000_000_000_000_000_000_000_000_000_000_000u128; // 1e36

// Stablecoin mint rate is expressed in basis points of collateral value
pub const MINT_RATE_DENOMINATOR: u128 = 10_000u128;

pub const TTL_THRESHOLD: u32 = 100_000;
pub const TTL_EXTEND_TO: u32 = 200_000;
