#![no_std]

mod constants;
mod contract;
mod error;
mod events;
mod flywheel;
mod interfaces;
mod liquidity;
mod membership;
mod policy;
mod storage;

pub use constants::*;
pub use contract::{Comptroller, ComptrollerClient};
pub use error::Error;
pub use interfaces::{AccountHint, AccountSnapshot, MarketHint};
pub use storage::{Market, PauseScope, PolicyConfig, RewardMarketState};

mod test;
