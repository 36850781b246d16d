#![no_std]

mod contract;
mod error;
mod events;
mod interfaces;
mod mintable;
mod storage;

pub use contract::{StablecoinController, StablecoinControllerClient};
pub use error::Error;
pub use storage::TreasuryData;
