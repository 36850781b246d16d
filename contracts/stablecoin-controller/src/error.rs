use fixed_point::MathError;
use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    Unauthorized = 1,
    AlreadyInitialized = 2,
    NotInitialized = 3,
    ProtocolPaused = 4,
    InvalidAmount = 5,
    InsufficientMintCapacity = 6,
    PriceUnavailable = 7,
    SnapshotError = 8,
    ArithmeticOverflow = 9,
    ArithmeticUnderflow = 10,
    DivisionByZero = 11,
    InvalidTreasuryPercent = 12,
    ComptrollerRejection = 13,
    LiquidatorIsBorrower = 14,
    SeizeTooMuch = 15,
    // Fatal: mint, repay or liquidate entered while another one is running
    ReentrancyError = 16,
}

impl From<MathError> for Error {
    fn from(err: MathError) -> Self {
        match err {
            MathError::ArithmeticUnderflow => Error::ArithmeticUnderflow,
            MathError::DivisionByZero => Error::DivisionByZero,
            MathError::ArithmeticOverflow
            | MathError::IndexOverflow
            | MathError::BlockNumberOverflow => Error::ArithmeticOverflow,
        }
    }
}
