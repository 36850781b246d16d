use fixed_point::MathError;
use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    Unauthorized = 1,
    MarketNotListed = 2,
    MarketAlreadyListed = 3,
    InvalidCollateralFactor = 4,
    InvalidCloseFactor = 5,
    InvalidLiquidationIncentive = 6,
    PriceUnavailable = 7,
    SnapshotError = 8,
    ArithmeticOverflow = 9,
    ArithmeticUnderflow = 10,
    DivisionByZero = 11,
    IndexOverflow = 12,
    BlockNumberOverflow = 13,
    InsufficientLiquidity = 14,
    InsufficientShortfall = 15,
    TooMuchRepay = 16,
    BorrowCapReached = 17,
    ComptrollerMismatch = 18,
    ProtocolPaused = 19,
    MintPaused = 20,
    BorrowPaused = 21,
    TransferPaused = 22,
    SeizePaused = 23,
    TooManyAssets = 24,
    NonzeroBorrowBalance = 25,
    AlreadyInitialized = 26,
    NotInitialized = 27,
    InvalidMarket = 28,
    InvalidInput = 29,
    InvalidMintRate = 30,
    MarketNotRewardEligible = 31,
    InsufficientRewardBalance = 32,
    // Fatal: account asset list and membership flags disagree
    MembershipCorrupted = 33,
    IncompleteMarketHint = 34,
}

impl From<MathError> for Error {
    fn from(err: MathError) -> Self {
        match err {
            MathError::ArithmeticOverflow => Error::ArithmeticOverflow,
            MathError::ArithmeticUnderflow => Error::ArithmeticUnderflow,
            MathError::DivisionByZero => Error::DivisionByZero,
            MathError::IndexOverflow => Error::IndexOverflow,
            MathError::BlockNumberOverflow => Error::BlockNumberOverflow,
        }
    }
}
