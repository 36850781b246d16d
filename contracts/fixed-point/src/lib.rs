//! Mantissa arithmetic for the risk ledger.
//!
//! Values are unsigned integers scaled by 1e18 ([`Exp`]) or 1e36
//! ([`Double`]). The backing store is a 256-bit integer so that products of
//! two mantissas never have to be approximated before they are truncated
//! back down. Every operation is checked: overflow, underflow and division
//! by zero surface as [`MathError`] values instead of wrapping.
#![no_std]
#![allow(clippy::assign_op_pattern)]
#![allow(clippy::ptr_offset_with_cast)]
#![allow(clippy::manual_range_contains)]

mod double;
mod exp;

pub use double::Double;
pub use exp::Exp;

use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer made of 4 x 64-bit little-endian words
    pub struct U256(4);
}

/// Scale of an [`Exp`] mantissa
pub const EXP_SCALE: u128 = 1_000_000_000_000_000_000;
/// Half of [`EXP_SCALE`]
pub const HALF_EXP_SCALE: u128 = EXP_SCALE / 2;
/// One, expressed as an [`Exp`] mantissa
pub const MANTISSA_ONE: u128 = EXP_SCALE;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MathError {
    ArithmeticOverflow,
    ArithmeticUnderflow,
    DivisionByZero,
    IndexOverflow,
    BlockNumberOverflow,
}

pub type MathResult<T> = Result<T, MathError>;

pub trait TryAdd: Sized {
    fn try_add(self, rhs: Self) -> MathResult<Self>;
}

pub trait TrySub: Sized {
    fn try_sub(self, rhs: Self) -> MathResult<Self>;
}

pub trait TryMul<Rhs = Self>: Sized {
    fn try_mul(self, rhs: Rhs) -> MathResult<Self>;
}

pub trait TryDiv<Rhs = Self>: Sized {
    fn try_div(self, rhs: Rhs) -> MathResult<Self>;
}

/// 1e18 as a [`U256`]
pub fn exp_scale() -> U256 {
    U256::from(EXP_SCALE)
}

/// 1e36 as a [`U256`]
pub fn double_scale() -> U256 {
    U256::from(EXP_SCALE) * U256::from(EXP_SCALE)
}

pub fn checked_add(a: U256, b: U256) -> MathResult<U256> {
    a.checked_add(b).ok_or(MathError::ArithmeticOverflow)
}

pub fn checked_sub(a: U256, b: U256) -> MathResult<U256> {
    a.checked_sub(b).ok_or(MathError::ArithmeticUnderflow)
}

pub fn checked_mul(a: U256, b: U256) -> MathResult<U256> {
    a.checked_mul(b).ok_or(MathError::ArithmeticOverflow)
}

pub fn checked_div(a: U256, b: U256) -> MathResult<U256> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok(a / b)
}

/// Narrow to u128, failing instead of truncating high bits.
pub fn to_u128(n: U256) -> MathResult<u128> {
    if n.bits() > 128 {
        return Err(MathError::ArithmeticOverflow);
    }
    Ok(n.as_u128())
}

/// Index values must fit in 224 bits.
pub fn safe224(n: U256) -> MathResult<U256> {
    if n.bits() > 224 {
        return Err(MathError::IndexOverflow);
    }
    Ok(n)
}

/// Block numbers must fit in 32 bits.
pub fn safe32(n: u64) -> MathResult<u32> {
    u32::try_from(n).map_err(|_| MathError::BlockNumberOverflow)
}

pub fn add_u128(a: u128, b: u128) -> MathResult<u128> {
    a.checked_add(b).ok_or(MathError::ArithmeticOverflow)
}

pub fn sub_u128(a: u128, b: u128) -> MathResult<u128> {
    a.checked_sub(b).ok_or(MathError::ArithmeticUnderflow)
}

pub fn mul_u128(a: u128, b: u128) -> MathResult<u128> {
    to_u128(checked_mul(U256::from(a), U256::from(b))?)
}

/// `a * b / 1e18`, the scalar result of multiplying an amount by an [`Exp`].
pub fn mul_u128_exp(a: u128, b: Exp) -> MathResult<u128> {
    to_u128(checked_mul(U256::from(a), b.mantissa)? / exp_scale())
}

/// `a * 1e18 / b`, the scalar result of dividing an amount by an [`Exp`].
pub fn div_u128_exp(a: u128, b: Exp) -> MathResult<u128> {
    to_u128(checked_div(checked_mul(U256::from(a), exp_scale())?, b.mantissa)?)
}

/// `a * b / 1e36`, the scalar result of multiplying an amount by a [`Double`].
pub fn mul_u128_double(a: u128, b: Double) -> MathResult<u128> {
    to_u128(checked_mul(U256::from(a), b.mantissa)? / double_scale())
}

/// `a * 1e36 / b` as a [`Double`].
pub fn fraction(a: u128, b: u128) -> MathResult<Double> {
    let numerator = checked_mul(U256::from(a), double_scale())?;
    Ok(Double::from_raw(checked_div(numerator, U256::from(b))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_primitives() {
        assert_eq!(
            checked_add(U256::MAX, U256::one()),
            Err(MathError::ArithmeticOverflow)
        );
        assert_eq!(
            checked_sub(U256::zero(), U256::one()),
            Err(MathError::ArithmeticUnderflow)
        );
        assert_eq!(
            checked_div(U256::one(), U256::zero()),
            Err(MathError::DivisionByZero)
        );
        assert_eq!(sub_u128(1, 2), Err(MathError::ArithmeticUnderflow));
        assert_eq!(add_u128(u128::MAX, 1), Err(MathError::ArithmeticOverflow));
        assert_eq!(mul_u128(u128::MAX, 2), Err(MathError::ArithmeticOverflow));
        assert_eq!(mul_u128(3, 4), Ok(12));
    }

    #[test]
    fn test_narrowing_casts() {
        assert_eq!(to_u128(U256::from(u128::MAX)), Ok(u128::MAX));
        assert_eq!(
            to_u128(U256::from(u128::MAX) + U256::one()),
            Err(MathError::ArithmeticOverflow)
        );

        let max224 = (U256::one() << 224) - U256::one();
        assert_eq!(safe224(max224), Ok(max224));
        assert_eq!(safe224(max224 + U256::one()), Err(MathError::IndexOverflow));

        assert_eq!(safe32(u32::MAX as u64), Ok(u32::MAX));
        assert_eq!(
            safe32(u32::MAX as u64 + 1),
            Err(MathError::BlockNumberOverflow)
        );
    }

    #[test]
    fn test_scalar_helpers_truncate() {
        // 10 * 0.15 = 1.5 -> 1
        let rate = Exp::from_mantissa(150_000_000_000_000_000);
        assert_eq!(mul_u128_exp(10, rate), Ok(1));
        // 3 / 2.0 = 1.5 -> 1
        assert_eq!(div_u128_exp(3, Exp::from_mantissa(2 * EXP_SCALE)), Ok(1));
        assert_eq!(
            div_u128_exp(3, Exp::zero()),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn test_fraction_and_double_product() {
        // 10 / 100 = 0.1 at 1e36 scale
        let ratio = fraction(10, 100).unwrap();
        assert_eq!(ratio.mantissa, double_scale() / U256::from(10u8));
        assert_eq!(mul_u128_double(100, ratio), Ok(10));
        assert_eq!(mul_u128_double(15, ratio), Ok(1));
        assert_eq!(fraction(1, 0), Err(MathError::DivisionByZero));
    }
}
