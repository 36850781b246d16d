use crate::{
    checked_add, checked_div, checked_mul, checked_sub, exp_scale, to_u128, MathError,
    MathResult, TryAdd, TryDiv, TryMul, TrySub, U256, EXP_SCALE,
};

/// Decimal scaled by 1e18
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub struct Exp {
    pub mantissa: U256,
}

impl Exp {
    pub fn from_mantissa(mantissa: u128) -> Self {
        Self {
            mantissa: U256::from(mantissa),
        }
    }

    pub fn from_raw(mantissa: U256) -> Self {
        Self { mantissa }
    }

    pub fn zero() -> Self {
        Self::from_raw(U256::zero())
    }

    pub fn one() -> Self {
        Self::from_mantissa(EXP_SCALE)
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn mantissa_u128(&self) -> MathResult<u128> {
        to_u128(self.mantissa)
    }

    /// Integer part, fractional remainder dropped.
    pub fn truncate(&self) -> U256 {
        self.mantissa / exp_scale()
    }

    /// `self * n` truncated to an integer.
    pub fn mul_scalar_truncate(&self, n: u128) -> MathResult<u128> {
        to_u128(checked_mul(self.mantissa, U256::from(n))? / exp_scale())
    }

    /// `self * n` truncated, then added to `addend`.
    pub fn mul_scalar_truncate_add(&self, n: u128, addend: u128) -> MathResult<u128> {
        let product = self.mul_scalar_truncate(n)?;
        product
            .checked_add(addend)
            .ok_or(MathError::ArithmeticOverflow)
    }
}

impl TryAdd for Exp {
    fn try_add(self, rhs: Self) -> MathResult<Self> {
        Ok(Self::from_raw(checked_add(self.mantissa, rhs.mantissa)?))
    }
}

impl TrySub for Exp {
    fn try_sub(self, rhs: Self) -> MathResult<Self> {
        Ok(Self::from_raw(checked_sub(self.mantissa, rhs.mantissa)?))
    }
}

impl TryMul<Exp> for Exp {
    fn try_mul(self, rhs: Exp) -> MathResult<Self> {
        let product = checked_mul(self.mantissa, rhs.mantissa)?;
        Ok(Self::from_raw(product / exp_scale()))
    }
}

impl TryMul<u128> for Exp {
    fn try_mul(self, rhs: u128) -> MathResult<Self> {
        Ok(Self::from_raw(checked_mul(self.mantissa, U256::from(rhs))?))
    }
}

impl TryDiv<Exp> for Exp {
    fn try_div(self, rhs: Exp) -> MathResult<Self> {
        let scaled = checked_mul(self.mantissa, exp_scale())?;
        Ok(Self::from_raw(checked_div(scaled, rhs.mantissa)?))
    }
}

impl TryDiv<u128> for Exp {
    fn try_div(self, rhs: u128) -> MathResult<Self> {
        Ok(Self::from_raw(checked_div(self.mantissa, U256::from(rhs))?))
    }
}
