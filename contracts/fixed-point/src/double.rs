use crate::{
    checked_add, checked_div, checked_mul, checked_sub, double_scale, to_u128, MathResult,
    TryAdd, TryDiv, TryMul, TrySub, U256,
};

/// Decimal scaled by 1e36, used for reward indices
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub struct Double {
    pub mantissa: U256,
}

impl Double {
    pub fn from_raw(mantissa: U256) -> Self {
        Self { mantissa }
    }

    pub fn from_mantissa(mantissa: u128) -> Self {
        Self::from_raw(U256::from(mantissa))
    }

    pub fn zero() -> Self {
        Self::from_raw(U256::zero())
    }

    pub fn one() -> Self {
        Self::from_raw(double_scale())
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn mantissa_u128(&self) -> MathResult<u128> {
        to_u128(self.mantissa)
    }
}

impl TryAdd for Double {
    fn try_add(self, rhs: Self) -> MathResult<Self> {
        Ok(Self::from_raw(checked_add(self.mantissa, rhs.mantissa)?))
    }
}

impl TrySub for Double {
    fn try_sub(self, rhs: Self) -> MathResult<Self> {
        Ok(Self::from_raw(checked_sub(self.mantissa, rhs.mantissa)?))
    }
}

impl TryMul<Double> for Double {
    fn try_mul(self, rhs: Double) -> MathResult<Self> {
        let product = checked_mul(self.mantissa, rhs.mantissa)?;
        Ok(Self::from_raw(product / double_scale()))
    }
}

impl TryMul<u128> for Double {
    fn try_mul(self, rhs: u128) -> MathResult<Self> {
        Ok(Self::from_raw(checked_mul(self.mantissa, U256::from(rhs))?))
    }
}

impl TryDiv<u128> for Double {
    fn try_div(self, rhs: u128) -> MathResult<Self> {
        Ok(Self::from_raw(checked_div(self.mantissa, U256::from(rhs))?))
    }
}
