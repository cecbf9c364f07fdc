use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round a decimal half-up (away from zero on ties) to `dp` places.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed-point monetary amount with exactly two decimal places.
///
/// Stored as integer cents; every constructor normalizes the scale so that
/// `Display` always renders two fractional digits. Deserialized values go
/// through the same rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Round `value` half-up to cents.
    pub fn from_decimal(value: Decimal) -> Self {
        let mut rounded = round_half_up(value, 2);
        rounded.rescale(2);
        Self(rounded)
    }

    /// Amount in cents, saturating at the `i64` bounds.
    pub fn cents(&self) -> i64 {
        let mut value = self.0;
        value.rescale(2);
        i64::try_from(value.mantissa()).unwrap_or(if value.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self × multiplier`, with the multiplier first rounded half-up to four
    /// places and the product rounded half-up to cents.
    pub fn scale_by(self, multiplier: Decimal) -> Money {
        Money::from_decimal(self.0 * round_half_up(multiplier, 4))
    }

    /// `self × quantity`, rounded half-up to cents.
    pub fn times(self, quantity: u32) -> Money {
        Money::from_decimal(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::from_decimal(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}
