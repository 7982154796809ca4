//! Display type for rupiah amounts.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A whole-rupiah amount for user-facing output: `Rp 104,050`. Arithmetic
/// happens on `Decimal` elsewhere; this wrapper only formats.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rupiah(pub Decimal);

impl From<Decimal> for Rupiah {
    fn from(value: Decimal) -> Self {
        Rupiah(value)
    }
}

impl fmt::Display for Rupiah {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.0.is_sign_negative() && !self.0.is_zero() {
            ("-", self.0.abs())
        } else {
            ("", self.0)
        };
        write!(
            f,
            "{sign}Rp {}",
            format_num::format_num!(",.0", num.to_f64().unwrap_or_default())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Rupiah(Decimal::from(104_050)).to_string(), "Rp 104,050");
        assert_eq!(Rupiah(Decimal::from(82)).to_string(), "Rp 82");
        assert_eq!(Rupiah(Decimal::ZERO).to_string(), "Rp 0");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Rupiah(Decimal::from(-500)).to_string(), "-Rp 500");
    }
}
