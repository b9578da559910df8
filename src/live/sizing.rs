//! Whole-share sizing of trade actions.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use super::position::TradeAction;
use crate::data::PriceMatrix;

/// Fixed dollar cap per leg: `total_capital * alloc_per_pair`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizer {
    total_capital: Decimal,
    alloc_per_pair: Decimal,
}

impl Sizer {
    pub fn new(total_capital: Decimal, alloc_per_pair: Decimal) -> Self {
        Self {
            total_capital,
            alloc_per_pair,
        }
    }

    pub fn leg_capital(&self) -> Decimal {
        self.total_capital * self.alloc_per_pair
    }

    /// Whole shares purchasable with the leg cap at `price`, truncated.
    /// Non-positive or non-finite prices give zero.
    pub fn shares(&self, price: f64) -> u64 {
        let Some(price) = Decimal::from_f64(price).filter(|p| *p > Decimal::ZERO) else {
            return 0;
        };
        (self.leg_capital() / price).trunc().to_u64().unwrap_or(0)
    }

    /// Fills share counts of an entry from the latest prices; exits are left untouched.
    pub fn size(&self, action: &mut TradeAction, prices: &PriceMatrix) {
        if !action.is_entry() {
            return;
        }
        let price_of = |ticker: &Option<String>| {
            ticker
                .as_deref()
                .and_then(|t| prices.last_price(t))
                .unwrap_or(0.0)
        };
        action.shares_long = self.shares(price_of(&action.long_ticker));
        action.shares_short = self.shares(price_of(&action.short_ticker));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_shares_truncate() {
        let sizer = Sizer::new(dec!(1000000), dec!(0.10));
        assert_eq!(sizer.leg_capital(), dec!(100000));
        assert_eq!(sizer.shares(333.0), 300);
        assert_eq!(sizer.shares(100_001.0), 0);
        assert_eq!(sizer.shares(0.0), 0);
        assert_eq!(sizer.shares(-5.0), 0);
        assert_eq!(sizer.shares(f64::NAN), 0);
    }
}
