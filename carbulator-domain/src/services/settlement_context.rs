//! Rounding configuration applied when a debt matrix is finalized.

use crate::model::Money;
use rust_decimal::RoundingStrategy;
use thiserror::Error;

const MAX_SETTLEMENT_SCALE: u32 = 22;

/// Rounding mode for finalized debt amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundingMode {
    /// Round half away from zero (e.g., 0.005 -> 0.01).
    HalfUp,
    /// Round half to nearest even number (banker's rounding).
    HalfEven,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// Context for settlement quantization.
///
/// # Example
/// ```
/// use carbulator_domain::services::{RoundingMode, SettlementContext};
///
/// let ctx = SettlementContext::new(2, RoundingMode::HalfUp).unwrap();
/// assert_eq!(ctx.scale(), 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementContext {
    scale: u32,
    rounding_mode: RoundingMode,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("settlement scale {scale} is not supported (max {max_supported})")]
pub struct UnsupportedScale {
    pub scale: u32,
    pub max_supported: u32,
}

impl SettlementContext {
    pub fn new(scale: u32, rounding_mode: RoundingMode) -> Result<Self, UnsupportedScale> {
        if scale > MAX_SETTLEMENT_SCALE {
            return Err(UnsupportedScale {
                scale,
                max_supported: MAX_SETTLEMENT_SCALE,
            });
        }
        Ok(Self {
            scale,
            rounding_mode,
        })
    }

    /// Cent precision with banker's rounding.
    pub fn cents_default() -> Self {
        Self {
            scale: 2,
            rounding_mode: RoundingMode::HalfEven,
        }
    }

    pub fn scale(self) -> u32 {
        self.scale
    }

    pub fn rounding_mode(self) -> RoundingMode {
        self.rounding_mode
    }

    pub fn round(self, amount: Money) -> Money {
        Money::from_decimal(
            amount
                .as_decimal()
                .round_dp_with_strategy(self.scale, self.rounding_mode.strategy()),
        )
    }
}

impl Default for SettlementContext {
    fn default() -> Self {
        Self::cents_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::half_up_rounds_midpoint_away(RoundingMode::HalfUp, Money::new(1125, 3), Money::new(113, 2))]
    #[case::half_even_rounds_midpoint_to_even(RoundingMode::HalfEven, Money::new(1125, 3), Money::new(112, 2))]
    #[case::negative_half_up(RoundingMode::HalfUp, Money::new(-1125, 3), Money::new(-113, 2))]
    #[case::below_midpoint(RoundingMode::HalfUp, Money::new(33333, 4), Money::new(333, 2))]
    fn rounds_to_cents(#[case] mode: RoundingMode, #[case] amount: Money, #[case] expected: Money) {
        let ctx = SettlementContext::new(2, mode).expect("valid scale");
        assert_eq!(ctx.round(amount), expected);
    }

    #[rstest]
    fn rejects_excessive_scale() {
        assert_eq!(
            SettlementContext::new(23, RoundingMode::HalfUp),
            Err(UnsupportedScale {
                scale: 23,
                max_supported: 22
            })
        );
    }

    #[rstest]
    fn default_is_cents() {
        let ctx = SettlementContext::default();
        assert_eq!(ctx.scale(), 2);
        assert_eq!(ctx.rounding_mode(), RoundingMode::HalfEven);
    }
}
