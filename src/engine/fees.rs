//! Maker/taker fee schedule.

use serde::{Deserialize, Serialize};

/// Configurable fee schedule for maker and taker fills.
///
/// Fees are expressed in basis points (bps), where 1 bps = 0.01% = 0.0001.
/// Negative values represent rebates (common for maker fees, to reward
/// liquidity provision).
///
/// # Examples
///
/// ```
/// use simex_core::FeeSchedule;
///
/// let schedule = FeeSchedule::new(-2, 5);
/// let notional = 10_000_000;
/// let taker_fee = schedule.calculate_fee(notional, false);
/// assert_eq!(taker_fee, 5_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Maker fee in basis points (negative = rebate).
    pub maker_fee_bps: i32,
    /// Taker fee in basis points.
    pub taker_fee_bps: i32,
}

impl FeeSchedule {
    #[must_use = "FeeSchedule does nothing unless used"]
    pub fn new(maker_fee_bps: i32, taker_fee_bps: i32) -> Self {
        Self {
            maker_fee_bps,
            taker_fee_bps,
        }
    }

    /// Fee for a fill of the given notional. Positive is a charge, negative a
    /// rebate.
    #[must_use = "fee calculation result must be used"]
    #[inline]
    pub fn calculate_fee(&self, notional: u128, is_maker: bool) -> i128 {
        let bps = if is_maker {
            self.maker_fee_bps
        } else {
            self.taker_fee_bps
        };
        (notional as i128)
            .checked_mul(bps as i128)
            .map(|product| product / 10_000)
            .unwrap_or(i128::MAX)
    }

    #[must_use]
    pub fn zero_fee() -> Self {
        Self::new(0, 0)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::zero_fee()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taker_fee_is_charged() {
        let schedule = FeeSchedule::new(-2, 5);
        assert_eq!(schedule.calculate_fee(100_000_000, false), 50_000);
    }

    #[test]
    fn maker_rebate_is_negative() {
        let schedule = FeeSchedule::new(-2, 5);
        assert_eq!(schedule.calculate_fee(100_000_000, true), -20_000);
    }

    #[test]
    fn zero_fee_schedule_charges_nothing() {
        let schedule = FeeSchedule::zero_fee();
        assert_eq!(schedule.calculate_fee(1_000_000, true), 0);
        assert_eq!(schedule.calculate_fee(1_000_000, false), 0);
    }

    #[test]
    fn serializes_round_trip() {
        let schedule = FeeSchedule::new(-2, 5);
        let json = serde_json::to_string(&schedule).unwrap();
        let back: FeeSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(schedule, back);
    }
}
