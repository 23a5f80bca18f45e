//! Inclusive ranges that quotas, amounts and delays are drawn from.

use std::time::Duration;

use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Token or coin amount, in whole units (not wei).
pub type Amount = Decimal;

/// Inclusive integer range, written `[low, high]` in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct CountRange {
    pub low: u32,
    pub high: u32,
}

impl CountRange {
    #[must_use]
    pub const fn new(low: u32, high: u32) -> Self {
        Self { low, high }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.low > self.high {
            return Err(DomainError::InvertedRange {
                low: self.low.to_string(),
                high: self.high.to_string(),
            });
        }
        Ok(())
    }

    /// Uniform draw from `[low, high]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.low >= self.high {
            return self.low;
        }
        rng.gen_range(self.low..=self.high)
    }
}

impl From<[u32; 2]> for CountRange {
    fn from([low, high]: [u32; 2]) -> Self {
        Self { low, high }
    }
}

impl From<CountRange> for [u32; 2] {
    fn from(range: CountRange) -> Self {
        [range.low, range.high]
    }
}

/// Inclusive decimal range, written `[low, high]` in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[Decimal; 2]", into = "[Decimal; 2]")]
pub struct AmountRange {
    pub low: Amount,
    pub high: Amount,
}

impl AmountRange {
    #[must_use]
    pub const fn new(low: Amount, high: Amount) -> Self {
        Self { low, high }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.low > self.high {
            return Err(DomainError::InvertedRange {
                low: self.low.to_string(),
                high: self.high.to_string(),
            });
        }
        Ok(())
    }

    /// Whether any nonzero value with `decimals` places lies in the range.
    #[must_use]
    pub fn has_nonzero_value(&self, decimals: u32) -> bool {
        match self.unit_bounds(decimals) {
            Some((low, high)) => high >= low.max(1),
            None => false,
        }
    }

    /// Uniform draw from the range, already rounded to `decimals` places.
    ///
    /// Sampling happens on the grid of representable values, so the result
    /// never falls outside the range because of rounding. Returns `None`
    /// when no grid point lies inside the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, decimals: u32) -> Option<Amount> {
        let (low, high) = self.unit_bounds(decimals)?;
        if low > high {
            return None;
        }
        let units = if low == high {
            low
        } else {
            rng.gen_range(low..=high)
        };
        Some(Decimal::new(units, decimals))
    }

    fn unit_bounds(&self, decimals: u32) -> Option<(i64, i64)> {
        let scale = Decimal::from(10u64.checked_pow(decimals)?);
        let low = (self.low * scale).ceil().to_i64()?;
        let high = (self.high * scale).floor().to_i64()?;
        Some((low, high))
    }
}

impl From<[Decimal; 2]> for AmountRange {
    fn from([low, high]: [Decimal; 2]) -> Self {
        Self { low, high }
    }
}

impl From<AmountRange> for [Decimal; 2] {
    fn from(range: AmountRange) -> Self {
        [range.low, range.high]
    }
}

/// Inclusive range of whole seconds used for pacing sleeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[u64; 2]", into = "[u64; 2]")]
pub struct DelayRange {
    pub low_secs: u64,
    pub high_secs: u64,
}

impl DelayRange {
    #[must_use]
    pub const fn new(low_secs: u64, high_secs: u64) -> Self {
        Self {
            low_secs,
            high_secs,
        }
    }

    /// A range that never sleeps.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.high_secs == 0
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.low_secs > self.high_secs {
            return Err(DomainError::InvertedRange {
                low: self.low_secs.to_string(),
                high: self.high_secs.to_string(),
            });
        }
        Ok(())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.low_secs >= self.high_secs {
            return Duration::from_secs(self.low_secs);
        }
        Duration::from_secs(rng.gen_range(self.low_secs..=self.high_secs))
    }
}

impl From<[u64; 2]> for DelayRange {
    fn from([low_secs, high_secs]: [u64; 2]) -> Self {
        Self {
            low_secs,
            high_secs,
        }
    }
}

impl From<DelayRange> for [u64; 2] {
    fn from(range: DelayRange) -> Self {
        [range.low_secs, range.high_secs]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    #[test]
    fn count_range_samples_inclusive_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = CountRange::new(1, 3);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let value = range.sample(&mut rng);
            assert!((1..=3).contains(&value));
            seen[value as usize] = true;
        }
        assert!(seen[1] && seen[2] && seen[3]);
    }

    #[test]
    fn degenerate_count_range_is_constant() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(CountRange::new(0, 0).sample(&mut rng), 0);
        assert_eq!(CountRange::new(4, 4).sample(&mut rng), 4);
    }

    #[test]
    fn inverted_ranges_fail_validation() {
        assert!(CountRange::new(3, 1).validate().is_err());
        assert!(AmountRange::new(dec!(0.5), dec!(0.1)).validate().is_err());
        assert!(DelayRange::new(10, 5).validate().is_err());
    }

    #[test]
    fn amount_samples_stay_on_grid_and_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let range = AmountRange::new(dec!(0.01), dec!(0.05));
        for _ in 0..200 {
            let amount = range.sample(&mut rng, 5).unwrap();
            assert!(amount >= dec!(0.01) && amount <= dec!(0.05));
            assert!(amount.scale() <= 5);
        }
    }

    #[test]
    fn amount_range_below_precision_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(42);
        let range = AmountRange::new(dec!(0.000001), dec!(0.000004));
        assert_eq!(range.sample(&mut rng, 5), None);
        assert!(!range.has_nonzero_value(5));
    }

    #[test]
    fn zero_range_has_no_nonzero_value() {
        let range = AmountRange::new(Decimal::ZERO, Decimal::ZERO);
        assert!(!range.has_nonzero_value(5));
        assert!(AmountRange::new(dec!(0), dec!(0.001)).has_nonzero_value(5));
    }

    #[test]
    fn ranges_deserialize_from_pairs() {
        let count: CountRange = serde_json::from_str("[1, 5]").unwrap();
        assert_eq!(count, CountRange::new(1, 5));
        let delay: DelayRange = serde_json::from_str("[30, 100]").unwrap();
        assert_eq!(delay, DelayRange::new(30, 100));
        let amount: AmountRange = serde_json::from_str("[0.01, 0.05]").unwrap();
        assert_eq!(amount, AmountRange::new(dec!(0.01), dec!(0.05)));
    }
}
