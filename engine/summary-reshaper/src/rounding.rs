//! Decimal rounding and the explicit no-value marker

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::fmt;

const MAX_PLACES: i32 = 28;
const MIN_PLACES: i32 = -18;

/// A figure rounded once at reshape time, or no value when upstream had none
///
/// Serializes as a JSON integer when there is no fractional part, as a JSON float
/// otherwise, and as `null` when missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rounded(Option<Decimal>);

impl Rounded {
    /// No value
    pub const NONE: Rounded = Rounded(None);

    pub fn value(&self) -> Option<Decimal> {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn to_f64(&self) -> Option<f64> {
        self.0.and_then(|d| d.to_f64())
    }
}

impl fmt::Display for Rounded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(d) => write!(f, "{}", d),
            None => f.write_str("null"),
        }
    }
}

impl Serialize for Rounded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(d) = self.0 else {
            return serializer.serialize_none();
        };

        if d.scale() == 0 {
            if let Some(i) = d.to_i64() {
                return serializer.serialize_i64(i);
            }
        }

        match d.to_f64() {
            Some(f) => serializer.serialize_f64(f),
            None => serializer.serialize_none(),
        }
    }
}

/// Round to `places` decimals, midpoint away from zero
///
/// Negative `places` round to tens, hundreds, and so on. Missing and non-finite inputs
/// give no value, never zero.
pub fn round_to(value: Option<f64>, places: i32) -> Rounded {
    let Some(d) = value.filter(|v| v.is_finite()).and_then(Decimal::from_f64) else {
        return Rounded::NONE;
    };

    let places = places.clamp(MIN_PLACES, MAX_PLACES);
    let rounded = if places >= 0 {
        d.round_dp_with_strategy(places as u32, RoundingStrategy::MidpointAwayFromZero)
    } else {
        let factor = Decimal::from(10i64.pow(places.unsigned_abs()));
        match (d / factor)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(factor)
        {
            Some(r) => r,
            None => return Rounded::NONE,
        }
    };

    Rounded(Some(rounded.normalize()))
}
