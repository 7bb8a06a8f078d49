//! Numeric certifiers: pure predicates deciding whether a raw value is
//! already a safe float / safe 32-bit integer.

use serde_json::Value;

/// Largest value the host's native integer type can carry. A compatibility
/// boundary, not a hardware limit; must stay exactly this.
pub const MAX_INT: i64 = 2_147_483_647;
/// Smallest value the host's native integer type can carry.
pub const MIN_INT: i64 = -2_147_483_648;

/// True iff the value is numeric and finite.
pub fn is_safe_float(raw: &Value) -> bool {
    as_safe_float(raw).is_some()
}

/// True iff the value is a finite whole number within `MIN_INT..=MAX_INT`.
/// A numeric value with a fractional part is not a safe integer even though
/// it is a valid float.
pub fn is_safe_integer(raw: &Value) -> bool {
    as_safe_integer(raw).is_some()
}

pub(crate) fn as_safe_float(raw: &Value) -> Option<f64> {
    raw.as_f64().filter(|f| f.is_finite())
}

pub(crate) fn as_safe_integer(raw: &Value) -> Option<i32> {
    let f = as_safe_float(raw)?;
    if f.fract() == 0.0 && f >= MIN_INT as f64 && f <= MAX_INT as f64 {
        Some(f as i32)
    } else {
        None
    }
}
