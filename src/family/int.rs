//! Bounded integer family.
//!
//! Same constraint shape as the float family with a stricter safety
//! predicate: whole numbers inside the host's 32-bit boundary.

use serde_json::Value;

use crate::certify::as_safe_integer;
use crate::family::NumericCode;
use crate::pipeline::{Hooks, Scalar, ScalarMeta, ValueFamily};

/// Checked in declaration order (minimum, then maximum, then the custom
/// validate hook). Bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IntRules {
    pub minimum: Option<i32>,
    pub maximum: Option<i32>,
}

pub struct IntFamily {
    rules: IntRules,
}

impl ValueFamily for IntFamily {
    type Native = i32;
    type Code = NumericCode;
    type Rules = IntRules;

    fn rules(&self) -> &IntRules {
        &self.rules
    }

    fn recognize(&self, raw: &Value) -> Option<i32> {
        as_safe_integer(raw)
    }

    fn check(&self, value: &i32) -> Option<NumericCode> {
        if let Some(minimum) = self.rules.minimum {
            if *value < minimum {
                return Some(NumericCode::Minimum);
            }
        }
        if let Some(maximum) = self.rules.maximum {
            if *value > maximum {
                return Some(NumericCode::Maximum);
            }
        }
        None
    }

    fn to_value(value: &i32) -> Value {
        Value::from(*value)
    }
}

pub type IntScalar<I = i32> = Scalar<IntFamily, I>;

pub fn create_int_scalar<I>(
    meta: ScalarMeta,
    rules: IntRules,
    hooks: Hooks<IntFamily, I>,
) -> IntScalar<I> {
    Scalar::from_parts(meta, IntFamily { rules }, hooks)
}
