//! Bounded float family.

use serde_json::Value;

use crate::certify::as_safe_float;
use crate::family::NumericCode;
use crate::pipeline::{Hooks, Scalar, ScalarMeta, ValueFamily};

/// Constraint fields, checked in declaration order (minimum, then maximum,
/// then the custom validate hook). Bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FloatRules {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

pub struct FloatFamily {
    rules: FloatRules,
}

impl ValueFamily for FloatFamily {
    type Native = f64;
    type Code = NumericCode;
    type Rules = FloatRules;

    fn rules(&self) -> &FloatRules {
        &self.rules
    }

    fn recognize(&self, raw: &Value) -> Option<f64> {
        as_safe_float(raw)
    }

    fn check(&self, value: &f64) -> Option<NumericCode> {
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

    fn to_value(value: &f64) -> Value {
        serde_json::Number::from_f64(*value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

pub type FloatScalar<I = f64> = Scalar<FloatFamily, I>;

pub fn create_float_scalar<I>(
    meta: ScalarMeta,
    rules: FloatRules,
    hooks: Hooks<FloatFamily, I>,
) -> FloatScalar<I> {
    Scalar::from_parts(meta, FloatFamily { rules }, hooks)
}
