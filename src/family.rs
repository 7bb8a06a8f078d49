//! The three concrete value families that configure the pipeline engine.
//!
//! Float and integer share one constraint shape (bounds then custom
//! validation) and one closed error-code set; the string family carries the
//! text-normalization sub-pipeline and a larger code set.

pub mod float;
pub mod int;
pub mod string;

use std::fmt;

use crate::pipeline::ErrorCode;

/// Closed failure set shared by the float and integer families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericCode {
    Type,
    Minimum,
    Maximum,
    Validate,
}

impl ErrorCode for NumericCode {
    const TYPE: Self = NumericCode::Type;
    const VALIDATE: Self = NumericCode::Validate;

    fn as_str(self) -> &'static str {
        match self {
            NumericCode::Type => "type",
            NumericCode::Minimum => "minimum",
            NumericCode::Maximum => "maximum",
            NumericCode::Validate => "validate",
        }
    }
}

impl fmt::Display for NumericCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
