//! Configurable scalar pipelines: coerce → sanitize → validate → parse.
pub mod certify;
pub mod cli;
pub mod error;
pub mod family;
pub mod node;
pub mod pipeline;

pub use certify::{is_safe_float, is_safe_integer, MAX_INT, MIN_INT};
pub use error::{default_error_handler, ParseError, ScalarError};
pub use family::float::{create_float_scalar, FloatFamily, FloatRules, FloatScalar};
pub use family::int::{create_int_scalar, IntFamily, IntRules, IntScalar};
pub use family::string::{
    create_string_scalar, Capitalize, PatternSpec, StringCode, StringFamily, StringRules,
    StringScalar,
};
pub use family::NumericCode;
pub use node::LiteralNode;
pub use pipeline::{ErrorCode, Hooks, Scalar, ScalarMeta, ValueFamily};
