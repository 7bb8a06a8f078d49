//! Error envelope and the default reaction to a failed parse.
//!
//! Every failing phase builds one `ParseError`, hands it to the configured
//! handler, and returns whatever the handler decides: `Ok(substitute)` turns
//! the failure into a successful parse, `Err` propagates to the caller. When
//! no handler is configured, `default_error_handler` raises a
//! `ScalarError::Invalid` that names the failing code and the offending value.

use serde_json::Value;

use crate::node::LiteralNode;
use crate::pipeline::{ErrorCode, ScalarMeta, ValueFamily};

#[derive(Debug, thiserror::Error)]
pub enum ScalarError {
    /// A value failed one of the scalar's checks and no handler substituted
    /// a fallback. The message carries the failing code and the value so the
    /// host can surface it verbatim.
    #[error("scalar `{scalar}`: `{code}` check failed for value {value}")]
    Invalid {
        scalar: String,
        code: &'static str,
        value: Value,
    },

    /// A textual `pattern` did not compile at construction time.
    #[error("scalar `{scalar}`: invalid pattern")]
    BadPattern {
        scalar: String,
        #[source]
        source: regex::Error,
    },

    /// The identity serializer could not render the internal value as JSON.
    #[error("scalar `{scalar}`: unserializable internal value")]
    Serialize {
        scalar: String,
        #[source]
        source: serde_json::Error,
    },

    /// For custom error handlers that raise their own message.
    #[error("{0}")]
    Handler(String),
}

/// Everything a failing phase knows, passed by value into the error handler
/// and discarded after it returns or raises.
///
/// `value` is the working value at the moment of failure (for a `type`
/// failure that is still the raw input); `original_value` is always the raw
/// input. `node` is present only on the literal path so diagnostics can point
/// back into the query document.
pub struct ParseError<'a, F: ValueFamily> {
    pub code: F::Code,
    pub original_value: &'a Value,
    pub value: Value,
    pub node: Option<&'a LiteralNode>,
    pub meta: &'a ScalarMeta,
    pub rules: &'a F::Rules,
}

/// The handler used when a scalar configures none: always raise.
pub fn default_error_handler<F: ValueFamily>(err: ParseError<'_, F>) -> ScalarError {
    ScalarError::Invalid {
        scalar: err.meta.name.clone(),
        code: err.code.as_str(),
        value: err.value,
    }
}
