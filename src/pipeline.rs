//! Generic value pipeline (single-engine).
//!
//! One externally supplied value goes through a fixed phase order —
//! coerce → sanitize → validate → parse — and comes out as a valid internal
//! value, a well-defined `null`, or an error-path outcome.
//!
//! Design goals:
//! - Fixed phase order: sanitize always sees a coerced value, never a raw one.
//! - Every exit goes through the same error path, so custom policy has a
//!   single override point.
//! - Hook absence is an `Option`, never a sentinel: a hook that is present
//!   but declines (returns `None`) is a distinct, sanctioned null outcome.
//! - No cross-call state; hooks are `Send + Sync` so a constructed scalar is
//!   shareable as-is.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::{default_error_handler, ParseError, ScalarError};
use crate::node::{value_from_literal, LiteralNode};

// ————————————————————————————————————————————————————————————————————————————
// CONFIGURATION
// ————————————————————————————————————————————————————————————————————————————

/// Descriptive metadata passed through to the host type system untouched.
/// Opaque to the pipeline; kept separate from the per-family rules so the
/// error envelope can borrow plain data.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScalarMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScalarMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None }
    }
}

/// A family's closed set of failure reasons. Every family owns at least the
/// `type` code (raw value not recognizable) and the `validate` code (custom
/// hook rejected the value).
pub trait ErrorCode: Copy + Eq + fmt::Debug + fmt::Display {
    const TYPE: Self;
    const VALIDATE: Self;

    fn as_str(self) -> &'static str;
}

/// One value kind's configuration of the engine: native shape, built-in
/// sanitize, and the fixed-order built-in constraint checks.
pub trait ValueFamily {
    /// Working value between the phases.
    type Native: Clone;
    /// Closed error-code set for this family.
    type Code: ErrorCode;
    /// Plain-data constraint fields, borrowed into `ParseError`.
    type Rules;

    fn rules(&self) -> &Self::Rules;

    /// Native-shape predicate + extraction. `None` sends the raw value to the
    /// coerce hook (or the `type` error path).
    fn recognize(&self, raw: &Value) -> Option<Self::Native>;

    /// Built-in sanitize, applied before the user hook. Identity by default;
    /// the string family runs its normalization sub-pipeline here.
    fn normalize(&self, value: Self::Native) -> Self::Native {
        value
    }

    /// First failing built-in constraint, in the family's fixed order.
    /// The engine appends the custom `validate` hook after these.
    fn check(&self, value: &Self::Native) -> Option<Self::Code>;

    /// Render the working value for diagnostics.
    fn to_value(value: &Self::Native) -> Value;
}

// ————————————————————————————————————————————————————————————————————————————
// HOOKS
// ————————————————————————————————————————————————————————————————————————————

pub type CoerceFn<N> = Box<dyn Fn(&Value) -> Option<N> + Send + Sync>;
pub type SanitizeFn<N> = Box<dyn Fn(N) -> Option<N> + Send + Sync>;
pub type ValidateFn<N> = Box<dyn Fn(&N) -> bool + Send + Sync>;
pub type ParseFn<N, I> = Box<dyn Fn(N) -> I + Send + Sync>;
pub type SerializeFn<I> = Box<dyn Fn(&I) -> Value + Send + Sync>;
pub type ErrorHandlerFn<F, I> =
    Box<dyn for<'a> Fn(ParseError<'a, F>) -> Result<I, ScalarError> + Send + Sync>;

/// User-supplied extension points. Every field defaults to absent.
pub struct Hooks<F: ValueFamily, I> {
    pub coerce: Option<CoerceFn<F::Native>>,
    pub sanitize: Option<SanitizeFn<F::Native>>,
    pub validate: Option<ValidateFn<F::Native>>,
    pub parse: Option<ParseFn<F::Native, I>>,
    pub serialize: Option<SerializeFn<I>>,
    pub error_handler: Option<ErrorHandlerFn<F, I>>,
}

impl<F: ValueFamily, I> Default for Hooks<F, I> {
    fn default() -> Self {
        Self {
            coerce: None,
            sanitize: None,
            validate: None,
            parse: None,
            serialize: None,
            error_handler: None,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENGINE
// ————————————————————————————————————————————————————————————————————————————

/// A constructed scalar value type: one family configuration plus hooks,
/// immutable for its lifetime. `parse`/`serialize` are pure functions of
/// their inputs and this configuration.
pub struct Scalar<F: ValueFamily, I = <F as ValueFamily>::Native> {
    meta: ScalarMeta,
    family: F,
    hooks: Hooks<F, I>,
}

impl<F: ValueFamily, I> Scalar<F, I> {
    pub(crate) fn from_parts(meta: ScalarMeta, family: F, hooks: Hooks<F, I>) -> Self {
        Self { meta, family, hooks }
    }

    pub fn meta(&self) -> &ScalarMeta {
        &self.meta
    }

    pub fn rules(&self) -> &F::Rules {
        self.family.rules()
    }

    /// Emit an internal value outward. Outbound values are trusted: no
    /// sanitize, validate, or normalization step ever runs here.
    pub fn serialize(&self, value: &I) -> Result<Value, ScalarError>
    where
        I: Serialize,
    {
        match &self.hooks.serialize {
            Some(serialize) => Ok(serialize(value)),
            None => serde_json::to_value(value).map_err(|source| ScalarError::Serialize {
                scalar: self.meta.name.clone(),
                source,
            }),
        }
    }
}

// Parsing needs a way back from the working value to the internal type when
// no `parse` hook is configured; `From` is that seam. The reflexive impl
// covers scalars whose internal type is the family's native type, and custom
// internal types provide a one-line `From` impl.
impl<F: ValueFamily, I: From<F::Native>> Scalar<F, I> {
    /// Normalize a dynamically-typed external value (e.g. a variable payload)
    /// into the internal representation. `Ok(None)` signals "intentionally
    /// absent".
    pub fn parse(&self, raw: &Value) -> Result<Option<I>, ScalarError> {
        self.run(raw, None)
    }

    /// Same phase sequence, entered from a literal syntax node. The node is
    /// threaded through only so the error envelope can carry it.
    pub fn parse_from_node(&self, node: &LiteralNode) -> Result<Option<I>, ScalarError> {
        let raw = value_from_literal(node);
        self.run(&raw, Some(node))
    }

    fn run(&self, raw: &Value, node: Option<&LiteralNode>) -> Result<Option<I>, ScalarError> {
        // Null short-circuit: no later phase runs.
        if raw.is_null() {
            return Ok(None);
        }

        // Coercion phase.
        let mut value = match self.family.recognize(raw) {
            Some(native) => native,
            None => match &self.hooks.coerce {
                Some(coerce) => match coerce(raw) {
                    Some(native) => native,
                    None => return Ok(None),
                },
                None => return self.fail(F::Code::TYPE, raw, raw.clone(), node),
            },
        };

        // Sanitization phase: built-in transforms, then the user hook.
        value = self.family.normalize(value);
        if let Some(sanitize) = &self.hooks.sanitize {
            match sanitize(value) {
                Some(clean) => value = clean,
                None => return Ok(None),
            }
        }

        // Validation phase: built-in checks in family order, custom last.
        // The first failure short-circuits; later checks never run.
        if let Some(code) = self.family.check(&value) {
            return self.fail(code, raw, F::to_value(&value), node);
        }
        if let Some(validate) = &self.hooks.validate {
            if !validate(&value) {
                return self.fail(F::Code::VALIDATE, raw, F::to_value(&value), node);
            }
        }

        // Parse phase.
        Ok(Some(match &self.hooks.parse {
            Some(parse) => parse(value),
            None => I::from(value),
        }))
    }

    fn fail(
        &self,
        code: F::Code,
        original: &Value,
        value: Value,
        node: Option<&LiteralNode>,
    ) -> Result<Option<I>, ScalarError> {
        let err = ParseError {
            code,
            original_value: original,
            value,
            node,
            meta: &self.meta,
            rules: self.family.rules(),
        };
        match &self.hooks.error_handler {
            Some(handler) => handler(err).map(Some),
            None => Err(default_error_handler(err)),
        }
    }
}
