//! Normalized string family.
//!
//! Before the user's sanitize hook runs, an ordered sub-pipeline of text
//! transforms executes: trim, single-line folding, whitespace collapsing,
//! empty-line clamping, truncation, case folding, capitalization. The step
//! order is fixed: trimming before collapsing avoids asymmetric edge
//! artifacts, truncation after collapsing measures logical characters, and
//! case folding before capitalize lets capitalize override single positions.
//!
//! Shared detection patterns live in process-wide tables, compiled once;
//! per-scalar patterns (the `pattern` rule and the empty-line clamp) compile
//! once at construction time.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, NoExpand, Regex};
use serde_json::Value;

use crate::error::ScalarError;
use crate::pipeline::{ErrorCode, Hooks, Scalar, ScalarMeta, ValueFamily};

// ————————————————————————————————————————————————————————————————————————————
// SHARED PATTERN TABLES
// ————————————————————————————————————————————————————————————————————————————

/// First non-space character at start-of-string or after whitespace.
static WORD_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)\S").unwrap());

/// First non-space character at start-of-string or after a `. ` sequence.
static SENTENCE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\.\s)\S").unwrap());

/// One-or-more line-break characters.
static NEWLINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());

/// A line-break run together with the whitespace hugging it.
static NEWLINE_WITH_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[\r\n]+\s*").unwrap());

/// A single line break in any of its three spellings.
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\r|\n").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_ws(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").into_owned()
}

fn trim_and_collapse_ws(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

// ————————————————————————————————————————————————————————————————————————————
// RULES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capitalize {
    /// Uppercase everything.
    Characters,
    /// Uppercase the first letter after start-of-string or whitespace.
    Words,
    /// Uppercase the first letter after start-of-string or a `. ` sequence.
    Sentences,
    /// Uppercase only the very first character.
    First,
}

/// A string pattern, either precompiled or textual. Textual patterns compile
/// once when the scalar is constructed, never per call.
#[derive(Debug, Clone)]
pub enum PatternSpec {
    Source(String),
    Compiled(Regex),
}

impl From<&str> for PatternSpec {
    fn from(source: &str) -> Self {
        PatternSpec::Source(source.to_string())
    }
}

impl From<String> for PatternSpec {
    fn from(source: String) -> Self {
        PatternSpec::Source(source)
    }
}

impl From<Regex> for PatternSpec {
    fn from(regex: Regex) -> Self {
        PatternSpec::Compiled(regex)
    }
}

impl<'de> serde::Deserialize<'de> for PatternSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <String as serde::Deserialize>::deserialize(deserializer).map(PatternSpec::Source)
    }
}

/// Normalization and constraint options. Validation runs in the fixed order
/// nonEmpty, minLength, maxLength, pattern, then the custom validate hook.
/// Lengths and `truncate` count `char`s.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StringRules {
    pub trim: bool,
    pub trim_start: bool,
    pub trim_end: bool,
    /// Replacement text for every run of line breaks.
    pub singleline: Option<String>,
    pub collapse_whitespace: bool,
    /// Longest run of blank lines allowed to survive collapsing. `Some(0)`
    /// removes blank lines entirely.
    pub max_empty_lines: Option<usize>,
    /// Hard cut at this many characters, no ellipsis.
    pub truncate: Option<usize>,
    pub uppercase: bool,
    pub lowercase: bool,
    pub capitalize: Option<Capitalize>,
    pub non_empty: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<PatternSpec>,
}

// ————————————————————————————————————————————————————————————————————————————
// FAMILY
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringCode {
    Type,
    Empty,
    MinLength,
    MaxLength,
    Pattern,
    Validate,
}

impl ErrorCode for StringCode {
    const TYPE: Self = StringCode::Type;
    const VALIDATE: Self = StringCode::Validate;

    fn as_str(self) -> &'static str {
        match self {
            StringCode::Type => "type",
            StringCode::Empty => "empty",
            StringCode::MinLength => "minLength",
            StringCode::MaxLength => "maxLength",
            StringCode::Pattern => "pattern",
            StringCode::Validate => "validate",
        }
    }
}

impl fmt::Display for StringCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct StringFamily {
    rules: StringRules,
    pattern: Option<Regex>,
    empty_line_clamp: Option<(Regex, String)>,
}

impl StringFamily {
    fn new(rules: StringRules) -> Result<Self, regex::Error> {
        let pattern = match &rules.pattern {
            Some(PatternSpec::Compiled(regex)) => Some(regex.clone()),
            Some(PatternSpec::Source(source)) => Some(Regex::new(source)?),
            None => None,
        };
        // A run of max+2 or more newlines clamps down to max+1 (at most
        // `max` consecutive blank lines survive).
        let empty_line_clamp = match rules.max_empty_lines {
            Some(max) => Some((
                Regex::new(&format!(r"\n{{{},}}", max + 2))?,
                "\n".repeat(max + 1),
            )),
            None => None,
        };
        Ok(Self { rules, pattern, empty_line_clamp })
    }
}

impl ValueFamily for StringFamily {
    type Native = String;
    type Code = StringCode;
    type Rules = StringRules;

    fn rules(&self) -> &StringRules {
        &self.rules
    }

    fn recognize(&self, raw: &Value) -> Option<String> {
        raw.as_str().map(str::to_owned)
    }

    /// The normalization sub-pipeline. Skipped entirely on an empty working
    /// value; emptiness is re-checked after trimming, the only early step
    /// that can empty a non-empty string.
    fn normalize(&self, mut value: String) -> String {
        let rules = &self.rules;
        if value.is_empty() {
            return value;
        }

        if rules.trim {
            value = value.trim().to_string();
        } else {
            if rules.trim_start {
                value = value.trim_start().to_string();
            }
            if rules.trim_end {
                value = value.trim_end().to_string();
            }
        }
        if value.is_empty() {
            return value;
        }

        if let Some(replacement) = &rules.singleline {
            value = NEWLINE_RUN
                .replace_all(&value, NoExpand(replacement))
                .into_owned();
        }

        if rules.collapse_whitespace {
            if rules.singleline.is_some() {
                // line breaks are already folded away
                value = collapse_ws(&value);
            } else if let Some((clamp, clamp_to)) = &self.empty_line_clamp {
                let lines: Vec<String> =
                    LINE_BREAK.split(&value).map(trim_and_collapse_ws).collect();
                value = clamp
                    .replace_all(&lines.join("\n"), NoExpand(clamp_to))
                    .into_owned();
            } else {
                let lines: Vec<String> =
                    NEWLINE_WITH_WS.split(&value).map(collapse_ws).collect();
                value = lines.join("\n");
            }
        }

        if let Some(limit) = rules.truncate {
            if value.chars().count() > limit {
                value = value.chars().take(limit).collect();
            }
        }

        if rules.uppercase {
            value = value.to_uppercase();
        } else if rules.lowercase {
            value = value.to_lowercase();
        }

        // truncate can empty the string; capitalizing nothing is a no-op
        if !value.is_empty() {
            if let Some(mode) = rules.capitalize {
                value = capitalize(&value, mode);
            }
        }

        value
    }

    fn check(&self, value: &String) -> Option<StringCode> {
        let rules = &self.rules;
        if rules.non_empty && value.is_empty() {
            return Some(StringCode::Empty);
        }
        if let Some(min) = rules.min_length {
            if value.chars().count() < min {
                return Some(StringCode::MinLength);
            }
        }
        if let Some(max) = rules.max_length {
            if value.chars().count() > max {
                return Some(StringCode::MaxLength);
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value) {
                return Some(StringCode::Pattern);
            }
        }
        None
    }

    fn to_value(value: &String) -> Value {
        Value::String(value.clone())
    }
}

fn capitalize(value: &str, mode: Capitalize) -> String {
    match mode {
        Capitalize::Characters => value.to_uppercase(),
        Capitalize::Words => WORD_START
            .replace_all(value, |caps: &Captures<'_>| caps[0].to_uppercase())
            .into_owned(),
        Capitalize::Sentences => SENTENCE_START
            .replace_all(value, |caps: &Captures<'_>| caps[0].to_uppercase())
            .into_owned(),
        Capitalize::First => {
            let mut chars = value.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

pub type StringScalar<I = String> = Scalar<StringFamily, I>;

/// Construction compiles a textual `pattern` (and the empty-line clamp) up
/// front, so a bad pattern surfaces here rather than on first parse.
pub fn create_string_scalar<I>(
    meta: ScalarMeta,
    rules: StringRules,
    hooks: Hooks<StringFamily, I>,
) -> Result<StringScalar<I>, ScalarError> {
    let family = StringFamily::new(rules).map_err(|source| ScalarError::BadPattern {
        scalar: meta.name.clone(),
        source,
    })?;
    Ok(Scalar::from_parts(meta, family, hooks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain(rules: StringRules) -> StringScalar {
        create_string_scalar(ScalarMeta::named("String"), rules, Hooks::default()).unwrap()
    }

    fn parsed(rules: StringRules, input: &str) -> String {
        plain(rules).parse(&json!(input)).unwrap().unwrap()
    }

    fn code_of(err: ScalarError) -> &'static str {
        match err {
            ScalarError::Invalid { code, .. } => code,
            other => panic!("unexpected error: {other}"),
        }
    }

    const MESSY: &str = " 921hluaocb1 au0[g2930,0.uh, ";

    #[test]
    fn identity_when_nothing_configured() {
        assert_eq!(parsed(StringRules::default(), MESSY), MESSY);
        assert_eq!(parsed(StringRules::default(), ""), "");
    }

    #[test]
    fn null_short_circuits() {
        assert_eq!(plain(StringRules::default()).parse(&json!(null)).unwrap(), None);
    }

    #[test]
    fn non_string_without_coerce_is_a_type_error() {
        let scalar = plain(StringRules::default());
        for raw in [json!(true), json!(false), json!(3), json!(3.5)] {
            assert_eq!(code_of(scalar.parse(&raw).unwrap_err()), "type");
        }
    }

    #[test]
    fn numeric_looking_string_is_native() {
        assert_eq!(parsed(StringRules::default(), "3"), "3");
    }

    #[test]
    fn coerce_renders_numbers_and_declines_zero() {
        let mut hooks = Hooks::default();
        hooks.coerce = Some(Box::new(|raw: &Value| {
            let n = raw.as_f64()?;
            if n == 0.0 { None } else { Some(n.to_string()) }
        }));
        let scalar =
            create_string_scalar(ScalarMeta::named("String"), StringRules::default(), hooks)
                .unwrap();
        assert_eq!(scalar.parse(&json!(3.0)).unwrap(), Some("3".to_string()));
        assert_eq!(scalar.parse(&json!(0)).unwrap(), None);
    }

    #[test]
    fn trim_variants() {
        let trim = StringRules { trim: true, ..Default::default() };
        assert_eq!(parsed(trim, MESSY), MESSY.trim());

        let left = StringRules { trim_start: true, ..Default::default() };
        assert_eq!(parsed(left, MESSY), MESSY.trim_start());

        let right = StringRules { trim_end: true, ..Default::default() };
        assert_eq!(parsed(right, MESSY), MESSY.trim_end());
    }

    #[test]
    fn trim_applied_to_padded_abc() {
        assert_eq!(
            parsed(StringRules { trim: true, ..Default::default() }, "  abc  "),
            "abc"
        );
    }

    #[test]
    fn singleline_replaces_each_linebreak_run() {
        let rules = StringRules { singleline: Some(".".into()), ..Default::default() };
        assert_eq!(parsed(rules, "\nHello\n World\n \nHi"), ".Hello. World. .Hi");
    }

    #[test]
    fn singleline_replacement_is_literal_text() {
        // `$` must not be treated as a capture-group expansion
        let rules = StringRules { singleline: Some("$0".into()), ..Default::default() };
        assert_eq!(parsed(rules, "a\nb"), "a$0b");
    }

    #[test]
    fn collapse_whitespace_keeps_line_structure() {
        let rules = StringRules { collapse_whitespace: true, ..Default::default() };
        assert_eq!(parsed(rules, "   Hello  \n   World\n "), " Hello\nWorld\n");
    }

    #[test]
    fn collapse_whitespace_after_singleline_folds_to_spaces() {
        let rules = StringRules {
            collapse_whitespace: true,
            singleline: Some(" ".into()),
            ..Default::default()
        };
        assert_eq!(parsed(rules, " \n\t\r  Hello   \n  World"), " Hello World");
    }

    #[test]
    fn max_empty_lines_clamps_blank_runs() {
        let rules = StringRules {
            trim: true,
            collapse_whitespace: true,
            max_empty_lines: Some(1),
            ..Default::default()
        };
        let input = "\n\n  a \t\n  \n   \n   \n   b  \n c\r\n\r\nd\r\n\n\ne\r\r\r\rf   \n\n";
        assert_eq!(parsed(rules, input), "a\n\nb\nc\n\nd\n\ne\n\nf");
    }

    #[test]
    fn max_empty_lines_zero_removes_blank_lines() {
        let rules = StringRules {
            collapse_whitespace: true,
            max_empty_lines: Some(0),
            ..Default::default()
        };
        assert_eq!(parsed(rules, "a\n\n\nb"), "a\nb");
    }

    #[test]
    fn truncate_cuts_to_exact_char_count() {
        let rules = StringRules { truncate: Some(10), ..Default::default() };
        let expected: String = MESSY.chars().take(10).collect();
        assert_eq!(parsed(rules, MESSY), expected);
    }

    #[test]
    fn truncate_leaves_short_values_alone() {
        let rules = StringRules { truncate: Some(10), ..Default::default() };
        assert_eq!(parsed(rules, " 921hlu"), " 921hlu");
    }

    #[test]
    fn trim_runs_before_truncate() {
        let rules = StringRules { trim: true, truncate: Some(10), ..Default::default() };
        let expected: String = MESSY.trim().chars().take(10).collect();
        assert_eq!(parsed(rules, MESSY), expected);
    }

    #[test]
    fn case_folding() {
        let upper = StringRules { uppercase: true, ..Default::default() };
        assert_eq!(parsed(upper, " 921hluAoCb1 au0[g2930,0.Uh, "), " 921HLUAOCB1 AU0[G2930,0.UH, ");

        let lower = StringRules { lowercase: true, ..Default::default() };
        assert_eq!(parsed(lower, " 921HluAOCB1 au0[G2930,0.uh, "), " 921hluaocb1 au0[g2930,0.uh, ");
    }

    #[test]
    fn uppercase_wins_over_lowercase() {
        let rules = StringRules { uppercase: true, lowercase: true, ..Default::default() };
        assert_eq!(parsed(rules, "aBc"), "ABC");
    }

    #[test]
    fn capitalize_modes() {
        let first = StringRules { capitalize: Some(Capitalize::First), ..Default::default() };
        assert_eq!(parsed(first, "hello my friend."), "Hello my friend.");

        let characters =
            StringRules { capitalize: Some(Capitalize::Characters), ..Default::default() };
        assert_eq!(parsed(characters, "hello my friend."), "HELLO MY FRIEND.");

        let words = StringRules { capitalize: Some(Capitalize::Words), ..Default::default() };
        assert_eq!(parsed(words, "hello my friend."), "Hello My Friend.");

        let sentences =
            StringRules { capitalize: Some(Capitalize::Sentences), ..Default::default() };
        assert_eq!(
            parsed(sentences, "hello my friend. hello my friend."),
            "Hello my friend. Hello my friend."
        );
    }

    #[test]
    fn capitalize_on_empty_is_a_noop() {
        let rules = StringRules { capitalize: Some(Capitalize::First), ..Default::default() };
        assert_eq!(parsed(rules, ""), "");
    }

    #[test]
    fn trim_then_capitalize() {
        let rules = StringRules {
            trim: true,
            capitalize: Some(Capitalize::First),
            ..Default::default()
        };
        assert_eq!(parsed(rules, "  hello my friend. "), "Hello my friend.");
    }

    #[test]
    fn sanitize_hook_sees_normalized_value() {
        let mut hooks = Hooks::default();
        hooks.sanitize = Some(Box::new(|s: String| {
            Some(s.chars().filter(char::is_ascii_digit).collect())
        }));
        let scalar =
            create_string_scalar(ScalarMeta::named("String"), StringRules::default(), hooks)
                .unwrap();
        assert_eq!(scalar.parse(&json!(MESSY)).unwrap(), Some("9211029300".to_string()));
    }

    #[test]
    fn sanitize_declining_yields_null() {
        let mut hooks: Hooks<StringFamily, String> = Hooks::default();
        hooks.sanitize = Some(Box::new(|s: String| if s.is_empty() { None } else { Some(s) }));
        let scalar =
            create_string_scalar(ScalarMeta::named("String"), StringRules::default(), hooks)
                .unwrap();
        assert_eq!(scalar.parse(&json!("")).unwrap(), None);
    }

    #[test]
    fn non_empty_rejects_the_empty_string() {
        let scalar = plain(StringRules { non_empty: true, ..Default::default() });
        assert_eq!(code_of(scalar.parse(&json!("")).unwrap_err()), "empty");
    }

    #[test]
    fn length_bounds() {
        let min = plain(StringRules { min_length: Some(3), ..Default::default() });
        assert_eq!(code_of(min.parse(&json!("ab")).unwrap_err()), "minLength");
        assert_eq!(min.parse(&json!("abc")).unwrap(), Some("abc".to_string()));

        let max = plain(StringRules { max_length: Some(5), ..Default::default() });
        assert_eq!(code_of(max.parse(&json!("abcdef")).unwrap_err()), "maxLength");
        assert_eq!(max.parse(&json!("abcde")).unwrap(), Some("abcde".to_string()));
    }

    #[test]
    fn lengths_count_chars_not_bytes() {
        let scalar = plain(StringRules { max_length: Some(3), ..Default::default() });
        assert_eq!(scalar.parse(&json!("äöü")).unwrap(), Some("äöü".to_string()));
    }

    #[test]
    fn pattern_from_text_and_from_regex() {
        let text = plain(StringRules { pattern: Some(r"^\w+$".into()), ..Default::default() });
        assert_eq!(text.parse(&json!("abc")).unwrap(), Some("abc".to_string()));
        assert_eq!(code_of(text.parse(&json!(" a ")).unwrap_err()), "pattern");

        let compiled = plain(StringRules {
            pattern: Some(Regex::new(r"^\w+$").unwrap().into()),
            ..Default::default()
        });
        assert_eq!(compiled.parse(&json!("abc")).unwrap(), Some("abc".to_string()));
    }

    #[test]
    fn bad_textual_pattern_fails_at_construction() {
        let result: Result<StringScalar, _> = create_string_scalar(
            ScalarMeta::named("String"),
            StringRules { pattern: Some("(unclosed".into()), ..Default::default() },
            Hooks::default(),
        );
        assert!(matches!(result, Err(ScalarError::BadPattern { .. })));
    }

    #[test]
    fn validate_hook_runs_last() {
        let mut hooks = Hooks::default();
        hooks.validate = Some(Box::new(|s: &String| s.len() < 3));
        let scalar =
            create_string_scalar(ScalarMeta::named("String"), StringRules::default(), hooks)
                .unwrap();
        assert_eq!(scalar.parse(&json!("ab")).unwrap(), Some("ab".to_string()));
        assert_eq!(code_of(scalar.parse(&json!("abc")).unwrap_err()), "validate");
    }

    #[test]
    fn parse_hook_maps_the_validated_value() {
        let mut hooks = Hooks::default();
        hooks.parse = Some(Box::new(|s: String| s.chars().take(3).collect()));
        let scalar = create_string_scalar(
            ScalarMeta::named("String"),
            StringRules { min_length: Some(5), ..Default::default() },
            hooks,
        )
        .unwrap();
        // minLength checks the working value, not the parsed result
        let expected: String = MESSY.chars().take(3).collect();
        assert_eq!(scalar.parse(&json!(MESSY)).unwrap(), Some(expected));
    }

    #[test]
    fn error_handler_substitutes_a_fallback() {
        let mut hooks = Hooks::default();
        hooks.error_handler = Some(Box::new(|_| Ok("there was error".to_string())));
        let scalar =
            create_string_scalar(ScalarMeta::named("String"), StringRules::default(), hooks)
                .unwrap();
        assert_eq!(scalar.parse(&json!(4)).unwrap(), Some("there was error".to_string()));
    }

    #[test]
    fn serialize_never_normalizes() {
        let scalar = plain(StringRules { trim: true, ..Default::default() });
        assert_eq!(scalar.serialize(&" test ".to_string()).unwrap(), json!(" test "));
    }

    #[test]
    fn description_passes_through() {
        let meta = ScalarMeta {
            name: "String".into(),
            description: Some("this is description".into()),
        };
        let scalar: StringScalar =
            create_string_scalar(meta, StringRules::default(), Hooks::default()).unwrap();
        assert_eq!(scalar.meta().description.as_deref(), Some("this is description"));
    }
}
