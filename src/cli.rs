//! Dev CLI: run candidate JSON values through a scalar definition.
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ScalarError;
use crate::family::float::{create_float_scalar, FloatRules, FloatScalar};
use crate::family::int::{create_int_scalar, IntRules, IntScalar};
use crate::family::string::{create_string_scalar, StringRules, StringScalar};
use crate::pipeline::{Hooks, ScalarMeta};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// check JSON values against a scalar definition, or preview string normalization
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse every input value through the scalar and report the outcomes
    Check(CheckSettings),
    /// print the normalized form of each given text (string scalars only)
    Normalize(NormalizeSettings),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// scalar definition file: {"kind": "float"|"integer"|"string", "name": ..., rules...}
    #[arg(long, short)]
    scalar: PathBuf,

    /// treat each input file as newline-delimited JSON, one candidate value per line
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// One or more inputs, each a JSON array of candidate values.
    /// May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckSettings {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json report file (stdout summary only if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct NormalizeSettings {
    /// scalar definition file; must have "kind": "string"
    #[arg(long, short)]
    scalar: PathBuf,

    /// texts to push through the normalization sub-pipeline
    #[arg(required = true)]
    text: Vec<String>,
}

/// On-disk scalar definition. Discriminated by `kind`; meta and rule fields sit flat
/// beside it.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ScalarSpec {
    Float {
        #[serde(flatten)]
        meta: ScalarMeta,
        #[serde(flatten)]
        rules: FloatRules,
    },
    #[serde(alias = "int")]
    Integer {
        #[serde(flatten)]
        meta: ScalarMeta,
        #[serde(flatten)]
        rules: IntRules,
    },
    String {
        #[serde(flatten)]
        meta: ScalarMeta,
        #[serde(flatten)]
        rules: StringRules,
    },
}

/// A constructed hook-free scalar, erased over the three families.
enum BuiltScalar {
    Float(FloatScalar),
    Integer(IntScalar),
    String(StringScalar),
}

#[derive(Debug, serde::Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Outcome {
    Ok {
        value: Value,
    },
    Null,
    Invalid {
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<&'static str>,
        message: String,
    },
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ScalarSpec {
    fn build(self) -> Result<BuiltScalar, ScalarError> {
        Ok(match self {
            ScalarSpec::Float { meta, rules } => {
                BuiltScalar::Float(create_float_scalar(meta, rules, Hooks::default()))
            }
            ScalarSpec::Integer { meta, rules } => {
                BuiltScalar::Integer(create_int_scalar(meta, rules, Hooks::default()))
            }
            ScalarSpec::String { meta, rules } => {
                BuiltScalar::String(create_string_scalar(meta, rules, Hooks::default())?)
            }
        })
    }

    fn load(path: &PathBuf) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scalar definition {path:?}"))?;
        from_str_with_path(&source).with_context(|| format!("bad scalar definition {path:?}"))
    }
}

impl BuiltScalar {
    fn name(&self) -> &str {
        match self {
            BuiltScalar::Float(scalar) => &scalar.meta().name,
            BuiltScalar::Integer(scalar) => &scalar.meta().name,
            BuiltScalar::String(scalar) => &scalar.meta().name,
        }
    }

    /// Parse one candidate and serialize the accepted value back out.
    fn check_value(&self, raw: &Value) -> Result<Option<Value>, ScalarError> {
        match self {
            BuiltScalar::Float(scalar) => match scalar.parse(raw)? {
                Some(value) => Ok(Some(scalar.serialize(&value)?)),
                None => Ok(None),
            },
            BuiltScalar::Integer(scalar) => match scalar.parse(raw)? {
                Some(value) => Ok(Some(scalar.serialize(&value)?)),
                None => Ok(None),
            },
            BuiltScalar::String(scalar) => match scalar.parse(raw)? {
                Some(value) => Ok(Some(scalar.serialize(&value)?)),
                None => Ok(None),
            },
        }
    }
}

impl Outcome {
    fn of(result: Result<Option<Value>, ScalarError>) -> Self {
        match result {
            Ok(Some(value)) => Outcome::Ok { value },
            Ok(None) => Outcome::Null,
            Err(error) => Outcome::Invalid {
                code: match &error {
                    ScalarError::Invalid { code, .. } => Some(*code),
                    _ => None,
                },
                message: error.to_string(),
            },
        }
    }

    fn render(&self) -> String {
        match self {
            Outcome::Ok { value } => format!("{} {value}", "ok".green()),
            Outcome::Null => format!("{} null", "null".dimmed()),
            Outcome::Invalid { message, .. } => format!("{} {message}", "invalid".red()),
        }
    }
}

impl InputSettings {
    fn load_candidates(&self) -> anyhow::Result<IndexMap<String, Vec<Value>>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|error| anyhow!("failed to resolve input file paths: {error}"))?;
        let mut candidates = IndexMap::<String, Vec<Value>>::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            let values = if self.ndjson {
                source
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(from_str_with_path::<Value>)
                    .collect::<anyhow::Result<Vec<_>>>()
                    .with_context(|| format!("bad NDJSON source file ({source_path_str})"))?
            } else {
                let document: Value = from_str_with_path(&source)
                    .with_context(|| format!("bad JSON source file ({source_path_str})"))?;
                match document {
                    Value::Array(values) => values,
                    _ => bail!("source file {source_path_str} must be a JSON array of candidate values"),
                }
            };
            candidates.insert(source_path_str, values);
        }
        Ok(candidates)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Check(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                // 1) build the scalar
                let scalar = ScalarSpec::load(&target.input_settings.scalar)?.build()?;

                // 2) run every candidate through the pipeline
                let candidates = target.input_settings.load_candidates()?;
                let mut report = IndexMap::<String, Vec<Outcome>>::new();
                let mut total = 0usize;
                let mut invalid = 0usize;
                for (source_path, values) in candidates {
                    let outcomes = values
                        .iter()
                        .map(|raw| Outcome::of(scalar.check_value(raw)))
                        .collect::<Vec<_>>();
                    total += outcomes.len();
                    for outcome in &outcomes {
                        if matches!(outcome, Outcome::Invalid { .. }) {
                            invalid += 1;
                        }
                        println!("{source_path}: {}", outcome.render());
                    }
                    report.insert(source_path, outcomes);
                }
                eprintln!(
                    "scalar `{}`: {total} values, {invalid} invalid",
                    scalar.name()
                );

                // 3) write the report
                if let Some(out) = target.out.as_ref() {
                    let report_src = serde_json::to_string_pretty(&report)?;
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, report_src)?;
                }
                if invalid > 0 {
                    bail!("{invalid} of {total} values rejected");
                }
                Ok(())
            }
            Command::Normalize(target) => {
                let scalar = match ScalarSpec::load(&target.scalar)? {
                    ScalarSpec::String { meta, rules } => {
                        create_string_scalar::<String>(meta, transform_only(rules), Hooks::default())?
                    }
                    _ => bail!("normalize expects a string scalar definition"),
                };
                for text in &target.text {
                    match scalar.parse(&Value::String(text.clone()))? {
                        Some(normalized) => println!("{normalized}"),
                        None => println!("{}", "null".dimmed()),
                    }
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Strip the constraint rules so a normalization preview never rejects its
/// input; only the transform steps remain.
fn transform_only(rules: StringRules) -> StringRules {
    StringRules {
        non_empty: false,
        min_length: None,
        max_length: None,
        pattern: None,
        ..rules
    }
}

/// Deserialize with the failing JSON path in the error message.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> anyhow::Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|error| {
        let path = error.path().to_string();
        anyhow!("at JSON path {path}: {}", error.into_inner())
    })
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                match entry {
                    Ok(p) => {
                        matched_any = true;
                        out.push(p);
                    }
                    Err(e) => return Err(Box::new(e)),
                }
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
