//! Literal syntax nodes and literal-to-raw-value extraction.
//!
//! The host's parser owns the full AST; the pipeline only ever sees the
//! literal kinds a scalar position can hold. Extraction feeds the same phase
//! sequence as `parse`, with the node threaded through for diagnostics.

use serde_json::Value;

/// A literal value node as handed over by the host's query parser.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralNode {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Extract the raw value carried by a literal node.
pub fn value_from_literal(node: &LiteralNode) -> Value {
    match node {
        LiteralNode::Null => Value::Null,
        LiteralNode::Bool(b) => Value::Bool(*b),
        LiteralNode::Int(i) => Value::from(*i),
        // JSON has no non-finite numbers; a non-finite literal degrades to
        // null and takes the null short-circuit.
        LiteralNode::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        LiteralNode::String(s) => Value::String(s.clone()),
    }
}
