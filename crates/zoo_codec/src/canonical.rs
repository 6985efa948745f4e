//! Canonical ordering and flattening of record values.
//!
//! Two values that differ only in the order of map keys or of sequence
//! elements canonicalize to the same [`Value`], and therefore flatten to
//! the same token stream.

use crate::value::Value;
use std::cmp::Ordering;

impl Value {
    /// Rank of the variant in the canonical total order.
    fn canonical_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::Array(_) => 4,
            Value::Map(_) => 5,
        }
    }

    /// Total order used to sort sequence elements.
    ///
    /// `null < booleans < numbers < text < arrays < maps`. Numbers compare
    /// by value (`f64::total_cmp`); an integer sorts before a float of equal
    /// value. Arrays and maps compare entry by entry, then by length. The
    /// order is only meaningful between canonical values, where map keys
    /// are already sorted.
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        let by_rank = self.canonical_rank().cmp(&other.canonical_rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }

        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.cmp_canonical(y))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Value::Map(a), Value::Map(b)) => a
                .iter()
                .zip(b)
                .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| va.cmp_canonical(vb)))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (a, b) => cmp_numbers(a, b),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn cmp_numbers(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Float(y)) => (*x as f64).total_cmp(y).then(Ordering::Less),
        (Value::Float(x), Value::Integer(y)) => x.total_cmp(&(*y as f64)).then(Ordering::Greater),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        _ => Ordering::Equal,
    }
}

/// Returns the canonical form of `value`.
///
/// Map entries are sorted by key; sequence elements are canonicalized and
/// then sorted with [`Value::cmp_canonical`]. Scalars are returned as-is.
#[must_use]
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Map(entries) => {
            let mut ordered: Vec<(String, Value)> = entries
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            ordered.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Map(ordered)
        }
        Value::Array(items) => {
            let mut ordered: Vec<Value> = items.iter().map(canonicalize).collect();
            ordered.sort_by(Value::cmp_canonical);
            Value::Array(ordered)
        }
        scalar => scalar.clone(),
    }
}

/// Whether two values are equal once canonicalized.
#[must_use]
pub fn canonical_eq(a: &Value, b: &Value) -> bool {
    canonicalize(a) == canonicalize(b)
}

/// One entry of a flattened canonical value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    /// A map key.
    Key(&'a str),
    /// `null` leaf.
    Null,
    /// Boolean leaf.
    Bool(bool),
    /// Integer leaf.
    Integer(i64),
    /// Float leaf.
    Float(f64),
    /// Text leaf.
    Text(&'a str),
}

impl Token<'_> {
    /// Single-byte tag identifying the token type in the digest stream.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Token::Key(_) => b'k',
            Token::Null => b'n',
            Token::Bool(_) => b'b',
            Token::Integer(_) => b'i',
            Token::Float(_) => b'f',
            Token::Text(_) => b's',
        }
    }

    /// Textual form fed to the digest.
    ///
    /// Floats use the shortest round-trip form (`1.0`, `NaN`, `inf`), so a
    /// non-finite float never renders like the text `"NaN"` once tagged.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Token::Key(s) | Token::Text(s) => (*s).to_string(),
            Token::Null => "null".to_string(),
            Token::Bool(b) => b.to_string(),
            Token::Integer(n) => n.to_string(),
            Token::Float(f) => format!("{f:?}"),
        }
    }
}

/// Flattens a canonical value into its token stream, depth first.
///
/// Only map keys and scalar leaves are emitted, each key before its value.
/// Nesting is not recorded, so empty containers emit nothing.
#[must_use]
pub fn flatten(canonical: &Value) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    push_tokens(canonical, &mut tokens);
    tokens
}

fn push_tokens<'a>(value: &'a Value, tokens: &mut Vec<Token<'a>>) {
    match value {
        Value::Map(entries) => {
            for (key, item) in entries {
                tokens.push(Token::Key(key));
                push_tokens(item, tokens);
            }
        }
        Value::Array(items) => {
            for item in items {
                push_tokens(item, tokens);
            }
        }
        Value::Null => tokens.push(Token::Null),
        Value::Bool(b) => tokens.push(Token::Bool(*b)),
        Value::Integer(n) => tokens.push(Token::Integer(*n)),
        Value::Float(f) => tokens.push(Token::Float(*f)),
        Value::Text(s) => tokens.push(Token::Text(s)),
    }
}
