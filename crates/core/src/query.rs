//! Logical SQL statements with named bind parameters.
//!
//! Placeholders use the Data API syntax `:name`. A [`ParameterizedQuery`] can
//! be sent as-is with its parameters bound server-side, or rendered with the
//! values inlined as SQL literals (batch submissions accept no parameters).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{RedshiftDataError, Result};

/// A bind parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// String form sent to the Data API; `None` for NULL.
    pub fn to_wire(&self) -> Option<String> {
        match self {
            ParamValue::Null => None,
            ParamValue::Boolean(b) => Some(b.to_string()),
            ParamValue::Integer(i) => Some(i.to_string()),
            ParamValue::Float(f) => Some(f.to_string()),
            ParamValue::Text(s) => Some(s.clone()),
        }
    }

    /// SQL literal used when the value is inlined into the statement text.
    pub fn to_sql_literal(&self) -> String {
        match self {
            ParamValue::Null => "NULL".to_string(),
            ParamValue::Boolean(true) => "TRUE".to_string(),
            ParamValue::Boolean(false) => "FALSE".to_string(),
            ParamValue::Integer(i) => i.to_string(),
            ParamValue::Float(f) if f.is_finite() => f.to_string(),
            ParamValue::Float(f) => format!("'{f}'::float8"),
            ParamValue::Text(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''")),
        }
    }

    /// Best-effort typing of a raw string (used by the CLI `--param` flag).
    pub fn infer(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return ParamValue::Integer(i);
        }
        if raw.chars().any(|c| c.is_ascii_digit()) {
            if let Ok(f) = raw.parse::<f64>() {
                return ParamValue::Float(f);
            }
        }
        match raw.to_ascii_lowercase().as_str() {
            "true" => ParamValue::Boolean(true),
            "false" => ParamValue::Boolean(false),
            _ => ParamValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_wire() {
            Some(v) => f.write_str(&v),
            None => f.write_str("NULL"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Integer(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Boolean(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

/// SQL text plus ordered `name → value` bind parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterizedQuery {
    sql: String,
    #[serde(default)]
    parameters: IndexMap<String, ParamValue>,
}

impl ParameterizedQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: IndexMap::new(),
        }
    }

    /// Bind `value` to the `:name` placeholder. Rebinding a name keeps its
    /// original position and replaces the value.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &IndexMap<String, ParamValue> {
        &self.parameters
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Reject empty SQL and malformed parameter names.
    pub fn validate(&self) -> Result<()> {
        if self.sql.trim().is_empty() {
            return Err(RedshiftDataError::Validation(
                "SQL text must not be empty".into(),
            ));
        }
        for name in self.parameters.keys() {
            if !is_valid_param_name(name) {
                return Err(RedshiftDataError::Validation(format!(
                    "invalid parameter name '{name}'"
                )));
            }
        }
        Ok(())
    }

    /// Parameters in binding order as `(name, value)` strings.
    ///
    /// The Data API cannot bind NULL, so a NULL value is a validation error.
    pub fn wire_parameters(&self) -> Result<Vec<(String, String)>> {
        self.parameters
            .iter()
            .map(|(name, value)| {
                value.to_wire().map(|v| (name.clone(), v)).ok_or_else(|| {
                    RedshiftDataError::Validation(format!(
                        "parameter '{name}' is NULL; inline NULL in the SQL text instead"
                    ))
                })
            })
            .collect()
    }

    /// Render the SQL with every bound `:name` replaced by its literal.
    ///
    /// Placeholders are only substituted in plain SQL text. String literals,
    /// quoted identifiers, `--` and `/* */` comments, and `::type` casts are
    /// copied verbatim, as are placeholders with no bound value. An
    /// unterminated quote or comment swallows the rest of the text.
    pub fn to_inline_sql(&self) -> String {
        let chars: Vec<char> = self.sql.chars().collect();
        let mut out = String::with_capacity(self.sql.len());
        let mut i = 0;

        while i < chars.len() {
            if let Some(end) = opaque_span_end(&chars, i) {
                out.extend(&chars[i..end]);
                i = end;
                continue;
            }

            let c = chars[i];
            match c {
                ':' if chars.get(i + 1) == Some(&':') => {
                    out.push_str("::");
                    i += 2;
                }
                ':' if chars.get(i + 1).is_some_and(|n| is_ident_start(*n)) => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && is_ident_char(chars[end]) {
                        end += 1;
                    }
                    let name: String = chars[start..end].iter().collect();
                    match self.parameters.get(&name) {
                        Some(value) => out.push_str(&value.to_sql_literal()),
                        None => {
                            out.push(':');
                            out.push_str(&name);
                        }
                    }
                    i = end;
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        out
    }
}

/// End (exclusive) of the string literal, quoted identifier or comment that
/// starts at `i`; `None` when `i` starts plain SQL text.
fn opaque_span_end(chars: &[char], i: usize) -> Option<usize> {
    match (chars[i], chars.get(i + 1)) {
        ('\'', _) => Some(quoted_end(chars, i + 1, '\'', true)),
        ('"', _) => Some(quoted_end(chars, i + 1, '"', false)),
        ('-', Some('-')) => Some(
            chars[i..]
                .iter()
                .position(|&c| c == '\n')
                .map_or(chars.len(), |p| i + p + 1),
        ),
        ('/', Some('*')) => Some(block_comment_end(chars, i + 2)),
        _ => None,
    }
}

/// Closing position of a quoted run. A doubled quote is an escaped quote;
/// string literals also honour backslash escapes.
fn quoted_end(chars: &[char], mut i: usize, quote: char, backslash_escapes: bool) -> usize {
    while i < chars.len() {
        let c = chars[i];
        if backslash_escapes && c == '\\' {
            i += 2;
        } else if c == quote && chars.get(i + 1) == Some(&quote) {
            i += 2;
        } else if c == quote {
            return i + 1;
        } else {
            i += 1;
        }
    }
    chars.len()
}

/// Block comments nest.
fn block_comment_end(chars: &[char], mut i: usize) -> usize {
    let mut depth = 1;
    while i < chars.len() {
        match (chars[i], chars.get(i + 1)) {
            ('/', Some('*')) => {
                depth += 1;
                i += 2;
            }
            ('*', Some('/')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    chars.len()
}

impl From<&str> for ParameterizedQuery {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for ParameterizedQuery {
    fn from(sql: String) -> Self {
        Self::new(sql)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => chars.all(is_ident_char),
        _ => false,
    }
}
