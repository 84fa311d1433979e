//! Morf strategies: the transforms applied to raw values at read time.
//!
//! Supports `%(key)s` syntax for cross-referencing values within a container.
//! Use `%%` to produce a literal `%`. Referenced keys are looked up on the
//! container being read, so resolution recurses through placeholders and
//! parent scopes at every read; nothing is memoized.

use std::rc::Rc;

use super::container::MorfDict;
use super::error::DictError;
use super::value::Value;

/// A per-key (or default) transform applied to a raw value during `get`.
///
/// Errors returned by a morf propagate unchanged through `get`.
pub type MorfFn = Rc<dyn Fn(&MorfDict, Value) -> Result<Value, DictError>>;

/// The default strategy of a plain container: raw values pass through.
pub fn identity(_dict: &MorfDict, value: Value) -> Result<Value, DictError> {
    Ok(value)
}

/// The default strategy of an interpolating container: string values have
/// their `%(key)s` placeholders substituted; everything else passes through.
pub fn interpolate(dict: &MorfDict, value: Value) -> Result<Value, DictError> {
    match value {
        Value::String(s) => Ok(Value::String(interpolate_str(dict, &s)?)),
        other => Ok(other),
    }
}

/// Substitutes all `%(key)s` placeholders in a string.
/// Handles `%%` escape sequences.
fn interpolate_str(dict: &MorfDict, s: &str) -> Result<String, DictError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '%' {
            match chars.peek() {
                Some('%') => {
                    // Escape sequence: %% -> %
                    chars.next();
                    result.push('%');
                }
                Some('(') => {
                    // Placeholder: %(key)s
                    chars.next(); // consume '('
                    let key = consume_until(&mut chars, ')')
                        .ok_or(DictError::UnclosedPlaceholder)?;

                    if chars.next() != Some('s') {
                        return Err(DictError::InvalidPlaceholder(key));
                    }

                    let resolved = dict.get(&key)?;
                    result.push_str(&scalar_to_string(&resolved, &key)?);
                }
                _ => {
                    // Just a lone %
                    result.push('%');
                }
            }
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Consumes characters until the delimiter, returning the collected string.
fn consume_until(chars: &mut std::iter::Peekable<std::str::Chars>, delim: char) -> Option<String> {
    let mut result = String::new();
    for ch in chars.by_ref() {
        if ch == delim {
            return Some(result);
        }
        result.push(ch);
    }
    None // Delimiter not found
}

/// Renders a resolved value into placeholder output.
fn scalar_to_string(value: &Value, key: &str) -> Result<String, DictError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::List(_) | Value::Table(_) | Value::Dict(_) => {
            Err(DictError::NonScalarPlaceholder(key.to_string()))
        }
    }
}
