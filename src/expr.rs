//! The `${...}` expression interpolator (spec §4.B).
//!
//! The grammar is a single whole-string match, resolved per spec §9 open question (a): there
//! is no support for multiple `${...}` occurrences inside one string, matching the contract
//! this spec settles on rather than the source's disabled multi-match branch.

use crate::ids::topic_from_id;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static::lazy_static! {
    static ref EXPR_RE: Regex = Regex::new(r"^(!?)\$\{([^}]+)\}$").unwrap();
}

/// The context an expression is evaluated against: the composition instance's id and its
/// (already deep-cloned) features object.
#[derive(Debug, Clone)]
pub struct Context {
    pub id: String,
    pub features: Value,
}

impl Context {
    pub fn new(id: impl Into<String>, features: Value) -> Self {
        Context {
            id: id.into(),
            features,
        }
    }

    /// Shallow dotted-path accessor into `features`, e.g. `features.test.resource` resolves
    /// `self.features["test"]["resource"]`; `id` resolves `self.id`.
    fn resolve_path(&self, path: &str) -> Option<Value> {
        let mut parts = path.split('.');
        let head = parts.next()?;
        let mut current = if head == "id" {
            Value::String(self.id.clone())
        } else if head == "features" {
            self.features.clone()
        } else {
            return None;
        };
        for part in parts {
            current = current.get(part)?.clone();
        }
        Some(current)
    }
}

/// Evaluates a single `${...}` / `!${...}` string against `ctx`. The outer `Option` tells the
/// caller whether `s` is an expression at all: `None` means "not an expression, pass through
/// unchanged". `Some(inner)` means it is one, and `inner` is itself `None` when the expression
/// resolved to *undefined* (a dotted path with no matching key) -- distinct from resolving to
/// JSON `null`, which is `Some(Some(Value::Null))`. Only the `None` case should ever make
/// [`interpolate`] drop something.
fn evaluate_expression(s: &str, ctx: &Context) -> Option<Option<Value>> {
    let caps = EXPR_RE.captures(s)?;
    let negated = &caps[1] == "!";
    let inner = &caps[2];

    let resolved = if let Some(subtopic) = inner.strip_prefix("topic:") {
        Some(Value::String(format!("{}+{}", topic_from_id(&ctx.id), subtopic)))
    } else {
        ctx.resolve_path(inner)
    };

    Some(resolved.map(|resolved| {
        if negated {
            if let Value::String(s) = &resolved {
                return Value::String(format!("!{}", s));
            }
        }
        resolved
    }))
}

/// Interpolates every string in `value` against `ctx`, recursively. `None` means "this
/// element/entry should be dropped": a non-expression string always survives, but an
/// expression string that resolves to undefined (spec §4.B) drops its entry same as a
/// composite container whose child dropped.
pub fn interpolate(value: &Value, ctx: &Context) -> Option<Value> {
    match value {
        Value::Null => Some(Value::Null),
        Value::String(s) => match evaluate_expression(s, ctx) {
            Some(Some(v)) => Some(v),
            Some(None) => None,
            None => Some(Value::String(s.clone())),
        },
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(replacement) = interpolate(item, ctx) {
                    out.push(replacement);
                }
            }
            Some(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                let new_key = match evaluate_expression(k, ctx) {
                    Some(Some(Value::String(s))) => Some(s),
                    Some(Some(_)) => None, // a key must stay a string; a non-string resolution drops the entry
                    Some(None) => None, // expression resolved to undefined
                    None => Some(k.clone()),
                };
                if let Some(new_key) = new_key {
                    if let Some(new_value) = interpolate(v, ctx) {
                        out.insert(new_key, new_value);
                    }
                }
            }
            Some(Value::Object(out))
        }
        other => Some(other.clone()),
    }
}
