//! Built-in filters
//!
//! Filters are lenient: a filter applied to a value of the wrong shape returns
//! the value unchanged rather than failing the render.

use super::value::{float_value, is_truthy, stringify};
use serde_json::Value;

/// Suffix appended by `truncate`
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Filter {
    Default,
    Upper,
    Lower,
    Title,
    Capitalize,
    Trim,
    Join,
    Length,
    First,
    Last,
    Bullets,
    Truncate,
    Round,
    Percent,
    Json,
}

impl Filter {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "default" => Self::Default,
            "upper" => Self::Upper,
            "lower" => Self::Lower,
            "title" => Self::Title,
            "capitalize" => Self::Capitalize,
            "trim" => Self::Trim,
            "join" => Self::Join,
            "length" => Self::Length,
            "first" => Self::First,
            "last" => Self::Last,
            "bullets" => Self::Bullets,
            "truncate" => Self::Truncate,
            "round" => Self::Round,
            "percent" => Self::Percent,
            "json" => Self::Json,
            _ => return None,
        })
    }

    /// Accepted argument count as `(min, max)`
    pub(crate) const fn arity(self) -> (usize, usize) {
        match self {
            Self::Default | Self::Truncate => (1, 1),
            Self::Join | Self::Round => (0, 1),
            _ => (0, 0),
        }
    }

    pub(crate) fn apply(self, value: Value, args: &[Value]) -> Value {
        match self {
            Self::Default => {
                if is_truthy(&value) || matches!(value, Value::Bool(false) | Value::Number(_)) {
                    value
                } else {
                    args.first().cloned().unwrap_or(Value::Null)
                }
            }
            Self::Upper => map_str(value, str::to_uppercase),
            Self::Lower => map_str(value, str::to_lowercase),
            Self::Title => map_str(value, title_case),
            Self::Capitalize => map_str(value, capitalize),
            Self::Trim => map_str(value, |s| s.trim().to_string()),
            Self::Join => match value {
                Value::Array(items) => {
                    let sep = args.first().map_or_else(|| ", ".to_string(), stringify);
                    Value::String(items.iter().map(stringify).collect::<Vec<_>>().join(&sep))
                }
                other => other,
            },
            Self::Length => {
                let len = match &value {
                    Value::Null => 0,
                    Value::Array(a) => a.len(),
                    Value::Object(o) => o.len(),
                    other => stringify(other).chars().count(),
                };
                Value::from(len)
            }
            Self::First => match value {
                Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
                Value::String(s) => s.chars().next().map_or(Value::Null, |c| c.to_string().into()),
                other => other,
            },
            Self::Last => match value {
                Value::Array(items) => items.into_iter().next_back().unwrap_or(Value::Null),
                Value::String(s) => s.chars().next_back().map_or(Value::Null, |c| c.to_string().into()),
                other => other,
            },
            Self::Bullets => match value {
                Value::Array(items) => Value::String(
                    items
                        .iter()
                        .map(|item| format!("- {}", stringify(item)))
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                Value::Null => Value::Null,
                other => Value::String(format!("- {}", stringify(&other))),
            },
            Self::Truncate => {
                let limit = args.first().and_then(Value::as_u64).unwrap_or(u64::MAX);
                let limit = usize::try_from(limit).unwrap_or(usize::MAX);
                map_str(value, |s| {
                    if s.chars().count() <= limit {
                        s.to_string()
                    } else {
                        let mut out: String = s.chars().take(limit).collect();
                        out.push_str(ELLIPSIS);
                        out
                    }
                })
            }
            Self::Round => match value.as_f64() {
                Some(f) => {
                    let digits = args.first().and_then(Value::as_u64).unwrap_or(0).min(10);
                    if digits == 0 {
                        float_value(f.round())
                    } else {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                        let scale = 10f64.powi(digits as i32);
                        float_value((f * scale).round() / scale)
                    }
                }
                None => value,
            },
            Self::Percent => match value.as_f64() {
                Some(f) => Value::String(format!("{:.0}%", f * 100.0)),
                None => value,
            },
            Self::Json => Value::String(value.to_string()),
        }
    }
}

fn map_str(value: Value, f: impl FnOnce(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_case(s: &str) -> String {
    s.split(' ').map(capitalize).collect::<Vec<_>>().join(" ")
}
