//! Loose value semantics shared by tokens, conditions and validators.
//!
//! Cell values are plain [`serde_json::Value`]s. A value that does not exist at
//! all (a missing column, a path that walks off the end of an object) is
//! represented as `None`; an explicit JSON `null` is `Some(Value::Null)`. The
//! helpers here give both the same coercion behaviour rule authors expect from
//! spreadsheet-like data: numeric strings compare as numbers, empty strings
//! count as missing, and so on.

use serde_json::Value;
use std::borrow::Cow;

/// Returns true if the value counts as "set" in a boolean position.
///
/// `false`, `0`, `NaN`, the empty string, `null` and a missing value are falsy.
/// Arrays and objects are always truthy, even when empty.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Returns true for a missing value, `null` or the empty string.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Coerces a value to a number the way spreadsheet text is usually read.
///
/// Missing values and anything unparseable become `NaN`; `null`, `false` and
/// blank strings become `0`. Strings accept surrounding whitespace, decimal
/// and exponent notation, `Infinity`, and `0x`/`0o`/`0b` integer literals.
/// A single-element array coerces like its only element.
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_numeric_str(s),
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [single] => match single {
                Value::Array(_) | Value::Object(_) => to_number(Some(&Value::String(
                    to_display(Some(single)).into_owned(),
                ))),
                other => to_number(Some(other)),
            },
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

fn parse_numeric_str(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    let (sign, unsigned) = match s.as_bytes()[0] {
        b'+' => (1.0, &s[1..]),
        b'-' => (-1.0, &s[1..]),
        _ => (1.0, s),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }

    // Radix literals never carry a sign.
    if unsigned.len() == s.len() {
        let radix = match s.get(..2) {
            Some("0x" | "0X") => Some(16),
            Some("0o" | "0O") => Some(8),
            Some("0b" | "0B") => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return s
                .get(2..)
                .filter(|digits| !digits.starts_with('+'))
                .and_then(|digits| u64::from_str_radix(digits, radix).ok())
                .map_or(f64::NAN, |n| n as f64);
        }
    }

    let well_formed = unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !well_formed || unsigned.starts_with(['+', '-']) {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Coerces to a number, treating missing, `null`, empty and unparseable
/// values as "no number".
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    if matches!(value, None | Some(Value::Null)) {
        return None;
    }
    if matches!(value, Some(Value::String(s)) if s.is_empty()) {
        return None;
    }
    let n = to_number(value);
    (!n.is_nan()).then_some(n)
}

/// Formats a number the way it reads in a message: integral values without a
/// fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{:.0}", n + 0.0)
    } else {
        n.to_string()
    }
}

/// Renders a value as text.
///
/// Missing values render as `undefined`, arrays join their elements with `,`
/// (nulls as empty) and objects render as `[object Object]`.
pub fn to_display(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None => Cow::Borrowed("undefined"),
        Some(Value::Null) => Cow::Borrowed("null"),
        Some(Value::Bool(b)) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Cow::Owned(i.to_string()),
            (_, Some(u)) => Cow::Owned(u.to_string()),
            _ => Cow::Owned(format_number(n.as_f64().unwrap_or(f64::NAN))),
        },
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(Value::Array(items)) => Cow::Owned(
            items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => to_display(Some(other)).into_owned(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Some(Value::Object(_)) => Cow::Borrowed("[object Object]"),
    }
}

/// Text form used by length checks: missing and `null` become the empty string.
pub fn to_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        other => to_display(other),
    }
}

/// Strict equality without type coercion.
///
/// Numbers compare by numeric value (so `1` equals `1.0`), everything else
/// structurally. A missing value only equals another missing value.
pub fn strict_equals(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Views a value as a list of candidates: `null`/missing is empty, arrays are
/// themselves and any other value is a one-element list.
pub fn as_sequence(value: Option<&Value>) -> Cow<'_, [Value]> {
    match value {
        None | Some(Value::Null) => Cow::Owned(Vec::new()),
        Some(Value::Array(items)) => Cow::Borrowed(items.as_slice()),
        Some(other) => Cow::Owned(vec![other.clone()]),
    }
}

/// Returns true if `candidates` holds an element strictly equal to `needle`.
pub fn contains(candidates: &[Value], needle: Option<&Value>) -> bool {
    candidates
        .iter()
        .any(|candidate| strict_equals(Some(candidate), needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&Value::Null)));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!({}))));
        assert!(is_truthy(Some(&json!(-2.5))));
    }

    #[test]
    fn test_emptiness() {
        assert!(is_empty(None));
        assert!(is_empty(Some(&Value::Null)));
        assert!(is_empty(Some(&json!(""))));
        assert!(!is_empty(Some(&json!(" "))));
        assert!(!is_empty(Some(&json!(0))));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(to_number(Some(&json!("500"))), 500.0);
        assert_eq!(to_number(Some(&json!("  12.5 "))), 12.5);
        assert_eq!(to_number(Some(&json!(""))), 0.0);
        assert_eq!(to_number(Some(&Value::Null)), 0.0);
        assert_eq!(to_number(Some(&json!(true))), 1.0);
        assert_eq!(to_number(Some(&json!("0x1F"))), 31.0);
        assert_eq!(to_number(Some(&json!("1e3"))), 1000.0);
        assert_eq!(to_number(Some(&json!("-Infinity"))), f64::NEG_INFINITY);
        assert_eq!(to_number(Some(&json!(["7"]))), 7.0);
        assert!(to_number(Some(&json!("abc"))).is_nan());
        assert!(to_number(Some(&json!("12abc"))).is_nan());
        assert!(to_number(Some(&json!("-0x10"))).is_nan());
        assert!(to_number(Some(&json!("inf"))).is_nan());
        assert!(to_number(Some(&json!({"a": 1}))).is_nan());
        assert!(to_number(None).is_nan());
    }

    #[test]
    fn test_number_coercion_non_ascii() {
        assert!(to_number(Some(&json!("€100"))).is_nan());
        assert!(to_number(Some(&json!("日本"))).is_nan());
        assert!(to_number(Some(&json!("0€"))).is_nan());
        assert!(to_number(Some(&json!("0x"))).is_nan());
        assert!(to_number(Some(&json!("0x+1"))).is_nan());
        assert_eq!(coerce_number(Some(&json!("€100"))), None);
    }

    #[test]
    fn test_coerce_number_rejects_blank() {
        assert_eq!(coerce_number(Some(&json!(""))), None);
        assert_eq!(coerce_number(Some(&Value::Null)), None);
        assert_eq!(coerce_number(Some(&json!("x"))), None);
        assert_eq!(coerce_number(Some(&json!(" 42 "))), Some(42.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(to_display(Some(&json!(100))), "100");
        assert_eq!(to_display(Some(&json!(100.0))), "100");
        assert_eq!(to_display(Some(&json!(2.5))), "2.5");
        assert_eq!(to_display(Some(&json!(["a", null, 1]))), "a,,1");
        assert_eq!(to_display(Some(&json!({"k": "v"}))), "[object Object]");
        assert_eq!(to_text(None), "");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(1e21), "1000000000000000000000");
    }

    #[test]
    fn test_strict_equality() {
        assert!(strict_equals(Some(&json!(1)), Some(&json!(1.0))));
        assert!(!strict_equals(Some(&json!("1")), Some(&json!(1))));
        assert!(strict_equals(None, None));
        assert!(!strict_equals(None, Some(&Value::Null)));
        assert!(strict_equals(Some(&json!(["a"])), Some(&json!(["a"]))));
    }

    #[test]
    fn test_sequence_membership() {
        let binding = json!(["gold", "platinum"]);
        let values = as_sequence(Some(&binding));
        assert!(contains(&values, Some(&json!("gold"))));
        assert!(!contains(&values, Some(&json!("silver"))));
        assert!(as_sequence(None).is_empty());
        assert_eq!(as_sequence(Some(&json!("solo"))).len(), 1);
    }
}
