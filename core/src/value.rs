use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::config::MAX_PRECISION;

/// A single scalar cell of a logged row.
///
/// Only `Float` is affected by the configured precision; every other kind
/// renders with its natural textual form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    #[serde(skip_deserializing)]
    DateTime(NaiveDateTime),
    Null,
}

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Enough fractional digits to print any finite f64 exactly.
const EXACT_DIGITS: usize = 1100;

/// Fixed-point rendering that rounds an exact half away from zero
/// (2.5 -> "3", 0.125 -> "0.13") instead of to even.
fn fixed_point(v: f64, precision: usize) -> String {
    if !v.is_finite() {
        return v.to_string();
    }

    let exact = format!("{:.*}", EXACT_DIGITS, v.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let frac = frac_part.as_bytes();

    let mut digits: Vec<u8> = int_part.bytes().chain(frac[..precision].iter().copied()).collect();
    let mut int_len = int_part.len();

    if frac[precision] >= b'5' {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
            int_len += 1;
        }
    }

    let mut out = String::with_capacity(digits.len() + 2);
    if v.is_sign_negative() {
        out.push('-');
    }
    for (i, d) in digits.iter().enumerate() {
        if i == int_len {
            out.push('.');
        }
        out.push(*d as char);
    }
    out
}

impl Value {
    pub fn render(&self, precision: usize) -> String {
        match self {
            Value::Float(v) => fixed_point(*v, precision.min(MAX_PRECISION)),
            Value::Int(v) => v.to_string(),
            Value::UInt(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Value::Null => String::new(),
        }
    }

    /// Classify a raw text field: integer, then float, then boolean, else text.
    pub fn infer(raw: &str) -> Self {
        let field = raw.trim();
        if field.is_empty() {
            return Value::Null;
        }
        if let Ok(v) = field.parse::<i64>() {
            return Value::Int(v);
        }
        if let Ok(v) = field.parse::<u64>() {
            return Value::UInt(v);
        }
        // "inf"/"nan" parse as f64 but are words, keep them as text
        if field.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(v) = field.parse::<f64>() {
                return Value::Float(v);
            }
        }
        match field {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Text(field.to_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_float_precision() {
        assert_eq!(Value::Float(3.14159).render(2), "3.14");
        assert_eq!(Value::Float(3.9).render(0), "4");
        assert_eq!(Value::Float(1.0).render(3), "1.000");
        assert_eq!(Value::Float(-0.125).render(1), "-0.1");
    }

    #[test]
    fn test_float_ties_round_away_from_zero() {
        assert_eq!(Value::Float(2.5).render(0), "3");
        assert_eq!(Value::Float(0.5).render(0), "1");
        assert_eq!(Value::Float(1.5).render(0), "2");
        assert_eq!(Value::Float(0.125).render(2), "0.13");
        assert_eq!(Value::Float(-2.5).render(0), "-3");
        assert_eq!(Value::Float(99.5).render(0), "100");
        assert_eq!(Value::Float(9.995).render(2), "9.99");
        assert_eq!(Value::Float(2.675).render(2), "2.67");
    }

    #[test]
    fn test_float_precision_is_capped() {
        assert_eq!(Value::Float(1.5).render(70_000), Value::Float(1.5).render(MAX_PRECISION));
        assert_eq!(Value::Float(f64::NAN).render(2), "NaN");
    }

    #[test]
    fn test_non_float_ignores_precision() {
        assert_eq!(Value::Int(42).render(0), "42");
        assert_eq!(Value::UInt(7).render(5), "7");
        assert_eq!(Value::Bool(true).render(2), "true");
        assert_eq!(Value::from("a, b").render(2), "a, b");
        assert_eq!(Value::Null.render(2), "");
    }

    #[test]
    fn test_datetime_render() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(7, 5, 3, 42)
            .unwrap();
        assert_eq!(Value::from(dt).render(2), "2024-03-09T07:05:03.042");
    }

    #[test]
    fn test_infer() {
        assert_eq!(Value::infer("12"), Value::Int(12));
        assert_eq!(Value::infer(" -3 "), Value::Int(-3));
        assert_eq!(Value::infer("18446744073709551615"), Value::UInt(u64::MAX));
        assert_eq!(Value::infer("2.5"), Value::Float(2.5));
        assert_eq!(Value::infer("true"), Value::Bool(true));
        assert_eq!(Value::infer("nan"), Value::Text("nan".to_string()));
        assert_eq!(Value::infer("hello"), Value::Text("hello".to_string()));
        assert_eq!(Value::infer(""), Value::Null);
    }

    #[test]
    fn test_json_row() {
        let row: Vec<Value> = serde_json::from_str(r#"[1, 2.5, "x", false, null]"#).unwrap();
        assert_eq!(
            row,
            vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Text("x".to_string()),
                Value::Bool(false),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<f64> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some(1.5)), Value::Float(1.5));
    }
}
