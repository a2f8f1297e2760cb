use std::{cmp::Ordering, fmt};

/// Stored in place of a number that is not a number.
pub const NOT_A_NUMBER: &str = "N/A";
/// Stored in place of a number above `f64::MAX`.
pub const INFINITY: &str = "Infinity";
/// Stored in place of a number below `-f64::MAX`.
pub const NEG_INFINITY: &str = "-Infinity";

/// Longest text an operator may produce, in characters.
pub const MAX_TEXT_LENGTH: u64 = 1 << 29;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Number => write!(f, "number"),
            ValueKind::Text => write!(f, "text"),
        }
    }
}

/// A stack value. Numbers are always finite.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Wraps a number, replacing NaN and infinities by their sentinel texts.
    pub fn number(n: f64) -> Value {
        if n.is_nan() {
            Value::Text(NOT_A_NUMBER.to_string())
        } else if n > f64::MAX {
            Value::Text(INFINITY.to_string())
        } else if n < -f64::MAX {
            Value::Text(NEG_INFINITY.to_string())
        } else {
            Value::Number(n)
        }
    }

    pub fn text(text: impl Into<String>) -> Value {
        Value::Text(text.into())
    }

    pub fn bool(b: bool) -> Value {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
        }
    }

    /// Numbers as they are, text by its length in characters.
    pub fn as_count(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => s.chars().count() as f64,
        }
    }

    /// Ordering used by `=`: natural order within a kind, otherwise text is greater.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Text(_), Value::Number(_)) => Ordering::Greater,
            (Value::Number(_), Value::Text(_)) => Ordering::Less,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Shortest decimal form of `n`; integers have no fraction and very large or
/// small magnitudes use `1.5e+21` style exponents.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { INFINITY } else { NEG_INFINITY }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{n:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
            _ => formatted,
        };
    }
    format!("{n}")
}

/// Parses the longest numeric prefix of `text` after leading whitespace.
/// Returns NaN when there is none.
pub fn parse_float(text: &str) -> f64 {
    let text = text.trim_start();
    let (sign, rest) = match text.as_bytes().first() {
        Some(b'-') => (-1.0, &text[1..]),
        Some(b'+') => (1.0, &text[1..]),
        _ => (1.0, text),
    };
    if rest.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    let bytes = rest.as_bytes();
    let digits_from = |start: usize| bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count();

    let int_digits = digits_from(0);
    let mut end = int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }
    let mantissa_end = end;
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_digits = digits_from(exp_start);
        if exp_digits > 0 {
            end = exp_start + exp_digits;
        }
    }

    let mut normalized = String::with_capacity(end + 4);
    let (int_part, frac_part) = rest[..mantissa_end].split_once('.').unwrap_or((&rest[..mantissa_end], ""));
    normalized.push_str(if int_part.is_empty() { "0" } else { int_part });
    normalized.push('.');
    normalized.push_str(if frac_part.is_empty() { "0" } else { frac_part });
    normalized.push_str(&rest[mantissa_end..end]);
    normalized.parse::<f64>().map(|n| sign * n).unwrap_or(f64::NAN)
}

/// Converts a number to a character the way a UTF-16 code unit would be read.
pub fn char_from_code(n: f64) -> char {
    let code = (n.abs().trunc() % 65536.0) as u32;
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Clamps a fractional index into `0..=len`; NaN counts as 0.
pub(crate) fn clamp_index(n: f64, len: usize) -> usize {
    if n.is_nan() || n <= 0.0 {
        0
    } else if n >= len as f64 {
        len
    } else {
        n.trunc() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_sentinels() {
        assert_eq!(Value::number(f64::NAN), Value::text(NOT_A_NUMBER));
        assert_eq!(Value::number(f64::INFINITY), Value::text(INFINITY));
        assert_eq!(Value::number(f64::MAX * 2.0), Value::text(INFINITY));
        assert_eq!(Value::number(f64::NEG_INFINITY), Value::text(NEG_INFINITY));
        assert_eq!(Value::number(f64::MAX), Value::Number(f64::MAX));
        assert_eq!(Value::number(-2.5), Value::Number(-2.5));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-12.25), "-12.25");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(123456789012.0), "123456789012");
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("42"), 42.0);
        assert_eq!(parse_float("  -3.5abc"), -3.5);
        assert_eq!(parse_float("1."), 1.0);
        assert_eq!(parse_float(".25"), 0.25);
        assert_eq!(parse_float("2e3x"), 2000.0);
        assert_eq!(parse_float("2e"), 2.0);
        assert_eq!(parse_float("+7"), 7.0);
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float("").is_nan());
        assert!(parse_float("abc").is_nan());
        assert!(parse_float(".").is_nan());
        assert!(parse_float("-").is_nan());
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::text("").is_truthy());
        assert!(Value::text("0").is_truthy());
    }

    #[test]
    fn test_char_from_code() {
        assert_eq!(char_from_code(65.0), 'A');
        assert_eq!(char_from_code(-97.9), 'a');
        assert_eq!(char_from_code(65536.0 + 66.0), 'B');
        assert_eq!(char_from_code(55296.0), char::REPLACEMENT_CHARACTER);
    }
}
