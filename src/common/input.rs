// src/common/input.rs

use arrayvec::ArrayString;
use core::fmt::{self, Write};

/// Capacity of a [`RejectedInput`] snapshot. Longer values are cut.
pub const REJECTED_INPUT_CAPACITY: usize = 32;

/// A loosely typed stack or channel value as it arrives from the caller.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub enum InputValue<'a> {
    /// The field was not supplied.
    #[default]
    Absent,
    Integer(i64),
    Float(f64),
    /// A textual number such as `"3"` or `" 7 "`.
    Text(&'a str),
}

impl<'a> InputValue<'a> {
    #[inline]
    pub const fn is_absent(&self) -> bool {
        matches!(self, InputValue::Absent)
    }

    /// Interprets the value as an integer.
    ///
    /// Floats are truncated toward zero. Text is read like a lenient integer parser would:
    /// leading whitespace, an optional sign, an optional `0x` prefix, then as many digits as
    /// follow (`"12abc"` is 12). Returns `None` for absent values, non-finite floats and
    /// text without a leading digit.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            InputValue::Absent => None,
            InputValue::Integer(v) => Some(v),
            InputValue::Float(v) if v.is_finite() => Some(v as i64),
            InputValue::Float(_) => None,
            InputValue::Text(s) => parse_integer_prefix(s),
        }
    }
}

impl From<i64> for InputValue<'_> {
    fn from(value: i64) -> Self {
        InputValue::Integer(value)
    }
}

impl From<i32> for InputValue<'_> {
    fn from(value: i32) -> Self {
        InputValue::Integer(value as i64)
    }
}

impl From<u8> for InputValue<'_> {
    fn from(value: u8) -> Self {
        InputValue::Integer(value as i64)
    }
}

impl From<f64> for InputValue<'_> {
    fn from(value: f64) -> Self {
        InputValue::Float(value)
    }
}

impl<'a> From<&'a str> for InputValue<'a> {
    fn from(value: &'a str) -> Self {
        InputValue::Text(value)
    }
}

impl<'a, T> From<Option<T>> for InputValue<'a>
where
    T: Into<InputValue<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(InputValue::Absent, Into::into)
    }
}

impl fmt::Display for InputValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Absent => f.write_str("absent"),
            InputValue::Integer(v) => write!(f, "{}", v),
            InputValue::Float(v) => write!(f, "{}", v),
            InputValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

fn parse_integer_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix) else { break };
        seen_digit = true;
        value = value.saturating_mul(radix as i64).saturating_add(d as i64);
    }

    if !seen_digit {
        return None;
    }
    Some(if negative { value.saturating_neg() } else { value })
}

/// Printable copy of a value that failed validation, kept for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct RejectedInput(ArrayString<REJECTED_INPUT_CAPACITY>);

impl RejectedInput {
    pub fn capture(value: &InputValue<'_>) -> Self {
        let mut out = Truncating(ArrayString::new());
        // Truncating never reports an error
        let _ = write!(out, "{}", value);
        RejectedInput(out.0)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RejectedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for RejectedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RejectedInput({})", self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RejectedInput {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}

struct Truncating<const N: usize>(ArrayString<N>);

impl<const N: usize> Write for Truncating<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.try_push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}
