// src/common/reading.rs

use super::address::{ChannelAddress, FIRMWARE_REVISION_LEN};
use arrayvec::ArrayString;
use core::fmt::{self, Write};

/// Number of bytes in one channel register.
pub const READING_LEN: usize = 4;

/// Digits after the decimal point in the textual form of a reading.
pub const READING_DECIMALS: usize = 4;

// Sign, 21 integer digits, point and four decimals.
const READING_TEXT_CAPACITY: usize = 32;

// 10^READING_DECIMALS
const DECIMAL_SCALE: i64 = 10_000;

// Magnitude from which the text switches to exponent form.
const EXPONENT_THRESHOLD: f64 = 1e21;

/// A decoded channel value together with its fixed-point text form (`"23.4567"`).
#[derive(Copy, Clone, PartialEq)]
pub struct Reading {
    value: f32,
    text: ArrayString<READING_TEXT_CAPACITY>,
}

impl Reading {
    /// Decodes the little-endian IEEE-754 single held in a channel register.
    pub fn from_le_bytes(raw: [u8; READING_LEN]) -> Self {
        Self::from_value(f32::from_le_bytes(raw))
    }

    pub fn from_value(value: f32) -> Self {
        let mut text = ArrayString::new();
        // Every branch of format_fixed fits the capacity.
        let _ = format_fixed(&mut text, value);
        Reading { value, text }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// The value with exactly four fractional digits.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
}

// Fixed-point text with the conventions of the dashboards consuming it: exact ties round away
// from zero, negative zero prints unsigned, and magnitudes from 1e21 use exponent form.
fn format_fixed<W: Write>(out: &mut W, value: f32) -> fmt::Result {
    if value.is_nan() {
        return out.write_str("NaN");
    }
    if value.is_infinite() {
        return out.write_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
    }

    let wide = f64::from(value);
    if wide >= EXPONENT_THRESHOLD || wide <= -EXPONENT_THRESHOLD {
        let mut sci: ArrayString<READING_TEXT_CAPACITY> = ArrayString::new();
        write!(sci, "{:e}", wide)?;
        return match sci.split_once('e') {
            Some((mantissa, exponent)) => write!(out, "{}e+{}", mantissa, exponent),
            None => out.write_str(&sci),
        };
    }

    if let Some(scaled) = rounded_tie(wide) {
        let sign = if scaled < 0 { "-" } else { "" };
        let magnitude = scaled.unsigned_abs();
        let scale = DECIMAL_SCALE as u64;
        return write!(out, "{}{}.{:04}", sign, magnitude / scale, magnitude % scale);
    }

    // -0.0 compares equal to 0.0
    let value = if value == 0.0 { 0.0 } else { value };
    write!(out, "{:.*}", READING_DECIMALS, value)
}

// For a value exactly halfway between two four-decimal neighbours, the neighbour away from
// zero scaled by 10^4. `None` otherwise.
fn rounded_tie(value: f64) -> Option<i64> {
    // A 24-bit mantissa times 20000 stays within 53 bits, so this product is exact.
    let doubled = value * (2 * DECIMAL_SCALE) as f64;
    if !(-9.0e15..=9.0e15).contains(&doubled) {
        return None;
    }
    let whole = doubled as i64;
    if whole as f64 != doubled || whole % 2 == 0 {
        return None;
    }
    Some((whole + whole.signum()) / 2)
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reading({})", self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Reading {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}

/// Firmware revision reported by a board, printed as `major.minor` with two minor digits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl FirmwareVersion {
    pub const fn from_bytes(raw: [u8; FIRMWARE_REVISION_LEN]) -> Self {
        FirmwareVersion {
            major: raw[0],
            minor: raw[1],
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

/// Successful result of one channel read.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReading<V = ()> {
    /// The sensor that was read, after clamping.
    pub address: ChannelAddress,
    pub reading: Reading,
    /// The resolved payload, `None` when the reader suppresses it.
    pub payload: Option<V>,
}

// Fifth order fit of temperature (°C) over resistance (Ω) for PT100 elements, c5 first.
const POLY5_COEFFS: [f64; 6] = [
    -2.10678E-11,
    2.27311E-08,
    -8.20888E-06,
    2.38589E-03,
    2.24745E+00,
    -2.42522E+02,
];

/// Converts a resistance reading to °C using a fifth order polynomial fit.
///
/// Tracks the PT100 curve more closely than the board's built-in linear conversion, in
/// particular near the ends of its -200..660 °C range.
pub fn poly5_temperature(resistance_ohms: f64) -> f64 {
    // Horner form: ((((c5*r + c4)*r + c3)*r + c2)*r + c1)*r + c0
    POLY5_COEFFS
        .iter()
        .skip(1)
        .fold(POLY5_COEFFS[0], |acc, c| acc * resistance_ohms + c)
}
