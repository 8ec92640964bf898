//! Timecode formatting and parsing for the trim UI.
//!
//! All values are seconds as `f64`, quantized to whole milliseconds.
//! Quantizing before storage and before every comparison keeps
//! floating-point jitter from producing spurious updates.

use crate::error::{ClipError, Result};

/// Minimum clip length in seconds.
pub const MIN_CLIP_SECS: f64 = 0.1;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Round a time value to millisecond precision.
///
/// Non-finite input collapses to zero.
#[inline]
pub fn round_ms(seconds: f64) -> f64 {
    if !seconds.is_finite() {
        return 0.0;
    }
    (seconds * 1000.0).round() / 1000.0
}

/// Whole milliseconds of a non-negative time value.
#[inline]
fn to_millis(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 1000.0).round() as u64
}

/// Two time values are equal once rounded to the millisecond.
#[inline]
pub fn same_ms(a: f64, b: f64) -> bool {
    round_ms(a) == round_ms(b)
}

/// Format seconds as `M:SS.mmm`, or `H:MM:SS.mmm` from one hour up.
///
/// Negative and non-finite values format as zero.
pub fn format_time(seconds: f64) -> String {
    let total = to_millis(seconds);
    let hours = total / MS_PER_HOUR;
    let minutes = (total % MS_PER_HOUR) / MS_PER_MINUTE;
    let secs = (total % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = total % MS_PER_SECOND;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}.{millis:03}")
    } else {
        format!("{minutes}:{secs:02}.{millis:03}")
    }
}

/// Parse a timecode typed by the user back into seconds.
///
/// Accepts `S`, `S.f`, `M:SS`, `M:SS.fff` and `H:MM:SS.fff`. Fractions
/// may have one to three digits. When a higher field is present the
/// lower fields must stay below 60.
pub fn parse_time_string(input: &str) -> Result<f64> {
    let text = input.trim();
    if text.is_empty() {
        return Err(invalid(input, "empty"));
    }

    let fields: Vec<&str> = text.split(':').collect();
    if fields.len() > 3 {
        return Err(invalid(input, "too many fields"));
    }

    let (whole_fields, last) = fields.split_at(fields.len() - 1);
    let (secs_part, frac_part) = match last[0].split_once('.') {
        Some((s, f)) => (s, Some(f)),
        None => (last[0], None),
    };

    let seconds = parse_field(input, secs_part)?;
    if !whole_fields.is_empty() && seconds >= 60 {
        return Err(invalid(input, "seconds out of range"));
    }

    let millis = match frac_part {
        None => 0,
        Some(f) if f.is_empty() || f.len() > 3 => {
            return Err(invalid(input, "fraction must have 1-3 digits"));
        }
        Some(f) => parse_field(input, f)? * 10u64.pow(3 - f.len() as u32),
    };

    let (hours, minutes) = match whole_fields {
        [] => (0, 0),
        [minutes] => (0, parse_field(input, minutes)?),
        [hours, minutes] => {
            let minutes = parse_field(input, minutes)?;
            if minutes >= 60 {
                return Err(invalid(input, "minutes out of range"));
            }
            (parse_field(input, hours)?, minutes)
        }
        _ => return Err(invalid(input, "too many fields")),
    };

    let total = hours
        .checked_mul(MS_PER_HOUR)
        .zip(minutes.checked_mul(MS_PER_MINUTE))
        .zip(seconds.checked_mul(MS_PER_SECOND))
        .and_then(|((h, m), s)| h.checked_add(m)?.checked_add(s)?.checked_add(millis))
        .ok_or_else(|| invalid(input, "field overflow"))?;

    Ok(total as f64 / 1000.0)
}

fn parse_field(input: &str, field: &str) -> Result<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(input, "expected digits"));
    }
    field
        .parse::<u64>()
        .map_err(|_| invalid(input, "field overflow"))
}

fn invalid(input: &str, reason: &str) -> ClipError {
    ClipError::InvalidTimecode(format!("{input:?}: {reason}"))
}
