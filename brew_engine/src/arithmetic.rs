/// Arithmetic Primitives
///
/// Volumes are i64 fixed-point litres (SCALE = 10_000).
/// No float. An odd bottle count is half a litre and stays exact.

use crate::error::EngineError;

/// Fixed-point scale factor. A volume of `v` litres is stored as `v * SCALE`.
pub const SCALE: i64 = 10_000;

/// Bottles that make up one litre-equivalent of stock.
pub const BOTTLES_PER_LITRE: i64 = 2;

/// Checked integer addition.
pub fn checked_add(a: i64, b: i64) -> Result<i64, EngineError> {
    a.checked_add(b)
        .ok_or_else(|| EngineError::Overflow(format!("{} + {} overflows i64", a, b)))
}

/// Checked integer subtraction.
pub fn checked_sub(a: i64, b: i64) -> Result<i64, EngineError> {
    a.checked_sub(b)
        .ok_or_else(|| EngineError::Overflow(format!("{} - {} overflows i64", a, b)))
}

/// Checked integer multiplication.
pub fn checked_mul(a: i64, b: i64) -> Result<i64, EngineError> {
    a.checked_mul(b)
        .ok_or_else(|| EngineError::Overflow(format!("{} * {} overflows i64", a, b)))
}

/// Whole litres to fixed-point.
pub fn litres(whole: u64) -> Result<i64, EngineError> {
    let whole = i64::try_from(whole)
        .map_err(|_| EngineError::Overflow(format!("{} litres exceeds i64", whole)))?;
    checked_mul(whole, SCALE)
}

/// Bottle count to fixed-point litres (`bottles / 2`).
pub fn bottles_to_litres(bottles: u64) -> Result<i64, EngineError> {
    let scaled = litres(bottles)?;
    Ok(scaled / BOTTLES_PER_LITRE)
}

/// Render a fixed-point volume, trimming trailing zero decimals.
///
/// `55_000` renders as `5.5`, `50_000` as `5`.
pub fn format_fixed(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let scale = SCALE as u64;
    let whole = abs / scale;
    let frac = abs % scale;
    if frac == 0 {
        return format!("{}{}", sign, whole);
    }
    let digits = format!("{:04}", frac);
    format!("{}{}.{}", sign, whole, digits.trim_end_matches('0'))
}

/// Integer mean of `total / count`, ties rounded to even.
///
/// `count == 0` is treated as one observation.
pub fn mean_half_even(total: u64, count: u64) -> u64 {
    let count = count.max(1);
    let quotient = total / count;
    let remainder = total % count;
    // Compare 2r against n without overflowing on huge remainders.
    match remainder.cmp(&(count - remainder)) {
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Equal => quotient + (quotient % 2),
    }
}
