/// Week-of-Year Arithmetic
///
/// Weeks are 1-based buckets `1..=52`. Day 1 of a year is January 1st
/// (one day after December 31st of the prior year). Days 365 and 366
/// fall into week 52.

use chrono::{Datelike, NaiveDate};

pub const WEEKS_PER_YEAR: u8 = 52;

/// Width of the demand window used for allocation.
pub const FORECAST_WINDOW_WEEKS: u8 = 8;

/// Order-date format in sales files, e.g. `05-Mar-19`.
pub const ORDER_DATE_FORMAT: &str = "%d-%b-%y";

/// `ceil(days since Dec 31 of the prior year / 7)`, capped at 52.
pub fn week_of_year(date: NaiveDate) -> u8 {
    let days = date.ordinal();
    let week = (days + 6) / 7;
    week.min(WEEKS_PER_YEAR as u32) as u8
}

/// `width` consecutive week indices starting at `start`, wrapping 52 -> 1.
///
/// `start` is clamped into `1..=52` and `width` to at most 52, so the
/// window never repeats a week.
pub fn rolling_window(start: u8, width: u8) -> Vec<u8> {
    let weeks = WEEKS_PER_YEAR as u16;
    let start = start.clamp(1, WEEKS_PER_YEAR) as u16;
    let width = width.min(WEEKS_PER_YEAR) as u16;
    (0..width)
        .map(|offset| ((start - 1 + offset) % weeks + 1) as u8)
        .collect()
}

/// Parse a sales-file order date.
pub fn parse_order_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(text.trim(), ORDER_DATE_FORMAT)
}
