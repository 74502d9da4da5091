// ── Display formatting ──
//
// Amounts and dates as the back-office renders them: thousand-separated
// fixed decimals, `YYYY-MM-DD` dates and `YYYY-MM-DD HH:MM:SS` timestamps.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};

// ── Numbers ──────────────────────────────────────────────────────────

/// Round half up to `decimals` places.
pub fn round_number(value: f64, decimals: u8) -> f64 {
    let factor = 10_f64.powi(i32::from(decimals));
    (value * factor + 0.5).floor() / factor
}

/// Thousand separators and exactly `decimals` decimal places.
///
/// Absent or NaN values render as zero.
pub fn format_number(value: Option<f64>, decimals: u8) -> String {
    let precision = usize::from(decimals);
    let Some(value) = value.filter(|v| !v.is_nan()) else {
        return format!("{:.precision$}", 0.0);
    };

    let fixed = format!("{:.precision$}", round_number(value, decimals));
    let (sign, unsigned) = fixed
        .strip_prefix('-')
        .map_or(("", fixed.as_str()), |rest| ("-", rest));
    let (integer, fraction) = unsigned
        .split_once('.')
        .map_or((unsigned, None), |(i, f)| (i, Some(f)));

    let grouped = group_thousands(integer);
    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Read a user-typed amount: commas are ignored, the longest numeric
/// prefix wins, anything unreadable is zero.
pub fn parse_number(input: &str) -> f64 {
    let cleaned: String = input.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim_start();

    cleaned
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .rev()
        .find_map(|end| cleaned[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

// ── Dates ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthBoundary {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBoundary {
    Start,
    End,
}

/// `YYYY-MM-DD`, optionally snapped to the first or last day of the month.
pub fn format_date(date: NaiveDate, boundary: Option<MonthBoundary>) -> String {
    let date = match boundary {
        Some(MonthBoundary::Start) => date.with_day(1).unwrap_or(date),
        Some(MonthBoundary::End) => last_day_of_month(date),
        None => date,
    };
    date.format("%Y-%m-%d").to_string()
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .unwrap_or(date)
}

/// `YYYY-MM-DD HH:MM:SS`; a boundary replaces the time with
/// `00:00:00` or `23:59:59`.
pub fn format_datetime(datetime: NaiveDateTime, boundary: Option<DayBoundary>) -> String {
    let day = datetime.format("%Y-%m-%d");
    match boundary {
        Some(DayBoundary::Start) => format!("{day} 00:00:00"),
        Some(DayBoundary::End) => format!("{day} 23:59:59"),
        None => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}
