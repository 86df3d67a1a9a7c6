use crate::error::{BPCError, BPCResult};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Pattern used for all date comparisons in the filter settings
pub const ISO_DATE_FORMAT: &str = "yyyy-MM-dd";

const MS_PER_YEAR: f64 = 1000.0 * 60.0 * 60.0 * 24.0 * 365.0;

const DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Anything the date parser accepts: a date string or milliseconds since the epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateInput<'a> {
    Text(&'a str),
    UnixMillis(f64),
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(s: &'a str) -> Self {
        DateInput::Text(s)
    }
}

impl<'a> From<&'a String> for DateInput<'a> {
    fn from(s: &'a String) -> Self {
        DateInput::Text(s.as_str())
    }
}

impl From<f64> for DateInput<'_> {
    fn from(ms: f64) -> Self {
        DateInput::UnixMillis(ms)
    }
}

impl From<i64> for DateInput<'_> {
    fn from(ms: i64) -> Self {
        DateInput::UnixMillis(ms as f64)
    }
}

/// Linear scaling mapping a point `x` from the domain [x1,x2] to the range [y1,y2]
pub fn scale(x: f64, x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
    if x1 == x2 {
        return y1 + (y2 - y1) / 2.0;
    }

    let a = (y2 - y1) / (x2 - x1);
    let b = y1 - a * x1;

    a * x + b
}

/// Single entry point for turning strings and timestamps into dates.
/// Timestamps and offset-carrying strings are resolved to UTC.
pub fn parse_date<'a, D: Into<DateInput<'a>>>(d: D) -> BPCResult<NaiveDateTime> {
    match d.into() {
        DateInput::UnixMillis(ms) => from_unix_millis(ms),
        DateInput::Text(s) => parse_date_str(s),
    }
}

fn from_unix_millis(ms: f64) -> BPCResult<NaiveDateTime> {
    if !ms.is_finite() {
        return Err(BPCError::DateRange(ms.to_string()));
    }

    DateTime::from_timestamp_millis(ms.trunc() as i64)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| BPCError::DateRange(ms.to_string()))
}

fn parse_date_str(s: &str) -> BPCResult<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| BPCError::DateParse(s.to_string()))
}

/// Format a date with an XDate-style pattern such as `yyyy-MM-dd` or `MMM d, yyyy`
pub fn format_date(date: &NaiveDateTime, pattern: &str) -> String {
    date.format(&to_chrono_pattern(pattern)).to_string()
}

/// Format a Unix timestamp (milliseconds) as an ISO calendar date
pub fn to_iso_date(unix_ms: f64) -> BPCResult<String> {
    let date = parse_date(unix_ms)?;
    Ok(format_date(&date, ISO_DATE_FORMAT))
}

fn to_chrono_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Quoted literal, '' is an escaped quote
        if c == '\'' {
            let mut j = i + 1;
            if j < chars.len() && chars[j] == '\'' {
                out.push('\'');
                i = j + 1;
                continue;
            }
            while j < chars.len() && chars[j] != '\'' {
                push_literal(&mut out, chars[j]);
                j += 1;
            }
            i = j + 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        match token_spec(c, run) {
            Some(spec) => out.push_str(spec),
            None => {
                for _ in 0..run {
                    push_literal(&mut out, c);
                }
            }
        }

        i += run;
    }

    out
}

fn token_spec(c: char, run: usize) -> Option<&'static str> {
    let spec = match (c, run) {
        ('y', 2) => "%y",
        ('y', 4) => "%Y",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', 4) => "%B",
        ('d', 1) => "%-d",
        ('d', 2) => "%d",
        ('d', 3) => "%a",
        ('d', 4) => "%A",
        ('H', 1) => "%-H",
        ('H', 2) => "%H",
        ('h', 1) => "%-I",
        ('h', 2) => "%I",
        ('m', 1) => "%-M",
        ('m', 2) => "%M",
        ('s', 1) => "%-S",
        ('s', 2) => "%S",
        ('f', 3) => "%3f",
        ('t', 2) => "%P",
        ('T', 2) => "%p",
        _ => return None,
    };
    Some(spec)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Age in completed years at `date` for someone born on `birth_date`
pub fn get_age<'a, 'b>(date: impl Into<DateInput<'a>>, birth_date: impl Into<DateInput<'b>>) -> BPCResult<i32> {
    let d1 = parse_date(date)?;
    let d2 = parse_date(birth_date)?;

    let mut age = d1.year() - d2.year();
    let m = d1.month() as i32 - d2.month() as i32;

    if m < 0 || (m == 0 && d1.day() < d2.day()) {
        age -= 1;
    }

    Ok(age)
}

/// Decimal years between two dates, counting every year as 365 days
pub fn years_apart<'a, 'b>(d1: impl Into<DateInput<'a>>, d2: impl Into<DateInput<'b>>) -> BPCResult<f64> {
    let t1 = parse_date(d1)?.and_utc().timestamp_millis();
    let t2 = parse_date(d2)?.and_utc().timestamp_millis();

    Ok(((t1 - t2) as f64 / MS_PER_YEAR).abs())
}
