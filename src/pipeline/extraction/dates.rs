//! Date pattern extraction over normalized recognizer text.
//!
//! Handles exact numeric dates, 8-digit compact dates, English textual
//! dates, bare month-day patterns with period-guided year inference, and
//! the compact `"<year> <3-4 digit blob>"` shape produced when a
//! recognizer swallows the separators of a review timestamp.
//! Unparseable fragments are dropped silently; they surface only as
//! unknown-time documents downstream.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::models::case::DefinedPeriod;

static RE_YMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(20\d{2})[./\-](\d{1,2})[./\-](\d{1,2})\b").expect("valid regex")
});

static RE_COMPACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(20\d{2})(\d{2})(\d{2})\b").expect("valid regex"));

static RE_TEXTUAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2})(?:st|nd|rd|th)?(?:,)?\s+(20\d{2})\b",
    )
    .expect("valid regex")
});

static RE_MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[./\-](\d{1,2})\b").expect("valid regex"));

static RE_MONTH_DAY_TEXTUAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2})(?:st|nd|rd|th)?\b",
    )
    .expect("valid regex")
});

static RE_YEAR_BLOB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(20\d{2})\s+(\d{3,4})\b").expect("valid regex"));

static RE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b20\d{2}\b").expect("valid regex"));

fn month_number(name: &str) -> Option<u32> {
    match name.to_ascii_lowercase().as_str() {
        "january" => Some(1),
        "february" => Some(2),
        "march" => Some(3),
        "april" => Some(4),
        "may" => Some(5),
        "june" => Some(6),
        "july" => Some(7),
        "august" => Some(8),
        "september" => Some(9),
        "october" => Some(10),
        "november" => Some(11),
        "december" => Some(12),
        _ => None,
    }
}

/// Exact dates in a line: numeric Y-M-D, 8-digit compact, English textual.
/// Invalid calendar combinations are dropped.
pub fn exact_dates(line: &str) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    for caps in RE_YMD.captures_iter(line) {
        push_date(&mut out, &caps[1], &caps[2], &caps[3]);
    }
    for caps in RE_COMPACT.captures_iter(line) {
        push_date(&mut out, &caps[1], &caps[2], &caps[3]);
    }
    for caps in RE_TEXTUAL.captures_iter(line) {
        if let Some(month) = month_number(&caps[1]) {
            if let (Ok(day), Ok(year)) = (caps[2].parse::<u32>(), caps[3].parse::<i32>()) {
                if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
                    out.push(d);
                }
            }
        }
    }
    out.sort();
    out.dedup();
    out
}

fn push_date(out: &mut Vec<NaiveDate>, y: &str, m: &str, d: &str) {
    if let (Ok(y), Ok(m), Ok(d)) = (y.parse::<i32>(), m.parse::<u32>(), d.parse::<u32>()) {
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            out.push(date);
        }
    }
}

/// Bare month-day pairs in a line, skipping spans already covered by a
/// full date match.
pub fn month_day_pairs(line: &str) -> Vec<(u32, u32)> {
    let full_spans: Vec<(usize, usize)> = RE_YMD
        .find_iter(line)
        .chain(RE_COMPACT.find_iter(line))
        .chain(RE_TEXTUAL.find_iter(line))
        .map(|m| (m.start(), m.end()))
        .collect();
    let overlaps = |start: usize, end: usize| {
        full_spans.iter().any(|&(s, e)| start < e && s < end)
    };

    let mut out = Vec::new();
    for caps in RE_MONTH_DAY.captures_iter(line) {
        let m = caps.get(0).expect("whole match");
        if overlaps(m.start(), m.end()) {
            continue;
        }
        if let (Ok(month), Ok(day)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
            if (1..=12).contains(&month) && (1..=31).contains(&day) {
                out.push((month, day));
            }
        }
    }
    for caps in RE_MONTH_DAY_TEXTUAL.captures_iter(line) {
        let m = caps.get(0).expect("whole match");
        if overlaps(m.start(), m.end()) {
            continue;
        }
        if let Some(month) = month_number(&caps[1]) {
            if let Ok(day) = caps[2].parse::<u32>() {
                if (1..=31).contains(&day) {
                    out.push((month, day));
                }
            }
        }
    }
    out
}

/// Infer the year for a bare month-day.
///
/// Tests each year in `[period.start.year - 1 ..= period.end.year + 1]`,
/// preferring a year that places the date inside the defined period, else
/// one within 365 days of it, else the current year. With no period at
/// all, the current year is used directly.
pub fn infer_year(
    month: u32,
    day: u32,
    period: Option<&DefinedPeriod>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let period = match period {
        Some(p) => p,
        None => return NaiveDate::from_ymd_opt(today.year(), month, day),
    };

    let mut best_near: Option<(i64, NaiveDate)> = None;
    for year in (period.start.year() - 1)..=(period.end.year() + 1) {
        let Some(candidate) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };
        if period.contains(candidate) {
            return Some(candidate);
        }
        let dist = period.distance_days(candidate);
        if dist <= 365 && best_near.map_or(true, |(d, _)| dist < d) {
            best_near = Some((dist, candidate));
        }
    }
    if let Some((_, near)) = best_near {
        return Some(near);
    }
    NaiveDate::from_ymd_opt(today.year(), month, day)
}

/// Decode the compact `"<year> <blob>"` shape into plausible dates.
///
/// A 3-digit blob splits as M/DD; a 4-digit blob as MM/DD and M/DD (with
/// the trailing digit pair as day). Every valid calendar split is
/// returned; the resolver arbitrates.
pub fn decode_year_blobs(line: &str) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    for caps in RE_YEAR_BLOB.captures_iter(line) {
        let Ok(year) = caps[1].parse::<i32>() else {
            continue;
        };
        let blob = &caps[2];
        for (m, d) in blob_splits(blob) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, m, d) {
                out.push(date);
            }
        }
    }
    out.sort();
    out.dedup();
    out
}

fn blob_splits(blob: &str) -> Vec<(u32, u32)> {
    let mut splits = Vec::new();
    match blob.len() {
        3 => {
            if let (Ok(m), Ok(d)) = (blob[..1].parse(), blob[1..].parse()) {
                splits.push((m, d));
            }
        }
        4 => {
            if let (Ok(m), Ok(d)) = (blob[..2].parse(), blob[2..].parse()) {
                splits.push((m, d));
            }
            if let (Ok(m), Ok(d)) = (blob[..1].parse(), blob[2..].parse()) {
                // single-digit month with a stray recognizer digit between
                splits.push((m, d));
            }
        }
        _ => {}
    }
    splits
        .into_iter()
        .filter(|(m, d)| (1..=12).contains(m) && (1..=31).contains(d))
        .collect()
}

/// True when the line carries a 4-digit year.
pub fn has_year(line: &str) -> bool {
    RE_YEAR.is_match(line)
}

/// True when the line carries any month-day shaped fragment.
pub fn has_month_day(line: &str) -> bool {
    !month_day_pairs(line).is_empty() || RE_YMD.is_match(line) || RE_COMPACT.is_match(line)
}

/// All dates extractable from a line: exact forms plus year-inferred
/// month-day forms.
pub fn dates_in_line(
    line: &str,
    period: Option<&DefinedPeriod>,
    today: NaiveDate,
) -> Vec<NaiveDate> {
    let mut out = exact_dates(line);
    for (m, d) in month_day_pairs(line) {
        if let Some(date) = infer_year(m, d, period, today) {
            out.push(date);
        }
    }
    out.sort();
    out.dedup();
    out
}
