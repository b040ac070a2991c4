use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::warn;

/// Publish dates arrive from Open Library in at least four incompatible
/// shapes. Each strategy handles one granularity; the first that parses the
/// whole input wins.
const STRATEGIES: [fn(&str) -> Option<i32>; 4] =
    [day_month_year, month_name_day_year, year_month, bare_year];

/// Extracts a publication year from a loosely formatted date string.
///
/// Tries the structured strategies in order, then falls back to scanning for
/// the first four-digit run anywhere in the text. The fallback is approximate
/// rather than authoritative, so it runs once, only after every structured
/// strategy has failed. Returns `None` when nothing in the text looks like a
/// year.
pub fn resolve_year(text: Option<&str>) -> Option<i32> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }

    for strategy in STRATEGIES {
        if let Some(year) = strategy(text) {
            return Some(year);
        }
    }

    let year = scan_four_digit_run(text);
    if year.is_none() {
        warn!("Could not extract a year from date string '{}'", text);
    }
    year
}

/// "29.03.2019"
fn day_month_year(text: &str) -> Option<i32> {
    NaiveDate::parse_from_str(text, "%d.%m.%Y")
        .ok()
        .map(|d| d.year())
}

/// "Jun 15, 2012"
fn month_name_day_year(text: &str) -> Option<i32> {
    NaiveDate::parse_from_str(text, "%b %d, %Y")
        .ok()
        .map(|d| d.year())
}

/// "1998-10" — no day component, so parse into `Parsed` instead of a date.
fn year_month(text: &str) -> Option<i32> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, text, StrftimeItems::new("%Y-%m")).ok()?;
    parsed.year
}

/// "2009"
fn bare_year(text: &str) -> Option<i32> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, text, StrftimeItems::new("%Y")).ok()?;
    parsed.year
}

/// Free-text salvage: the first digit run of exactly four digits.
fn scan_four_digit_run(text: &str) -> Option<i32> {
    let digits = Regex::new(r"\d+").ok()?;
    let year = digits
        .find_iter(text)
        .find(|m| m.as_str().len() == 4)
        .and_then(|m| m.as_str().parse().ok());
    year
}
