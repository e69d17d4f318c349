//! Temporal expression resolution
//!
//! Phrase rules are checked in a fixed order and only the first match
//! applies. Numeric spans (`N days`, `N weeks`, `N months`) are checked
//! afterwards and always override `start`; only phrase rules move `end`.

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use crate::model::DateRange;

/// Days covered when the query names no period
pub const DEFAULT_LOOKBACK_DAYS: u64 = 7;

static DAY_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s+days?").expect("valid day span pattern"));
static WEEK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s+weeks?").expect("valid week span pattern"));
static MONTH_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s+months?").expect("valid month span pattern"));

/// Resolve the date range a query refers to
///
/// `available_dates` is the ascending list of dates with data; it is only
/// consulted for "yesterday", which moves to the previous trading date. If
/// `context` is missing from that list, or is its first entry, the default
/// range is kept.
pub fn resolve_range(text: &str, context: NaiveDate, available_dates: &[NaiveDate]) -> DateRange {
    let mut end = context;
    let mut start = days_before(context, DEFAULT_LOOKBACK_DAYS).unwrap_or(context);

    if text.contains("today") {
        // default range
    } else if text.contains("yesterday") {
        if let Some(previous) = previous_trading_day(context, available_dates) {
            end = previous;
            start = days_before(previous, 1).unwrap_or(previous);
        }
    } else if text.contains("this week") {
        start = start_of_week(context);
    } else if text.contains("this month") {
        start = start_of_month(context);
    } else if text.contains("last week") {
        let weekday = u64::from(context.weekday().num_days_from_monday());
        if let Some(last_sunday) = days_before(context, weekday + 1) {
            end = last_sunday;
            start = days_before(last_sunday, 6).unwrap_or(last_sunday);
        }
    } else if text.contains("last month") {
        let this_month = start_of_month(context);
        if let (Some(first), Some(last)) = (
            this_month.checked_sub_months(Months::new(1)),
            days_before(this_month, 1),
        ) {
            start = first;
            end = last;
        }
    }

    if let Some(override_start) = numeric_span_start(text, context) {
        start = override_start;
    }

    DateRange::new(start, end)
}

/// `context` minus the first numeric span found, by priority days > weeks > months
fn numeric_span_start(text: &str, context: NaiveDate) -> Option<NaiveDate> {
    if let Some(days) = span_value(&DAY_SPAN, text) {
        days_before(context, days)
    } else if let Some(weeks) = span_value(&WEEK_SPAN, text) {
        days_before(context, weeks.checked_mul(7)?)
    } else if let Some(months) = span_value(&MONTH_SPAN, text) {
        // approximated: lands on day 1 of the target month
        let months = u32::try_from(months).ok()?;
        start_of_month(context).checked_sub_months(Months::new(months))
    } else {
        None
    }
}

fn span_value(pattern: &Regex, text: &str) -> Option<u64> {
    pattern
        .captures(text)
        .and_then(|caps| caps[1].parse::<u64>().ok())
}

fn days_before(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(days))
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    let weekday = u64::from(date.weekday().num_days_from_monday());
    days_before(date, weekday).unwrap_or(date)
}

fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The date with data immediately before `date`
pub fn previous_trading_day(date: NaiveDate, available_dates: &[NaiveDate]) -> Option<NaiveDate> {
    let idx = available_dates.iter().position(|d| *d == date)?;
    idx.checked_sub(1).map(|prev| available_dates[prev])
}
