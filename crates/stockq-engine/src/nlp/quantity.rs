//! "Top N" extraction

use regex::Regex;
use std::sync::LazyLock;

/// Limit used when the query names no number
pub const DEFAULT_LIMIT: usize = 5;

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]+)\b").expect("valid digit pattern"));

/// Number words, checked in this order (not by position in the text)
static NUMBER_WORDS: LazyLock<Vec<(Regex, usize)>> = LazyLock::new(|| {
    [
        ("one", 1),
        ("two", 2),
        ("three", 3),
        ("four", 4),
        ("five", 5),
        ("six", 6),
        ("seven", 7),
        ("eight", 8),
        ("nine", 9),
        ("ten", 10),
    ]
    .into_iter()
    .map(|(word, value)| {
        let re = Regex::new(&format!(r"\b{word}\b")).expect("valid number word pattern");
        (re, value)
    })
    .collect()
});

/// Extract a limit, falling back to [`DEFAULT_LIMIT`]
pub fn extract_limit(text: &str) -> usize {
    extract_limit_or(text, DEFAULT_LIMIT)
}

/// Extract a limit: first standalone digit run, else a number word, else `default`
///
/// No upper bound is applied; callers clamp against what they rank.
pub fn extract_limit_or(text: &str, default: usize) -> usize {
    if let Some(caps) = DIGITS.captures(text) {
        // ASCII-only digits, so only overflow can fail here
        return caps[1].parse().unwrap_or(usize::MAX);
    }

    NUMBER_WORDS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map_or(default, |(_, value)| *value)
}

static SHORT_WINDOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)[ -]day.*short").expect("valid short window pattern"));
static LONG_WINDOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)[ -]day.*long").expect("valid long window pattern"));
static DAY_WINDOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)[ -]day").expect("valid day window pattern"));

fn first_capture(pattern: &Regex, text: &str) -> Option<usize> {
    pattern
        .captures(text)
        .map(|caps| caps[1].parse().unwrap_or(usize::MAX))
}

/// Explicit short and long moving-average windows ("5-day short", "20 day long")
///
/// Both patterns match leftmost, so "5 day short and 20 day long" yields 5
/// for both; the caller is responsible for rejecting `short >= long`.
pub fn extract_ma_windows(text: &str) -> (Option<usize>, Option<usize>) {
    (
        first_capture(&SHORT_WINDOW, text),
        first_capture(&LONG_WINDOW, text),
    )
}

/// First "N-day" / "N day" window in the text
pub fn extract_day_window(text: &str) -> Option<usize> {
    first_capture(&DAY_WINDOW, text)
}
