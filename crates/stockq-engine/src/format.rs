//! Display helpers for prices, percentages and symbols

/// Format an amount with crore / lakh scaling
pub fn format_currency(value: f64, currency: &str) -> String {
    if value >= 10_000_000.0 {
        format!("{currency}{:.2} Cr", value / 10_000_000.0)
    } else if value >= 100_000.0 {
        format!("{currency}{:.2} L", value / 100_000.0)
    } else {
        format!("{currency}{value:.2}")
    }
}

/// Format a percentage with an explicit sign for gains
pub fn format_percentage(value: f64) -> String {
    if value > 0.0 {
        format!("+{value:.2}%")
    } else {
        format!("{value:.2}%")
    }
}

/// Strip the exchange suffix (`RELIANCE.NS` -> `RELIANCE`)
pub fn clean_symbol(symbol: &str) -> &str {
    symbol.split('.').next().unwrap_or(symbol)
}
