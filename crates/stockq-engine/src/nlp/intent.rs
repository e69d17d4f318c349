//! Intent classification via an ordered pattern table
//!
//! Intents are tried in table order and, within an intent, patterns in
//! listed order. The first match wins, so reordering the table changes how
//! overlapping queries ("compare volume ...") are classified.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// What a query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Best performers over the range
    TopGainers,
    /// Worst performers over the range
    TopLosers,
    /// Price history for one symbol
    PriceTrend,
    /// Side-by-side performance of several symbols
    CompareStocks,
    /// Dual moving averages, or the above-average screen
    MovingAverage,
    /// Volume trend for one symbol, or the day's volume leaders
    VolumeAnalysis,
    /// Unusual price/volume moves for one symbol
    PriceSpike,
    /// Close price on the context date
    CurrentPrice,
    /// Fallback: symbol summary or market summary
    GeneralInfo,
}

impl Intent {
    /// Every intent, in classification priority order
    pub const ALL: [Intent; 9] = [
        Self::TopGainers,
        Self::TopLosers,
        Self::PriceTrend,
        Self::CompareStocks,
        Self::MovingAverage,
        Self::VolumeAnalysis,
        Self::PriceSpike,
        Self::CurrentPrice,
        Self::GeneralInfo,
    ];

    /// Snake-case tag of this intent
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopGainers => "top_gainers",
            Self::TopLosers => "top_losers",
            Self::PriceTrend => "price_trend",
            Self::CompareStocks => "compare_stocks",
            Self::MovingAverage => "moving_average",
            Self::VolumeAnalysis => "volume_analysis",
            Self::PriceSpike => "price_spike",
            Self::CurrentPrice => "current_price",
            Self::GeneralInfo => "general_info",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PATTERN_TABLE: &[(Intent, &[&str])] = &[
    (
        Intent::TopGainers,
        &[
            r"(top|best).*gain",
            r"gain.*most",
            r"perform.*best",
            r"highest.*return",
            r"most.*profit",
            r"biggest.*rise",
        ],
    ),
    (
        Intent::TopLosers,
        &[
            r"(top|worst).*los",
            r"los.*most",
            r"perform.*worst",
            r"lowest.*return",
            r"most.*loss",
            r"biggest.*drop",
            r"biggest.*fall",
        ],
    ),
    (
        Intent::PriceTrend,
        &[
            r"(price|trend|movement|chart|graph).*for",
            r"show.*price",
            r"how.*price",
            r"price.*history",
            r"price.*trend",
        ],
    ),
    (
        Intent::CompareStocks,
        &[
            r"compare",
            r"vs",
            r"versus",
            r"against",
            r"difference.*between",
            r"perform.*better",
            r"which.*better",
        ],
    ),
    (
        Intent::MovingAverage,
        &[
            r"moving.*average",
            r"ma",
            r"above.*average",
            r"below.*average",
            r"cross.*average",
            r"average.*price",
        ],
    ),
    (
        Intent::VolumeAnalysis,
        &[
            r"volume",
            r"trading.*volume",
            r"high.*volume",
            r"unusual.*volume",
        ],
    ),
    (
        Intent::PriceSpike,
        &[
            r"spike",
            r"jump",
            r"surge",
            r"plunge",
            r"crash",
            r"sudden",
            r"anomaly",
            r"unusual.*movement",
        ],
    ),
    (
        Intent::CurrentPrice,
        &[
            r"current.*price",
            r"what.*price",
            r"latest.*price",
            r"price.*now",
            r"how much.*cost",
        ],
    ),
];

struct CompiledPattern {
    intent: Intent,
    source: &'static str,
    regex: Regex,
}

static PATTERNS: LazyLock<Vec<CompiledPattern>> = LazyLock::new(|| {
    PATTERN_TABLE
        .iter()
        .flat_map(|(intent, patterns)| {
            patterns.iter().map(move |source| CompiledPattern {
                intent: *intent,
                source,
                regex: Regex::new(source).expect("valid intent pattern"),
            })
        })
        .collect()
});

/// The first `(intent, pattern)` pair matching `text`, if any
pub fn matched_pattern(text: &str) -> Option<(Intent, &'static str)> {
    PATTERNS
        .iter()
        .find(|p| p.regex.is_match(text))
        .map(|p| (p.intent, p.source))
}

/// Classify normalized text; never fails, falls back to [`Intent::GeneralInfo`]
pub fn classify(text: &str) -> Intent {
    match matched_pattern(text) {
        Some((intent, pattern)) => {
            tracing::debug!("Intent {} matched pattern {:?}", intent, pattern);
            intent
        }
        None => Intent::GeneralInfo,
    }
}
