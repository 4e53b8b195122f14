/// Keyword Sentiment Scorer
///
/// Transparent heuristic that maps a post's text to a sentiment score in
/// [0, 100]. Three disjoint keyword sets are matched against the
/// lower-cased text; each keyword that occurs counts once for its set.
///
/// Formula (P, N, U = positive/negative/neutral matches, T = P + N + U):
///
/// ```text
/// T == 0  → 50
/// T  > 0  → round(clamp(50 + 60·P/T − 30·N/T, 0, 100))
/// ```
///
/// Neutral matches carry no direction but dilute both shares.
use serde::Serialize;

/// Score returned when a post carries no sentiment signal
pub const NEUTRAL_SCORE: u8 = 50;

const POSITIVE_PULL: f64 = 60.0;
const NEGATIVE_PULL: f64 = 30.0;

/// Immutable keyword tables used by the scorer
#[derive(Debug, Clone, Copy)]
pub struct KeywordTable {
    pub positive: &'static [&'static str],
    pub negative: &'static [&'static str],
    pub neutral: &'static [&'static str],
}

impl KeywordTable {
    /// Crypto-domain tables
    pub const DEFAULT: KeywordTable = KeywordTable {
        positive: &[
            "moon", "mooning", "pump", "bullish", "buy", "buying", "hodl", "diamond", "gem",
            "rocket", "🚀", "💎", "🔥", "💪", "strong", "amazing", "incredible", "awesome",
            "profit", "gains", "winning", "success", "breakout", "rally", "surge", "jump",
        ],
        negative: &[
            "dump", "dumping", "bearish", "sell", "selling", "scam", "rug", "pull", "crash",
            "fall", "drop", "decline", "loss", "losing", "weak", "bad", "💩", "😡", "😭", "sad",
            "terrible", "awful", "horrible", "disaster",
        ],
        neutral: &[
            "token", "coin", "crypto", "blockchain", "defi", "trading", "market", "price",
            "volume", "liquidity", "chart", "analysis", "technical",
        ],
    };
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-set keyword match counts for one text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeywordMatches {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

impl KeywordMatches {
    pub fn total(&self) -> u32 {
        self.positive + self.negative + self.neutral
    }
}

/// Count how many keywords of each set occur in `text`
pub fn match_counts(table: &KeywordTable, text: &str) -> KeywordMatches {
    let lower = text.to_lowercase();
    let count = |set: &[&str]| {
        set.iter()
            .filter(|keyword| lower.contains(&keyword.to_lowercase()))
            .count() as u32
    };

    KeywordMatches {
        positive: count(table.positive),
        negative: count(table.negative),
        neutral: count(table.neutral),
    }
}

/// Score a post with the default keyword tables
pub fn score(text: Option<&str>) -> u8 {
    score_with(&KeywordTable::DEFAULT, text)
}

/// Score a post against an explicit keyword table
///
/// Missing or empty text yields [`NEUTRAL_SCORE`].
pub fn score_with(table: &KeywordTable, text: Option<&str>) -> u8 {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return NEUTRAL_SCORE,
    };

    let matches = match_counts(table, text);
    let total = matches.total();
    if total == 0 {
        return NEUTRAL_SCORE;
    }

    let total = f64::from(total);
    let raw = f64::from(NEUTRAL_SCORE)
        + POSITIVE_PULL * f64::from(matches.positive) / total
        - NEGATIVE_PULL * f64::from(matches.negative) / total;

    raw.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_missing_text_is_neutral() {
        assert_eq!(score(None), 50);
        assert_eq!(score(Some("")), 50);
    }

    #[test]
    fn test_no_keywords_is_neutral() {
        assert_eq!(score(Some("gm frens, what is everyone up to today")), 50);
    }

    #[test]
    fn test_neutral_keywords_only_is_neutral() {
        assert_eq!(score(Some("Token price chart analysis on the market")), 50);
    }

    #[test]
    fn test_all_positive_clamps_to_100() {
        let text = "$FOO is mooning! rocket to the moon 🚀";
        let matches = match_counts(&KeywordTable::DEFAULT, text);
        assert_eq!(matches.negative, 0);
        assert_eq!(matches.neutral, 0);
        assert!(matches.positive >= 3);
        assert_eq!(score(Some(text)), 100);
    }

    #[test]
    fn test_three_keyword_table_matches_expected_counts() {
        let table = KeywordTable {
            positive: &["moon", "mooning", "rocket"],
            negative: &[],
            neutral: &[],
        };
        let matches = match_counts(&table, "$FOO is mooning! rocket to the moon 🚀");
        assert_eq!(matches.positive, 3);
        assert_eq!(score_with(&table, Some("$FOO is mooning! rocket to the moon 🚀")), 100);
    }

    #[test]
    fn test_all_negative() {
        // 50 - 30 = 20
        assert_eq!(score(Some("total scam, pure rug")), 20);
    }

    #[test]
    fn test_mixed_signal() {
        // P=1 (bullish), N=1 (crash), U=1 (chart): 50 + 20 - 10 = 60
        assert_eq!(score(Some("Bullish chart despite the crash")), 60);
    }

    #[test]
    fn test_case_folding() {
        assert_eq!(score(Some("BULLISH")), score(Some("bullish")));
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        assert_eq!(
            match_counts(&KeywordTable::DEFAULT, "dump dump dump token").negative,
            1
        );
        // N=1, U=1: 50 - 15 = 35
        assert_eq!(score(Some("dump dump dump token")), 35);
    }

    #[test]
    fn test_default_sets_are_disjoint() {
        let table = KeywordTable::DEFAULT;
        for word in table.positive {
            assert!(!table.negative.contains(word), "{word} in both sets");
            assert!(!table.neutral.contains(word), "{word} in both sets");
        }
        for word in table.negative {
            assert!(!table.neutral.contains(word), "{word} in both sets");
        }
    }

    proptest! {
        #[test]
        fn prop_score_is_bounded(text in ".{0,200}") {
            let s = score(Some(&text));
            prop_assert!(s <= 100);
        }

        #[test]
        fn prop_score_is_deterministic(text in ".{0,200}") {
            prop_assert_eq!(score(Some(&text)), score(Some(&text)));
        }
    }
}
