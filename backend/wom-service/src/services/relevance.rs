//! Relevance filter for incoming posts
//!
//! Drops shill/bot-looking posts before they reach the store. A post is
//! irrelevant as soon as any rule fires.

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_TAGS: usize = 3;
const MIN_WORDS: usize = 3;

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").expect("valid hashtag regex"));
static CASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\w+").expect("valid cashtag regex"));
static TELEGRAM_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(t\.me/|telegram\.me/)").expect("valid telegram regex"));

type Rule = fn(&str) -> bool;

fn has_too_many_tags(text: &str) -> bool {
    HASHTAG.find_iter(text).count() + CASHTAG.find_iter(text).count() > MAX_TAGS
}

fn contains_rocket(text: &str) -> bool {
    text.contains('🚀')
}

fn has_short_word_count(text: &str) -> bool {
    text.split_whitespace().count() < MIN_WORDS
}

fn contains_tco_link(text: &str) -> bool {
    text.to_lowercase().contains("t.co")
}

fn contains_telegram_link(text: &str) -> bool {
    TELEGRAM_LINK.is_match(&text.to_lowercase())
}

const RULES: &[(&str, Rule)] = &[
    ("too_many_tags", has_too_many_tags),
    ("rocket_emoji", contains_rocket),
    ("short_word_count", has_short_word_count),
    ("tco_link", contains_tco_link),
    ("telegram_link", contains_telegram_link),
];

/// Name of the first rule that rejects `text`, if any
pub fn rejection_reason(text: &str) -> Option<&'static str> {
    RULES
        .iter()
        .find(|(_, rule)| rule(text))
        .map(|(name, _)| *name)
}

pub fn is_relevant(text: &str) -> bool {
    rejection_reason(text).is_none()
}
