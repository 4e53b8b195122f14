/// Business logic layer
///
/// - `sentiment`: keyword scorer (text → [0,100])
/// - `wom_score`: decay-weighted aggregation (scored posts → token score)
/// - `relevance`: spam filter for incoming posts
/// - `discovery`: external token/post feeds
pub mod discovery;
pub mod relevance;
pub mod sentiment;
pub mod wom_score;

pub use sentiment::{score, score_with, KeywordTable, NEUTRAL_SCORE};
pub use wom_score::{aggregate, decay_weight, DecayParams};
