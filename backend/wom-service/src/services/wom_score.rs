/// WOM Score Aggregation
///
/// Turns a token's scored posts into one freshness-aware score: a
/// decay-weighted mean over the posts inside the aggregation window.
///
/// ```text
/// weight_i = e^(-age_hours_i / half_life_hours)
/// wom      = Σ(score_i · weight_i) / Σ(weight_i)
/// ```
///
/// Examples (half_life = 24h):
/// - age 1h  → weight 0.9592
/// - age 23h → weight 0.3835
/// - age 49h with window = 48h → dropped, whatever its weight
use crate::error::{AppError, Result};
use crate::models::ScoredSample;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Longest accepted aggregation window (10 years)
pub const MAX_WINDOW_HOURS: f64 = 87_600.0;

/// Decay configuration (read-only at runtime)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayParams {
    /// Hours after which a post's weight has decayed by a factor of e
    pub half_life_hours: f64,
    /// Maximum post age considered
    pub window_hours: f64,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self {
            half_life_hours: 24.0,
            window_hours: 48.0,
        }
    }
}

impl DecayParams {
    pub fn new(half_life_hours: f64, window_hours: f64) -> Self {
        Self {
            half_life_hours,
            window_hours,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.half_life_hours.is_finite() || self.half_life_hours <= 0.0 {
            return Err(AppError::Validation(format!(
                "Decay half-life must be positive, got {}",
                self.half_life_hours
            )));
        }

        if !self.window_hours.is_finite() || self.window_hours <= 0.0 {
            return Err(AppError::Validation(format!(
                "Aggregation window must be positive, got {}",
                self.window_hours
            )));
        }

        if self.window_hours > MAX_WINDOW_HOURS {
            return Err(AppError::Validation(format!(
                "Aggregation window must be at most {} hours, got {}",
                MAX_WINDOW_HOURS, self.window_hours
            )));
        }

        Ok(())
    }

    /// Oldest `created_at` still inside the window
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::milliseconds((self.window_hours * 3_600_000.0) as i64)
    }
}

/// Weight of a post `age_hours` old
pub fn decay_weight(age_hours: f64, half_life_hours: f64) -> f64 {
    (-age_hours / half_life_hours).exp()
}

fn age_hours(now: DateTime<Utc>, created_at: DateTime<Utc>) -> f64 {
    // Future-dated posts (clock skew) count as brand new
    (now - created_at).num_milliseconds().max(0) as f64 / 3_600_000.0
}

/// Decay-weighted mean of `samples` as of `now`
///
/// Returns `None` ("no data") when nothing falls inside the window or the
/// accumulated weight underflows. `Some(0.0)` is a real score.
pub fn aggregate(samples: &[ScoredSample], now: DateTime<Utc>, params: &DecayParams) -> Option<f64> {
    let (weighted_sum, total_weight) = samples
        .iter()
        .filter_map(|sample| {
            let age = age_hours(now, sample.created_at);
            (age <= params.window_hours).then(|| (sample.score, decay_weight(age, params.half_life_hours)))
        })
        .fold((0.0_f64, 0.0_f64), |(sum, weights), (score, weight)| {
            (sum + score * weight, weights + weight)
        });

    if !(total_weight > f64::MIN_POSITIVE) {
        return None;
    }

    Some((weighted_sum / total_weight).clamp(0.0, 100.0))
}
