//! wom-service: word-of-mouth sentiment pipeline for crypto tokens
//!
//! Posts about tokens are scored with a keyword heuristic, then folded into a
//! per-token decay-weighted WOM score. Four periodic batch jobs keep the store
//! current: token discovery, post collection, sentiment scoring and WOM
//! recompute, plus a retention sweep.
//!
//! The scorer ([`services::sentiment::score`]) and aggregator
//! ([`services::wom_score::aggregate`]) are pure functions and can be called
//! directly by ranking code outside the job loop.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export common types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, StoreBackend};
pub use error::{AppError, Result};
pub use jobs::{BatchJob, BatchOutcome};
