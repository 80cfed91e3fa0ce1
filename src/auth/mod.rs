//! Upload password checks
//!
//! Per-client retry accounting for the upload password check.

mod retry_limit;

pub use retry_limit::{RetryLimiter, RetryLimiterStats, Verdict};
