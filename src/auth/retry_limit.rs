//! Retry limiting for the upload password check
//!
//! Each client starts with `max_attempts` guesses. A wrong guess costs one
//! attempt, a correct one restores the full allowance, and a client with
//! none left is blocked until it is evicted or the process restarts.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::metrics::{LIMITER_TRACKED_CLIENTS, PASSWORD_CHECKS_TOTAL};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_MAX_TRACKED_CLIENTS: usize = 10_000;

/// Outcome of a password check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Password matched; attempts restored
    Ok,
    /// Password missing or wrong
    Wrong,
    /// No attempts left; the password was not compared
    Blocked,
}

impl Verdict {
    /// Body returned by the validate endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ok => "true",
            Verdict::Wrong => "false",
            Verdict::Blocked => "blocked",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct RetryEntry {
    remaining: u32,
    last_seen: Instant,
}

/// Per-client password retry limiter
///
/// Clients without an entry have the full allowance.
pub struct RetryLimiter {
    /// client identifier -> remaining attempts
    entries: RwLock<HashMap<String, RetryEntry>>,
    max_attempts: u32,
    /// Maximum number of clients tracked in memory
    max_tracked_clients: usize,
}

impl Default for RetryLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_TRACKED_CLIENTS)
    }
}

impl RetryLimiter {
    /// Create new retry limiter
    ///
    /// # Arguments
    /// * `max_attempts` - Wrong guesses allowed before blocking (at least 1)
    /// * `max_tracked_clients` - In-memory cap; the least recently seen
    ///   client is evicted when a new one arrives at the cap
    pub fn new(max_attempts: u32, max_tracked_clients: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_attempts: max_attempts.max(1),
            max_tracked_clients: max_tracked_clients.max(1),
        }
    }

    fn evict_oldest_locked(entries: &mut HashMap<String, RetryEntry>) -> bool {
        let Some(oldest_key) = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(key, _)| key.clone())
        else {
            return false;
        };
        entries.remove(&oldest_key);
        true
    }

    /// Check a supplied password for a client
    ///
    /// # Arguments
    /// * `client` - Client identifier (IP address)
    /// * `supplied` - Password from the request; `None` or empty counts as
    ///   wrong without costing an attempt
    /// * `expected` - The configured upload password
    pub async fn check_password(
        &self,
        client: &str,
        supplied: Option<&str>,
        expected: &str,
    ) -> Verdict {
        let mut entries = self.entries.write().await;

        let remaining = entries
            .get(client)
            .map(|entry| entry.remaining)
            .unwrap_or(self.max_attempts);

        let verdict = if remaining == 0 {
            // Blocked clients count as seen, so eviction prefers idle ones.
            if let Some(entry) = entries.get_mut(client) {
                entry.last_seen = Instant::now();
            }
            Verdict::Blocked
        } else {
            match supplied.filter(|password| !password.is_empty()) {
                None => Verdict::Wrong,
                Some(password) if password == expected => {
                    // Absent entries already have the full allowance.
                    entries.remove(client);
                    Verdict::Ok
                }
                Some(_) => {
                    if !entries.contains_key(client) && entries.len() >= self.max_tracked_clients {
                        Self::evict_oldest_locked(&mut entries);
                    }
                    entries.insert(
                        client.to_string(),
                        RetryEntry {
                            remaining: remaining.saturating_sub(1),
                            last_seen: Instant::now(),
                        },
                    );
                    if remaining == 1 {
                        tracing::warn!(client = %client, "Client exhausted password attempts");
                    }
                    Verdict::Wrong
                }
            }
        };

        LIMITER_TRACKED_CLIENTS.set(entries.len() as i64);
        PASSWORD_CHECKS_TOTAL
            .with_label_values(&[verdict.as_str()])
            .inc();

        if verdict == Verdict::Blocked {
            tracing::debug!(client = %client, "Password check blocked");
        }

        verdict
    }

    /// Attempts a client has left
    pub async fn remaining(&self, client: &str) -> u32 {
        let entries = self.entries.read().await;
        entries
            .get(client)
            .map(|entry| entry.remaining)
            .unwrap_or(self.max_attempts)
    }

    /// Number of clients currently tracked
    pub async fn tracked_clients(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Get limiter statistics
    pub async fn stats(&self) -> RetryLimiterStats {
        let entries = self.entries.read().await;
        RetryLimiterStats {
            tracked_clients: entries.len(),
            blocked_clients: entries.values().filter(|e| e.remaining == 0).count(),
            max_attempts: self.max_attempts,
            max_tracked_clients: self.max_tracked_clients,
        }
    }
}

/// Retry limiter statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryLimiterStats {
    pub tracked_clients: usize,
    pub blocked_clients: usize,
    pub max_attempts: u32,
    pub max_tracked_clients: usize,
}
