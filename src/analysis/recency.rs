//! Recency status of a student's portfolio.
//!
//! The status is driven by the newest `lastUpdated` (or `createdAt`)
//! timestamp across a collection of portfolio items.

use crate::models::Portfolio;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tier derived from the time since the most recent update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecencyStatus {
    /// Updated within the fresh window (7 days by default)
    Fresh,
    /// Updated within the aging window (30 days by default)
    Aging,
    /// Older than the aging window
    Stale,
    /// No portfolio items, or none with a timestamp
    Unknown,
}

impl fmt::Display for RecencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecencyStatus::Fresh => write!(f, "Fresh"),
            RecencyStatus::Aging => write!(f, "Aging"),
            RecencyStatus::Stale => write!(f, "Stale"),
            RecencyStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

impl RecencyStatus {
    /// Returns an emoji representation of the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            RecencyStatus::Fresh => "🟢",
            RecencyStatus::Aging => "🟡",
            RecencyStatus::Stale => "🔴",
            RecencyStatus::Unknown => "⚪",
        }
    }

    /// Colour name for the status dot.
    pub fn color(&self) -> &'static str {
        match self {
            RecencyStatus::Fresh => "green",
            RecencyStatus::Aging => "yellow",
            RecencyStatus::Stale => "red",
            RecencyStatus::Unknown => "gray",
        }
    }
}

/// Day thresholds for the recency tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyThresholds {
    pub fresh_days: i64,
    pub aging_days: i64,
}

impl Default for RecencyThresholds {
    fn default() -> Self {
        Self {
            fresh_days: 7,
            aging_days: 30,
        }
    }
}

impl RecencyThresholds {
    /// Classify a single timestamp relative to `now`.
    ///
    /// A threshold too large for a `Duration` covers every age.
    pub fn classify(&self, last_update: DateTime<Utc>, now: DateTime<Utc>) -> RecencyStatus {
        let age = now - last_update;
        let within = |days: i64| Duration::try_days(days).map_or(true, |limit| age <= limit);
        if within(self.fresh_days) {
            RecencyStatus::Fresh
        } else if within(self.aging_days) {
            RecencyStatus::Aging
        } else {
            RecencyStatus::Stale
        }
    }
}

/// Status plus the moment it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyReport {
    pub status: RecencyStatus,
    pub last_update: Option<DateTime<Utc>>,
}

impl RecencyReport {
    pub fn unknown() -> Self {
        Self {
            status: RecencyStatus::Unknown,
            last_update: None,
        }
    }

    /// Human-readable date of the most recent update, or "—".
    pub fn last_update_display(&self) -> String {
        self.last_update
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "—".to_string())
    }
}

/// Newest item by effective timestamp; the last of equal maxima wins.
pub fn most_recent<'a, I>(items: I) -> Option<&'a Portfolio>
where
    I: IntoIterator<Item = &'a Portfolio>,
{
    items
        .into_iter()
        .filter(|p| p.effective_timestamp().is_some())
        .max_by_key(|p| p.effective_timestamp())
}

/// Classify a collection of portfolio items.
pub fn classify_recency<'a, I>(
    items: I,
    now: DateTime<Utc>,
    thresholds: RecencyThresholds,
) -> RecencyReport
where
    I: IntoIterator<Item = &'a Portfolio>,
{
    match most_recent(items).and_then(Portfolio::effective_timestamp) {
        Some(last_update) => RecencyReport {
            status: thresholds.classify(last_update, now),
            last_update: Some(last_update),
        },
        None => RecencyReport::unknown(),
    }
}
