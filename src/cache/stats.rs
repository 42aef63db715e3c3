//! Cache hit/miss statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitMiss {
    pub hits: u64,
    pub misses: u64,
}

impl HitMiss {
    fn record(&mut self, outcome: Lookup) {
        match outcome {
            Lookup::Hit => self.hits += 1,
            Lookup::Miss => self.misses += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit,
    Miss,
}

/// Persisted counters. Providers are keyed lowercase, endpoints verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub hits: u64,
    pub misses: u64,
    #[serde(default)]
    pub providers: BTreeMap<String, HitMiss>,
    #[serde(default)]
    pub endpoints: BTreeMap<String, HitMiss>,
}

impl Statistics {
    pub fn record(&mut self, outcome: Lookup, provider: Option<&str>, endpoint: Option<&str>) {
        match outcome {
            Lookup::Hit => self.hits += 1,
            Lookup::Miss => self.misses += 1,
        }
        if let Some(p) = provider {
            self.providers
                .entry(p.to_lowercase())
                .or_default()
                .record(outcome);
        }
        if let Some(e) = endpoint {
            self.endpoints.entry(e.to_string()).or_default().record(outcome);
        }
    }
}

/// Snapshot handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub enabled: bool,
    pub hits: u64,
    pub misses: u64,
    pub total: u64,
    /// Percentage rounded to two decimals.
    pub hit_rate: f64,
    pub providers: BTreeMap<String, HitMiss>,
    pub endpoints: BTreeMap<String, HitMiss>,
    pub last_clear: Option<DateTime<Utc>>,
}

impl StatisticsReport {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            hits: 0,
            misses: 0,
            total: 0,
            hit_rate: 0.0,
            providers: BTreeMap::new(),
            endpoints: BTreeMap::new(),
            last_clear: None,
        }
    }

    pub fn from_stats(stats: Statistics, last_clear: Option<DateTime<Utc>>) -> Self {
        let total = stats.hits + stats.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            ((stats.hits as f64 / total as f64) * 10_000.0).round() / 100.0
        };
        Self {
            enabled: true,
            hits: stats.hits,
            misses: stats.misses,
            total,
            hit_rate,
            providers: stats.providers,
            endpoints: stats.endpoints,
            last_clear,
        }
    }
}
