use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;

use crate::config::JournalConfig;
use crate::features::ModelDomain;
use crate::tier::RiskTier;

/// Prediction journal - a bounded in-memory log of recent scoring calls.
///
/// Answers "what did we score that supplier at around 23:00 yesterday,
/// and with which model version?" without a round trip to storage.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JournalEntry {
    pub timestamp: String,
    pub domain: String,
    pub risk_score: f64,
    pub risk_tier: &'static str,
    pub model_version: String,
    pub latency_us: u64,
}

pub struct Journal {
    config: JournalConfig,
    entries: RwLock<Vec<JournalEntry>>,
    total_recorded: AtomicU64,
}

impl Journal {
    pub fn new(config: &JournalConfig) -> Self {
        Self {
            config: config.clone(),
            entries: RwLock::new(Vec::new()),
            total_recorded: AtomicU64::new(0),
        }
    }

    /// Record one prediction.
    pub fn record(
        &self,
        domain: ModelDomain,
        risk_score: f64,
        risk_tier: RiskTier,
        model_version: &str,
        latency: Duration,
    ) {
        if !self.config.enabled {
            return;
        }

        let entry = JournalEntry {
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            domain: domain.as_str().to_string(),
            risk_score,
            risk_tier: risk_tier.as_str(),
            model_version: model_version.to_string(),
            latency_us: latency.as_micros() as u64,
        };

        let mut entries = self.entries.write();
        entries.push(entry);
        self.total_recorded.fetch_add(1, Ordering::Relaxed);

        // Rotation: keep within max_entries
        if entries.len() > self.config.max_entries {
            let drain_count = entries.len() - self.config.max_entries;
            entries.drain(..drain_count);
        }
    }

    /// Search the journal by domain and/or tier, most recent first.
    pub fn search(&self, domain: Option<&str>, tier: Option<&str>, limit: usize) -> Vec<JournalEntry> {
        let entries = self.entries.read();
        entries
            .iter()
            .rev()
            .filter(|e| {
                if let Some(d) = domain {
                    if e.domain != d {
                        return false;
                    }
                }
                if let Some(t) = tier {
                    if e.risk_tier != t {
                        return false;
                    }
                }
                true
            })
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn get_stats(&self) -> serde_json::Value {
        let entries = self.entries.read();
        serde_json::json!({
            "enabled": self.config.enabled,
            "current_entries": entries.len(),
            "max_entries": self.config.max_entries,
            "total_recorded": self.total_recorded.load(Ordering::Relaxed),
        })
    }
}
