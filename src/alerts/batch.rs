//! Alert batch handed over by the monitoring run
//!
//! A batch groups human-readable alert lines into three fixed tiers. Lines
//! are kept exactly as the caller produced them, in the caller's order.

use serde::{Deserialize, Serialize};

/// Severity tier of an alert line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Informational: one line per monitored asset
    Level1,
    /// Warning that may require attention
    Level2,
    /// Emergency requiring immediate attention
    Level3,
}

/// Alert lines grouped by tier
///
/// Deserializes from `{"level1": [...], "level2": [...], "level3": [...]}`;
/// a missing key is treated as an empty tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AlertBatch {
    pub level1: Vec<String>,
    pub level2: Vec<String>,
    pub level3: Vec<String>,
}

impl AlertBatch {
    pub fn new(level1: Vec<String>, level2: Vec<String>, level3: Vec<String>) -> Self {
        Self {
            level1,
            level2,
            level3,
        }
    }

    /// Alert lines recorded for the given tier
    pub fn entries(&self, level: Level) -> &[String] {
        match level {
            Level::Level1 => &self.level1,
            Level::Level2 => &self.level2,
            Level::Level3 => &self.level3,
        }
    }

    pub fn count(&self, level: Level) -> usize {
        self.entries(level).len()
    }

    /// True when neither warnings nor emergencies were raised
    pub fn is_quiet(&self) -> bool {
        self.level2.is_empty() && self.level3.is_empty()
    }
}
