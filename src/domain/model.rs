use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fetched source document. `index` is the 1-based position of the URL
/// in the source list and names the per-source intermediate file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub index: usize,
    pub url: String,
    pub fetched: bool,
    pub lines: Vec<String>,
}

/// Canonical rules produced from one source, in original line order.
#[derive(Debug, Clone)]
pub struct SourceRules {
    pub index: usize,
    pub url: String,
    pub fetched: bool,
    pub rules: Vec<String>,
}

/// Outcome of normalizing a single raw line: zero or more canonical output
/// lines plus trace messages describing what was done to the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalization {
    pub outputs: Vec<String>,
    pub trace: Vec<String>,
}

/// Aggregate of the transform stage. `merged` keeps insertion order and
/// duplicates; the dedupe/sort policy is applied only when persisting.
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub per_source: Vec<SourceRules>,
    pub merged: Vec<String>,
    pub trace: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSummary {
    pub index: usize,
    pub url: String,
    pub fetched: bool,
    pub rule_count: usize,
}

/// End-of-run counters, persisted alongside the merged ruleset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub sources_total: usize,
    pub sources_fetched: usize,
    pub sources_failed: usize,
    pub rules_collected: usize,
    pub rules_written: usize,
    pub sources: Vec<SourceSummary>,
}
