use serde::{Deserialize, Serialize};

use crate::domain::Severity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub pct_models: f64,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrigramEntry {
    pub phrase: String,
    pub pct_models: f64,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub overuse_ratio: f64,
    pub regex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordData {
    pub words: Vec<WordEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrigramData {
    pub trigrams: Vec<TrigramEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternData {
    pub patterns: Vec<PatternEntry>,
}

/// Additive bundle merged on top of the base banlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresetData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub words: Vec<WordEntry>,
    #[serde(default)]
    pub trigrams: Vec<TrigramEntry>,
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
}
