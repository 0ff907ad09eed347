use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    Word,
    Trigram,
    Pattern,
}

impl fmt::Display for HitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HitKind::Word => "word",
            HitKind::Trigram => "trigram",
            HitKind::Pattern => "pattern",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[default]
    Clean,
    Moderate,
    Heavy,
}

impl Rating {
    pub const MODERATE_THRESHOLD: f64 = 20.0;
    pub const HEAVY_THRESHOLD: f64 = 50.0;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::HEAVY_THRESHOLD {
            Rating::Heavy
        } else if score >= Self::MODERATE_THRESHOLD {
            Rating::Moderate
        } else {
            Rating::Clean
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rating::Clean => "clean",
            Rating::Moderate => "moderate",
            Rating::Heavy => "heavy",
        })
    }
}

/// One detection occurrence. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub line: usize,
    pub column: usize,
    #[serde(rename = "match")]
    pub matched_text: String,
    #[serde(rename = "type")]
    pub kind: HitKind,
    pub detail: String,
    pub severity: Severity,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub source: String,
    pub hits: Vec<Hit>,
    pub line_count: usize,
    pub word_count: usize,
    pub score: f64,
    pub density: f64,
    pub rating: Rating,
}

impl ScanResult {
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn total_weight(&self) -> f64 {
        self.hits.iter().map(|hit| hit.weight).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_boundaries_are_inclusive_on_the_lower_edge() {
        assert_eq!(Rating::from_score(0.0), Rating::Clean);
        assert_eq!(Rating::from_score(19.999), Rating::Clean);
        assert_eq!(Rating::from_score(20.0), Rating::Moderate);
        assert_eq!(Rating::from_score(49.999), Rating::Moderate);
        assert_eq!(Rating::from_score(50.0), Rating::Heavy);
        assert_eq!(Rating::from_score(100.0), Rating::Heavy);
    }

    #[test]
    fn hit_serializes_with_short_field_names() {
        let hit = Hit {
            line: 1,
            column: 9,
            matched_text: "leverage".into(),
            kind: HitKind::Word,
            detail: "80.0% of models overuse this word".into(),
            severity: Severity::Medium,
            weight: 0.8,
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["match"], "leverage");
        assert_eq!(json["type"], "word");
        assert_eq!(json["severity"], "medium");
    }
}
