use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{HitKind, Rating, ScanResult};

pub const TOP_HITS: usize = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingCounts {
    pub clean: usize,
    pub moderate: usize,
    pub heavy: usize,
}

impl RatingCounts {
    fn record(&mut self, rating: Rating) {
        match rating {
            Rating::Clean => self.clean += 1,
            Rating::Moderate => self.moderate += 1,
            Rating::Heavy => self.heavy += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentHit {
    #[serde(rename = "type")]
    pub kind: HitKind,
    #[serde(rename = "match")]
    pub text: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteReport {
    pub target: String,
    pub generated_at: DateTime<Utc>,
    /// Pages fetched or files read, including skipped ones.
    pub total_items: usize,
    pub scanned: usize,
    pub skipped: usize,
    pub total_words: usize,
    pub total_hits: usize,
    pub mean_score: f64,
    pub rating: Rating,
    pub ratings: RatingCounts,
    pub top_hits: Vec<FrequentHit>,
    /// Sorted by score, highest first.
    pub items: Vec<ScanResult>,
}

impl SiteReport {
    pub fn build(
        target: impl Into<String>,
        mut results: Vec<ScanResult>,
        total_items: usize,
        skipped: usize,
    ) -> Self {
        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut ratings = RatingCounts::default();
        let mut frequency: HashMap<(HitKind, &str), usize> = HashMap::new();
        let mut total_words = 0;
        let mut total_hits = 0;
        let mut score_sum = 0.0;
        for result in &results {
            ratings.record(result.rating);
            total_words += result.word_count;
            total_hits += result.hits.len();
            score_sum += result.score;
            for hit in &result.hits {
                *frequency
                    .entry((hit.kind, hit.matched_text.as_str()))
                    .or_default() += 1;
            }
        }

        let mut top_hits: Vec<FrequentHit> = frequency
            .into_iter()
            .map(|((kind, text), count)| FrequentHit {
                kind,
                text: text.to_string(),
                count,
            })
            .collect();
        top_hits.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.text.cmp(&b.text))
                .then_with(|| a.kind.cmp(&b.kind))
        });
        top_hits.truncate(TOP_HITS);

        let mean_score = if results.is_empty() {
            0.0
        } else {
            score_sum / results.len() as f64
        };

        Self {
            target: target.into(),
            generated_at: Utc::now(),
            total_items,
            scanned: results.len(),
            skipped,
            total_words,
            total_hits,
            mean_score,
            rating: Rating::from_score(mean_score),
            ratings,
            top_hits,
            items: results,
        }
    }
}
