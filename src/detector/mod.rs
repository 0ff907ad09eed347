//! Detection engine. Scans one blob of plain text against a [`BanlistStore`]
//! and derives a bounded 0-100 score.

mod positions;

use std::sync::Arc;

use crate::{
    banlist::{BanlistStore, CompiledPattern, CompiledTrigram, CompiledWord},
    domain::{Hit, HitKind, Rating, ScanResult},
};

pub use positions::LineIndex;

/// Forward window, in bytes of lower-cased text, in which the remaining words
/// of a phrase must appear after its first word. Heuristic; tune only against
/// a calibration corpus.
pub const TRIGRAM_WINDOW: usize = 60;
/// Longest pattern match kept verbatim in a hit.
pub const MAX_MATCH_DISPLAY: usize = 60;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct Detector {
    store: Arc<BanlistStore>,
}

impl Detector {
    pub fn new(store: Arc<BanlistStore>) -> Self {
        Self { store }
    }

    /// Never fails. Empty or whitespace-only text yields a clean, hit-free
    /// result.
    pub fn scan(&self, text: &str) -> ScanResult {
        let mut result = ScanResult {
            line_count: text.split('\n').count(),
            word_count: text.split_whitespace().count(),
            ..ScanResult::default()
        };
        if result.word_count == 0 {
            return result;
        }

        let lower = text.to_lowercase();
        let index = LineIndex::new(&lower);

        for word in self.store.words() {
            scan_word(&lower, &index, word, &mut result.hits);
        }
        for trigram in self.store.trigrams() {
            scan_trigram(&lower, &index, trigram, &mut result.hits);
        }
        for pattern in self.store.patterns() {
            scan_pattern(&lower, &index, pattern, &mut result.hits);
        }

        result.score = score(result.total_weight(), result.word_count);
        result.density = density(result.hits.len(), result.word_count);
        result.rating = Rating::from_score(result.score);
        result
    }

    /// Lossy-decodes arbitrary bytes before scanning.
    pub fn scan_bytes(&self, bytes: &[u8]) -> ScanResult {
        self.scan(&String::from_utf8_lossy(bytes))
    }
}

/// Weighted hits per thousand words, clamped to `[0, 100]`.
pub fn score(total_weight: f64, word_count: usize) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    let raw = total_weight / word_count as f64 * 1000.0;
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, MAX_SCORE)
}

/// Unweighted hits per thousand words.
pub fn density(hit_count: usize, word_count: usize) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    hit_count as f64 / word_count as f64 * 1000.0
}

fn scan_word(lower: &str, index: &LineIndex<'_>, word: &CompiledWord, hits: &mut Vec<Hit>) {
    for m in word.regex.find_iter(lower) {
        let (line, column) = index.locate(m.start());
        hits.push(Hit {
            line,
            column,
            matched_text: m.as_str().to_string(),
            kind: HitKind::Word,
            detail: format!("{:.1}% of models overuse this word", word.entry.pct_models),
            severity: word.entry.severity,
            weight: word.entry.pct_models / 100.0,
        });
    }
}

fn scan_trigram(
    lower: &str,
    index: &LineIndex<'_>,
    trigram: &CompiledTrigram,
    hits: &mut Vec<Hit>,
) {
    let Some((first, rest)) = trigram.words.split_first() else {
        return;
    };
    if rest.is_empty() {
        return;
    }

    for (start, _) in lower.match_indices(first.as_str()) {
        let window = &lower[start..floor_char_boundary(lower, start + TRIGRAM_WINDOW)];
        if rest.iter().all(|word| window.contains(word.as_str())) {
            let (line, column) = index.locate(start);
            hits.push(Hit {
                line,
                column,
                matched_text: trigram.entry.phrase.clone(),
                kind: HitKind::Trigram,
                detail: format!(
                    "{:.1}% of models overuse this phrase",
                    trigram.entry.pct_models
                ),
                severity: trigram.entry.severity,
                weight: trigram.entry.pct_models / 100.0,
            });
        }
    }
}

fn scan_pattern(
    lower: &str,
    index: &LineIndex<'_>,
    pattern: &CompiledPattern,
    hits: &mut Vec<Hit>,
) {
    for m in pattern.regex.find_iter(lower) {
        let (line, column) = index.locate(m.start());
        hits.push(Hit {
            line,
            column,
            matched_text: truncate_display(m.as_str()),
            kind: HitKind::Pattern,
            detail: format!(
                "{} ({:.1}x overrepresented)",
                pattern.entry.description, pattern.entry.overuse_ratio
            ),
            severity: pattern.entry.severity,
            weight: pattern.entry.overuse_ratio / 10.0,
        });
    }
}

fn truncate_display(matched: &str) -> String {
    match matched.char_indices().nth(MAX_MATCH_DISPLAY) {
        Some((cut, _)) => format!("{}...", &matched[..cut]),
        None => matched.to_string(),
    }
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
