mod entries;
mod presets;

use std::{
    fs,
    path::{Path, PathBuf},
};

use regex::{Regex, RegexBuilder};
use thiserror::Error;

pub use entries::{
    PatternData, PatternEntry, PresetData, TrigramData, TrigramEntry, WordData, WordEntry,
};
pub use presets::{describe_preset, list_presets, resolve_preset, PRESET_EXTENSION};

const EMBEDDED_WORDS: &str = include_str!("../../data/words.json");
const EMBEDDED_TRIGRAMS: &str = include_str!("../../data/trigrams.json");
const EMBEDDED_PATTERNS: &str = include_str!("../../data/patterns.json");

#[derive(Debug, Error)]
pub enum BanlistError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        source: serde_json::Error,
    },
    #[error("preset {name:?} not found (searched: {})", .searched.join(", "))]
    PresetNotFound { name: String, searched: Vec<String> },
    #[error("failed to parse preset {name:?}: {source}")]
    PresetParse {
        name: String,
        source: serde_json::Error,
    },
}

/// Where the mandatory base tables come from.
#[derive(Debug, Clone, Default)]
pub enum BaseSource {
    #[default]
    Embedded,
    Directory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct CompiledWord {
    pub entry: WordEntry,
    pub regex: Regex,
}

#[derive(Debug, Clone)]
pub struct CompiledTrigram {
    pub entry: TrigramEntry,
    /// Lower-cased, whitespace-split phrase.
    pub words: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub entry: PatternEntry,
    pub regex: Regex,
}

#[derive(Debug, Clone, Default)]
pub struct BanlistStore {
    words: Vec<CompiledWord>,
    trigrams: Vec<CompiledTrigram>,
    patterns: Vec<CompiledPattern>,
}

impl BanlistStore {
    /// Loads the base tables and merges each named preset on top.
    ///
    /// A missing or malformed base table, or a preset that cannot be resolved,
    /// fails the whole load. Individual regexes that do not compile are
    /// skipped with a warning.
    pub fn load(
        base: &BaseSource,
        presets: &[String],
        preset_dir: Option<&Path>,
    ) -> Result<Self, BanlistError> {
        let (words, trigrams, patterns) = match base {
            BaseSource::Embedded => (
                parse_table::<WordData>("embedded words", EMBEDDED_WORDS)?,
                parse_table::<TrigramData>("embedded trigrams", EMBEDDED_TRIGRAMS)?,
                parse_table::<PatternData>("embedded patterns", EMBEDDED_PATTERNS)?,
            ),
            BaseSource::Directory(dir) => (
                parse_table::<WordData>("words.json", &read_file(&dir.join("words.json"))?)?,
                parse_table::<TrigramData>(
                    "trigrams.json",
                    &read_file(&dir.join("trigrams.json"))?,
                )?,
                parse_table::<PatternData>(
                    "patterns.json",
                    &read_file(&dir.join("patterns.json"))?,
                )?,
            ),
        };

        let mut store = Self::from_tables(words, trigrams, patterns);
        for name in presets {
            let preset = resolve_preset(name, preset_dir)?;
            tracing::debug!(
                target: "banlist",
                preset = %preset.name,
                words = preset.words.len(),
                trigrams = preset.trigrams.len(),
                patterns = preset.patterns.len(),
                "merging preset"
            );
            store.merge(preset);
        }

        tracing::info!(
            target: "banlist",
            words = store.words.len(),
            trigrams = store.trigrams.len(),
            patterns = store.patterns.len(),
            "banlist loaded"
        );
        Ok(store)
    }

    /// Loads the embedded base tables with no presets.
    pub fn embedded() -> Result<Self, BanlistError> {
        Self::load(&BaseSource::Embedded, &[], None)
    }

    pub fn from_tables(words: WordData, trigrams: TrigramData, patterns: PatternData) -> Self {
        let mut store = Self::default();
        store.extend(words.words, trigrams.trigrams, patterns.patterns);
        store
    }

    pub fn merge(&mut self, preset: PresetData) {
        self.extend(preset.words, preset.trigrams, preset.patterns);
    }

    pub fn words(&self) -> impl Iterator<Item = &CompiledWord> {
        self.words.iter()
    }

    pub fn trigrams(&self) -> impl Iterator<Item = &CompiledTrigram> {
        self.trigrams.iter()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.patterns.iter()
    }

    fn extend(
        &mut self,
        words: Vec<WordEntry>,
        trigrams: Vec<TrigramEntry>,
        patterns: Vec<PatternEntry>,
    ) {
        for mut entry in words {
            entry.word = entry.word.trim().to_lowercase();
            if entry.word.is_empty() {
                continue;
            }
            match Regex::new(&format!(r"\b{}\b", regex::escape(&entry.word))) {
                Ok(regex) => self.words.push(CompiledWord { entry, regex }),
                Err(err) => tracing::warn!(
                    target: "banlist",
                    word = %entry.word,
                    error = %err,
                    "skipping word entry"
                ),
            }
        }

        for mut entry in trigrams {
            entry.phrase = entry.phrase.to_lowercase();
            let words: Vec<String> = entry.phrase.split_whitespace().map(str::to_string).collect();
            if words.is_empty() {
                continue;
            }
            self.trigrams.push(CompiledTrigram { entry, words });
        }

        for entry in patterns {
            if !(entry.overuse_ratio > 0.0) {
                tracing::warn!(
                    target: "banlist",
                    pattern = %entry.name,
                    ratio = entry.overuse_ratio,
                    "skipping pattern with non-positive overuse ratio"
                );
                continue;
            }
            match RegexBuilder::new(&entry.regex)
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => self.patterns.push(CompiledPattern { entry, regex }),
                Err(err) => tracing::warn!(
                    target: "banlist",
                    pattern = %entry.name,
                    error = %err,
                    "skipping invalid pattern"
                ),
            }
        }
    }
}

fn read_file(path: &Path) -> Result<String, BanlistError> {
    fs::read_to_string(path).map_err(|source| BanlistError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_table<T: serde::de::DeserializeOwned>(
    what: &'static str,
    raw: &str,
) -> Result<T, BanlistError> {
    serde_json::from_str(raw).map_err(|source| BanlistError::Parse { what, source })
}
