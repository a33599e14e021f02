//! Spell correction for raw user input.
// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]

use crate::config::CorrectorConfig;
use crate::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// Runs of letters, the unit of correction.
static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}+").expect("static regex: word pattern"));

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Longest word for which distance-2 candidates are generated.
const MAX_EDIT2_LEN: usize = 12;

/// Common English words with relative frequencies.
const BUNDLED_WORDS: &str = include_str!("english_words.txt");

/// Text-to-text normalization applied before matching.
pub trait TextCorrector: Send {
    /// The corrector name.
    fn name(&self) -> &'static str;

    /// Returns the corrected text.
    ///
    /// # Errors
    ///
    /// Returns an error if correction fails; callers treat this as fatal.
    fn correct(&self, text: &str) -> Result<String>;
}

/// Corrector that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCorrector;

impl TextCorrector for PassthroughCorrector {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn correct(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Frequency-ranked edit-distance corrector over a word list.
///
/// Unknown words are replaced by the most frequent known word one edit away,
/// or two edits away for words up to 12 letters. Ties go to the
/// alphabetically first word. Single letters and known words are left alone.
#[derive(Debug, Clone, Default)]
pub struct DictionaryCorrector {
    frequencies: HashMap<String, u64>,
}

impl DictionaryCorrector {
    /// Builds a corrector from word list text.
    ///
    /// Each line holds a word optionally followed by a count; blank lines and
    /// lines starting with `#` are skipped. Repeated words add up.
    #[must_use]
    pub fn from_word_list(contents: &str) -> Self {
        let mut frequencies = HashMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };
            let count = parts.next().and_then(|c| c.parse().ok()).unwrap_or(1);
            *frequencies.entry(word.to_lowercase()).or_insert(0) += count;
        }
        Self { frequencies }
    }

    /// Builds a corrector from the bundled English word list.
    #[must_use]
    pub fn bundled() -> Self {
        Self::from_word_list(BUNDLED_WORDS)
    }

    /// Loads a word list file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_dictionary".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Ok(Self::from_word_list(&contents))
    }

    /// Number of known words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Returns true when the word list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Correction for a single word, or `None` to keep it.
    #[must_use]
    pub fn correct_word(&self, word: &str) -> Option<String> {
        if word.chars().count() < 2 {
            return None;
        }
        let lower = word.to_lowercase();
        if self.frequencies.contains_key(&lower) {
            return None;
        }

        let edits = edits1(&lower);
        let best = self.best_known(edits.iter()).or_else(|| {
            if lower.chars().count() > MAX_EDIT2_LEN {
                return None;
            }
            let second: Vec<String> = edits.iter().flat_map(|e| edits1(e)).collect();
            self.best_known(second.iter())
        })?;

        Some(match_case(word, best))
    }

    fn best_known<'a>(&self, candidates: impl Iterator<Item = &'a String>) -> Option<&str> {
        candidates
            .filter_map(|c| self.frequencies.get_key_value(c))
            .max_by(|(a, fa), (b, fb)| fa.cmp(fb).then_with(|| b.cmp(a)))
            .map(|(word, _)| word.as_str())
    }
}

impl TextCorrector for DictionaryCorrector {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn correct(&self, text: &str) -> Result<String> {
        Ok(WORD_REGEX
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let word = &caps[0];
                self.correct_word(word).unwrap_or_else(|| word.to_string())
            })
            .into_owned())
    }
}

/// Builds the configured corrector.
///
/// Correction uses the bundled word list unless a dictionary file is
/// configured. A dictionary that cannot be read or is empty falls back to
/// the bundled list. Input passes through unchanged only when correction is
/// disabled.
#[must_use]
pub fn build_corrector(config: &CorrectorConfig) -> Box<dyn TextCorrector> {
    if !config.enabled {
        tracing::debug!("Spell correction disabled");
        return Box::new(PassthroughCorrector);
    }
    let Some(path) = config.dictionary.as_deref() else {
        return Box::new(DictionaryCorrector::bundled());
    };
    match DictionaryCorrector::load(path) {
        Ok(corrector) if !corrector.is_empty() => {
            tracing::info!(path = %path.display(), words = corrector.len(), "Loaded dictionary");
            Box::new(corrector)
        },
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Dictionary is empty, using bundled words");
            Box::new(DictionaryCorrector::bundled())
        },
        Err(e) => {
            tracing::warn!(error = %e, "Dictionary unavailable, using bundled words");
            Box::new(DictionaryCorrector::bundled())
        },
    }
}

/// All strings one delete, transpose, replace or insert away from `word`.
fn edits1(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut out = Vec::with_capacity(chars.len() * 54 + 26);

    for i in 0..=chars.len() {
        let (left, right) = chars.split_at(i);
        if let Some((_, rest)) = right.split_first() {
            out.push(left.iter().chain(rest).collect());
        }
        if right.len() > 1 {
            out.push(
                left.iter()
                    .chain([&right[1], &right[0]])
                    .chain(&right[2..])
                    .collect(),
            );
        }
        for c in ALPHABET.chars() {
            if let Some((_, rest)) = right.split_first() {
                out.push(left.iter().chain([&c]).chain(rest).collect());
            }
            out.push(left.iter().chain([&c]).chain(right).collect());
        }
    }
    out
}

/// Gives `replacement` the capitalization style of `original`.
fn match_case(original: &str, replacement: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return replacement.to_uppercase();
    }
    if letters.first().is_some_and(|c| c.is_uppercase()) {
        let mut chars = replacement.chars();
        return chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        });
    }
    replacement.to_string()
}
