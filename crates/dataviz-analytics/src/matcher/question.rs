//! Question normalization and typo-tolerant keyword tests.

use once_cell::sync::Lazy;
use rapidfuzz::distance::indel;
use regex::Regex;

/// Tokens shorter than this only match a keyword exactly.
const MIN_FUZZY_TOKEN_LEN: usize = 4;

static EDGE_PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\p{L}\p{N}]+|[^\p{L}\p{N}]+$").expect("Invalid regex: edge punctuation")
});

static PARAMETER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[=\d]").expect("Invalid regex: parameter marker"));

/// Similarity ratio in `[0, 1]`: `2 * LCS / (len(a) + len(b))`.
pub fn similarity(a: &str, b: &str) -> f64 {
    indel::normalized_similarity(a.chars(), b.chars())
}

/// A lowercased, tokenized question.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    raw: String,
    normalized: String,
    tokens: Vec<String>,
}

impl Question {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        let tokens = normalized
            .split_whitespace()
            .map(|t| EDGE_PUNCTUATION.replace_all(t, "").into_owned())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            raw: raw.to_string(),
            normalized,
            tokens,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// True if the question carries parameters (`=` or any digit).
    pub fn has_parameters(&self) -> bool {
        PARAMETER_MARKER.is_match(&self.normalized)
    }

    /// Case-insensitive substring test against the normalized question.
    pub fn mentions(&self, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        !needle.is_empty() && self.normalized.contains(&needle)
    }

    fn contains_phrase(&self, phrase: &str) -> bool {
        let haystack = format!(" {} ", self.tokens.join(" "));
        haystack.contains(&format!(" {} ", phrase))
    }

    /// True if any keyword matches.
    ///
    /// Multi-word keywords must appear as a phrase; single words match a
    /// token whose similarity reaches `threshold`.
    pub fn matches_any(&self, keywords: &[&str], threshold: f64) -> bool {
        keywords.iter().any(|keyword| {
            if keyword.contains(' ') {
                self.contains_phrase(keyword)
            } else {
                self.tokens
                    .iter()
                    .any(|token| token_matches(token, keyword, threshold))
            }
        })
    }

    /// Like [`Question::matches_any`], but a single-word token only counts
    /// when it is strictly closer to `keywords` than to `rival`.
    ///
    /// Keeps "minimum" from matching the max set ("maximum" scores 0.71).
    pub fn matches_any_over(&self, keywords: &[&str], rival: &[&str], threshold: f64) -> bool {
        keywords.iter().any(|keyword| {
            if keyword.contains(' ') {
                return self.contains_phrase(keyword);
            }
            self.tokens.iter().any(|token| {
                token_matches(token, keyword, threshold)
                    && best_similarity(token, keywords) > best_similarity(token, rival)
            })
        })
    }
}

fn best_similarity(token: &str, keywords: &[&str]) -> f64 {
    keywords
        .iter()
        .map(|keyword| similarity(token, keyword))
        .fold(0.0, f64::max)
}

fn token_matches(token: &str, keyword: &str, threshold: f64) -> bool {
    if token == keyword {
        return true;
    }
    if token.chars().count() < MIN_FUZZY_TOKEN_LEN {
        return false;
    }
    similarity(token, keyword) >= threshold
}
