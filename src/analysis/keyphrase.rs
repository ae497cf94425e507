//! Statistical keyphrase extraction.
//!
//! Candidates are the 1..=`max_ngram` grams of the stop-word-filtered token
//! sequence. Each candidate is scored by how often it occurs weighted by the
//! mean frequency of its tokens, and the final list is picked with maximal
//! marginal relevance so near-duplicate phrases ("dark forest", "forest")
//! do not crowd out the rest:
//!
//! ```text
//! mmr(c) = (1 - diversity) * relevance(c) - diversity * max_sim(c, selected)
//! ```
//!
//! Similarity between two phrases is the Jaccard overlap of their tokens.

use std::collections::{HashMap, HashSet};

/// Trailing Korean particles, longest first.
const PARTICLES: &[&str] = &[
    "에서", "에게", "으로", "은", "는", "이", "가", "을", "를", "에", "의", "도", "로", "와", "과",
];

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Ranks keyphrases of a text.
pub trait KeyphraseExtractor: Send + Sync {
    /// Return up to `top_n` phrases with their relevance in `[0, 1]`, best
    /// first.
    fn extract(
        &self,
        text: &str,
        stop_words: &HashSet<&'static str>,
        top_n: usize,
    ) -> Vec<(String, f32)>;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_hangul_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

/// `true` when Hangul syllables make up more than a third of the characters.
pub fn is_korean_dominant(text: &str) -> bool {
    let total = text.chars().count();
    let hangul = text.chars().filter(|c| is_hangul_syllable(*c)).count();
    hangul * 3 > total
}

/// Remove one trailing particle from a Hangul token, keeping at least two
/// characters of stem.
pub fn strip_particle(token: &str) -> &str {
    if !token.chars().last().is_some_and(is_hangul_syllable) {
        return token;
    }
    for particle in PARTICLES {
        if let Some(stem) = token.strip_suffix(particle) {
            if stem.chars().count() >= 2 {
                return stem;
            }
        }
    }
    token
}

/// Lowercased word tokens with surrounding punctuation removed and Korean
/// particles stripped. Single-character tokens are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| {
            raw.trim_matches(|c: char| !(c.is_alphanumeric() || c == '_'))
                .to_lowercase()
        })
        .map(|t| strip_particle(&t).to_string())
        .filter(|t| t.chars().count() >= 2)
        .collect()
}

fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}

// ---------------------------------------------------------------------------
// StatisticalExtractor
// ---------------------------------------------------------------------------

/// Frequency-based extractor with MMR diversification.
#[derive(Debug, Clone)]
pub struct StatisticalExtractor {
    pub max_ngram: usize,
    pub diversity: f32,
}

impl StatisticalExtractor {
    pub fn new(max_ngram: usize, diversity: f32) -> Self {
        Self {
            max_ngram: max_ngram.max(1),
            diversity: diversity.clamp(0.0, 1.0),
        }
    }

    /// Candidate phrases with normalized relevance, in first-seen order.
    fn candidates(&self, tokens: &[String]) -> Vec<(String, f32)> {
        let mut token_freq: HashMap<&str, usize> = HashMap::new();
        for t in tokens {
            *token_freq.entry(t.as_str()).or_default() += 1;
        }

        let mut order: Vec<String> = Vec::new();
        let mut phrase_freq: HashMap<String, usize> = HashMap::new();
        for n in 1..=self.max_ngram {
            for window in tokens.windows(n) {
                let phrase = window.join(" ");
                let count = phrase_freq.entry(phrase.clone()).or_default();
                if *count == 0 {
                    order.push(phrase);
                }
                *count += 1;
            }
        }

        let raw: Vec<(String, f32)> = order
            .into_iter()
            .map(|phrase| {
                let words: Vec<&str> = phrase.split(' ').collect();
                let mean = words
                    .iter()
                    .map(|w| token_freq.get(w).copied().unwrap_or(0) as f32)
                    .sum::<f32>()
                    / words.len() as f32;
                let score = phrase_freq[&phrase] as f32 * mean;
                (phrase, score)
            })
            .collect();

        let max = raw.iter().map(|(_, s)| *s).fold(0.0_f32, f32::max);
        if max <= 0.0 {
            return Vec::new();
        }
        raw.into_iter().map(|(p, s)| (p, s / max)).collect()
    }
}

impl Default for StatisticalExtractor {
    fn default() -> Self {
        Self::new(2, 0.7)
    }
}

impl KeyphraseExtractor for StatisticalExtractor {
    fn extract(
        &self,
        text: &str,
        stop_words: &HashSet<&'static str>,
        top_n: usize,
    ) -> Vec<(String, f32)> {
        let tokens: Vec<String> = tokenize(text)
            .into_iter()
            .filter(|t| !stop_words.contains(t.as_str()))
            .collect();
        let candidates = self.candidates(&tokens);
        if candidates.is_empty() || top_n == 0 {
            return Vec::new();
        }

        let token_sets: Vec<HashSet<&str>> = candidates
            .iter()
            .map(|(p, _)| p.split(' ').collect())
            .collect();

        let mut selected: Vec<usize> = Vec::new();
        let mut remaining: Vec<usize> = (0..candidates.len()).collect();

        while selected.len() < top_n && !remaining.is_empty() {
            let mut best_pos = 0;
            let mut best_score = f32::NEG_INFINITY;
            for (pos, &idx) in remaining.iter().enumerate() {
                let relevance = candidates[idx].1;
                let score = if selected.is_empty() {
                    relevance
                } else {
                    let max_sim = selected
                        .iter()
                        .map(|&s| jaccard(&token_sets[idx], &token_sets[s]))
                        .fold(0.0_f32, f32::max);
                    (1.0 - self.diversity) * relevance - self.diversity * max_sim
                };
                if score > best_score {
                    best_score = score;
                    best_pos = pos;
                }
            }
            selected.push(remaining.remove(best_pos));
        }

        selected
            .into_iter()
            .map(|idx| candidates[idx].clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stopwords;

    #[test]
    fn korean_dominance() {
        assert!(is_korean_dominant("그녀는 사랑에 빠졌다"));
        assert!(!is_korean_dominant("she fell in love 사랑"));
        assert!(!is_korean_dominant(""));
    }

    #[test]
    fn strips_particles() {
        assert_eq!(strip_particle("사랑은"), "사랑");
        assert_eq!(strip_particle("학교에서"), "학교");
        assert_eq!(strip_particle("마법사를"), "마법사");
        // Stem would be a single syllable.
        assert_eq!(strip_particle("나는"), "나는");
        assert_eq!(strip_particle("dragon"), "dragon");
    }

    #[test]
    fn tokenize_trims_punctuation() {
        let tokens = tokenize("The dragon, the KNIGHT! a");
        assert_eq!(tokens, vec!["the", "dragon", "the", "knight"]);
    }

    #[test]
    fn most_frequent_word_ranks_first() {
        let ex = StatisticalExtractor::default();
        let text = "dragon dragon dragon knight castle dragon";
        let out = ex.extract(text, stopwords::english(), 3);
        assert_eq!(out[0].0, "dragon");
        assert!((out[0].1 - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn stop_words_are_excluded() {
        let ex = StatisticalExtractor::default();
        let out = ex.extract("the the the the dragon", stopwords::english(), 5);
        assert!(out.iter().all(|(p, _)| !p.split(' ').any(|w| w == "the")));
        assert_eq!(out[0].0, "dragon");
    }

    #[test]
    fn respects_top_n_and_uniqueness() {
        let ex = StatisticalExtractor::default();
        let text = "rain falls on the quiet city while the lonely detective walks \
                    through the quiet rain thinking about the city";
        let out = ex.extract(text, stopwords::english(), 4);
        assert_eq!(out.len(), 4);
        let unique: HashSet<&str> = out.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn diversity_penalizes_overlap() {
        let text = "dark forest dark forest dark forest night";
        let diverse = StatisticalExtractor::new(2, 0.9).extract(text, stopwords::english(), 2);
        // The second pick should not share a token with the first.
        let first: HashSet<&str> = diverse[0].0.split(' ').collect();
        let second: HashSet<&str> = diverse[1].0.split(' ').collect();
        assert!(first.is_disjoint(&second));
    }

    #[test]
    fn empty_text_yields_nothing() {
        let ex = StatisticalExtractor::default();
        assert!(ex.extract("", stopwords::english(), 5).is_empty());
        assert!(ex.extract("the a an", stopwords::english(), 5).is_empty());
    }

    #[test]
    fn korean_phrases() {
        let ex = StatisticalExtractor::default();
        let text = "마법사는 용을 만났다 마법사가 용과 싸웠다 마법사의 모험";
        let out = ex.extract(text, stopwords::korean(), 3);
        assert_eq!(out[0].0, "마법사");
    }
}
