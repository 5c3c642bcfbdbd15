//! Keyword and key-phrase extraction.
//!
//! English text goes through a RAKE-style ranking: candidate phrases are the maximal runs of
//! non-stopword words between stopwords and punctuation, each word is scored by
//! `degree / frequency` over the co-occurrence graph, and a phrase scores the sum of its
//! word scores. Other languages fall back to a frequency count of capitalized tokens. Both
//! paths bottom out at a fixed sentinel so the report's key-points field is never empty.

use crate::config::Language;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Sentinel emitted when no key phrases could be extracted.
pub const KEY_POINTS_SENTINEL: &str = "Key phrase extraction unavailable";

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9']+").expect("valid word regex"));

static CAPITALIZED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("valid capitalized-word regex"));

static PHRASE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9'\s]+").expect("valid boundary regex"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
        "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "down",
        "during", "each", "few", "for", "from", "further", "had", "has", "have", "having",
        "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it",
        "its", "itself", "just", "me", "more", "most", "my", "no", "nor", "not", "now", "of",
        "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own",
        "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
        "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to",
        "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
        "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your",
        "yours",
    ]
    .into_iter()
    .collect()
});

/// Extract up to 8 title-cased key phrases from the original text.
///
/// English input uses the RAKE-style ranker restricted to phrases of at most 4 words and
/// more than 3 characters, taking the top 15 candidates before truncating to 8. Other
/// languages (and English text yielding no ranked phrases) fall back to capitalized-token
/// frequencies; if that also finds nothing, a single sentinel entry is returned.
pub fn extract_key_phrases(text: &str, language: Language) -> Vec<String> {
    let mut phrases = match language {
        Language::En => {
            let mut clean = Vec::new();
            for phrase in rank_phrases(text).into_iter().take(15) {
                if phrase.split_whitespace().count() <= 4 && phrase.len() > 3 {
                    clean.push(title_case(&phrase));
                }
            }
            clean.truncate(8);
            clean
        }
        Language::Zh => Vec::new(),
    };

    if phrases.is_empty() {
        phrases = capitalized_frequency_fallback(text);
    }
    if phrases.is_empty() {
        phrases = vec![KEY_POINTS_SENTINEL.to_string()];
    }
    phrases
}

/// Rank candidate phrases RAKE-style, best first.
///
/// Word score is `degree / frequency`, where a word's degree accumulates the length of
/// every candidate phrase it appears in; a phrase's score is the sum of its word scores.
pub fn rank_phrases(text: &str) -> Vec<String> {
    let candidates = candidate_phrases(text);
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut frequency: HashMap<&str, f64> = HashMap::new();
    let mut degree: HashMap<&str, f64> = HashMap::new();
    for phrase in &candidates {
        let length = phrase.len() as f64;
        for word in phrase {
            *frequency.entry(word.as_str()).or_insert(0.0) += 1.0;
            *degree.entry(word.as_str()).or_insert(0.0) += length;
        }
    }

    let mut seen = HashSet::new();
    let mut scored: Vec<(f64, usize, String)> = Vec::new();
    for (index, phrase) in candidates.iter().enumerate() {
        let joined = phrase.join(" ");
        if !seen.insert(joined.clone()) {
            continue;
        }
        let score: f64 = phrase
            .iter()
            .map(|word| degree[word.as_str()] / frequency[word.as_str()])
            .sum();
        scored.push((score, index, joined));
    }

    // Highest score first; first-seen order breaks ties.
    scored.sort_by(|left, right| {
        right
            .0
            .partial_cmp(&left.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(left.1.cmp(&right.1))
    });
    scored.into_iter().map(|(_, _, phrase)| phrase).collect()
}

/// Maximal runs of non-stopword words, lowercased, delimited by stopwords and punctuation.
fn candidate_phrases(text: &str) -> Vec<Vec<String>> {
    let mut phrases = Vec::new();
    for fragment in PHRASE_BOUNDARY.split(text) {
        let mut current: Vec<String> = Vec::new();
        for word in WORD_PATTERN.find_iter(fragment) {
            let lowered = word.as_str().to_lowercase();
            if STOP_WORDS.contains(lowered.as_str()) {
                if !current.is_empty() {
                    phrases.push(std::mem::take(&mut current));
                }
            } else {
                current.push(lowered);
            }
        }
        if !current.is_empty() {
            phrases.push(current);
        }
    }
    phrases
}

/// Frequency count of capitalized multi-character tokens appearing more than once.
///
/// Keeps the top 8 by descending frequency; ties resolve in first-seen order.
fn capitalized_frequency_fallback(text: &str) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for word in CAPITALIZED_PATTERN.find_iter(text) {
        let word = word.as_str();
        if word.len() <= 3 {
            continue;
        }
        match index.get(word) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(word.to_string(), counts.len());
                counts.push((word.to_string(), 1));
            }
        }
    }

    let mut ranked: Vec<(usize, String, usize)> = counts
        .into_iter()
        .enumerate()
        .filter(|(_, (_, count))| *count > 1)
        .map(|(first_seen, (word, count))| (count, word, first_seen))
        .collect();
    ranked.sort_by(|left, right| right.0.cmp(&left.0).then(left.2.cmp(&right.2)));
    ranked
        .into_iter()
        .take(8)
        .map(|(_, word, _)| word)
        .collect()
}

/// Uppercase the first letter of each word and lowercase the rest.
fn title_case(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
