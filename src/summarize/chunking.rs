//! Sentence-aware chunking under a token budget.
//!
//! Long input is split into model-sized windows before inference. Boundaries always fall on
//! sentence ends; a sentence is never split, even when it alone exceeds the budget. Token
//! counts use the fixed `chars / 4` approximation rather than a real tokenizer, so chunk
//! sizing stays reproducible across model backends and matches the service's size limits.

use crate::config::Language;
use regex::Regex;
use std::sync::LazyLock;

static SENTENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("valid sentence regex"));

static SENTENCE_PATTERN_CJK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?。！？]+[.!?。！？]+").expect("valid CJK sentence regex"));

static PUNCT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?。！？]+").expect("valid punctuation regex"));

/// Estimate the token count of a span of text.
///
/// Fixed heuristic: one token per four characters, rounded down. This is a documented
/// approximation, not exact tokenization.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Split text into sentences, preserving end-of-sentence punctuation.
///
/// The delimiter-preserving scan fails on text with no sentence-final punctuation; in that
/// case a plain punctuation split is used, which degrades to yielding the whole text as a
/// single sentence.
pub fn split_sentences(text: &str, language: Language) -> Vec<String> {
    let pattern = match language {
        Language::En => &*SENTENCE_PATTERN,
        Language::Zh => &*SENTENCE_PATTERN_CJK,
    };

    let sentences: Vec<String> = pattern
        .find_iter(text)
        .map(|found| found.as_str().trim().to_string())
        .filter(|sentence| !sentence.is_empty())
        .collect();
    if !sentences.is_empty() {
        return sentences;
    }

    PUNCT_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split text into ordered chunks, each within the estimated token budget.
///
/// Sentences are accumulated greedily; when adding the next sentence would push the current
/// chunk past `budget` tokens, the chunk is closed and the sentence starts a new one. A
/// single sentence larger than the budget is emitted as its own chunk rather than split.
/// No chunk is empty, and joining all chunks with single spaces reconstructs the sentence
/// sequence of the input modulo whitespace normalization.
pub fn split_chunks(text: &str, language: Language, budget: usize) -> Vec<String> {
    let sentences = split_sentences(text, language);

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        let estimated = estimate_tokens(&format!("{current} {sentence}"));
        if estimated > budget && !current.is_empty() {
            chunks.push(std::mem::replace(&mut current, sentence));
        } else if current.is_empty() {
            current = sentence;
        } else {
            current.push(' ');
            current.push_str(&sentence);
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }

    chunks
}
