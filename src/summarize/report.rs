//! Structured report assembly from chunk summaries and the original text.
//!
//! The builder trades precision for robustness: each of the five fields has a
//! deterministic, always-non-empty fallback, because downstream consumers assume a fully
//! populated report regardless of input quality. Methods, results, and limitations share
//! one keyword-triggered sentence collector; the collector scans the combined chunk summary
//! first and only falls through to the original text when the summary yields no match at
//! all, even if the original text would match better.

use crate::config::Language;
use crate::summarize::keywords::extract_key_phrases;
use crate::summarize::types::{StructuredReport, SummaryStyle};
use regex::Regex;
use std::sync::LazyLock;

/// Sentinel TL;DR used when the combined summary contains no sentences.
pub const TLDR_SENTINEL: &str = "Summary unavailable";
/// Sentinel emitted when no methodology sentences were found.
pub const METHODS_SENTINEL: &str = "Methodology details not clearly identified in the text.";
/// Sentinel emitted when no results sentences were found.
pub const RESULTS_SENTINEL: &str = "Specific results not clearly identified in the text.";
/// Sentinel emitted when no limitation sentences were found.
pub const LIMITATIONS_SENTINEL: &str =
    "Limitations not explicitly discussed in the available text.";

const METHOD_KEYWORDS: &[&str] = &[
    "method",
    "approach",
    "technique",
    "algorithm",
    "framework",
    "procedure",
    "methodology",
    "protocol",
    "experiment",
    "analysis",
];

const RESULT_KEYWORDS: &[&str] = &[
    "result",
    "finding",
    "outcome",
    "conclusion",
    "demonstrate",
    "show",
    "achieve",
    "performance",
    "accuracy",
    "improvement",
];

const LIMITATION_KEYWORDS: &[&str] = &[
    "limitation",
    "limit",
    "constraint",
    "drawback",
    "challenge",
    "future work",
    "further research",
    "improvement",
    "weakness",
];

static SENTENCE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid sentence-split regex"));

/// Combine chunk summaries and the original text into the five-field report.
pub fn build(
    original_text: &str,
    chunk_summaries: &[String],
    _style: SummaryStyle,
    language: Language,
) -> StructuredReport {
    let combined_summary = chunk_summaries.join(" ");

    let key_points = extract_key_phrases(original_text, language);
    let tl_dr = generate_tldr(&combined_summary);

    let methods = collect_keyword_sentences(
        &[combined_summary.as_str(), original_text],
        METHOD_KEYWORDS,
        3,
        Some(100),
    )
    .map(join_report_sentences)
    .unwrap_or_else(|| METHODS_SENTINEL.to_string());

    let results = collect_keyword_sentences(
        &[combined_summary.as_str(), original_text],
        RESULT_KEYWORDS,
        3,
        Some(100),
    )
    .map(join_report_sentences)
    .unwrap_or_else(|| RESULTS_SENTINEL.to_string());

    let limitations = collect_keyword_sentences(
        &[combined_summary.as_str(), original_text],
        LIMITATION_KEYWORDS,
        5,
        None,
    )
    .unwrap_or_else(|| vec![LIMITATIONS_SENTINEL.to_string()]);

    StructuredReport {
        tl_dr,
        key_points,
        methods,
        results,
        limitations,
    }
}

/// Compress the combined summary into at most 60 words.
///
/// Summaries already within 60 words pass through verbatim. Longer ones keep the first
/// sentence, and append the second when the first is at most 40 words and the pair stays
/// within 60 words together.
pub fn generate_tldr(summary: &str) -> String {
    if count_words(summary) <= 60 {
        return summary.to_string();
    }

    let sentences = split_plain_sentences(summary);
    let Some(first) = sentences.first() else {
        return TLDR_SENTINEL.to_string();
    };

    if count_words(first) <= 40 {
        if let Some(second) = sentences.get(1) {
            if count_words(&format!("{first} {second}")) <= 60 {
                return format!("{first}. {second}.");
            }
        }
    }

    format!("{first}.")
}

/// Scan the sources in order and collect sentences containing any of the keywords.
///
/// Matching is a case-insensitive substring test. Collection within a source stops once
/// `max_words` is exceeded (when given) or `max_sentences` are gathered (when no word cap
/// applies); the first source producing any match wins and later sources are never
/// consulted. Returns `None` when no source matches.
fn collect_keyword_sentences(
    sources: &[&str],
    keywords: &[&str],
    max_sentences: usize,
    max_words: Option<usize>,
) -> Option<Vec<String>> {
    for source in sources {
        let mut collected: Vec<String> = Vec::new();
        for sentence in split_plain_sentences(source) {
            let lowered = sentence.to_lowercase();
            if !keywords.iter().any(|keyword| lowered.contains(keyword)) {
                continue;
            }
            collected.push(sentence);
            match max_words {
                Some(cap) => {
                    if count_words(&collected.join(" ")) > cap {
                        break;
                    }
                }
                None => {
                    if collected.len() >= max_sentences {
                        break;
                    }
                }
            }
        }
        if !collected.is_empty() {
            collected.truncate(max_sentences);
            return Some(collected);
        }
    }
    None
}

fn join_report_sentences(sentences: Vec<String>) -> String {
    format!("{}.", sentences.join(". "))
}

/// Punctuation-delimited sentences with terminators stripped.
fn split_plain_sentences(text: &str) -> Vec<String> {
    SENTENCE_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
