// Text Processing Service
// Tokenization and dispersion helpers shared by the text features

use regex::Regex;
use std::sync::OnceLock;

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // ASCII boundaries: accented letters split a word rather than hide it
    RE.get_or_init(|| Regex::new(r"(?-u:\b)[a-z']+(?-u:\b)").expect("word regex"))
}

fn sentence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]+").expect("sentence regex"))
}

fn paragraph_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("paragraph regex"))
}

/// Lowercased alphabetic word tokens (apostrophes kept, digits dropped).
pub fn tokenize_words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    word_re()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Sentences terminated by `.`, `!` or `?`.
/// Text without any terminator falls back to its non-empty lines.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let sentences: Vec<&str> = sentence_re().find_iter(text).map(|m| m.as_str()).collect();
    if !sentences.is_empty() {
        return sentences;
    }
    text.split('\n').filter(|line| !line.is_empty()).collect()
}

/// Word counts of the sentences with more than two words.
pub fn usable_sentence_lengths(text: &str) -> Vec<usize> {
    split_sentences(text)
        .into_iter()
        .map(|s| s.split_whitespace().count())
        .filter(|&len| len > 2)
        .collect()
}

/// Paragraphs separated by blank lines whose trimmed text exceeds `min_chars`.
pub fn split_paragraphs(text: &str, min_chars: usize) -> Vec<&str> {
    paragraph_break_re()
        .split(text)
        .map(str::trim)
        .filter(|p| p.chars().count() > min_chars)
        .collect()
}

/// Coefficient of variation using the population standard deviation.
pub fn coefficient_of_variation(values: &[usize]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<usize>() as f64 / n;
    if mean <= 0.0 {
        return None;
    }
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    Some(variance.sqrt() / mean)
}

/// First `max_chars` characters with every non-alphanumeric replaced by a
/// space and whitespace collapsed; used as an exact-phrase search query.
pub fn search_snippet(text: &str, max_chars: usize) -> String {
    let cleaned: String = text
        .chars()
        .take(max_chars)
        .map(|c| if c.is_ascii_alphanumeric() || c == ' ' { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
