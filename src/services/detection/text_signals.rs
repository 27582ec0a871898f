// Text Signal Extraction
// Six independent stylometric features, each producing a labeled signal and,
// when its own precondition holds, a weighted vote.

use crate::models::{Evidence, ScoreReport, Signal, SignalFlag};
use crate::services::text_processor::{
    coefficient_of_variation, split_paragraphs, tokenize_words, usable_sentence_lengths,
};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;

use super::aggregation::{aggregate, AggregationRule};
use super::calibration::{
    BURSTINESS_AI_MAX, INFORMAL_PUNCTUATION, LEXICAL_BURSTINESS, MIN_BALANCE_PARAGRAPHS,
    MIN_TEXT_WORDS, MIN_UNIFORMITY_SENTENCES, PARAGRAPH_AI_CV, PARAGRAPH_BALANCE,
    SENTENCE_UNIFORMITY, TRANSITION_HIGH_HITS, TRANSITION_PHRASES, TTR_LENGTH_FACTOR,
    TTR_LENGTH_PIVOT, UNIFORMITY_AI_CV, VOCABULARY_AI_TTR, VOCABULARY_RICHNESS,
};

/// Stock transition and hedge phrases overrepresented in LLM prose.
pub const AI_TRANSITION_PHRASES: &[&str] = &[
    "furthermore",
    "moreover",
    "in addition",
    "it is worth noting",
    "it is important to note",
    "in conclusion",
    "to summarize",
    "in summary",
    "therefore",
    "thus",
    "additionally",
    "notably",
    "significantly",
    "interestingly",
    "importantly",
    "ultimately",
    "in essence",
    "overall",
    "needless to say",
    "that being said",
    "having said that",
    "with that said",
    "it can be argued",
    "it is clear that",
    "by and large",
    "to elaborate",
    "in other words",
];

const PARAGRAPH_MIN_CHARS: usize = 20;

fn transition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = AI_TRANSITION_PHRASES
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?-u:\b)(?:{})(?-u:\b)", alternation)).expect("transition regex")
    })
}

/// Score a piece of text. Fewer than ten words yields a neutral, signal-free report.
pub fn score_text(text: &str) -> ScoreReport {
    let evidence = extract_text_evidence(text);
    if evidence.is_empty() {
        return ScoreReport::neutral();
    }
    let score = aggregate(&evidence, AggregationRule::WeightedMean);
    debug!(score, features = evidence.len(), "text.scored");
    ScoreReport {
        score,
        signals: evidence.into_iter().map(|e| e.signal).collect(),
    }
}

/// Build the ordered evidence list for `text`; empty when the text is too short.
pub fn extract_text_evidence(text: &str) -> Vec<Evidence> {
    let words = tokenize_words(text);
    if words.len() < MIN_TEXT_WORDS {
        return Vec::new();
    }
    let sentence_lengths = usable_sentence_lengths(text);
    let sentence_count = sentence_lengths.len().max(1) as f64;

    vec![
        sentence_uniformity(&sentence_lengths),
        transition_phrases(text, sentence_count),
        vocabulary_richness(&words),
        informal_punctuation(text, sentence_count),
        lexical_burstiness(&words),
        paragraph_balance(text),
    ]
}

fn sentence_uniformity(lengths: &[usize]) -> Evidence {
    let name = SENTENCE_UNIFORMITY.name;
    let cv = if lengths.len() >= MIN_UNIFORMITY_SENTENCES {
        coefficient_of_variation(lengths)
    } else {
        None
    };
    let Some(cv) = cv else {
        return Evidence::informational(Signal::new(
            name,
            "Too few sentences to compare (inconclusive)",
            SignalFlag::Uncertain,
        ));
    };

    let signal = if cv < UNIFORMITY_AI_CV {
        Signal::new(name, "Very uniform (AI-like)", SignalFlag::Ai)
    } else {
        Signal::new(name, "Varied (human-like)", SignalFlag::Human)
    };
    Evidence::voting(signal, SENTENCE_UNIFORMITY.vote(cv))
}

/// Occurrences of the stock phrases, matched on word boundaries.
pub fn count_transition_phrases(text: &str) -> usize {
    transition_re().find_iter(&text.to_lowercase()).count()
}

fn transition_phrases(text: &str, sentence_count: f64) -> Evidence {
    let hits = count_transition_phrases(text);
    let rate = hits as f64 / sentence_count;

    let (level, flag) = if hits > TRANSITION_HIGH_HITS {
        ("high", SignalFlag::Ai)
    } else if hits > 0 {
        ("moderate", SignalFlag::Uncertain)
    } else {
        ("none", SignalFlag::Human)
    };
    let signal = Signal::new(
        TRANSITION_PHRASES.name,
        format!("{} found ({})", hits, level),
        flag,
    );
    Evidence::voting(signal, TRANSITION_PHRASES.vote(rate))
}

/// Type-token ratio, raised for long texts to offset its natural decay with length.
pub fn adjusted_type_token_ratio(words: &[String]) -> (f64, f64) {
    let total = words.len();
    if total == 0 {
        return (0.0, 0.0);
    }
    let unique: HashSet<&str> = words.iter().map(String::as_str).collect();
    let ttr = unique.len() as f64 / total as f64;
    let total = total as f64;
    let adjusted = if total > TTR_LENGTH_PIVOT {
        ttr * (1.0 + (total / TTR_LENGTH_PIVOT).log10() * TTR_LENGTH_FACTOR)
    } else {
        ttr
    };
    (ttr, adjusted)
}

fn vocabulary_richness(words: &[String]) -> Evidence {
    let (ttr, adjusted) = adjusted_type_token_ratio(words);
    let flag = if adjusted < VOCABULARY_AI_TTR {
        SignalFlag::Ai
    } else {
        SignalFlag::Human
    };
    let signal = Signal::new(
        VOCABULARY_RICHNESS.name,
        format!("{}% unique words", (ttr * 100.0).round() as i64),
        flag,
    );
    Evidence::voting(signal, VOCABULARY_RICHNESS.vote(adjusted))
}

/// Dashes, ellipses and exclamation marks.
pub fn count_informal_punctuation(text: &str) -> usize {
    let singles = text
        .chars()
        .filter(|c| matches!(c, '\u{2014}' | '\u{2013}' | '\u{2026}' | '!'))
        .count();
    singles + text.matches("...").count()
}

fn informal_punctuation(text: &str, sentence_count: f64) -> Evidence {
    let count = count_informal_punctuation(text);
    let rate = count as f64 / sentence_count;
    let signal = if count == 0 {
        Signal::new(INFORMAL_PUNCTUATION.name, "None (AI-like)", SignalFlag::Ai)
    } else {
        Signal::new(
            INFORMAL_PUNCTUATION.name,
            format!("{} instance(s)", count),
            SignalFlag::Human,
        )
    };
    Evidence::voting(signal, INFORMAL_PUNCTUATION.vote(rate))
}

/// Peak-to-mean frequency ratio over the words that repeat; 1 when none do.
pub fn burstiness(words: &[String]) -> f64 {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for w in words {
        *freq.entry(w.as_str()).or_insert(0) += 1;
    }
    let repeated: Vec<usize> = freq.into_values().filter(|&c| c > 1).collect();
    if repeated.is_empty() {
        return 1.0;
    }
    let max = repeated.iter().copied().max().unwrap_or(1) as f64;
    let mean = repeated.iter().sum::<usize>() as f64 / repeated.len() as f64;
    max / mean
}

fn lexical_burstiness(words: &[String]) -> Evidence {
    let burst = burstiness(words);
    let signal = if burst < BURSTINESS_AI_MAX {
        Signal::new(
            LEXICAL_BURSTINESS.name,
            "Low \u{2014} evenly spread (AI-like)",
            SignalFlag::Ai,
        )
    } else {
        Signal::new(
            LEXICAL_BURSTINESS.name,
            "High \u{2014} clustered (human-like)",
            SignalFlag::Human,
        )
    };
    Evidence::voting(signal, LEXICAL_BURSTINESS.vote(burst))
}

fn paragraph_balance(text: &str) -> Evidence {
    let name = PARAGRAPH_BALANCE.name;
    let paragraphs = split_paragraphs(text, PARAGRAPH_MIN_CHARS);
    if paragraphs.len() < MIN_BALANCE_PARAGRAPHS {
        return Evidence::informational(Signal::new(
            name,
            "Single paragraph (inconclusive)",
            SignalFlag::Uncertain,
        ));
    }

    let lengths: Vec<usize> = paragraphs
        .iter()
        .map(|p| p.split_whitespace().count())
        .collect();
    let Some(cv) = coefficient_of_variation(&lengths) else {
        return Evidence::informational(Signal::new(
            name,
            "Paragraph lengths unavailable (inconclusive)",
            SignalFlag::Uncertain,
        ));
    };

    let signal = if cv < PARAGRAPH_AI_CV {
        Signal::new(name, "Highly balanced (AI-like)", SignalFlag::Ai)
    } else {
        Signal::new(name, "Varied lengths (human-like)", SignalFlag::Human)
    };
    Evidence::voting(signal, PARAGRAPH_BALANCE.vote(cv))
}
