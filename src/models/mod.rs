// AuthVerifier Data Models
// Signals, votes and the result objects returned to callers

use serde::{Deserialize, Serialize};

// ============ Signals & Votes ============

/// Which way a signal leans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalFlag {
    Ai,
    Human,
    Uncertain,
}

impl SignalFlag {
    /// Flag for an externally supplied AI probability (secondary engine).
    pub fn from_probability(p: f64) -> Self {
        if p > 0.6 {
            Self::Ai
        } else if p > 0.4 {
            Self::Uncertain
        } else {
            Self::Human
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub value: String,
    pub flag: SignalFlag,
}

impl Signal {
    pub fn new(name: impl Into<String>, value: impl Into<String>, flag: SignalFlag) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            flag,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vote {
    pub score: f64,
    pub weight: f64,
}

impl Vote {
    pub const fn new(score: f64, weight: f64) -> Self {
        Self { score, weight }
    }
}

/// One finding of an extractor: a signal, plus the vote it casts if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub signal: Signal,
    pub vote: Option<Vote>,
}

impl Evidence {
    pub fn voting(signal: Signal, vote: Vote) -> Self {
        Self {
            signal,
            vote: Some(vote),
        }
    }

    pub fn informational(signal: Signal) -> Self {
        Self { signal, vote: None }
    }
}

/// Output of both engine operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: f64,
    pub signals: Vec<Signal>,
}

impl ScoreReport {
    pub fn neutral() -> Self {
        Self {
            score: 0.5,
            signals: Vec::new(),
        }
    }
}

// ============ Classification ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "AI-Generated")]
    AiGenerated,
    #[serde(rename = "Uncertain")]
    Uncertain,
    #[serde(rename = "Human-Written")]
    HumanWritten,
    #[serde(rename = "Real Image")]
    RealImage,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiGenerated => "AI-Generated",
            Self::Uncertain => "Uncertain",
            Self::HumanWritten => "Human-Written",
            Self::RealImage => "Real Image",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

// ============ Detection Response ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub ai_probability: u8,
    pub human_probability: u8,
    pub verdict: Verdict,
    pub confidence: Confidence,
    pub signals: Vec<Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

/// A supporting or opposing web/reverse-image source. Cosmetic only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub display_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub detection: DetectionResult,
    #[serde(default)]
    pub sources: Vec<SourceResult>,
    #[serde(rename = "type")]
    pub kind: ContentKind,
}
