// Analysis Orchestration
// Validates caller input, runs the heuristic engines and consults the optional
// collaborators concurrently. Collaborator failures never fail an analysis.

use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::models::{AnalysisResponse, ContentKind, DetectionResult, SourceResult};
use crate::services::config_store::AppConfig;
use crate::services::providers::{SecondaryTextScorer, SourceQuery, SourceSearch};
use crate::services::text_processor::search_snippet;
use crate::services::upload::UploadedImage;

use super::image_signals::score_image;
use super::text_signals::score_text;
use super::verdict::{blend_secondary, secondary_signal};

const SEARCH_SNIPPET_CHARS: usize = 120;
const HEURISTIC_ENGINE: &str = "Heuristic Engine";
const TOO_FEW_WORDS_NOTE: &str =
    "Text is too short for heuristic analysis; the heuristic score is neutral.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Text must be at least {min} characters.")]
    InputTooShort { min: usize },
    #[error("No image uploaded.")]
    EmptyImage,
    #[error("Image is {size} bytes; the limit is {max} bytes.")]
    ImageTooLarge { size: usize, max: usize },
    #[error("Failed to read uploaded image: {0}")]
    UnreadableUpload(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub min_text_chars: usize,
    pub max_image_bytes: usize,
    pub secondary_enabled: bool,
    pub secondary_timeout: Duration,
    pub search_enabled: bool,
    pub search_timeout: Duration,
    pub max_sources: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for AnalysisSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            min_text_chars: config.limits.min_text_chars,
            max_image_bytes: config.limits.max_image_bytes,
            secondary_enabled: config.secondary.enabled,
            secondary_timeout: Duration::from_secs(config.secondary.timeout_secs),
            search_enabled: config.search.enabled,
            search_timeout: Duration::from_secs(config.search.timeout_secs),
            max_sources: config.search.max_results,
        }
    }
}

impl AnalysisSettings {
    /// Same limits, with both collaborators switched off.
    pub fn offline(self) -> Self {
        Self {
            secondary_enabled: false,
            search_enabled: false,
            ..self
        }
    }
}

/// Analyze a text: heuristics, optionally blended with a secondary engine,
/// plus matching web sources.
pub async fn analyze_text<S, Q>(
    text: &str,
    settings: &AnalysisSettings,
    scorer: &S,
    search: &Q,
) -> Result<AnalysisResponse, AnalysisError>
where
    S: SecondaryTextScorer,
    Q: SourceSearch,
{
    if text.trim().chars().count() < settings.min_text_chars {
        return Err(AnalysisError::InputTooShort {
            min: settings.min_text_chars,
        });
    }
    let start = Instant::now();
    info!(chars = text.chars().count(), "analysis.text.start");

    let heuristic = score_text(text);
    let snippet = search_snippet(text, SEARCH_SNIPPET_CHARS);
    let query = (!snippet.is_empty()).then(|| SourceQuery::Text(snippet));

    let (secondary, sources) = tokio::join!(
        secondary_score(scorer, text, settings),
        find_sources(search, query, settings),
    );

    let too_few_words = heuristic.signals.is_empty();
    let mut signals = heuristic.signals;
    let (score, engine) = match secondary {
        Some(s) => {
            signals.insert(0, secondary_signal(scorer.label(), s));
            (
                blend_secondary(heuristic.score, s),
                format!("{} + Heuristics", scorer.label()),
            )
        }
        None => (heuristic.score, HEURISTIC_ENGINE.to_string()),
    };

    let mut detection =
        DetectionResult::from_probability(score, ContentKind::Text, signals).with_engine(engine);
    if too_few_words {
        detection = detection.with_note(TOO_FEW_WORDS_NOTE);
    }

    info!(
        ai_probability = detection.ai_probability,
        verdict = detection.verdict.as_str(),
        sources = sources.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analysis.text.done"
    );
    Ok(AnalysisResponse {
        detection,
        sources,
        kind: ContentKind::Text,
    })
}

/// Analyze image bytes. Reverse image search runs only when the caller can
/// supply a public URL for the same image.
pub async fn analyze_image<Q>(
    bytes: &[u8],
    declared_mime: &str,
    image_url: Option<&str>,
    settings: &AnalysisSettings,
    search: &Q,
) -> Result<AnalysisResponse, AnalysisError>
where
    Q: SourceSearch,
{
    if bytes.is_empty() {
        return Err(AnalysisError::EmptyImage);
    }
    if bytes.len() > settings.max_image_bytes {
        return Err(AnalysisError::ImageTooLarge {
            size: bytes.len(),
            max: settings.max_image_bytes,
        });
    }
    let start = Instant::now();
    info!(bytes = bytes.len(), mime = declared_mime, "analysis.image.start");

    let report = score_image(bytes, declared_mime);
    let query = image_url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(|u| SourceQuery::ImageUrl(u.to_string()));
    let sources = find_sources(search, query, settings).await;

    let detection =
        DetectionResult::from_probability(report.score, ContentKind::Image, report.signals);

    info!(
        ai_probability = detection.ai_probability,
        verdict = detection.verdict.as_str(),
        sources = sources.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analysis.image.done"
    );
    Ok(AnalysisResponse {
        detection,
        sources,
        kind: ContentKind::Image,
    })
}

/// Analyze an uploaded file; the upload is removed on return, success or not.
/// Oversized files are rejected from their metadata before being read.
pub async fn analyze_uploaded_image<Q>(
    upload: UploadedImage,
    image_url: Option<&str>,
    settings: &AnalysisSettings,
    search: &Q,
) -> Result<AnalysisResponse, AnalysisError>
where
    Q: SourceSearch,
{
    let size = upload
        .byte_len()
        .map_err(|e| AnalysisError::UnreadableUpload(e.to_string()))?;
    if size > settings.max_image_bytes as u64 {
        return Err(AnalysisError::ImageTooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            max: settings.max_image_bytes,
        });
    }
    let bytes = upload
        .read()
        .map_err(|e| AnalysisError::UnreadableUpload(e.to_string()))?;
    analyze_image(&bytes, upload.mime(), image_url, settings, search).await
}

async fn secondary_score<S: SecondaryTextScorer>(
    scorer: &S,
    text: &str,
    settings: &AnalysisSettings,
) -> Option<f64> {
    if !settings.secondary_enabled {
        return None;
    }
    match timeout(settings.secondary_timeout, scorer.score(text)).await {
        Ok(Ok(s)) if s.is_finite() => Some(s.clamp(0.0, 1.0)),
        Ok(Ok(s)) => {
            warn!(engine = scorer.label(), score = s, "secondary.invalid_score");
            None
        }
        Ok(Err(e)) => {
            warn!(engine = scorer.label(), error = %e, "secondary.unavailable");
            None
        }
        Err(_) => {
            warn!(
                engine = scorer.label(),
                timeout_ms = settings.secondary_timeout.as_millis() as u64,
                "secondary.timeout"
            );
            None
        }
    }
}

async fn find_sources<Q: SourceSearch>(
    search: &Q,
    query: Option<SourceQuery>,
    settings: &AnalysisSettings,
) -> Vec<SourceResult> {
    let Some(query) = query.filter(|_| settings.search_enabled) else {
        debug!("search.skipped");
        return Vec::new();
    };
    match timeout(settings.search_timeout, search.search(&query)).await {
        Ok(Ok(mut results)) => {
            results.truncate(settings.max_sources);
            results
        }
        Ok(Err(e)) => {
            warn!(error = %e, "search.unavailable");
            Vec::new()
        }
        Err(_) => {
            warn!(timeout_ms = settings.search_timeout.as_millis() as u64, "search.timeout");
            Vec::new()
        }
    }
}
