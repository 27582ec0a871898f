// Calibration Table
// Every hand-tuned weight, tier boundary and vote value used by the extractors.
// Tests exercise each boundary against these tables directly.

use crate::models::Vote;

/// Which side of a boundary a tier covers.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TierDirection {
    /// First tier whose bound is strictly greater than the measurement wins.
    Below,
    /// First tier whose bound is strictly less than the measurement wins.
    Above,
}

/// Maps a measurement to a score through ordered `(bound, score)` tiers.
#[derive(Debug, Clone, Copy)]
pub struct TierTable {
    pub direction: TierDirection,
    pub tiers: &'static [(f64, f64)],
    pub otherwise: f64,
}

impl TierTable {
    pub fn score(&self, x: f64) -> f64 {
        self.tiers
            .iter()
            .find(|(bound, _)| match self.direction {
                TierDirection::Below => x < *bound,
                TierDirection::Above => x > *bound,
            })
            .map(|(_, score)| *score)
            .unwrap_or(self.otherwise)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureCalibration {
    pub name: &'static str,
    pub weight: f64,
    pub table: TierTable,
}

impl FeatureCalibration {
    pub fn vote(&self, measurement: f64) -> Vote {
        Vote::new(self.table.score(measurement), self.weight)
    }
}

// ============ Text features ============

pub const SENTENCE_UNIFORMITY: FeatureCalibration = FeatureCalibration {
    name: "Sentence Uniformity",
    weight: 0.22,
    table: TierTable {
        direction: TierDirection::Below,
        tiers: &[(0.15, 0.90), (0.25, 0.70), (0.40, 0.45)],
        otherwise: 0.20,
    },
};

pub const TRANSITION_PHRASES: FeatureCalibration = FeatureCalibration {
    name: "AI Transition Phrases",
    weight: 0.20,
    table: TierTable {
        direction: TierDirection::Above,
        tiers: &[(0.8, 0.92), (0.5, 0.78), (0.25, 0.55)],
        otherwise: 0.20,
    },
};

pub const VOCABULARY_RICHNESS: FeatureCalibration = FeatureCalibration {
    name: "Vocabulary Richness",
    weight: 0.18,
    table: TierTable {
        direction: TierDirection::Below,
        tiers: &[(0.40, 0.85), (0.55, 0.55), (0.70, 0.35)],
        otherwise: 0.15,
    },
};

pub const INFORMAL_PUNCTUATION: FeatureCalibration = FeatureCalibration {
    name: "Informal Punctuation",
    weight: 0.14,
    table: TierTable {
        direction: TierDirection::Below,
        tiers: &[(0.05, 0.80), (0.15, 0.50), (0.30, 0.30)],
        otherwise: 0.10,
    },
};

pub const LEXICAL_BURSTINESS: FeatureCalibration = FeatureCalibration {
    name: "Lexical Burstiness",
    weight: 0.13,
    table: TierTable {
        direction: TierDirection::Below,
        tiers: &[(2.5, 0.75), (4.0, 0.45)],
        otherwise: 0.20,
    },
};

pub const PARAGRAPH_BALANCE: FeatureCalibration = FeatureCalibration {
    name: "Paragraph Balance",
    weight: 0.13,
    table: TierTable {
        direction: TierDirection::Below,
        tiers: &[(0.20, 0.82), (0.35, 0.55)],
        otherwise: 0.20,
    },
};

/// Flag cut points, distinct from the score tiers above.
pub const UNIFORMITY_AI_CV: f64 = 0.25;
pub const VOCABULARY_AI_TTR: f64 = 0.45;
pub const BURSTINESS_AI_MAX: f64 = 2.5;
pub const PARAGRAPH_AI_CV: f64 = 0.25;
pub const TRANSITION_HIGH_HITS: usize = 2;

pub const MIN_TEXT_WORDS: usize = 10;
pub const MIN_UNIFORMITY_SENTENCES: usize = 3;
pub const MIN_BALANCE_PARAGRAPHS: usize = 2;
pub const TTR_LENGTH_PIVOT: f64 = 200.0;
pub const TTR_LENGTH_FACTOR: f64 = 0.3;

// ============ Image votes ============

pub const GENERATOR_SIGNATURE: Vote = Vote::new(0.97, 10.0);
pub const PNG_PROMPT_CHUNK: Vote = Vote::new(0.94, 10.0);
pub const PNG_CREATOR_SOFTWARE: Vote = Vote::new(0.95, 10.0);
pub const PNG_SOURCE_METADATA: Vote = Vote::new(0.12, 3.0);
pub const EMBEDDED_AI_SOFTWARE: Vote = Vote::new(0.95, 10.0);
pub const CAMERA_MODEL: Vote = Vote::new(0.07, 4.0);
pub const GPS_COORDINATES: Vote = Vote::new(0.06, 4.0);
pub const CAPTURE_TIMESTAMP: Vote = Vote::new(0.15, 2.0);
pub const BARE_EXIF: Vote = Vote::new(0.50, 1.0);
pub const MISSING_EXIF: Vote = Vote::new(0.55, 0.5);
pub const LOW_ENTROPY: Vote = Vote::new(0.65, 0.3);

/// Any image vote at or above this replaces the weighted mean.
pub const DOMINANCE_THRESHOLD: f64 = 0.94;
pub const LOW_ENTROPY_VOTE_BELOW: f64 = 6.5;
pub const LOW_ENTROPY_FLAG_BELOW: f64 = 6.8;

pub const PRESCAN_LIMIT: usize = 512 * 1024;
pub const PNG_SCAN_LIMIT: usize = 512 * 1024;
pub const PNG_TEXT_CHUNK_CAP: usize = 4096;
pub const JPEG_SCAN_LIMIT: usize = 128 * 1024;
pub const ENTROPY_SAMPLE_LEN: usize = 2000;

// ============ Verdict ============

pub const VERDICT_AI_ABOVE: f64 = 0.68;
pub const VERDICT_HUMAN_AT_OR_BELOW: f64 = 0.42;

/// `(high_above, high_below, medium_above, medium_below)`
pub const TEXT_CONFIDENCE_BANDS: (f64, f64, f64, f64) = (0.82, 0.18, 0.62, 0.35);
pub const IMAGE_CONFIDENCE_BANDS: (f64, f64, f64, f64) = (0.80, 0.20, 0.60, 0.38);

pub const SECONDARY_BLEND_WEIGHT: f64 = 0.60;
pub const HEURISTIC_BLEND_WEIGHT: f64 = 0.40;
