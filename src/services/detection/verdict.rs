// Verdict Classification
// Maps a final probability to a verdict, a confidence band and the public result object.

use crate::models::{Confidence, ContentKind, DetectionResult, Signal, SignalFlag, Verdict};

use super::calibration::{
    HEURISTIC_BLEND_WEIGHT, IMAGE_CONFIDENCE_BANDS, SECONDARY_BLEND_WEIGHT, TEXT_CONFIDENCE_BANDS,
    VERDICT_AI_ABOVE, VERDICT_HUMAN_AT_OR_BELOW,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Classification {
    pub verdict: Verdict,
    pub confidence: Confidence,
}

pub fn classify(p: f64, kind: ContentKind) -> Classification {
    Classification {
        verdict: verdict_for(p, kind),
        confidence: confidence_for(p, kind),
    }
}

fn verdict_for(p: f64, kind: ContentKind) -> Verdict {
    if p > VERDICT_AI_ABOVE {
        Verdict::AiGenerated
    } else if p > VERDICT_HUMAN_AT_OR_BELOW {
        Verdict::Uncertain
    } else {
        match kind {
            ContentKind::Text => Verdict::HumanWritten,
            ContentKind::Image => Verdict::RealImage,
        }
    }
}

fn confidence_for(p: f64, kind: ContentKind) -> Confidence {
    let (high_above, high_below, medium_above, medium_below) = match kind {
        ContentKind::Text => TEXT_CONFIDENCE_BANDS,
        ContentKind::Image => IMAGE_CONFIDENCE_BANDS,
    };
    if p > high_above || p < high_below {
        Confidence::High
    } else if p > medium_above || p < medium_below {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Percentages as shown to users; the human side is derived, never rounded on its own.
pub fn to_percentages(p: f64) -> (u8, u8) {
    let ai = (p.clamp(0.0, 1.0) * 100.0).round() as u8;
    (ai, 100 - ai)
}

/// Blend a heuristic score with a secondary engine's AI probability.
pub fn blend_secondary(heuristic: f64, secondary: f64) -> f64 {
    (secondary.clamp(0.0, 1.0) * SECONDARY_BLEND_WEIGHT
        + heuristic.clamp(0.0, 1.0) * HEURISTIC_BLEND_WEIGHT)
        .clamp(0.0, 1.0)
}

/// Signal surfacing a secondary engine's raw percentage.
pub fn secondary_signal(engine_label: &str, secondary: f64) -> Signal {
    let secondary = secondary.clamp(0.0, 1.0);
    Signal::new(
        format!("{} Engine", engine_label),
        format!("{}% AI probability", (secondary * 100.0).round() as i64),
        SignalFlag::from_probability(secondary),
    )
}

impl DetectionResult {
    pub fn from_probability(p: f64, kind: ContentKind, signals: Vec<Signal>) -> Self {
        let p = p.clamp(0.0, 1.0);
        let Classification { verdict, confidence } = classify(p, kind);
        let (ai_probability, human_probability) = to_percentages(p);
        Self {
            ai_probability,
            human_probability,
            verdict,
            confidence,
            signals,
            note: None,
            engine: None,
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(classify(0.69, ContentKind::Text).verdict, Verdict::AiGenerated);
        assert_eq!(classify(0.68, ContentKind::Text).verdict, Verdict::Uncertain);
        assert_eq!(classify(0.43, ContentKind::Image).verdict, Verdict::Uncertain);
        assert_eq!(classify(0.42, ContentKind::Text).verdict, Verdict::HumanWritten);
        assert_eq!(classify(0.42, ContentKind::Image).verdict, Verdict::RealImage);
    }

    #[test]
    fn test_text_confidence_bands() {
        assert_eq!(classify(0.83, ContentKind::Text).confidence, Confidence::High);
        assert_eq!(classify(0.17, ContentKind::Text).confidence, Confidence::High);
        assert_eq!(classify(0.81, ContentKind::Text).confidence, Confidence::Medium);
        assert_eq!(classify(0.34, ContentKind::Text).confidence, Confidence::Medium);
        assert_eq!(classify(0.50, ContentKind::Text).confidence, Confidence::Low);
    }

    #[test]
    fn test_image_confidence_bands_differ_from_text() {
        assert_eq!(classify(0.81, ContentKind::Image).confidence, Confidence::High);
        assert_eq!(classify(0.81, ContentKind::Text).confidence, Confidence::Medium);
        assert_eq!(classify(0.19, ContentKind::Image).confidence, Confidence::High);
        assert_eq!(classify(0.37, ContentKind::Image).confidence, Confidence::Medium);
        assert_eq!(classify(0.37, ContentKind::Text).confidence, Confidence::Low);
        assert_eq!(classify(0.61, ContentKind::Image).confidence, Confidence::Medium);
    }

    #[test]
    fn test_percentages_always_sum_to_100() {
        for i in 0..=1000 {
            let p = i as f64 / 1000.0;
            let (ai, human) = to_percentages(p);
            assert_eq!(ai as u16 + human as u16, 100, "p={}", p);
        }
        assert_eq!(to_percentages(0.946), (95, 5));
    }

    #[test]
    fn test_blend_weights_secondary_sixty_percent() {
        let blended = blend_secondary(0.5, 1.0);
        assert!((blended - 0.8).abs() < 1e-12);
        assert_eq!(blend_secondary(2.0, -1.0), 0.4);
    }

    #[test]
    fn test_secondary_signal() {
        let signal = secondary_signal("Sapling AI", 0.734);
        assert_eq!(signal.name, "Sapling AI Engine");
        assert_eq!(signal.value, "73% AI probability");
        assert_eq!(signal.flag, SignalFlag::Ai);
    }

    #[test]
    fn test_detection_result_from_probability() {
        let result = DetectionResult::from_probability(0.5, ContentKind::Image, vec![])
            .with_engine("Heuristic Engine");
        assert_eq!(result.ai_probability, 50);
        assert_eq!(result.human_probability, 50);
        assert_eq!(result.verdict, Verdict::Uncertain);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.engine.as_deref(), Some("Heuristic Engine"));
    }
}
