// Detection Module
// Heuristic AI-content detection organized into specialized submodules:
// - text_signals: Stylometric features of a text
// - image_signals: Signature pre-scan and per-format image forensics
// - png_chunks / jpeg_markers: Bounded binary metadata walkers
// - aggregation: Folds evidence into a single probability
// - verdict: Verdict, confidence and secondary-engine blending
// - analyzer: Input validation and collaborator orchestration

pub mod calibration;
pub mod byte_cursor;
pub mod text_signals;
pub mod image_signals;
pub mod png_chunks;
pub mod jpeg_markers;
pub mod aggregation;
pub mod verdict;
pub mod analyzer;

// Re-export commonly used functions
pub use text_signals::{score_text, extract_text_evidence};
pub use image_signals::{score_image, extract_image_evidence, ImageFormat};
pub use aggregation::{aggregate, AggregationRule};
pub use verdict::{blend_secondary, classify, to_percentages, Classification};
pub use analyzer::{
    analyze_image,
    analyze_text,
    analyze_uploaded_image,
    AnalysisError,
    AnalysisSettings,
};
