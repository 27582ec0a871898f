// AuthVerifier Core Services

pub mod text_processor;
pub mod config_store;
pub mod providers;
pub mod upload;
pub mod detection;

pub use config_store::*;
pub use providers::*;
pub use upload::UploadedImage;

// Re-export detection module functions
pub use detection::{
    analyze_image,
    analyze_text,
    analyze_uploaded_image,
    blend_secondary,
    classify,
    score_image,
    score_text,
    AnalysisError,
    AnalysisSettings,
    Classification,
};
