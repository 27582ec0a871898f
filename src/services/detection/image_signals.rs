// Image Signal Extraction
// Byte-level forensics: a universal signature pre-scan, then format-specific
// metadata parsing (PNG chunks, JPEG markers). Never fails on any input.

use crate::models::{Evidence, ScoreReport, Signal, SignalFlag};
use tracing::debug;

use super::aggregation::{aggregate, AggregationRule};
use super::byte_cursor::latin1_lowercase;
use super::calibration::{
    BARE_EXIF, CAMERA_MODEL, CAPTURE_TIMESTAMP, EMBEDDED_AI_SOFTWARE, GENERATOR_SIGNATURE,
    GPS_COORDINATES, LOW_ENTROPY, LOW_ENTROPY_FLAG_BELOW, LOW_ENTROPY_VOTE_BELOW, MISSING_EXIF,
    PNG_CREATOR_SOFTWARE, PNG_PROMPT_CHUNK, PNG_SOURCE_METADATA, PRESCAN_LIMIT,
};
use super::jpeg_markers::{scan_data_entropy, scan_jpeg_markers};
use super::png_chunks::walk_png_chunks;

/// Generator and AI-tool names, searched case-insensitively.
pub const AI_TOOLS: &[&str] = &[
    "stable diffusion",
    "dall-e",
    "dall\u{b7}e",
    "midjourney",
    "adobe firefly",
    "leonardo.ai",
    "novel ai",
    "comfyui",
    "automatic1111",
    "invokeai",
    "diffusers",
    "dreamstudio",
    "getimg.ai",
    "nightcafe",
    "artbreeder",
    "bluewillow",
    "bing image creator",
    "generative fill",
    "ai generated",
    "generated by ai",
    "wombo",
    "runway ml",
];

/// Generation-parameter keys as they appear in raw metadata (some NUL-terminated).
pub const AI_PARAM_KEYS: &[&str] = &[
    "parameters\0",
    "prompt\0",
    "negative_prompt",
    "negative prompt",
    "sd model",
    "cfg scale",
    "sampler name",
    "steps\0",
];

pub fn find_ai_tool(lowercase_text: &str) -> Option<&'static str> {
    AI_TOOLS.iter().copied().find(|t| lowercase_text.contains(t))
}

fn find_param_key(lowercase_text: &str) -> Option<&'static str> {
    AI_PARAM_KEYS.iter().copied().find(|k| lowercase_text.contains(k))
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Unknown,
}

impl ImageFormat {
    /// Declared MIME type or magic bytes; PNG is checked first, then JPEG, then WebP.
    pub fn detect(data: &[u8], declared_mime: &str) -> Self {
        let mime = declared_mime.trim().to_ascii_lowercase();
        if mime == "image/png" || data.starts_with(&[0x89, 0x50]) {
            Self::Png
        } else if mime == "image/jpeg" || mime == "image/jpg" || data.starts_with(&[0xFF, 0xD8]) {
            Self::Jpeg
        } else if mime == "image/webp" || (data.len() > 12 && &data[8..12] == b"WEBP") {
            Self::WebP
        } else {
            Self::Unknown
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::WebP => "WebP",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What the whole-buffer signature search found.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
struct Prescan {
    tool: Option<&'static str>,
    param_key: Option<&'static str>,
}

impl Prescan {
    fn run(data: &[u8]) -> Self {
        let text = latin1_lowercase(&data[..data.len().min(PRESCAN_LIMIT)]);
        Self {
            tool: find_ai_tool(&text),
            param_key: find_param_key(&text),
        }
    }

    fn signature_signal(&self) -> Option<Signal> {
        let detected = match (self.tool, self.param_key) {
            (Some(tool), _) => format!("\"{}\"", tool),
            (None, Some(key)) => format!("parameter key \"{}\"", key.trim_end_matches('\0')),
            (None, None) => return None,
        };
        Some(Signal::new(
            "AI Generator Signature",
            format!("Detected: {}", detected),
            SignalFlag::Ai,
        ))
    }
}

/// Score raw image bytes. Malformed input only reduces the evidence found.
pub fn score_image(data: &[u8], declared_mime: &str) -> ScoreReport {
    let evidence = extract_image_evidence(data, declared_mime);
    let score = aggregate(&evidence, AggregationRule::image());
    debug!(
        score,
        votes = evidence.iter().filter(|e| e.vote.is_some()).count(),
        "image.scored"
    );
    ScoreReport {
        score,
        signals: evidence.into_iter().map(|e| e.signal).collect(),
    }
}

pub fn extract_image_evidence(data: &[u8], declared_mime: &str) -> Vec<Evidence> {
    let format = ImageFormat::detect(data, declared_mime);
    let mut prescan = Prescan::run(data);
    debug!(
        %format,
        bytes = data.len(),
        tool = ?prescan.tool,
        key = ?prescan.param_key,
        "image.prescan"
    );

    let format_evidence = match format {
        ImageFormat::Png => png_evidence(data, &mut prescan),
        ImageFormat::Jpeg => jpeg_evidence(data, &prescan),
        ImageFormat::WebP => vec![Evidence::informational(Signal::new(
            "Format",
            "WebP \u{2014} used by AI tools and web images alike (inconclusive)",
            SignalFlag::Uncertain,
        ))],
        ImageFormat::Unknown => vec![Evidence::informational(Signal::new(
            "Format",
            "Unknown/unsupported format \u{2014} limited forensic analysis possible",
            SignalFlag::Uncertain,
        ))],
    };

    let mut evidence = Vec::with_capacity(format_evidence.len() + 1);
    if let Some(signal) = prescan.signature_signal() {
        evidence.push(Evidence::voting(signal, GENERATOR_SIGNATURE));
    }
    evidence.extend(format_evidence);
    evidence
}

/// PNG findings. Generation parameters located inside a text chunk are reported
/// as the chunk-level signal, superseding a parameter-key-only pre-scan hit.
fn png_evidence(data: &[u8], prescan: &mut Prescan) -> Vec<Evidence> {
    let findings = walk_png_chunks(data);
    let mut evidence = Vec::new();

    if findings.generation_params && prescan.tool.is_none() {
        prescan.param_key = None;
        evidence.push(Evidence::voting(
            Signal::new(
                "AI Prompt in PNG Chunks",
                "Generation parameters found (Stable Diffusion style)",
                SignalFlag::Ai,
            ),
            PNG_PROMPT_CHUNK,
        ));
    }
    if let (Some(tool), None) = (findings.creator_tool, prescan.tool) {
        evidence.push(Evidence::voting(
            Signal::new(
                "PNG Creator Software",
                format!("AI tool identified: \"{}\"", tool),
                SignalFlag::Ai,
            ),
            PNG_CREATOR_SOFTWARE,
        ));
    }
    if findings.source_metadata {
        evidence.push(Evidence::voting(
            Signal::new(
                "PNG Source Metadata",
                "Editing/camera software metadata found \u{2014} processed real image",
                SignalFlag::Human,
            ),
            PNG_SOURCE_METADATA,
        ));
    }
    if !findings.has_any_metadata() && prescan.tool.is_none() {
        // Absence of metadata is normal for screenshots and web graphics.
        evidence.push(Evidence::informational(Signal::new(
            "PNG Metadata",
            "No metadata present (inconclusive \u{2014} normal for screenshots & web graphics)",
            SignalFlag::Uncertain,
        )));
    }
    evidence
}

fn jpeg_evidence(data: &[u8], prescan: &Prescan) -> Vec<Evidence> {
    let findings = scan_jpeg_markers(data);
    let mut evidence = Vec::new();

    if let (Some(tool), None) = (findings.embedded_tool, prescan.tool) {
        evidence.push(Evidence::voting(
            Signal::new(
                "EXIF/XMP Software Tag",
                format!("AI tool found: \"{}\"", tool),
                SignalFlag::Ai,
            ),
            EMBEDDED_AI_SOFTWARE,
        ));
    }

    // Provenance cases in priority order; only the first that applies votes.
    let provenance = if findings.camera_model {
        Evidence::voting(
            Signal::new(
                "Camera EXIF",
                "Camera make/model confirmed \u{2014} real photograph",
                SignalFlag::Human,
            ),
            CAMERA_MODEL,
        )
    } else if findings.gps {
        Evidence::voting(
            Signal::new(
                "GPS Data",
                "Location coordinates embedded \u{2014} real photograph",
                SignalFlag::Human,
            ),
            GPS_COORDINATES,
        )
    } else if findings.capture_time {
        Evidence::voting(
            Signal::new("Capture Timestamp", "Original capture time present", SignalFlag::Human),
            CAPTURE_TIMESTAMP,
        )
    } else if findings.has_exif {
        Evidence::voting(
            Signal::new(
                "Camera EXIF",
                "EXIF present but no camera model (possibly stripped)",
                SignalFlag::Uncertain,
            ),
            BARE_EXIF,
        )
    } else {
        Evidence::voting(
            Signal::new(
                "Camera EXIF",
                "No EXIF data (common in web-optimized & social media images \u{2014} inconclusive)",
                SignalFlag::Uncertain,
            ),
            MISSING_EXIF,
        )
    };
    evidence.push(provenance);

    if let Some(entropy) = findings
        .sos_offset
        .and_then(|sos| scan_data_entropy(data, sos))
    {
        evidence.push(entropy_evidence(entropy));
    }
    evidence
}

fn entropy_evidence(entropy: f64) -> Evidence {
    let label = if entropy > 7.6 {
        "high (photo-like)"
    } else if entropy > 7.0 {
        "normal"
    } else {
        "low"
    };
    let flag = if entropy < LOW_ENTROPY_FLAG_BELOW {
        SignalFlag::Uncertain
    } else {
        SignalFlag::Human
    };
    let signal = Signal::new(
        "JPEG Compression Entropy",
        format!("{:.2} bits/symbol \u{2014} {}", entropy, label),
        flag,
    );
    if entropy < LOW_ENTROPY_VOTE_BELOW {
        Evidence::voting(signal, LOW_ENTROPY)
    } else {
        Evidence::informational(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;
    use crate::models::Verdict;
    use crate::services::detection::jpeg_markers::fixtures::{app1, jpeg, noisy_scan};
    use crate::services::detection::png_chunks::fixtures::{chunk, png};
    use crate::services::detection::verdict::classify;

    fn names(report: &ScoreReport) -> Vec<&str> {
        report.signals.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::detect(&[0x89, 0x50, 0x4E], ""), ImageFormat::Png);
        assert_eq!(ImageFormat::detect(&[0xFF, 0xD8, 0xFF], ""), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::detect(b"RIFF\0\0\0\0WEBPVP8 ", ""), ImageFormat::WebP);
        assert_eq!(ImageFormat::detect(b"hello", "image/jpg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::detect(b"hello", "IMAGE/WEBP"), ImageFormat::WebP);
        assert_eq!(ImageFormat::detect(b"hello", "application/octet-stream"), ImageFormat::Unknown);
        assert_eq!(ImageFormat::detect(&[0xFF, 0xD8], "image/png"), ImageFormat::Png);
    }

    #[test]
    fn test_png_prompt_chunk_dominates_human_lean_chunk() {
        let data = png(&[
            chunk(b"tEXt", b"parameters: Steps: 20, Sampler: Euler a, CFG scale: 7"),
            chunk(b"tEXt", b"Software\0Adobe Photoshop"),
        ]);
        let report = score_image(&data, "image/png");
        assert_eq!(names(&report), vec!["AI Prompt in PNG Chunks", "PNG Source Metadata"]);
        assert_eq!(report.score, 0.94);
        assert_eq!(classify(report.score, ContentKind::Image).verdict, Verdict::AiGenerated);
    }

    #[test]
    fn test_png_prompt_chunk_vote() {
        let data = png(&[chunk(b"tEXt", b"parameters\0Steps: 20, Sampler: Euler a, CFG scale: 7")]);
        let evidence = extract_image_evidence(&data, "image/png");
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].signal.name, "AI Prompt in PNG Chunks");
        assert_eq!(evidence[0].vote, Some(PNG_PROMPT_CHUNK));
    }

    #[test]
    fn test_tool_signature_in_png_supersedes_chunk_signals() {
        let data = png(&[chunk(b"tEXt", b"Software\0Stable Diffusion XL, Sampler: DPM++")]);
        let report = score_image(&data, "image/png");
        assert_eq!(names(&report), vec!["AI Generator Signature"]);
        assert_eq!(report.signals[0].value, "Detected: \"stable diffusion\"");
        assert_eq!(report.score, 0.97);
    }

    #[test]
    fn test_png_creator_software_votes_when_prescan_missed_it() {
        let data = png(&[chunk(b"tEXt", b"Software\0ComfyUI")]);
        let evidence = png_evidence(&data, &mut Prescan::default());
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].signal.value, "AI tool identified: \"comfyui\"");
        assert_eq!(evidence[0].vote, Some(PNG_CREATOR_SOFTWARE));
    }

    #[test]
    fn test_png_without_metadata_is_inconclusive_and_casts_no_vote() {
        let data = png(&[]);
        let evidence = extract_image_evidence(&data, "image/png");
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].signal.name, "PNG Metadata");
        assert_eq!(evidence[0].signal.flag, SignalFlag::Uncertain);
        assert!(evidence[0].vote.is_none());
        assert_eq!(score_image(&data, "image/png").score, 0.5);
    }

    #[test]
    fn test_png_parameter_key_outside_text_chunks_keeps_inconclusive_signal() {
        let data = png(&[chunk(b"zzZz", b"prompt\0a lighthouse at dusk")]);
        let report = score_image(&data, "image/png");
        assert_eq!(names(&report), vec!["AI Generator Signature", "PNG Metadata"]);
        assert_eq!(report.signals[1].flag, SignalFlag::Uncertain);
        assert_eq!(report.score, 0.97);
    }

    #[test]
    fn test_png_text_chunk_past_scan_limits_is_ignored() {
        let filler = vec![0u8; 300_000];
        let data = png(&[
            chunk(b"zzZz", &filler),
            chunk(b"zzZz", &filler),
            chunk(b"tEXt", b"Software\0Midjourney, Steps: 20, CFG scale: 7"),
        ]);
        let report = score_image(&data, "image/png");
        assert_eq!(names(&report), vec!["PNG Metadata"]);
        assert_eq!(report.score, 0.5);
    }

    #[test]
    fn test_prescan_limit() {
        let mut inside = vec![0u8; PRESCAN_LIMIT - 32];
        inside.extend_from_slice(b"midjourney");
        assert_eq!(score_image(&inside, "").score, 0.97);

        let mut outside = vec![0u8; PRESCAN_LIMIT];
        outside.extend_from_slice(b"midjourney");
        let report = score_image(&outside, "");
        assert_eq!(report.score, 0.5);
        assert_eq!(names(&report), vec!["Format"]);
    }

    #[test]
    fn test_png_source_metadata_leans_real() {
        let data = png(&[chunk(b"eXIf", b"MM\0*")]);
        let report = score_image(&data, "image/png");
        assert_eq!(report.score, 0.12);
        assert_eq!(classify(report.score, ContentKind::Image).verdict, Verdict::RealImage);
    }

    #[test]
    fn test_jpeg_camera_model_outranks_gps() {
        let data = jpeg(
            &[app1(b"Exif\0\0MM\0*Apple\0iPhone 14 Pro\0GPSLatitude\0GPSLongitude")],
            &[0x12, 0x34],
        );
        let evidence = extract_image_evidence(&data, "image/jpeg");
        let votes: Vec<_> = evidence.iter().filter_map(|e| e.vote).collect();
        assert_eq!(votes, vec![CAMERA_MODEL]);
        let report = score_image(&data, "image/jpeg");
        assert!(report.score <= 0.10);
        assert_eq!(classify(report.score, ContentKind::Image).verdict, Verdict::RealImage);
    }

    #[test]
    fn test_jpeg_priority_chain() {
        let gps = jpeg(&[app1(b"Exif\0\0MM\0*GPSInfo")], &[]);
        assert_eq!(score_image(&gps, "image/jpeg").score, 0.06);

        let dated = jpeg(&[app1(b"Exif\0\0MM\0*2021-04-09")], &[]);
        assert_eq!(score_image(&dated, "image/jpeg").score, 0.15);

        let bare = jpeg(&[app1(b"Exif\0\0MM\0*")], &[]);
        assert_eq!(score_image(&bare, "image/jpeg").score, 0.50);

        let none = jpeg(&[], &[]);
        let report = score_image(&none, "image/jpeg");
        assert_eq!(report.score, 0.55);
        assert_eq!(report.signals[0].flag, SignalFlag::Uncertain);
    }

    #[test]
    fn test_jpeg_xmp_tool_dominates_camera() {
        let xmp = b"http://ns.adobe.com/xap/1.0/\0<x:xmpmeta><xmp:CreatorTool>Generative Fill</xmp:CreatorTool>";
        let data = jpeg(&[app1(b"Exif\0\0Canon EOS R5"), app1(xmp)], &[]);
        // the raw pre-scan sees the tool name first
        let report = score_image(&data, "image/jpeg");
        assert_eq!(report.score, 0.97);
        assert_eq!(report.signals[0].name, "AI Generator Signature");
        assert!(names(&report).contains(&"Camera EXIF"));
        assert!(!names(&report).contains(&"EXIF/XMP Software Tag"));
    }

    #[test]
    fn test_jpeg_entropy_is_informational_when_high() {
        let data = jpeg(&[app1(b"Exif\0\0Nikon")], &noisy_scan(4096));
        let evidence = extract_image_evidence(&data, "image/jpeg");
        let entropy = evidence
            .iter()
            .find(|e| e.signal.name == "JPEG Compression Entropy")
            .expect("entropy signal");
        assert!(entropy.vote.is_none());
        assert_eq!(entropy.signal.flag, SignalFlag::Human);
        assert!(entropy.signal.value.ends_with("high (photo-like)"));
    }

    #[test]
    fn test_jpeg_low_entropy_casts_weak_vote() {
        let data = jpeg(&[], &vec![0x42u8; 2500]);
        let evidence = extract_image_evidence(&data, "image/jpeg");
        let last = evidence.last().unwrap();
        assert_eq!(last.signal.name, "JPEG Compression Entropy");
        assert_eq!(last.signal.value, "0.00 bits/symbol \u{2014} low");
        assert_eq!(last.vote, Some(LOW_ENTROPY));
        let score = score_image(&data, "image/jpeg").score;
        let expected = (0.55 * 0.5 + 0.65 * 0.3) / 0.8;
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_and_webp_are_neutral() {
        let report = score_image(b"just some bytes", "application/octet-stream");
        assert_eq!(report.score, 0.5);
        assert_eq!(names(&report), vec!["Format"]);
        assert_eq!(classify(report.score, ContentKind::Image).verdict, Verdict::Uncertain);

        let webp = score_image(b"RIFF\x10\0\0\0WEBPVP8 \0\0", "image/webp");
        assert_eq!(webp.score, 0.5);
        assert!(webp.signals[0].value.starts_with("WebP"));
    }

    #[test]
    fn test_signature_in_unknown_format_still_counts() {
        let report = score_image(b"blob with Midjourney tag", "");
        assert_eq!(report.score, 0.97);
        assert_eq!(names(&report), vec!["AI Generator Signature", "Format"]);
    }

    #[test]
    fn test_parameter_key_prescan_in_jpeg() {
        let data = jpeg(&[app1(b"Exif\0\0prompt\0a cat")], &[]);
        let report = score_image(&data, "image/jpeg");
        assert_eq!(report.signals[0].value, "Detected: parameter key \"prompt\"");
        assert_eq!(report.score, 0.97);
    }

    #[test]
    fn test_arbitrary_bytes_never_panic_and_stay_in_range() {
        let mut seed: u32 = 0x1234_5678;
        for len in [0usize, 1, 2, 3, 7, 8, 12, 13, 64, 300] {
            let data: Vec<u8> = (0..len)
                .map(|_| {
                    seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                    (seed >> 16) as u8
                })
                .collect();
            for mime in ["image/png", "image/jpeg", "image/webp", ""] {
                let report = score_image(&data, mime);
                assert!((0.0..=1.0).contains(&report.score));
            }
        }
    }

    #[test]
    fn test_score_image_is_deterministic() {
        let data = jpeg(&[app1(b"Exif\0\0Sony\02022:01:01")], &noisy_scan(2500));
        assert_eq!(score_image(&data, "image/jpeg"), score_image(&data, "image/jpeg"));
    }
}
