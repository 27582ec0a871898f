// JPEG Marker Scanner
// Looks through the APP1 segments ahead of start-of-scan for Exif provenance
// and XMP tool tags, then samples entropy-coded data after SOS.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::byte_cursor::{latin1_lowercase, ByteCursor};
use super::calibration::{ENTROPY_SAMPLE_LEN, JPEG_SCAN_LIMIT};
use super::image_signals::find_ai_tool;

const MARKER_PREFIX: u8 = 0xFF;
const MARKER_SOS: u8 = 0xDA;
const MARKER_APP1: u8 = 0xE1;
/// Marker (2) + segment length (2) before the first byte of scan data.
const SOS_HEADER_LEN: usize = 4;

fn camera_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)canon|nikon|sony|apple|iphone|samsung|fujifilm|panasonic|olympus|leica|pentax|ricoh|xiaomi|huawei|google|oneplus|motorola",
        )
        .expect("camera regex")
    })
}

fn capture_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"20\d\d[:\-]\d\d[:\-]\d\d").expect("capture date regex"))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JpegFindings {
    pub has_exif: bool,
    pub camera_model: bool,
    pub gps: bool,
    pub capture_time: bool,
    /// AI tool named inside Exif or XMP.
    pub embedded_tool: Option<&'static str>,
    /// Offset of the `FF DA` marker, if reached within the scan budget.
    pub sos_offset: Option<usize>,
    /// APP1 payload bytes inspected; never exceeds the scan budget.
    pub app1_bytes: usize,
}

/// Walk markers from offset 2 within the first `JPEG_SCAN_LIMIT` bytes.
/// Each APP1 payload is consumed once and truncated at the budget, so the
/// bytes inspected never exceed it however the lengths are declared.
pub fn scan_jpeg_markers(data: &[u8]) -> JpegFindings {
    let mut findings = JpegFindings::default();
    let marker_end = data.len().saturating_sub(3).min(JPEG_SCAN_LIMIT);
    let mut cursor = ByteCursor::new(data, 2, JPEG_SCAN_LIMIT);

    while cursor.position() < marker_end {
        let at = cursor.position();
        let Some(&[prefix, marker]) = cursor.peek(2) else {
            break;
        };
        if prefix != MARKER_PREFIX {
            cursor.skip(1);
            continue;
        }
        match marker {
            MARKER_SOS => {
                findings.sos_offset = Some(at);
                break;
            }
            MARKER_APP1 => {
                cursor.skip(2);
                let Some(declared) = cursor.read_u16_be() else {
                    break;
                };
                // declared length counts its own two bytes
                let segment = cursor.take_up_to(usize::from(declared).saturating_sub(2));
                findings.app1_bytes += segment.len();
                if !segment.is_empty() {
                    inspect_app1(segment, &mut findings);
                }
            }
            _ => {
                cursor.skip(1);
            }
        }
    }

    debug!(
        exif = findings.has_exif,
        camera = findings.camera_model,
        gps = findings.gps,
        sos = ?findings.sos_offset,
        app1_bytes = findings.app1_bytes,
        "jpeg.scan"
    );
    findings
}

fn inspect_app1(segment: &[u8], findings: &mut JpegFindings) {
    if segment.starts_with(b"Exif") {
        findings.has_exif = true;
        let exif = latin1_lowercase(segment);
        findings.camera_model |= camera_re().is_match(&exif);
        findings.gps |= exif.contains("gps");
        findings.capture_time |= capture_date_re().is_match(&exif);
        if let Some(tool) = find_ai_tool(&exif) {
            findings.embedded_tool = Some(tool);
        }
    } else if is_xmp(segment) {
        let xmp = String::from_utf8_lossy(segment).to_lowercase();
        if let Some(tool) = find_ai_tool(&xmp) {
            findings.embedded_tool = Some(tool);
        }
    }
}

fn is_xmp(segment: &[u8]) -> bool {
    let head = &segment[..segment.len().min(28)];
    segment.starts_with(b"http://") || head.windows(7).any(|w| w == b"xpacket")
}

/// Shannon entropy (bits/byte) of the `ENTROPY_SAMPLE_LEN` bytes following
/// the SOS header; `None` when fewer bytes are available.
pub fn scan_data_entropy(data: &[u8], sos_offset: usize) -> Option<f64> {
    let start = sos_offset.checked_add(SOS_HEADER_LEN)?;
    if data.len() <= start.checked_add(ENTROPY_SAMPLE_LEN)? {
        return None;
    }
    Some(shannon_entropy(&data[start..start + ENTROPY_SAMPLE_LEN]))
}

pub fn shannon_entropy(sample: &[u8]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let mut histogram = [0usize; 256];
    for &b in sample {
        histogram[b as usize] += 1;
    }
    let n = sample.len() as f64;
    histogram
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            p * (n / c as f64).log2()
        })
        .sum()
}
