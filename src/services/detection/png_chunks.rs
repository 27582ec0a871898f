// PNG Chunk Walker
// Inspects textual metadata chunks for generation parameters, generator
// names and editing/camera software. Stops before image data.

use tracing::debug;

use super::byte_cursor::{latin1_lowercase, ByteCursor};
use super::calibration::{PNG_SCAN_LIMIT, PNG_TEXT_CHUNK_CAP};
use super::image_signals::find_ai_tool;

const PNG_SIGNATURE_LEN: usize = 8;

const GENERATION_PARAM_KEYWORDS: &[&str] = &[
    "parameters",
    "negative prompt",
    "negative_prompt",
    "cfg scale",
    "sampler",
    "seed:",
];

const SOURCE_SOFTWARE: &[&str] = &[
    "photoshop",
    "lightroom",
    "gimp",
    "affinity",
    "darktable",
    "capture one",
    "camera raw",
];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WalkStop {
    /// Reached `IDAT` or `IEND`.
    ImageData,
    /// Ran out of buffer or scan budget on a chunk boundary.
    EndOfScan,
    /// A header was cut short.
    TruncatedHeader,
    /// Declared length exceeds the scan cap or the bytes actually present.
    BadLength,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PngFindings {
    pub generation_params: bool,
    pub creator_tool: Option<&'static str>,
    pub source_metadata: bool,
    pub chunks_walked: usize,
    pub stop: WalkStop,
}

impl PngFindings {
    pub fn has_any_metadata(&self) -> bool {
        self.generation_params || self.creator_tool.is_some() || self.source_metadata
    }
}

pub fn walk_png_chunks(data: &[u8]) -> PngFindings {
    let mut findings = PngFindings {
        generation_params: false,
        creator_tool: None,
        source_metadata: false,
        chunks_walked: 0,
        stop: WalkStop::EndOfScan,
    };
    let mut cursor = ByteCursor::new(data, PNG_SIGNATURE_LEN, PNG_SCAN_LIMIT);

    loop {
        if cursor.remaining() == 0 {
            findings.stop = WalkStop::EndOfScan;
            break;
        }
        let (Some(len), Some(kind)) = (cursor.read_u32_be(), cursor.read_bytes(4)) else {
            findings.stop = WalkStop::TruncatedHeader;
            break;
        };
        let len = len as usize;
        if len > PNG_SCAN_LIMIT || len > cursor.remaining_in_buffer() {
            findings.stop = WalkStop::BadLength;
            break;
        }
        findings.chunks_walked += 1;

        match kind {
            b"tEXt" | b"iTXt" | b"zTXt" => {
                let text = latin1_lowercase(cursor.payload(len, PNG_TEXT_CHUNK_CAP));
                inspect_text_chunk(&text, &mut findings);
            }
            b"eXIf" => findings.source_metadata = true,
            b"IDAT" | b"IEND" => {
                findings.stop = WalkStop::ImageData;
                break;
            }
            _ => {}
        }

        // payload + CRC; a missing trailing CRC just ends the walk
        if !cursor.skip(len.saturating_add(4)) {
            findings.stop = WalkStop::EndOfScan;
            break;
        }
    }

    debug!(
        chunks = findings.chunks_walked,
        stop = ?findings.stop,
        params = findings.generation_params,
        source = findings.source_metadata,
        "png.walk"
    );
    findings
}

fn inspect_text_chunk(text: &str, findings: &mut PngFindings) {
    if GENERATION_PARAM_KEYWORDS.iter().any(|k| text.contains(k)) {
        findings.generation_params = true;
    }
    if let Some(tool) = find_ai_tool(text) {
        findings.creator_tool = Some(tool);
    }
    if SOURCE_SOFTWARE.iter().any(|s| text.contains(s)) {
        findings.source_metadata = true;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    pub fn chunk(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(payload.len() + 12);
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    pub fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        out.extend(chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0]));
        for c in chunks {
            out.extend_from_slice(c);
        }
        out.extend(chunk(b"IDAT", &[0x78, 0x9c, 0x63, 0x00]));
        out.extend(chunk(b"IEND", &[]));
        out
    }
}
