//! JPEG marker-segment rewriting.
//!
//! Only the segments before the first SOS are examined. Everything from SOS
//! on (entropy-coded data, later scans, EOI) is copied verbatim, so pixel
//! data is never touched.
//!
//! ```text
//! SOI  APP0  [APP1 Exif]  [COM]  DQT  SOF  DHT  SOS  <scan data ...>  EOI
//!             kept unless   dropped              └── copied as-is ──┘
//!             strip_exif
//! ```

use super::{ImageFormat, OptimizeError};
use crate::config::JpegConfig;

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const TEM: u8 = 0x01;
const RST0: u8 = 0xD0;
const RST7: u8 = 0xD7;
const COM: u8 = 0xFE;
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const APP2: u8 = 0xE2;
const APP14: u8 = 0xEE;
const APP15: u8 = 0xEF;

/// Drop comments and metadata APPn segments.
pub fn optimize(data: &[u8], config: &JpegConfig) -> Result<Vec<u8>, OptimizeError> {
    let malformed = |reason: String| OptimizeError::malformed(ImageFormat::Jpeg, reason);

    if data.len() < 4 || data[0] != 0xFF || data[1] != SOI {
        return Err(malformed("missing SOI marker".into()));
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&[0xFF, SOI]);
    let mut pos = 2;

    loop {
        if data.get(pos) != Some(&0xFF) {
            return Err(malformed(format!("expected marker at offset {pos}")));
        }
        // fill bytes
        while data.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let Some(&marker) = data.get(pos) else {
            return Err(malformed("truncated before SOS".into()));
        };
        pos += 1;

        match marker {
            TEM | RST0..=RST7 => {
                out.extend_from_slice(&[0xFF, marker]);
                continue;
            }
            SOI | EOI | 0x00 => {
                return Err(malformed(format!(
                    "unexpected marker 0x{marker:02X} before SOS"
                )));
            }
            _ => {}
        }

        let Some(len_bytes) = data.get(pos..pos + 2) else {
            return Err(malformed("truncated segment length".into()));
        };
        let len = usize::from(u16::from_be_bytes([len_bytes[0], len_bytes[1]]));
        if len < 2 || pos + len > data.len() {
            return Err(malformed(format!(
                "segment 0x{marker:02X} at offset {pos} overruns the file"
            )));
        }

        let segment = &data[pos..pos + len];
        if keep_segment(marker, &segment[2..], config) {
            out.extend_from_slice(&[0xFF, marker]);
            out.extend_from_slice(segment);
        }
        pos += len;

        if marker == SOS {
            out.extend_from_slice(&data[pos..]);
            return Ok(out);
        }
    }
}

/// Whether a pre-scan segment survives.
fn keep_segment(marker: u8, payload: &[u8], config: &JpegConfig) -> bool {
    match marker {
        COM => false,
        // JFIF / JFXX
        APP0 => true,
        // Exif carries orientation; XMP and others go
        APP1 => payload.starts_with(b"Exif\0") && !config.strip_exif,
        APP2 => payload.starts_with(b"ICC_PROFILE\0"),
        // Adobe colour transform flag changes how YCCK/CMYK decodes
        APP14 => payload.starts_with(b"Adobe"),
        APP1..=APP15 => false,
        _ => true,
    }
}
